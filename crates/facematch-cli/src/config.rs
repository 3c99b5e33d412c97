use std::path::PathBuf;

use facematch_config::{
    default_config_paths, load_resolved_from_paths, ConfigError, ResolvedConfig,
};
use facematch_core::faces::{
    DescriptorStore, EnvStoreDirResolver, FaceModelConfig, FilesystemDescriptorStore,
    StoreDirResolver,
};
use facematch_core::store_key::StoreKey;
use tracing::debug;

use crate::cli::{ModelArgs, StoreArgs};
use crate::errors::{AppError, AppResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreSettings {
    pub dir: PathBuf,
    pub key_file: Option<PathBuf>,
}

/// Store location: flag, then config file, then `$FACEMATCH_STORE_DIR`,
/// then the built-in default.
pub fn resolve_store_settings(args: &StoreArgs) -> AppResult<StoreSettings> {
    resolve_store_settings_with_sources(args, &default_config_paths())
}

pub fn resolve_store_settings_with_sources(
    args: &StoreArgs,
    sources: &[PathBuf],
) -> AppResult<StoreSettings> {
    let file = load_file_config(sources)?;
    let dir_override = args.store_dir.clone().or(file.descriptor_store_dir);
    let dir = EnvStoreDirResolver.resolve(dir_override.as_deref());
    let key_file = args.store_key_file.clone().or(file.store_key_file);
    debug!(dir = %dir.display(), encrypted = key_file.is_some(), "resolved descriptor store");
    Ok(StoreSettings { dir, key_file })
}

pub fn resolve_model_config(args: &ModelArgs) -> AppResult<FaceModelConfig> {
    resolve_model_config_with_sources(args, &default_config_paths())
}

/// Model paths left unset here are filled from the `DLIB_*` environment
/// variables when the extractor is built.
pub fn resolve_model_config_with_sources(
    args: &ModelArgs,
    sources: &[PathBuf],
) -> AppResult<FaceModelConfig> {
    let file = load_file_config(sources)?;
    Ok(FaceModelConfig {
        landmark_model: args.landmark_model.clone().or(file.landmark_model),
        encoder_model: args.encoder_model.clone().or(file.encoder_model),
        jitters: args.jitters.unwrap_or(file.jitters).max(1),
    })
}

pub fn open_store(settings: &StoreSettings) -> AppResult<FilesystemDescriptorStore> {
    let key = settings
        .key_file
        .as_deref()
        .map(StoreKey::load)
        .transpose()?;
    Ok(FilesystemDescriptorStore::new(&settings.dir).with_key(key))
}

/// Opens the configured store as a trait object for the handlers' default
/// pipelines.
pub fn open_default_store(args: &StoreArgs) -> AppResult<Box<dyn DescriptorStore>> {
    let settings = resolve_store_settings(args)?;
    Ok(Box::new(open_store(&settings)?))
}

fn load_file_config(sources: &[PathBuf]) -> AppResult<ResolvedConfig> {
    let loaded = load_resolved_from_paths(sources).map_err(map_config_error)?;
    if let Some(source) = &loaded.source {
        debug!(path = %source.display(), "loaded configuration file");
    }
    Ok(loaded.resolved)
}

fn map_config_error(err: ConfigError) -> AppError {
    match err {
        ConfigError::Read { path, source } => AppError::ConfigRead { path, source },
        ConfigError::Parse { path, message } => AppError::ConfigParse { path, message },
    }
}
