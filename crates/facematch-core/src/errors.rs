use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

use image::ImageError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("input image not found or unreadable: {path}")]
    MissingInput { path: PathBuf },

    #[error("failed to decode image {label}: {source}")]
    ImageDecode {
        label: String,
        #[source]
        source: ImageError,
    },

    #[error("face extraction failed for {label}: {message}")]
    Extraction { label: String, message: String },

    #[error("missing {kind} model; provide {flag} or set ${env}")]
    MissingModel {
        kind: &'static str,
        flag: &'static str,
        env: &'static str,
    },

    #[error("failed to load model {path}: {message}")]
    ModelLoad { path: PathBuf, message: String },

    #[error("no face extraction backend available: {0}")]
    BackendUnavailable(String),

    #[error("invalid identity '{identity}': {message}")]
    InvalidIdentity { identity: String, message: String },

    #[error("enrollment requires between {min} and {max} images, got {provided}")]
    InvalidBatchSize {
        provided: usize,
        min: usize,
        max: usize,
    },

    #[error("no faces detected in any of the {provided} image(s) supplied for identity {identity}")]
    NoFacesDetected { identity: String, provided: usize },

    #[error(
        "only {accepted} of {provided} image(s) were usable for identity {identity}; at least {required} are required"
    )]
    InsufficientSamples {
        identity: String,
        accepted: usize,
        provided: usize,
        required: usize,
    },

    #[error("sample index {index} out of range for identity {identity} ({len} stored)")]
    SampleIndexOutOfRange {
        identity: String,
        index: usize,
        len: usize,
    },

    #[error("stored descriptor #{index} for identity {identity} is corrupt: {message}")]
    CorruptRecord {
        identity: String,
        index: usize,
        message: String,
    },

    #[error("failed to read descriptor store {path}: {source}")]
    StoreRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write descriptor store {path}: {source}")]
    StoreWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("descriptor store {path} is invalid: {message}")]
    InvalidStore { path: PathBuf, message: String },

    #[error("descriptor store {path} is encrypted and requires a store key")]
    EncryptedStoreRequiresKey { path: PathBuf },

    #[error("descriptor encryption error: {0}")]
    Encryption(String),

    #[error("store key {path} is invalid: {message}")]
    StoreKey { path: PathBuf, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to read configuration file {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid configuration file {path}: {message}")]
    ConfigParse { path: PathBuf, message: String },
}

impl AppError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            AppError::MissingInput { .. } => ExitCode::from(2),
            AppError::ImageDecode { .. } => ExitCode::from(2),
            AppError::MissingModel { .. } => ExitCode::from(2),
            AppError::ModelLoad { .. } => ExitCode::from(2),
            AppError::BackendUnavailable(_) => ExitCode::from(2),
            AppError::InvalidIdentity { .. } => ExitCode::from(2),
            AppError::InvalidBatchSize { .. } => ExitCode::from(2),
            AppError::NoFacesDetected { .. } => ExitCode::from(3),
            AppError::InsufficientSamples { .. } => ExitCode::from(3),
            AppError::SampleIndexOutOfRange { .. } => ExitCode::from(4),
            AppError::InvalidStore { .. } => ExitCode::from(2),
            AppError::EncryptedStoreRequiresKey { .. } => ExitCode::from(2),
            AppError::Encryption(_) => ExitCode::from(2),
            AppError::StoreKey { .. } => ExitCode::from(2),
            AppError::ConfigRead { .. } => ExitCode::from(2),
            AppError::ConfigParse { .. } => ExitCode::from(2),
            _ => ExitCode::from(1),
        }
    }

    pub fn human_message(&self) -> String {
        self.to_string()
    }

    /// True for failures raised by the descriptor store adapter.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            AppError::StoreRead { .. }
                | AppError::StoreWrite { .. }
                | AppError::InvalidStore { .. }
                | AppError::EncryptedStoreRequiresKey { .. }
                | AppError::Encryption(_)
        )
    }
}

pub type AppResult<T> = Result<T, AppError>;
