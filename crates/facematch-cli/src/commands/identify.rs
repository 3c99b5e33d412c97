use std::any::Any;
use std::process::ExitCode;

use crate::cli::{IdentifyArgs, OutputMode};
use crate::commands::CommandHandler;
use crate::config;
use crate::errors::AppResult;
use crate::faces::{
    default_extractor, run_face_identification_with, FaceIdentificationConfig,
    FaceIdentificationOutcome, IdentificationDecision, ImageSource,
};
use crate::output::render_identify;

pub const NO_MATCH_EXIT_CODE: u8 = 5;
pub const NO_FACE_EXIT_CODE: u8 = 3;

pub struct IdentifyHandler {
    args: IdentifyArgs,
    run: Box<dyn Fn(&IdentifyArgs) -> AppResult<FaceIdentificationOutcome> + Send + Sync>,
    render: Box<dyn Fn(&FaceIdentificationOutcome, OutputMode) -> AppResult<()> + Send + Sync>,
}

impl IdentifyHandler {
    pub fn new(args: IdentifyArgs) -> Self {
        Self::with_dependencies(args, default_identify, render_identify)
    }

    pub fn with_dependencies(
        args: IdentifyArgs,
        run: impl Fn(&IdentifyArgs) -> AppResult<FaceIdentificationOutcome> + Send + Sync + 'static,
        render: impl Fn(&FaceIdentificationOutcome, OutputMode) -> AppResult<()>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            args,
            run: Box::new(run),
            render: Box::new(render),
        }
    }
}

impl CommandHandler for IdentifyHandler {
    /// Exits successfully only when an identity was identified.
    fn execute(&self, mode: OutputMode, _verbose: bool) -> AppResult<ExitCode> {
        let outcome = (self.run)(&self.args)?;
        (self.render)(&outcome, mode)?;
        Ok(match outcome.decision {
            IdentificationDecision::Identified(_) => ExitCode::SUCCESS,
            IdentificationDecision::NoMatchFound => ExitCode::from(NO_MATCH_EXIT_CODE),
            IdentificationDecision::NoFaceDetected => ExitCode::from(NO_FACE_EXIT_CODE),
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn default_identify(args: &IdentifyArgs) -> AppResult<FaceIdentificationOutcome> {
    let models = config::resolve_model_config(&args.models)?;
    let store = config::open_default_store(&args.store)?;
    let extractor = default_extractor(&models)?;
    let query = FaceIdentificationConfig {
        image: ImageSource::path(&args.image),
    };
    run_face_identification_with(&query, extractor.as_ref(), store.as_ref())
}
