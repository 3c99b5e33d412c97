use std::any::Any;
use std::process::ExitCode;

use crate::cli::{EnrollArgs, OutputMode};
use crate::commands::CommandHandler;
use crate::config;
use crate::errors::AppResult;
use crate::faces::{
    default_extractor, run_face_enrollment_with, validate_identity, FaceEnrollmentConfig,
    FaceEnrollmentOutcome, ImageSource,
};
use crate::output::render_enroll;

pub struct EnrollHandler {
    args: EnrollArgs,
    run: Box<dyn Fn(&EnrollArgs) -> AppResult<FaceEnrollmentOutcome> + Send + Sync>,
    render: Box<dyn Fn(&FaceEnrollmentOutcome, OutputMode) -> AppResult<()> + Send + Sync>,
}

impl EnrollHandler {
    pub fn new(args: EnrollArgs) -> Self {
        Self::with_dependencies(args, default_enroll, render_enroll)
    }

    pub fn with_dependencies(
        args: EnrollArgs,
        run: impl Fn(&EnrollArgs) -> AppResult<FaceEnrollmentOutcome> + Send + Sync + 'static,
        render: impl Fn(&FaceEnrollmentOutcome, OutputMode) -> AppResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            args,
            run: Box::new(run),
            render: Box::new(render),
        }
    }
}

impl CommandHandler for EnrollHandler {
    fn execute(&self, mode: OutputMode, _verbose: bool) -> AppResult<ExitCode> {
        let outcome = (self.run)(&self.args)?;
        (self.render)(&outcome, mode)?;
        Ok(ExitCode::SUCCESS)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

pub fn enrollment_config(args: &EnrollArgs) -> FaceEnrollmentConfig {
    FaceEnrollmentConfig {
        identity: args.identity.clone(),
        images: args
            .images
            .iter()
            .map(|path| ImageSource::path(path))
            .collect(),
    }
}

fn default_enroll(args: &EnrollArgs) -> AppResult<FaceEnrollmentOutcome> {
    validate_identity(&args.identity)?;
    let models = config::resolve_model_config(&args.models)?;
    let store = config::open_default_store(&args.store)?;
    let extractor = default_extractor(&models)?;
    run_face_enrollment_with(&enrollment_config(args), extractor.as_ref(), store.as_ref())
}
