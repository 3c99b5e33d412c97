use std::any::Any;
use std::process::ExitCode;

use crate::cli::{DetectArgs, OutputMode};
use crate::commands::identify::NO_FACE_EXIT_CODE;
use crate::commands::CommandHandler;
use crate::config;
use crate::errors::AppResult;
use crate::faces::{
    default_extractor, run_face_detection_with, FaceDetectionConfig, FaceDetectionOutcome,
    ImageSource,
};
use crate::output::render_detect;

pub struct DetectHandler {
    args: DetectArgs,
    run: Box<dyn Fn(&DetectArgs) -> AppResult<FaceDetectionOutcome> + Send + Sync>,
    render: Box<dyn Fn(&FaceDetectionOutcome, OutputMode) -> AppResult<()> + Send + Sync>,
}

impl DetectHandler {
    pub fn new(args: DetectArgs) -> Self {
        Self::with_dependencies(args, default_detect, render_detect)
    }

    pub fn with_dependencies(
        args: DetectArgs,
        run: impl Fn(&DetectArgs) -> AppResult<FaceDetectionOutcome> + Send + Sync + 'static,
        render: impl Fn(&FaceDetectionOutcome, OutputMode) -> AppResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            args,
            run: Box::new(run),
            render: Box::new(render),
        }
    }
}

impl CommandHandler for DetectHandler {
    fn execute(&self, mode: OutputMode, _verbose: bool) -> AppResult<ExitCode> {
        let outcome = (self.run)(&self.args)?;
        (self.render)(&outcome, mode)?;
        if outcome.largest.is_some() {
            Ok(ExitCode::SUCCESS)
        } else {
            Ok(ExitCode::from(NO_FACE_EXIT_CODE))
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn default_detect(args: &DetectArgs) -> AppResult<FaceDetectionOutcome> {
    let models = config::resolve_model_config(&args.models)?;
    let extractor = default_extractor(&models)?;
    let config = FaceDetectionConfig {
        image: ImageSource::path(&args.image),
    };
    run_face_detection_with(&config, extractor.as_ref())
}
