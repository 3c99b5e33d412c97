use std::any::Any;
use std::process::ExitCode;

use crate::cli::{Commands, OutputMode};
use crate::errors::AppResult;

pub trait CommandHandler: Send + Sync {
    fn execute(&self, mode: OutputMode, verbose: bool) -> AppResult<ExitCode>;
    fn as_any(&self) -> &dyn Any;
}

mod detect;
mod enroll;
mod identify;
mod keygen;
mod samples;

pub use detect::DetectHandler;
pub use enroll::EnrollHandler;
pub use identify::{IdentifyHandler, NO_FACE_EXIT_CODE, NO_MATCH_EXIT_CODE};
pub use keygen::KeygenHandler;
pub use samples::{SamplesHandler, SamplesHandlerDeps};

impl From<Commands> for Box<dyn CommandHandler> {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Enroll(args) => Box::new(EnrollHandler::new(args)),
            Commands::Identify(args) => Box::new(IdentifyHandler::new(args)),
            Commands::Detect(args) => Box::new(DetectHandler::new(args)),
            Commands::Samples(cmd) => Box::new(SamplesHandler::new(cmd)),
            Commands::Keygen(args) => Box::new(KeygenHandler::new(args)),
        }
    }
}
