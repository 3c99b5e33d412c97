use std::any::Any;
use std::process::ExitCode;

use crate::cli::{KeygenArgs, OutputMode};
use crate::commands::CommandHandler;
use crate::errors::AppResult;
use crate::keygen::{self, KeygenSummary};
use crate::output::render_keygen;

pub struct KeygenHandler {
    args: KeygenArgs,
    generate: Box<dyn Fn(&KeygenArgs) -> AppResult<KeygenSummary> + Send + Sync>,
    render: Box<dyn Fn(&KeygenSummary, OutputMode) -> AppResult<()> + Send + Sync>,
}

impl KeygenHandler {
    pub fn new(args: KeygenArgs) -> Self {
        Self::with_dependencies(args, default_generate, render_keygen)
    }

    pub fn with_dependencies(
        args: KeygenArgs,
        generate: impl Fn(&KeygenArgs) -> AppResult<KeygenSummary> + Send + Sync + 'static,
        render: impl Fn(&KeygenSummary, OutputMode) -> AppResult<()> + Send + Sync + 'static,
    ) -> Self {
        Self {
            args,
            generate: Box::new(generate),
            render: Box::new(render),
        }
    }
}

impl CommandHandler for KeygenHandler {
    fn execute(&self, mode: OutputMode, _verbose: bool) -> AppResult<ExitCode> {
        let summary = (self.generate)(&self.args)?;
        (self.render)(&summary, mode)?;
        Ok(ExitCode::SUCCESS)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn default_generate(args: &KeygenArgs) -> AppResult<KeygenSummary> {
    keygen::run_keygen(&args.output)
}
