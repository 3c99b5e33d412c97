use std::any::Any;
use std::process::ExitCode;

use crate::cli::{OutputMode, SamplesCommands, StoreArgs};
use crate::commands::CommandHandler;
use crate::config;
use crate::errors::AppResult;
use crate::faces::{
    run_sample_clear_with, run_sample_listing_with, run_sample_removal_with, SampleClearOutcome,
    SampleListingOutcome, SampleRemovalOutcome,
};
use crate::output::{render_sample_clear, render_sample_list, render_sample_remove};

type ListFn = dyn Fn(&str, &StoreArgs) -> AppResult<SampleListingOutcome> + Send + Sync;
type RemoveFn = dyn Fn(&str, usize, &StoreArgs) -> AppResult<SampleRemovalOutcome> + Send + Sync;
type ClearFn = dyn Fn(&str, &StoreArgs) -> AppResult<SampleClearOutcome> + Send + Sync;

pub struct SamplesHandler {
    command: SamplesCommands,
    deps: SamplesHandlerDeps,
}

pub struct SamplesHandlerDeps {
    pub list: Box<ListFn>,
    pub remove: Box<RemoveFn>,
    pub clear: Box<ClearFn>,
    pub render_list:
        Box<dyn Fn(&SampleListingOutcome, OutputMode) -> AppResult<()> + Send + Sync>,
    pub render_remove:
        Box<dyn Fn(&SampleRemovalOutcome, OutputMode) -> AppResult<()> + Send + Sync>,
    pub render_clear: Box<dyn Fn(&SampleClearOutcome, OutputMode) -> AppResult<()> + Send + Sync>,
}

impl SamplesHandlerDeps {
    pub fn new(
        list: impl Fn(&str, &StoreArgs) -> AppResult<SampleListingOutcome> + Send + Sync + 'static,
        remove: impl Fn(&str, usize, &StoreArgs) -> AppResult<SampleRemovalOutcome>
            + Send
            + Sync
            + 'static,
        clear: impl Fn(&str, &StoreArgs) -> AppResult<SampleClearOutcome> + Send + Sync + 'static,
        render_list: impl Fn(&SampleListingOutcome, OutputMode) -> AppResult<()>
            + Send
            + Sync
            + 'static,
        render_remove: impl Fn(&SampleRemovalOutcome, OutputMode) -> AppResult<()>
            + Send
            + Sync
            + 'static,
        render_clear: impl Fn(&SampleClearOutcome, OutputMode) -> AppResult<()>
            + Send
            + Sync
            + 'static,
    ) -> Self {
        Self {
            list: Box::new(list),
            remove: Box::new(remove),
            clear: Box::new(clear),
            render_list: Box::new(render_list),
            render_remove: Box::new(render_remove),
            render_clear: Box::new(render_clear),
        }
    }
}

impl Default for SamplesHandlerDeps {
    fn default() -> Self {
        Self::new(
            default_list,
            default_remove,
            default_clear,
            render_sample_list,
            render_sample_remove,
            render_sample_clear,
        )
    }
}

impl SamplesHandler {
    pub fn new(command: SamplesCommands) -> Self {
        Self {
            command,
            deps: SamplesHandlerDeps::default(),
        }
    }

    pub fn with_dependencies(command: SamplesCommands, deps: SamplesHandlerDeps) -> Self {
        Self { command, deps }
    }
}

impl CommandHandler for SamplesHandler {
    fn execute(&self, mode: OutputMode, _verbose: bool) -> AppResult<ExitCode> {
        match &self.command {
            SamplesCommands::List(args) => {
                let outcome = (self.deps.list)(&args.identity, &args.store)?;
                (self.deps.render_list)(&outcome, mode)?;
            }
            SamplesCommands::Remove(args) => {
                let outcome = (self.deps.remove)(&args.identity, args.index, &args.store)?;
                (self.deps.render_remove)(&outcome, mode)?;
            }
            SamplesCommands::Clear(args) => {
                let outcome = (self.deps.clear)(&args.identity, &args.store)?;
                (self.deps.render_clear)(&outcome, mode)?;
            }
        }
        Ok(ExitCode::SUCCESS)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn default_list(identity: &str, store_args: &StoreArgs) -> AppResult<SampleListingOutcome> {
    let store = config::open_default_store(store_args)?;
    run_sample_listing_with(identity, store.as_ref())
}

fn default_remove(
    identity: &str,
    index: usize,
    store_args: &StoreArgs,
) -> AppResult<SampleRemovalOutcome> {
    let store = config::open_default_store(store_args)?;
    run_sample_removal_with(identity, index, store.as_ref())
}

fn default_clear(identity: &str, store_args: &StoreArgs) -> AppResult<SampleClearOutcome> {
    let store = config::open_default_store(store_args)?;
    run_sample_clear_with(identity, store.as_ref())
}
