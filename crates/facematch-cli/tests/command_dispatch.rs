use std::path::PathBuf;

use facematch_cli::cli::{
    Commands, DetectArgs, EnrollArgs, IdentifyArgs, KeygenArgs, ModelArgs, SampleClearArgs,
    SampleListArgs, SamplesCommands, StoreArgs,
};
use facematch_cli::commands::{
    CommandHandler, DetectHandler, EnrollHandler, IdentifyHandler, KeygenHandler, SamplesHandler,
};

fn sample_enroll_args() -> EnrollArgs {
    EnrollArgs {
        identity: "t1".into(),
        images: vec![
            PathBuf::from("a.png"),
            PathBuf::from("b.png"),
            PathBuf::from("c.png"),
        ],
        store: StoreArgs::default(),
        models: ModelArgs::default(),
    }
}

fn assert_dispatch<T: 'static>(command: Commands)
where
    T: CommandHandler,
{
    let handler: Box<dyn CommandHandler> = command.into();
    assert!(handler.as_any().is::<T>());
}

#[test]
fn enroll_command_dispatches_enroll_handler() {
    assert_dispatch::<EnrollHandler>(Commands::Enroll(sample_enroll_args()));
}

#[test]
fn identify_command_dispatches_identify_handler() {
    assert_dispatch::<IdentifyHandler>(Commands::Identify(IdentifyArgs {
        image: PathBuf::from("query.png"),
        store: StoreArgs::default(),
        models: ModelArgs::default(),
    }));
}

#[test]
fn detect_command_dispatches_detect_handler() {
    assert_dispatch::<DetectHandler>(Commands::Detect(DetectArgs {
        image: PathBuf::from("query.png"),
        models: ModelArgs::default(),
    }));
}

#[test]
fn samples_commands_dispatch_samples_handler() {
    assert_dispatch::<SamplesHandler>(Commands::Samples(SamplesCommands::List(SampleListArgs {
        identity: "t1".into(),
        store: StoreArgs::default(),
    })));
    assert_dispatch::<SamplesHandler>(Commands::Samples(SamplesCommands::Clear(
        SampleClearArgs {
            identity: "t1".into(),
            store: StoreArgs::default(),
        },
    )));
}

#[test]
fn keygen_command_dispatches_keygen_handler() {
    assert_dispatch::<KeygenHandler>(Commands::Keygen(KeygenArgs {
        output: PathBuf::from("store.key"),
    }));
}
