use std::collections::HashMap;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use facematch_cli::cli::{EnrollArgs, ModelArgs, OutputMode, StoreArgs};
use facematch_cli::commands::{CommandHandler, EnrollHandler};
use facematch_cli::config::{open_store, StoreSettings};
use facematch_cli::errors::{AppError, AppResult};
use facematch_cli::faces::{
    run_face_enrollment_with, Descriptor, DescriptorStore, FaceEnrollmentConfig,
    FaceEnrollmentOutcome, FaceExtractor, ImageSource, Rectangle, DESCRIPTOR_LEN,
};
use tempfile::TempDir;

struct LabelExtractor {
    faces: HashMap<String, usize>,
}

impl FaceExtractor for LabelExtractor {
    fn detect_faces(&self, image: &ImageSource) -> AppResult<Vec<Descriptor>> {
        let count = self.faces.get(&image.label()).copied().unwrap_or(0);
        Ok((0..count)
            .map(|n| {
                Descriptor::new(
                    [0.1 * n as f32; DESCRIPTOR_LEN],
                    Rectangle::new(0, 0, 10 + n as i64, 10 + n as i64),
                )
            })
            .collect())
    }
}

fn args(store_dir: PathBuf, images: &[&str]) -> EnrollArgs {
    EnrollArgs {
        identity: "t1".into(),
        images: images.iter().map(|image| PathBuf::from(*image)).collect(),
        store: StoreArgs {
            store_dir: Some(store_dir),
            store_key_file: None,
        },
        models: ModelArgs::default(),
    }
}

fn stub_run(
    faces: Vec<(&str, usize)>,
) -> impl Fn(&EnrollArgs) -> AppResult<FaceEnrollmentOutcome> + Send + Sync + 'static {
    let faces: HashMap<String, usize> = faces
        .into_iter()
        .map(|(label, count)| (label.to_string(), count))
        .collect();
    move |args: &EnrollArgs| {
        let extractor = LabelExtractor {
            faces: faces.clone(),
        };
        let store = open_store(&StoreSettings {
            dir: args.store.store_dir.clone().unwrap_or_default(),
            key_file: None,
        })?;
        let config = FaceEnrollmentConfig {
            identity: args.identity.clone(),
            images: args.images.iter().map(|path| ImageSource::path(path)).collect(),
        };
        run_face_enrollment_with(&config, &extractor, &store)
    }
}

#[test]
fn enroll_handler_renders_accepted_count() {
    let tmp = TempDir::new().unwrap();
    let rendered = Arc::new(Mutex::new(Vec::new()));
    let handler = EnrollHandler::with_dependencies(
        args(tmp.path().to_path_buf(), &["a.png", "b.png", "c.png", "d.png"]),
        stub_run(vec![("a.png", 1), ("b.png", 2), ("c.png", 1)]),
        {
            let rendered = Arc::clone(&rendered);
            move |outcome, mode| {
                rendered
                    .lock()
                    .unwrap()
                    .push((outcome.samples_accepted, outcome.skipped.len(), mode));
                Ok(())
            }
        },
    );

    let code = handler.execute(OutputMode::Json, false).unwrap();
    assert_eq!(code, ExitCode::SUCCESS);
    assert_eq!(
        rendered.lock().unwrap().as_slice(),
        &[(3, 1, OutputMode::Json)]
    );

    let store = open_store(&StoreSettings {
        dir: tmp.path().to_path_buf(),
        key_file: None,
    })
    .unwrap();
    assert_eq!(store.get_samples("t1").unwrap().len(), 3);
}

#[test]
fn enroll_handler_surfaces_insufficient_samples() {
    let tmp = TempDir::new().unwrap();
    let handler = EnrollHandler::with_dependencies(
        args(tmp.path().to_path_buf(), &["a.png", "b.png", "c.png"]),
        stub_run(vec![("a.png", 1), ("b.png", 1)]),
        |_outcome, _mode| panic!("render should not run"),
    );

    let err = handler.execute(OutputMode::Human, false).unwrap_err();
    match &err {
        AppError::InsufficientSamples { accepted, .. } => assert_eq!(*accepted, 2),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(err.exit_code(), ExitCode::from(3));
    assert!(tmp.path().join("t1.json").exists());
}

#[test]
fn enroll_handler_rejects_invalid_batch_size() {
    let tmp = TempDir::new().unwrap();
    let handler = EnrollHandler::with_dependencies(
        args(tmp.path().to_path_buf(), &["a.png"]),
        stub_run(vec![("a.png", 1)]),
        |_outcome, _mode| Ok(()),
    );

    let err = handler.execute(OutputMode::Human, false).unwrap_err();
    assert!(matches!(err, AppError::InvalidBatchSize { provided: 1, .. }));
    assert_eq!(err.exit_code(), ExitCode::from(2));
}
