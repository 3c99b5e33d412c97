use std::collections::HashMap;

use facematch_core::errors::{AppError, AppResult};
use facematch_core::faces::{
    run_face_enrollment_with, run_face_identification_with, run_sample_clear_with,
    run_sample_listing_with, run_sample_removal_with, Descriptor, DescriptorStore,
    FaceEnrollmentConfig, FaceExtractor, FaceIdentificationConfig, FilesystemDescriptorStore,
    IdentificationDecision, ImageSource, Rectangle, DESCRIPTOR_LEN,
};
use facematch_core::store_key::StoreKey;
use tempfile::TempDir;

struct FixtureExtractor {
    faces: HashMap<String, Vec<Descriptor>>,
}

impl FixtureExtractor {
    fn new(entries: Vec<(&str, Vec<Descriptor>)>) -> Self {
        Self {
            faces: entries
                .into_iter()
                .map(|(label, faces)| (label.to_string(), faces))
                .collect(),
        }
    }
}

impl FaceExtractor for FixtureExtractor {
    fn detect_faces(&self, image: &ImageSource) -> AppResult<Vec<Descriptor>> {
        let label = image.label();
        self.faces
            .get(&label)
            .cloned()
            .ok_or(AppError::Extraction {
                label,
                message: "no fixture".into(),
            })
    }
}

/// A face "photo": a shared base vector nudged by `jitter` on a few axes.
fn face_photo(base: f32, jitter: f32) -> Descriptor {
    let mut vector = [0.0f32; DESCRIPTOR_LEN];
    for (idx, value) in vector.iter_mut().enumerate() {
        *value = base + (idx as f32) * 0.001;
    }
    vector[0] += jitter;
    vector[1] -= jitter;
    Descriptor::new(vector, Rectangle::new(40, 40, 200, 220))
}

fn images(labels: &[&str]) -> Vec<ImageSource> {
    labels.iter().map(|label| ImageSource::path(*label)).collect()
}

#[test]
fn enroll_four_images_then_identify_fifth() {
    let tmp = TempDir::new().unwrap();
    let store = FilesystemDescriptorStore::new(tmp.path());
    let extractor = FixtureExtractor::new(vec![
        ("t1-1.jpg", vec![face_photo(0.1, 0.00)]),
        ("t1-2.jpg", vec![face_photo(0.1, 0.05)]),
        ("t1-3.jpg", vec![face_photo(0.1, -0.05)]),
        ("t1-4.jpg", vec![]),
        ("t1-5.jpg", vec![face_photo(0.1, 0.02)]),
        ("stranger.jpg", vec![face_photo(0.6, 0.0)]),
    ]);

    let enrollment = run_face_enrollment_with(
        &FaceEnrollmentConfig {
            identity: "T1".into(),
            images: images(&["t1-1.jpg", "t1-2.jpg", "t1-3.jpg", "t1-4.jpg"]),
        },
        &extractor,
        &store,
    )
    .unwrap();
    assert_eq!(enrollment.samples_accepted, 3);
    assert_eq!(enrollment.skipped.len(), 1);
    assert_eq!(enrollment.skipped[0].position, 3);
    assert!(tmp.path().join("T1.json").exists());

    let outcome = run_face_identification_with(
        &FaceIdentificationConfig {
            image: ImageSource::path("t1-5.jpg"),
        },
        &extractor,
        &store,
    )
    .unwrap();
    match outcome.decision {
        IdentificationDecision::Identified(result) => {
            assert_eq!(result.identity, "T1");
            assert_eq!(result.match_count, 3);
            assert_eq!(result.total_samples, 3);
            assert!(result.min_distance > 0.0);
        }
        other => panic!("unexpected decision: {:?}", other),
    }

    let stranger = run_face_identification_with(
        &FaceIdentificationConfig {
            image: ImageSource::path("stranger.jpg"),
        },
        &extractor,
        &store,
    )
    .unwrap();
    assert_eq!(stranger.decision, IdentificationDecision::NoMatchFound);
}

#[test]
fn removing_a_sample_drops_identity_below_quorum() {
    let tmp = TempDir::new().unwrap();
    let store = FilesystemDescriptorStore::new(tmp.path());
    for jitter in [0.0, 0.01, 0.02] {
        store.append_sample("t1", &face_photo(0.2, jitter)).unwrap();
    }
    let extractor = FixtureExtractor::new(vec![("query.jpg", vec![face_photo(0.2, 0.0)])]);
    let config = FaceIdentificationConfig {
        image: ImageSource::path("query.jpg"),
    };

    let before = run_face_identification_with(&config, &extractor, &store).unwrap();
    assert!(before.decision.matched().is_some());

    let removal = run_sample_removal_with("t1", 0, &store).unwrap();
    assert_eq!(removal.remaining, 2);
    let after = run_face_identification_with(&config, &extractor, &store).unwrap();
    assert_eq!(after.decision, IdentificationDecision::NoMatchFound);

    run_sample_clear_with("t1", &store).unwrap();
    assert_eq!(run_sample_listing_with("t1", &store).unwrap().count(), 0);
    assert!(store.list_enrolled_identities().unwrap().is_empty());
}

#[test]
fn unreadable_store_file_does_not_block_other_identities() {
    let tmp = TempDir::new().unwrap();
    let store = FilesystemDescriptorStore::new(tmp.path());
    std::fs::write(tmp.path().join("a-broken.json"), "not json at all").unwrap();
    for _ in 0..3 {
        store.append_sample("b-good", &face_photo(0.3, 0.0)).unwrap();
    }
    let extractor = FixtureExtractor::new(vec![("query.jpg", vec![face_photo(0.3, 0.0)])]);

    let outcome = run_face_identification_with(
        &FaceIdentificationConfig {
            image: ImageSource::path("query.jpg"),
        },
        &extractor,
        &store,
    )
    .unwrap();
    assert_eq!(outcome.decision.matched().unwrap().identity, "b-good");
    assert!(outcome.logs.iter().any(|line| line.contains("a-broken")));
}

#[test]
fn tampered_encrypted_file_does_not_block_other_identities() {
    let tmp = TempDir::new().unwrap();
    let store = FilesystemDescriptorStore::new(tmp.path()).with_key(Some(StoreKey::generate()));
    for _ in 0..3 {
        store.append_sample("b-good", &face_photo(0.3, 0.0)).unwrap();
    }
    std::fs::write(
        tmp.path().join("a-tampered.json"),
        r#"{"version":1,"algorithm":"AES-256-GCM","nonce":"AAAAAAAAAAAAAAAA","ciphertext":"AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA="}"#,
    )
    .unwrap();
    let extractor = FixtureExtractor::new(vec![("query.jpg", vec![face_photo(0.3, 0.0)])]);

    let outcome = run_face_identification_with(
        &FaceIdentificationConfig {
            image: ImageSource::path("query.jpg"),
        },
        &extractor,
        &store,
    )
    .unwrap();
    assert_eq!(outcome.decision.matched().unwrap().identity, "b-good");
    assert_eq!(outcome.identities_scanned, 1);
    assert!(outcome
        .logs
        .iter()
        .any(|line| line.contains("a-tampered") && line.contains("skipped")));
}

#[test]
fn encrypted_store_identifies_with_key() {
    let tmp = TempDir::new().unwrap();
    let key_path = tmp.path().join("store.key");
    StoreKey::generate().persist(&key_path).unwrap();
    let key = StoreKey::load(&key_path).unwrap();
    let store = FilesystemDescriptorStore::new(tmp.path().join("descriptors")).with_key(Some(key));

    let extractor = FixtureExtractor::new(vec![
        ("1.jpg", vec![face_photo(0.4, 0.0)]),
        ("2.jpg", vec![face_photo(0.4, 0.01)]),
        ("3.jpg", vec![face_photo(0.4, 0.02)]),
    ]);
    run_face_enrollment_with(
        &FaceEnrollmentConfig {
            identity: "sealed".into(),
            images: images(&["1.jpg", "2.jpg", "3.jpg"]),
        },
        &extractor,
        &store,
    )
    .unwrap();

    let raw = std::fs::read_to_string(tmp.path().join("descriptors/sealed.json")).unwrap();
    assert!(!raw.contains("rectangle"));

    let outcome = run_face_identification_with(
        &FaceIdentificationConfig {
            image: ImageSource::path("1.jpg"),
        },
        &extractor,
        &store,
    )
    .unwrap();
    assert_eq!(outcome.decision.matched().unwrap().identity, "sealed");
}
