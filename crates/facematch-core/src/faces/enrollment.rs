use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};
use crate::faces::descriptor::largest_face;
use crate::faces::extractor::{FaceExtractor, ImageSource};
use crate::faces::store::DescriptorStore;

pub const MIN_ENROLLMENT_IMAGES: usize = 3;
pub const MAX_ENROLLMENT_IMAGES: usize = 10;
/// Usable descriptors an enrollment batch must yield to succeed.
pub const MIN_ENROLLMENT_SAMPLES: usize = 3;

#[derive(Debug, Clone)]
pub struct FaceEnrollmentConfig {
    pub identity: String,
    pub images: Vec<ImageSource>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SkippedImage {
    pub position: usize,
    pub image: String,
    pub reason: String,
}

#[derive(Debug)]
pub struct FaceEnrollmentOutcome {
    pub identity: String,
    pub samples_accepted: usize,
    pub images_provided: usize,
    pub skipped: Vec<SkippedImage>,
    pub logs: Vec<String>,
}

/// Enrolls a batch of 3 to 10 images for one identity.
///
/// Images are processed in order. An image whose extraction fails or finds no
/// face is skipped; otherwise its largest face is appended to the store at
/// once. Store failures abort the batch. Descriptors appended before the
/// batch is found to be short of [`MIN_ENROLLMENT_SAMPLES`] stay persisted.
pub fn run_face_enrollment_with<E, S>(
    config: &FaceEnrollmentConfig,
    extractor: &E,
    store: &S,
) -> AppResult<FaceEnrollmentOutcome>
where
    E: FaceExtractor + ?Sized,
    S: DescriptorStore + ?Sized,
{
    validate_identity(&config.identity)?;

    let provided = config.images.len();
    if !(MIN_ENROLLMENT_IMAGES..=MAX_ENROLLMENT_IMAGES).contains(&provided) {
        return Err(AppError::InvalidBatchSize {
            provided,
            min: MIN_ENROLLMENT_IMAGES,
            max: MAX_ENROLLMENT_IMAGES,
        });
    }

    let mut logs = Vec::new();
    logs.push(format!(
        "Enrolling {} image(s) for identity {}",
        provided, config.identity
    ));

    let mut accepted = 0usize;
    let mut skipped = Vec::new();
    for (position, image) in config.images.iter().enumerate() {
        let label = image.label();
        let faces = match extractor.detect_faces(image) {
            Ok(faces) => faces,
            Err(err) => {
                warn!(identity = %config.identity, image = %label, error = %err, "skipping image");
                logs.push(format!("Image #{} ({label}) skipped: {err}", position + 1));
                skipped.push(SkippedImage {
                    position,
                    image: label,
                    reason: err.to_string(),
                });
                continue;
            }
        };

        let Some(face) = largest_face(&faces) else {
            debug!(identity = %config.identity, image = %label, "no face detected");
            logs.push(format!("Image #{} ({label}) skipped: no face detected", position + 1));
            skipped.push(SkippedImage {
                position,
                image: label,
                reason: "no face detected".into(),
            });
            continue;
        };

        store.append_sample(&config.identity, face)?;
        accepted += 1;
        logs.push(format!(
            "Image #{} ({label}): stored largest of {} face(s)",
            position + 1,
            faces.len()
        ));
    }

    if accepted == 0 {
        return Err(AppError::NoFacesDetected {
            identity: config.identity.clone(),
            provided,
        });
    }
    if accepted < MIN_ENROLLMENT_SAMPLES {
        warn!(
            identity = %config.identity,
            accepted,
            "enrollment short of required samples; stored descriptors were kept"
        );
        return Err(AppError::InsufficientSamples {
            identity: config.identity.clone(),
            accepted,
            provided,
            required: MIN_ENROLLMENT_SAMPLES,
        });
    }

    info!(identity = %config.identity, accepted, provided, "enrollment complete");
    logs.push(format!(
        "Enrolled {} of {} image(s) for identity {}",
        accepted, provided, config.identity
    ));

    Ok(FaceEnrollmentOutcome {
        identity: config.identity.clone(),
        samples_accepted: accepted,
        images_provided: provided,
        skipped,
        logs,
    })
}

pub fn validate_identity(identity: &str) -> AppResult<()> {
    if identity.is_empty() {
        return Err(AppError::InvalidIdentity {
            identity: identity.to_string(),
            message: "identity cannot be empty".into(),
        });
    }

    if !identity
        .chars()
        .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
    {
        return Err(AppError::InvalidIdentity {
            identity: identity.to_string(),
            message: "use ASCII letters, numbers, '-' or '_' only".into(),
        });
    }

    Ok(())
}
