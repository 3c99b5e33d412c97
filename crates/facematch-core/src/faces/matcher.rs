use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};
use crate::faces::descriptor::{distance, largest_face, Descriptor, TOLERANCE};
use crate::faces::extractor::{FaceExtractor, ImageSource};
use crate::faces::store::DescriptorStore;

/// Stored descriptors of one identity that must match before it is identified.
pub const MIN_MATCHES_REQUIRED: usize = 3;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct MatchResult {
    pub identity: String,
    pub match_count: usize,
    pub total_samples: usize,
    pub min_distance: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IdentificationDecision {
    Identified(MatchResult),
    NoFaceDetected,
    NoMatchFound,
}

impl IdentificationDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            IdentificationDecision::Identified(_) => "identified",
            IdentificationDecision::NoFaceDetected => "no_face_detected",
            IdentificationDecision::NoMatchFound => "no_match_found",
        }
    }

    pub fn matched(&self) -> Option<&MatchResult> {
        match self {
            IdentificationDecision::Identified(result) => Some(result),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FaceIdentificationConfig {
    pub image: ImageSource,
}

#[derive(Debug)]
pub struct FaceIdentificationOutcome {
    pub decision: IdentificationDecision,
    pub faces_detected: usize,
    pub identities_scanned: usize,
    pub logs: Vec<String>,
}

/// Counts the stored samples matching `query`.
///
/// `min_distance` only considers matching samples and is `None` when none
/// match. Corrupt records are skipped without counting as a vote.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IdentityScore {
    pub match_count: usize,
    pub total_samples: usize,
    pub corrupt_samples: usize,
    pub min_distance: Option<f32>,
}

pub fn score_identity<S>(store: &S, identity: &str, query: &Descriptor) -> AppResult<IdentityScore>
where
    S: DescriptorStore + ?Sized,
{
    let samples = store.get_samples(identity)?;
    let mut score = IdentityScore {
        match_count: 0,
        total_samples: samples.len(),
        corrupt_samples: 0,
        min_distance: None,
    };

    for (index, sample) in samples.iter().enumerate() {
        let stored = match sample.decode(identity, index) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(identity, index, error = %err, "skipping corrupt descriptor");
                score.corrupt_samples += 1;
                continue;
            }
        };

        let dist = distance(query, &stored);
        debug!(identity, index, distance = dist, "compared descriptor");
        if dist < TOLERANCE {
            score.match_count += 1;
            score.min_distance = Some(score.min_distance.map_or(dist, |current| current.min(dist)));
        }
    }

    Ok(score)
}

/// Identifies the largest face in one image against every enrolled identity.
///
/// Identities are scanned in store listing order. Only identities with at
/// least [`MIN_MATCHES_REQUIRED`] matching samples qualify; among them the
/// strictly highest match count wins and ties keep the earlier identity.
pub fn run_face_identification_with<E, S>(
    config: &FaceIdentificationConfig,
    extractor: &E,
    store: &S,
) -> AppResult<FaceIdentificationOutcome>
where
    E: FaceExtractor + ?Sized,
    S: DescriptorStore + ?Sized,
{
    let mut logs = Vec::new();
    let faces = extractor.detect_faces(&config.image)?;
    let Some(query) = largest_face(&faces) else {
        info!(image = %config.image.label(), "no face detected in query image");
        logs.push(format!("No face detected in {}", config.image.label()));
        return Ok(FaceIdentificationOutcome {
            decision: IdentificationDecision::NoFaceDetected,
            faces_detected: 0,
            identities_scanned: 0,
            logs,
        });
    };
    logs.push(format!(
        "Detected {} face(s) in {}; using the largest",
        faces.len(),
        config.image.label()
    ));

    let mut best: Option<MatchResult> = None;
    let mut scanned = 0usize;
    for enrolled in store.list_enrolled_identities()? {
        if !enrolled.has_samples {
            continue;
        }

        let score = match score_identity(store, &enrolled.identity, query) {
            Ok(score) => score,
            Err(err @ (AppError::InvalidStore { .. } | AppError::Encryption(_))) => {
                warn!(identity = %enrolled.identity, error = %err, "skipping unreadable enrollment set");
                logs.push(format!("Identity {} skipped: {err}", enrolled.identity));
                continue;
            }
            Err(err) => return Err(err),
        };
        scanned += 1;
        if score.corrupt_samples > 0 {
            logs.push(format!(
                "Identity {}: ignored {} corrupt descriptor(s)",
                enrolled.identity, score.corrupt_samples
            ));
        }
        logs.push(format!(
            "Identity {}: {} of {} sample(s) matched",
            enrolled.identity, score.match_count, score.total_samples
        ));

        if score.match_count < MIN_MATCHES_REQUIRED {
            continue;
        }
        let Some(min_distance) = score.min_distance else {
            continue;
        };
        let replaces = best
            .as_ref()
            .map_or(true, |current| score.match_count > current.match_count);
        if replaces {
            best = Some(MatchResult {
                identity: enrolled.identity.clone(),
                match_count: score.match_count,
                total_samples: score.total_samples,
                min_distance,
            });
        }
    }

    let decision = match best {
        Some(result) => {
            info!(
                identity = %result.identity,
                match_count = result.match_count,
                min_distance = result.min_distance,
                "identified face"
            );
            logs.push(format!(
                "Identified {} with {} match(es), minimum distance {:.4}",
                result.identity, result.match_count, result.min_distance
            ));
            IdentificationDecision::Identified(result)
        }
        None => {
            info!(identities = scanned, "no identity reached the match quorum");
            logs.push(format!(
                "No identity reached {MIN_MATCHES_REQUIRED} matching samples"
            ));
            IdentificationDecision::NoMatchFound
        }
    };

    Ok(FaceIdentificationOutcome {
        decision,
        faces_detected: faces.len(),
        identities_scanned: scanned,
        logs,
    })
}

#[derive(Debug, Clone)]
pub struct FaceDetectionConfig {
    pub image: ImageSource,
}

#[derive(Debug)]
pub struct FaceDetectionOutcome {
    pub face_count: usize,
    /// `None` when the image holds no face.
    pub largest: Option<Descriptor>,
    pub logs: Vec<String>,
}

/// Extracts faces from one image without touching any store.
pub fn run_face_detection_with<E>(
    config: &FaceDetectionConfig,
    extractor: &E,
) -> AppResult<FaceDetectionOutcome>
where
    E: FaceExtractor + ?Sized,
{
    let faces = extractor.detect_faces(&config.image)?;
    let largest = largest_face(&faces).cloned();

    let mut logs = Vec::new();
    match &largest {
        Some(face) => {
            let rect = face.rectangle();
            logs.push(format!(
                "Detected {} face(s) in {}; largest at ({}, {})-({}, {})",
                faces.len(),
                config.image.label(),
                rect.min.x,
                rect.min.y,
                rect.max.x,
                rect.max.y
            ));
        }
        None => logs.push(format!("No face detected in {}", config.image.label())),
    }

    Ok(FaceDetectionOutcome {
        face_count: faces.len(),
        largest,
        logs,
    })
}
