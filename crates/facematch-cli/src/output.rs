use std::error::Error;
use std::io::{self, Write};

use serde_json::{json, Value};

use crate::cli::OutputMode;
use crate::errors::{AppError, AppResult};
use crate::faces::{
    FaceDetectionOutcome, FaceEnrollmentOutcome, FaceIdentificationOutcome,
    IdentificationDecision, SampleClearOutcome, SampleListingOutcome, SampleRemovalOutcome,
};
use crate::keygen::KeygenSummary;

fn write_json_line(payload: &Value) -> AppResult<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let payload = serde_json::to_string(payload)?;
    handle.write_all(payload.as_bytes())?;
    handle.write_all(b"\n")?;
    Ok(())
}

fn print_logs(logs: &[String]) {
    for line in logs {
        println!("{line}");
    }
}

pub fn render_enroll(outcome: &FaceEnrollmentOutcome, mode: OutputMode) -> AppResult<()> {
    match mode {
        OutputMode::Human => {
            print_logs(&outcome.logs);
            println!(
                "Enrollment successful: {} of {} image(s) stored for identity {}",
                outcome.samples_accepted, outcome.images_provided, outcome.identity
            );
        }
        OutputMode::Json => write_json_line(&enroll_json_payload(outcome))?,
    }
    Ok(())
}

fn enroll_json_payload(outcome: &FaceEnrollmentOutcome) -> Value {
    json!({
        "success": true,
        "identity": outcome.identity,
        "samples_accepted": outcome.samples_accepted,
        "images_provided": outcome.images_provided,
        "skipped": outcome.skipped,
    })
}

pub fn render_identify(outcome: &FaceIdentificationOutcome, mode: OutputMode) -> AppResult<()> {
    match mode {
        OutputMode::Human => {
            print_logs(&outcome.logs);
            match &outcome.decision {
                IdentificationDecision::Identified(result) => println!(
                    "Identified {} ({} of {} sample(s) matched, distance {:.4})",
                    result.identity, result.match_count, result.total_samples, result.min_distance
                ),
                IdentificationDecision::NoFaceDetected => println!("No face detected"),
                IdentificationDecision::NoMatchFound => println!("No match found"),
            }
        }
        OutputMode::Json => write_json_line(&identify_json_payload(outcome))?,
    }
    Ok(())
}

fn identify_json_payload(outcome: &FaceIdentificationOutcome) -> Value {
    let mut payload = json!({
        "success": true,
        "decision": outcome.decision.as_str(),
        "faces_detected": outcome.faces_detected,
        "identities_scanned": outcome.identities_scanned,
    });
    if let IdentificationDecision::Identified(result) = &outcome.decision {
        payload["match"] = json!(result);
    }
    payload
}

pub fn render_detect(outcome: &FaceDetectionOutcome, mode: OutputMode) -> AppResult<()> {
    match mode {
        OutputMode::Human => {
            print_logs(&outcome.logs);
            println!("Faces detected: {}", outcome.face_count);
        }
        OutputMode::Json => write_json_line(&detect_json_payload(outcome))?,
    }
    Ok(())
}

fn detect_json_payload(outcome: &FaceDetectionOutcome) -> Value {
    json!({
        "success": true,
        "face_count": outcome.face_count,
        "descriptor": outcome.largest,
    })
}

pub fn render_sample_list(outcome: &SampleListingOutcome, mode: OutputMode) -> AppResult<()> {
    match mode {
        OutputMode::Human => {
            print_logs(&outcome.logs);
            for (index, sample) in outcome.samples.iter().enumerate() {
                let rect = sample.rectangle();
                println!(
                    "#{index}: face at ({}, {})-({}, {})",
                    rect.min.x, rect.min.y, rect.max.x, rect.max.y
                );
            }
            println!(
                "Identity {} has {} descriptor(s)",
                outcome.identity,
                outcome.count()
            );
        }
        OutputMode::Json => write_json_line(&sample_list_json_payload(outcome))?,
    }
    Ok(())
}

fn sample_list_json_payload(outcome: &SampleListingOutcome) -> Value {
    json!({
        "success": true,
        "identity": outcome.identity,
        "count": outcome.count(),
        "descriptors": outcome.samples,
    })
}

pub fn render_sample_remove(outcome: &SampleRemovalOutcome, mode: OutputMode) -> AppResult<()> {
    match mode {
        OutputMode::Human => {
            print_logs(&outcome.logs);
            println!(
                "Removal successful: descriptor #{} removed; remaining {}",
                outcome.removed_index, outcome.remaining
            );
        }
        OutputMode::Json => write_json_line(&json!({
            "success": true,
            "identity": outcome.identity,
            "removed_index": outcome.removed_index,
            "remaining": outcome.remaining,
        }))?,
    }
    Ok(())
}

pub fn render_sample_clear(outcome: &SampleClearOutcome, mode: OutputMode) -> AppResult<()> {
    match mode {
        OutputMode::Human => print_logs(&outcome.logs),
        OutputMode::Json => write_json_line(&json!({
            "success": true,
            "identity": outcome.identity,
            "cleared": true,
        }))?,
    }
    Ok(())
}

pub fn render_keygen(summary: &KeygenSummary, mode: OutputMode) -> AppResult<()> {
    match mode {
        OutputMode::Human => print_logs(&summary.logs),
        OutputMode::Json => write_json_line(&json!({
            "success": true,
            "key_file": summary.path.display().to_string(),
        }))?,
    }
    Ok(())
}

pub fn render_error(err: &AppError, mode: OutputMode) {
    match mode {
        OutputMode::Human => {
            eprintln!("error: {}", err.human_message());
            if let Some(source) = err.source() {
                eprintln!("cause: {source}");
            }
        }
        OutputMode::Json => {
            if let Ok(json) = serde_json::to_string(&error_json_payload(err)) {
                println!("{json}");
            }
            if let Some(source) = err.source() {
                eprintln!("cause: {source}");
            }
        }
    }
}

fn error_json_payload(err: &AppError) -> Value {
    let mut payload = json!({
        "success": false,
        "error": err.human_message(),
    });
    match err {
        AppError::InsufficientSamples {
            identity,
            accepted,
            provided,
            required,
        } => {
            payload["identity"] = json!(identity);
            payload["samples_accepted"] = json!(accepted);
            payload["images_provided"] = json!(provided);
            payload["samples_required"] = json!(required);
        }
        AppError::NoFacesDetected { identity, provided } => {
            payload["identity"] = json!(identity);
            payload["samples_accepted"] = json!(0);
            payload["images_provided"] = json!(provided);
        }
        AppError::SampleIndexOutOfRange {
            identity,
            index,
            len,
        } => {
            payload["identity"] = json!(identity);
            payload["index"] = json!(index);
            payload["count"] = json!(len);
        }
        _ => {}
    }
    payload
}
