//! `POST /image-upload`: classify the multipart `file` field.

use std::fmt::Write;

use axum::{
    body::Bytes,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};

use ingestor_core::error::{IngestError, Result};

use crate::app_state::AppState;
use crate::collab::Prediction;
use crate::error::ApiError;
use crate::obs::timing::RequestSubject;

use super::with_subject;

pub const FILE_FIELD: &str = "file";
const INVALID_IMAGE: &str = "Please upload a valid image";

struct Upload {
    filename: String,
    bytes: Bytes,
}

pub async fn image_upload(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let upload = match receive(multipart).await {
        Ok(upload) => upload,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let subject = RequestSubject::Filename(upload.filename.clone());
    let result = state
        .classifier()
        .classify(upload.bytes)
        .await
        .map(|predictions| report(&upload.filename, &predictions))
        .map_err(ApiError::from);
    with_subject(result, Some(subject))
}

async fn receive(multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<Upload> {
    let mut multipart =
        multipart.map_err(|_| IngestError::Validation(INVALID_IMAGE.into()))?;

    read_file_field(&mut multipart)
        .await?
        .filter(|u| !u.bytes.is_empty())
        .ok_or_else(|| IngestError::Validation(INVALID_IMAGE.into()))
}

async fn read_file_field(multipart: &mut Multipart) -> Result<Option<Upload>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_owned();
        let bytes = field.bytes().await.map_err(multipart_error)?;
        return Ok(Some(Upload { filename, bytes }));
    }
    Ok(None)
}

fn multipart_error(e: MultipartError) -> IngestError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        IngestError::PayloadTooLarge
    } else {
        IngestError::Validation(format!("{INVALID_IMAGE}: {}", e.body_text()))
    }
}

fn report(filename: &str, predictions: &[Prediction]) -> String {
    let mut out = format!("File processed successfully: {filename}\nPredictions:\n");
    for p in predictions {
        let _ = writeln!(out, "{}: {:.2}%", p.label, p.probability * 100.0);
    }
    out
}
