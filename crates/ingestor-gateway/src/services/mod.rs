//! Content endpoints. Each validates its input, calls its collaborator and
//! formats a text/plain report.

pub mod csv_row;
pub mod image;
pub mod text;

use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;

use ingestor_core::error::{IngestError, Result};

use crate::obs::timing::RequestSubject;

/// Message used by the JSON endpoints when `data` is absent or empty.
pub(crate) const NO_DATA: &str = "No data was uploaded.";

pub(crate) fn parse_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    if body.is_empty() {
        return Err(IngestError::Validation(NO_DATA.into()));
    }
    serde_json::from_slice(body)
        .map_err(|e| IngestError::Validation(format!("invalid JSON body: {e}")))
}

/// Attach what the request worked on, for the request log.
pub(crate) fn with_subject(resp: impl IntoResponse, subject: Option<RequestSubject>) -> Response {
    let mut resp = resp.into_response();
    if let Some(subject) = subject {
        resp.extensions_mut().insert(subject);
    }
    resp
}
