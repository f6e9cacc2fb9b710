//! `POST /text-upload`: sentiment score for `{ "data": string }`.

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use serde_json::Value;

use ingestor_core::error::IngestError;

use super::{parse_json, with_subject, NO_DATA};
use crate::app_state::AppState;
use crate::error::ApiError;
use crate::obs::timing::RequestSubject;

#[derive(Debug, Deserialize)]
struct TextUpload {
    #[serde(default)]
    data: Option<Value>,
}

pub async fn text_upload(State(state): State<AppState>, body: Bytes) -> Response {
    let req: TextUpload = match parse_json(&body) {
        Ok(req) => req,
        Err(e) => return ApiError::from(e).into_response(),
    };
    let subject = req.data.as_ref().map(RequestSubject::data);
    with_subject(score(&state, req.data).await, subject)
}

async fn score(state: &AppState, data: Option<Value>) -> Result<String, ApiError> {
    let text = match data {
        Some(Value::String(s)) if !s.is_empty() => s,
        None | Some(Value::Null) | Some(Value::String(_)) => {
            return Err(IngestError::Validation(NO_DATA.into()).into())
        }
        Some(_) => return Err(IngestError::Validation("data must be a string".into()).into()),
    };

    let score = state.analyzer().score(&text).await?;
    Ok(format!(
        "Data processed successfully: {text}\nSentiment Score: {score}"
    ))
}
