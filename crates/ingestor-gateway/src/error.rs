//! HTTP mapping of `IngestError`.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use thiserror::Error;

use ingestor_core::error::{ClientCode, IngestError};

/// Handler-boundary error: every variant becomes a complete text/plain response.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub IngestError);

pub fn status_for(code: ClientCode) -> StatusCode {
    match code {
        ClientCode::BadRequest => StatusCode::BAD_REQUEST,
        ClientCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        ClientCode::DecodeFailed => StatusCode::INTERNAL_SERVER_ERROR,
        ClientCode::UpstreamFailed => StatusCode::BAD_GATEWAY,
        ClientCode::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
        ClientCode::AnalysisFailed => StatusCode::INTERNAL_SERVER_ERROR,
        ClientCode::Config | ClientCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.0.client_code();
        let status = status_for(code);

        if self.0.is_programmer_error() {
            tracing::error!(code = code.as_str(), error = %self.0, "metrics registry misuse");
        } else if status.is_server_error() {
            tracing::warn!(code = code.as_str(), error = %self.0, "request failed");
        } else {
            tracing::debug!(code = code.as_str(), error = %self.0, "request rejected");
        }

        (
            status,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            self.0.to_string(),
        )
            .into_response()
    }
}
