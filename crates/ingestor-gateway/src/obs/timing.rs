//! Request timing middleware.
//!
//! Installed with `Router::route_layer`, so it only sees requests that matched
//! a route; 404s never reach it. For each request it records one observation
//! into `http_request_duration_seconds{method, route, status_code}`, where
//! `route` is the matched template and the value is wall-clock seconds from
//! entry until the response body has been fully sent (or dropped).
//!
//! The metrics route itself is never recorded.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::{
    body::{Body, Bytes},
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use http_body::{Body as HttpBody, Frame, SizeHint};

use ingestor_core::metrics::MetricsRegistry;

use crate::app_state::AppState;

pub const REQUEST_DURATION_SECONDS: &str = "http_request_duration_seconds";
pub const REQUEST_DURATION_HELP: &str = "Duration of HTTP requests in seconds.";
pub const REQUEST_LABELS: [&str; 3] = ["method", "route", "status_code"];

/// Longest `req_data` value written to the request log.
const MAX_LOGGED_DATA: usize = 256;

/// What a handler worked on. Handlers attach it to their response extensions
/// and it is added to the request log line.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestSubject {
    Filename(String),
    Data(String),
}

impl RequestSubject {
    pub fn data(value: &serde_json::Value) -> Self {
        let mut text = value.to_string();
        if let Some((cut, _)) = text.char_indices().nth(MAX_LOGGED_DATA) {
            text.truncate(cut);
            text.push_str("...");
        }
        RequestSubject::Data(text)
    }
}

pub async fn track_request_timing(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();

    let route = match request.extensions().get::<MatchedPath>() {
        Some(mp) if mp.as_str() != state.cfg().metrics.path => mp.as_str().to_owned(),
        _ => return next.run(request).await,
    };
    let method = request.method().as_str().to_owned();

    let response = next.run(request).await;

    // Status is final here: handler errors and rejections are already responses.
    let guard = ObservationGuard {
        registry: Arc::clone(state.registry()),
        method,
        route,
        status: response.status().as_u16(),
        subject: response.extensions().get::<RequestSubject>().cloned(),
        start,
    };

    let (parts, body) = response.into_parts();
    let body = TimedBody {
        inner: body,
        _guard: guard,
    };
    Response::from_parts(parts, Body::new(body))
}

/// Records the observation when dropped. Dropping happens exactly once: after
/// the server finished writing the body, or when the connection went away.
struct ObservationGuard {
    registry: Arc<MetricsRegistry>,
    method: String,
    route: String,
    status: u16,
    subject: Option<RequestSubject>,
    start: Instant,
}

impl Drop for ObservationGuard {
    fn drop(&mut self) {
        let elapsed = self.start.elapsed();
        let status = self.status.to_string();
        let labels = [
            ("method", self.method.as_str()),
            ("route", self.route.as_str()),
            ("status_code", status.as_str()),
        ];

        if let Err(e) = self
            .registry
            .observe_duration(REQUEST_DURATION_SECONDS, &labels, elapsed)
        {
            tracing::error!(error = %e, route = %self.route, "request timing not recorded");
            return;
        }

        let (req_filename, req_data) = match &self.subject {
            Some(RequestSubject::Filename(f)) => (Some(f.as_str()), None),
            Some(RequestSubject::Data(d)) => (None, Some(d.as_str())),
            None => (None, None),
        };
        tracing::info!(
            response_time = elapsed.as_secs_f64(),
            method = %self.method,
            route = %self.route,
            status_code = self.status,
            req_filename,
            req_data,
            "request completed"
        );
    }
}

/// Response body carrying the observation guard. Frames, end-of-stream and
/// the size hint all come from the wrapped body, so `Content-Length` survives.
struct TimedBody {
    inner: Body,
    _guard: ObservationGuard,
}

impl HttpBody for TimedBody {
    type Data = Bytes;
    type Error = axum::Error;

    fn poll_frame(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Pin::new(&mut self.inner).poll_frame(cx)
    }

    fn is_end_stream(&self) -> bool {
        self.inner.is_end_stream()
    }

    fn size_hint(&self) -> SizeHint {
        self.inner.size_hint()
    }
}
