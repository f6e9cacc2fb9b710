//! Axum router wiring.
//!
//! Layer order, outermost first: trace, CORS, body limit, then (matched
//! routes only) request timing and panic-to-500 conversion.

use axum::{
    extract::DefaultBodyLimit,
    http::{header, Method},
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{
    catch_panic::CatchPanicLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{app_state::AppState, obs, ops, services};

pub const IMAGE_UPLOAD: &str = "/image-upload";
pub const TEXT_UPLOAD: &str = "/text-upload";
pub const CSV_ROW_PROCESS: &str = "/csv-row-process";
pub const HEALTHZ: &str = "/healthz";

/// Fixed API routes; the metrics path may not shadow any of them.
pub const API_ROUTES: [&str; 4] = [IMAGE_UPLOAD, TEXT_UPLOAD, CSV_ROW_PROCESS, HEALTHZ];

pub fn build_router(state: AppState) -> Router {
    let cfg = state.cfg();

    let mut router = Router::new()
        .route(IMAGE_UPLOAD, post(services::image::image_upload))
        .route(TEXT_UPLOAD, post(services::text::text_upload))
        .route(CSV_ROW_PROCESS, post(services::csv_row::csv_row_process))
        .route(HEALTHZ, get(ops::healthz));

    if cfg.metrics.expose_on_api {
        router = router.route(&cfg.metrics.path, get(ops::metrics));
    }

    // route_layer: unmatched paths fall through to the 404 fallback untimed.
    router = router
        .route_layer(CatchPanicLayer::new())
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            obs::timing::track_request_timing,
        ))
        .layer(DefaultBodyLimit::max(cfg.api.body_limit_bytes));

    if cfg.api.cors_allow_all {
        router = router.layer(cors_layer());
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::ORIGIN,
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-requested-with"),
        ])
}
