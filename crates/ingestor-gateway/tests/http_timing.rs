//! End-to-end behaviour of the router: content endpoints plus the request
//! timing histogram they feed.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body, Bytes},
    http::{header, Request, StatusCode},
    Router,
};
use http_body::Body as _;
use tower::ServiceExt;

use ingestor_core::error::{IngestError, Result};
use ingestor_gateway::app_state::AppState;
use ingestor_gateway::collab::{
    Analyzer, Classifier, ClassifierLoader, HeuristicClassifier, HeuristicLoader, LexiconAnalyzer,
    Prediction,
};
use ingestor_gateway::config::IngestorConfig;
use ingestor_gateway::obs::exporter::metrics_router;
use ingestor_gateway::obs::timing::{RequestSubject, REQUEST_DURATION_SECONDS};
use ingestor_gateway::router::build_router;

// ---------- helpers ----------

fn test_config() -> IngestorConfig {
    let mut cfg = IngestorConfig::default();
    cfg.metrics.process_metrics = false;
    cfg
}

fn app_with(cfg: IngestorConfig, loader: Arc<dyn ClassifierLoader>, analyzer: Arc<dyn Analyzer>) -> (AppState, Router) {
    let state = AppState::with_collaborators(cfg, loader, analyzer).unwrap();
    let router = build_router(state.clone());
    (state, router)
}

fn app() -> (AppState, Router) {
    let state = AppState::new(test_config()).unwrap();
    let router = build_router(state.clone());
    (state, router)
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, String) {
    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(bytes.to_vec()).unwrap())
}

fn post_json(uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_owned()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

const BOUNDARY: &str = "ingestor-test-boundary";

fn post_file(field: &str, filename: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/image-upload")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn png(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 90])
    });
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

fn count(state: &AppState, method: &str, route: &str, status: &str) -> u64 {
    state
        .registry()
        .snapshot()
        .series(REQUEST_DURATION_SECONDS)
        .unwrap()
        .cell(&[("method", method), ("route", route), ("status_code", status)])
        .map(|c| c.count)
        .unwrap_or(0)
}

fn total(state: &AppState) -> u64 {
    state
        .registry()
        .snapshot()
        .series(REQUEST_DURATION_SECONDS)
        .unwrap()
        .total_count()
}

fn has_route(state: &AppState, route: &str) -> bool {
    let snap = state.registry().snapshot();
    snap.series(REQUEST_DURATION_SECONDS)
        .unwrap()
        .cells
        .iter()
        .any(|c| c.label_values[1] == route)
}

// ---------- collaborator doubles ----------

struct FailingClassifier;

#[async_trait]
impl Classifier for FailingClassifier {
    fn name(&self) -> &'static str {
        "failing"
    }
    async fn classify(&self, _image: Bytes) -> Result<Vec<Prediction>> {
        Err(IngestError::Inference("model exploded".into()))
    }
}

struct SlowClassifier;

#[async_trait]
impl Classifier for SlowClassifier {
    fn name(&self) -> &'static str {
        "slow"
    }
    async fn classify(&self, _image: Bytes) -> Result<Vec<Prediction>> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok(Vec::new())
    }
}

struct FixedLoader(Arc<dyn Classifier>);

#[async_trait]
impl ClassifierLoader for FixedLoader {
    async fn load(&self) -> Result<Arc<dyn Classifier>> {
        Ok(Arc::clone(&self.0))
    }
}

#[derive(Default)]
struct CountingLoader {
    loads: AtomicUsize,
}

#[async_trait]
impl ClassifierLoader for CountingLoader {
    async fn load(&self) -> Result<Arc<dyn Classifier>> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(HeuristicClassifier::new()))
    }
}

struct PanickingAnalyzer;

#[async_trait]
impl Analyzer for PanickingAnalyzer {
    async fn score(&self, _text: &str) -> Result<f64> {
        panic!("lexicon corrupted");
    }
}

// ---------- text ----------

#[tokio::test]
async fn text_upload_scores_sentiment() {
    let (state, app) = app();
    let (status, body) = send(&app, post_json("/text-upload", r#"{"data":"I love this, it is great"}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        "Data processed successfully: I love this, it is great\nSentiment Score: 6"
    );
    assert_eq!(count(&state, "POST", "/text-upload", "200"), 1);
}

#[tokio::test]
async fn text_upload_without_data_is_400_and_observed_once() {
    let (state, app) = app();
    let (status, body) = send(&app, post_json("/text-upload", "{}")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "No data was uploaded.");
    assert_eq!(count(&state, "POST", "/text-upload", "400"), 1);
    assert_eq!(total(&state), 1);
}

#[tokio::test]
async fn text_upload_rejects_bad_payloads() {
    let (state, app) = app();

    let (status, _) = send(&app, post_json("/text-upload", r#"{"data":""}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(&app, post_json("/text-upload", r#"{"data":42}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("data"));

    let (status, body) = send(&app, post_json("/text-upload", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.starts_with("invalid JSON body"));

    assert_eq!(count(&state, "POST", "/text-upload", "400"), 3);
}

#[tokio::test]
async fn concurrent_text_uploads_each_observed_once() {
    let (state, app) = app();

    let mut handles = Vec::new();
    for i in 0..16 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            let body = if i % 2 == 0 {
                format!(r#"{{"data":"good day number {i}"}}"#)
            } else {
                "{}".to_string()
            };
            send(&app, post_json("/text-upload", &body)).await.0
        }));
    }
    for (i, h) in handles.into_iter().enumerate() {
        let status = h.await.unwrap();
        let expected = if i % 2 == 0 { StatusCode::OK } else { StatusCode::BAD_REQUEST };
        assert_eq!(status, expected);
    }

    assert_eq!(count(&state, "POST", "/text-upload", "200"), 8);
    assert_eq!(count(&state, "POST", "/text-upload", "400"), 8);
    assert_eq!(total(&state), 16);
}

#[tokio::test]
async fn handler_panic_becomes_500_and_is_observed() {
    let (state, app) = app_with(
        test_config(),
        Arc::new(HeuristicLoader),
        Arc::new(PanickingAnalyzer),
    );

    let (status, _) = send(&app, post_json("/text-upload", r#"{"data":"hello"}"#)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(count(&state, "POST", "/text-upload", "500"), 1);
    assert_eq!(total(&state), 1);
}

#[tokio::test]
async fn oversized_body_is_413_and_observed() {
    let mut cfg = test_config();
    cfg.api.body_limit_bytes = 64;
    let (state, app) = app_with(cfg, Arc::new(HeuristicLoader), Arc::new(LexiconAnalyzer::new()));

    let big = format!(r#"{{"data":"{}"}}"#, "a".repeat(1024));
    let (status, _) = send(&app, post_json("/text-upload", &big)).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(count(&state, "POST", "/text-upload", "413"), 1);
}

// ---------- csv ----------

#[tokio::test]
async fn csv_row_zero_celsius() {
    let (state, app) = app();
    let (status, body) = send(&app, post_json("/csv-row-process", r#"{"data":{"AvgTemperature":0}}"#)).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Fahrenheit: 32"), "{body}");
    assert!(body.contains("Celsius: 0"), "{body}");
    assert!(body.contains(r#"{"AvgTemperature":0}"#), "{body}");
    assert_eq!(count(&state, "POST", "/csv-row-process", "200"), 1);
}

#[tokio::test]
async fn csv_row_boiling_point() {
    let (_, app) = app();
    let (status, body) = send(&app, post_json("/csv-row-process", r#"{"data":{"AvgTemperature":100}}"#)).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Fahrenheit: 212"), "{body}");
}

#[tokio::test]
async fn csv_row_accepts_numeric_strings_and_keeps_other_fields() {
    let (_, app) = app();
    let (status, body) = send(
        &app,
        post_json("/csv-row-process", r#"{"data":{"AvgTemperature":"100","City":"Oslo"}}"#),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("Fahrenheit: 212"), "{body}");
    assert!(body.contains("\"City\":\"Oslo\""), "{body}");
}

#[tokio::test]
async fn csv_row_validation_errors() {
    let (state, app) = app();

    let (status, body) = send(&app, post_json("/csv-row-process", "{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "No data was uploaded.");

    let (status, body) = send(&app, post_json("/csv-row-process", r#"{"data":{"City":"Oslo"}}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("AvgTemperature"), "{body}");

    let (status, _) = send(&app, post_json("/csv-row-process", r#"{"data":{"AvgTemperature":"warm"}}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, post_json("/csv-row-process", r#"{"data":{"AvgTemperature":true}}"#)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(count(&state, "POST", "/csv-row-process", "400"), 4);
}

// ---------- image ----------

#[tokio::test]
async fn image_upload_classifies_and_is_observed_once() {
    let (state, app) = app();
    let (status, body) = send(&app, post_file("file", "pic.png", &png(100, 100))).await;

    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("File processed successfully: pic.png\nPredictions:\n"), "{body}");
    let first = body.lines().nth(2).unwrap();
    assert!(first.starts_with("png square: "), "{body}");
    assert!(first.ends_with('%'));
    assert_eq!(body.lines().count(), 2 + 3); // default top_k
    assert_eq!(count(&state, "POST", "/image-upload", "200"), 1);
    assert_eq!(total(&state), 1);
}

#[tokio::test]
async fn image_upload_without_file_is_400() {
    let (state, app) = app();

    let (status, body) = send(&app, post_file("other", "pic.png", &png(10, 10))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, "Please upload a valid image");

    let (status, _) = send(&app, post_file("file", "empty.png", &[])).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, post_json("/image-upload", "{}")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert_eq!(count(&state, "POST", "/image-upload", "400"), 3);
}

#[tokio::test]
async fn undecodable_image_is_500() {
    let (state, app) = app();
    let (status, body) = send(&app, post_file("file", "notes.txt", b"definitely not an image")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("decode failed"), "{body}");
    assert_eq!(count(&state, "POST", "/image-upload", "500"), 1);
}

#[tokio::test]
async fn corrupt_image_behind_valid_header_is_500() {
    let (state, app) = app();

    // signature + IHDR of a real PNG, then no image data
    let mut broken = png(640, 480)[..33].to_vec();
    broken.extend_from_slice(b"this is not image data at all");
    let (status, body) = send(&app, post_file("file", "broken.png", &broken)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body.starts_with("decode failed"), "{body}");

    let whole = png(64, 64);
    let (status, _) = send(&app, post_file("file", "cut.png", &whole[..whole.len() / 2])).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

    assert_eq!(count(&state, "POST", "/image-upload", "500"), 2);
    assert_eq!(count(&state, "POST", "/image-upload", "200"), 0);
}

#[tokio::test]
async fn inference_failure_is_502_and_still_observed() {
    let (state, app) = app_with(
        test_config(),
        Arc::new(FixedLoader(Arc::new(FailingClassifier))),
        Arc::new(LexiconAnalyzer::new()),
    );

    let (status, body) = send(&app, post_file("file", "pic.png", &png(10, 10))).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert!(body.contains("model exploded"));
    assert_eq!(count(&state, "POST", "/image-upload", "502"), 1);
    assert_eq!(total(&state), 1);
}

#[tokio::test]
async fn slow_classifier_times_out_with_504() {
    let mut cfg = test_config();
    cfg.classifier.classify_timeout_ms = 20;
    let (state, app) = app_with(
        cfg,
        Arc::new(FixedLoader(Arc::new(SlowClassifier))),
        Arc::new(LexiconAnalyzer::new()),
    );

    let (status, _) = send(&app, post_file("file", "pic.png", &png(10, 10))).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert_eq!(count(&state, "POST", "/image-upload", "504"), 1);
}

#[tokio::test]
async fn classifier_model_is_loaded_once() {
    let loader = Arc::new(CountingLoader::default());
    let (state, app) = app_with(test_config(), loader.clone(), Arc::new(LexiconAnalyzer::new()));
    assert!(!state.classifier().is_loaded());

    for _ in 0..3 {
        let (status, _) = send(&app, post_file("file", "pic.png", &png(40, 20))).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert_eq!(loader.loads.load(Ordering::SeqCst), 1);
    assert!(state.classifier().is_loaded());
}

// ---------- completion ----------

#[tokio::test]
async fn observation_waits_for_the_body() {
    let (state, app) = app();
    let resp = app
        .clone()
        .oneshot(post_json("/text-upload", r#"{"data":"good"}"#))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(total(&state), 0);

    to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(count(&state, "POST", "/text-upload", "200"), 1);
    assert_eq!(total(&state), 1);
}

#[tokio::test]
async fn dropped_body_is_observed_exactly_once() {
    let (state, app) = app();
    let resp = app
        .clone()
        .oneshot(post_json("/csv-row-process", r#"{"data":{"AvgTemperature":10}}"#))
        .await
        .unwrap();
    assert_eq!(total(&state), 0);

    drop(resp);
    assert_eq!(count(&state, "POST", "/csv-row-process", "200"), 1);
    assert_eq!(total(&state), 1);
}

#[tokio::test]
async fn timed_response_keeps_exact_length() {
    let (_, app) = app();
    let resp = app
        .clone()
        .oneshot(post_json("/text-upload", r#"{"data":"nice"}"#))
        .await
        .unwrap();

    let hint = resp.body().size_hint().exact();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(hint, Some(bytes.len() as u64));
}

#[tokio::test]
async fn responses_carry_request_subject() {
    let (_, app) = app();

    let resp = app.clone().oneshot(post_file("file", "cat.png", &png(20, 20))).await.unwrap();
    assert_eq!(
        resp.extensions().get::<RequestSubject>(),
        Some(&RequestSubject::Filename("cat.png".into()))
    );

    let resp = app.clone().oneshot(post_file("file", "bad.png", b"junk")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        resp.extensions().get::<RequestSubject>(),
        Some(&RequestSubject::Filename("bad.png".into()))
    );

    let resp = app
        .clone()
        .oneshot(post_json("/text-upload", r#"{"data":"hello"}"#))
        .await
        .unwrap();
    assert_eq!(
        resp.extensions().get::<RequestSubject>(),
        Some(&RequestSubject::Data("\"hello\"".into()))
    );

    let resp = app.clone().oneshot(post_json("/text-upload", "{}")).await.unwrap();
    assert_eq!(resp.extensions().get::<RequestSubject>(), None);
}

#[test]
fn logged_data_is_truncated() {
    let long = serde_json::Value::String("x".repeat(1000));
    let RequestSubject::Data(d) = RequestSubject::data(&long) else {
        panic!("expected data");
    };
    assert_eq!(d.chars().count(), 256 + 3);
    assert!(d.ends_with("..."));
}

// ---------- metrics ----------

#[tokio::test]
async fn scraping_metrics_never_observes_itself() {
    let (state, app) = app();

    for _ in 0..3 {
        let (status, _) = send(&app, get("/metrics")).await;
        assert_eq!(status, StatusCode::OK);
    }
    assert!(!has_route(&state, "/metrics"));
    assert_eq!(total(&state), 0);
}

#[tokio::test]
async fn metrics_endpoint_renders_histogram() {
    let (_, app) = app();
    send(&app, post_json("/text-upload", r#"{"data":"fine"}"#)).await;

    let resp = app.clone().oneshot(get("/metrics")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/plain; version=0.0.4; charset=utf-8"
    );
    let body = String::from_utf8(to_bytes(resp.into_body(), usize::MAX).await.unwrap().to_vec()).unwrap();

    assert!(body.contains("# HELP http_request_duration_seconds Duration of HTTP requests in seconds.\n"));
    assert!(body.contains("# TYPE http_request_duration_seconds histogram\n"));
    assert!(body.contains(
        "http_request_duration_seconds_bucket{method=\"POST\",route=\"/text-upload\",status_code=\"200\",le=\"+Inf\"} 1\n"
    ));
    assert!(body.contains(
        "http_request_duration_seconds_count{method=\"POST\",route=\"/text-upload\",status_code=\"200\"} 1\n"
    ));
    assert!(!body.contains("route=\"/metrics\""));
}

#[tokio::test]
async fn repeated_scrapes_are_identical() {
    let (_, app) = app();
    send(&app, post_json("/csv-row-process", r#"{"data":{"AvgTemperature":3}}"#)).await;

    let (_, first) = send(&app, get("/metrics")).await;
    let (_, second) = send(&app, get("/metrics")).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn process_metrics_are_appended_when_enabled() {
    let mut cfg = test_config();
    cfg.metrics.process_metrics = true;
    let (_, app) = app_with(cfg, Arc::new(HeuristicLoader), Arc::new(LexiconAnalyzer::new()));

    let (_, body) = send(&app, get("/metrics")).await;
    assert!(body.contains("# TYPE process_start_time_seconds gauge\n"));
    assert!(body.contains("# TYPE process_uptime_seconds gauge\n"));
}

#[tokio::test]
async fn unmatched_route_is_404_and_not_observed() {
    let (state, app) = app();
    let (status, _) = send(&app, post_json("/image-upload/123", "{}")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, get("/does-not-exist")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(total(&state), 0);
}

#[tokio::test]
async fn dedicated_metrics_router_serves_without_api_route() {
    let mut cfg = test_config();
    cfg.metrics.expose_on_api = false;
    let (state, app) = app_with(cfg, Arc::new(HeuristicLoader), Arc::new(LexiconAnalyzer::new()));

    let (status, _) = send(&app, get("/metrics")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, post_json("/text-upload", r#"{"data":"ok"}"#)).await;

    let scrape = metrics_router(state.clone());
    let (status, body) = send(&scrape, get("/metrics")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("route=\"/text-upload\""));
    assert_eq!(total(&state), 1);
}
