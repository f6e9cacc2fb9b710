//! External collaborators: image classification and sentiment scoring.
//!
//! Handlers only see the traits below. The built-in implementations
//! (`HeuristicClassifier`, `LexiconAnalyzer`) keep the service runnable on its
//! own; a real model is plugged in through `ClassifierLoader`.

pub mod heuristic;
pub mod image;
pub mod lexicon;
pub mod model;

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use ingestor_core::error::Result;

pub use heuristic::{HeuristicClassifier, HeuristicLoader};
pub use image::{decode_image, DecodedImage, ImageFormat};
pub use lexicon::LexiconAnalyzer;
pub use model::ClassifierHandle;

/// One classification label with its probability in `0..=1`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub probability: f64,
}

/// Image classifier. Fails with `Decode` for unreadable bytes and
/// `Inference` when the model itself fails.
#[async_trait]
pub trait Classifier: Send + Sync {
    fn name(&self) -> &'static str;
    async fn classify(&self, image: Bytes) -> Result<Vec<Prediction>>;
}

/// Loads a classifier model. Called at most once per successful load.
#[async_trait]
pub trait ClassifierLoader: Send + Sync {
    async fn load(&self) -> Result<Arc<dyn Classifier>>;
}

/// Sentiment scorer: signed, more positive means more positive sentiment.
#[async_trait]
pub trait Analyzer: Send + Sync {
    async fn score(&self, text: &str) -> Result<f64>;
}
