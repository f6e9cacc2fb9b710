//! Built-in stand-in model: classifies images by aspect ratio.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use ingestor_core::error::{IngestError, Result};

use super::image::decode_image;
use super::{Classifier, ClassifierLoader, Prediction};

/// (label, aspect ratio the label is centred on)
const ASPECT_CLASSES: [(&str, f64); 5] = [
    ("square", 1.0),
    ("landscape", 1.5),
    ("portrait", 2.0 / 3.0),
    ("panorama", 3.0),
    ("banner", 1.0 / 3.0),
];

/// Sharpness of the distance weighting in log-aspect space.
const SHARPNESS: f64 = 4.0;

#[derive(Debug, Default)]
pub struct HeuristicClassifier;

impl HeuristicClassifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Classifier for HeuristicClassifier {
    fn name(&self) -> &'static str {
        "heuristic-aspect"
    }

    async fn classify(&self, image: Bytes) -> Result<Vec<Prediction>> {
        // full pixel decode is CPU bound
        let decoded = tokio::task::spawn_blocking(move || decode_image(&image))
            .await
            .map_err(|e| IngestError::Internal(format!("image decode task failed: {e}")))??;
        let aspect = (f64::from(decoded.width) / f64::from(decoded.height)).ln();

        let weights: Vec<f64> = ASPECT_CLASSES
            .iter()
            .map(|(_, centre)| (-(aspect - centre.ln()).abs() * SHARPNESS).exp())
            .collect();
        let total: f64 = weights.iter().sum();

        Ok(ASPECT_CLASSES
            .iter()
            .zip(weights)
            .map(|((label, _), w)| Prediction {
                label: format!("{} {}", decoded.format.as_str(), label),
                probability: w / total,
            })
            .collect())
    }
}

#[derive(Debug, Default)]
pub struct HeuristicLoader;

#[async_trait]
impl ClassifierLoader for HeuristicLoader {
    async fn load(&self) -> Result<Arc<dyn Classifier>> {
        Ok(Arc::new(HeuristicClassifier::new()))
    }
}
