//! Load-once classifier handle with bounded load and inference time.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::sync::OnceCell;

use ingestor_core::error::{IngestError, Result};

use super::{Classifier, ClassifierLoader, Prediction};
use crate::config::ClassifierSection;

/// Shared across requests. The model is loaded on first use (or at warmup)
/// and cached; a failed or timed-out load is retried by the next caller.
pub struct ClassifierHandle {
    loader: Arc<dyn ClassifierLoader>,
    model: OnceCell<Arc<dyn Classifier>>,
    load_timeout: Duration,
    classify_timeout: Duration,
    top_k: usize,
}

impl ClassifierHandle {
    pub fn new(loader: Arc<dyn ClassifierLoader>, cfg: &ClassifierSection) -> Self {
        Self {
            loader,
            model: OnceCell::new(),
            load_timeout: Duration::from_millis(cfg.load_timeout_ms),
            classify_timeout: Duration::from_millis(cfg.classify_timeout_ms),
            top_k: cfg.top_k,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    pub async fn model(&self) -> Result<Arc<dyn Classifier>> {
        let model = self
            .model
            .get_or_try_init(|| async {
                let started = Instant::now();
                let model = tokio::time::timeout(self.load_timeout, self.loader.load())
                    .await
                    .map_err(|_| {
                        IngestError::UpstreamTimeout(format!(
                            "classifier load exceeded {}ms",
                            self.load_timeout.as_millis()
                        ))
                    })??;
                tracing::info!(
                    model = model.name(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "classifier model loaded"
                );
                Ok::<_, IngestError>(model)
            })
            .await?;
        Ok(Arc::clone(model))
    }

    /// Classify an image; predictions come back sorted by probability and
    /// truncated to `top_k`.
    pub async fn classify(&self, image: Bytes) -> Result<Vec<Prediction>> {
        let model = self.model().await?;
        let mut preds = tokio::time::timeout(self.classify_timeout, model.classify(image))
            .await
            .map_err(|_| {
                IngestError::UpstreamTimeout(format!(
                    "classification exceeded {}ms",
                    self.classify_timeout.as_millis()
                ))
            })??;

        preds.sort_by(|a, b| b.probability.total_cmp(&a.probability));
        preds.truncate(self.top_k);
        Ok(preds)
    }
}
