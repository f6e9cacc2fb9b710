//! Shared application state for the ingestor gateway.
//!
//! Built once at startup: the metrics registry, the load-once classifier
//! handle and the analyzer are owned here and handed to the router, the
//! timing middleware and the exporter. Startup errors are returned, not
//! panicked.

use std::sync::Arc;

use ingestor_core::error::Result;
use ingestor_core::metrics::MetricsRegistry;

use crate::collab::{Analyzer, ClassifierHandle, ClassifierLoader, HeuristicLoader, LexiconAnalyzer};
use crate::config::IngestorConfig;
use crate::obs::process::ProcessCollector;
use crate::obs::timing::{REQUEST_DURATION_HELP, REQUEST_DURATION_SECONDS, REQUEST_LABELS};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: IngestorConfig,
    registry: Arc<MetricsRegistry>,
    classifier: ClassifierHandle,
    analyzer: Arc<dyn Analyzer>,
    process: ProcessCollector,
}

impl AppState {
    /// Build state with the built-in collaborators.
    pub fn new(cfg: IngestorConfig) -> Result<Self> {
        let analyzer = Arc::new(LexiconAnalyzer::with_extra(&cfg.analyzer.extra_words));
        Self::with_collaborators(cfg, Arc::new(HeuristicLoader), analyzer)
    }

    pub fn with_collaborators(
        cfg: IngestorConfig,
        loader: Arc<dyn ClassifierLoader>,
        analyzer: Arc<dyn Analyzer>,
    ) -> Result<Self> {
        let registry = Arc::new(MetricsRegistry::new());
        registry.register(
            REQUEST_DURATION_SECONDS,
            REQUEST_DURATION_HELP,
            &REQUEST_LABELS,
            &cfg.metrics.buckets,
        )?;

        let classifier = ClassifierHandle::new(loader, &cfg.classifier);

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                registry,
                classifier,
                analyzer,
                process: ProcessCollector::new(),
            }),
        })
    }

    pub fn cfg(&self) -> &IngestorConfig {
        &self.inner.cfg
    }

    pub fn registry(&self) -> &Arc<MetricsRegistry> {
        &self.inner.registry
    }

    pub fn classifier(&self) -> &ClassifierHandle {
        &self.inner.classifier
    }

    pub fn analyzer(&self) -> Arc<dyn Analyzer> {
        Arc::clone(&self.inner.analyzer)
    }

    pub fn process(&self) -> &ProcessCollector {
        &self.inner.process
    }
}
