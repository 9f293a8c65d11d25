use crate::config::GatewayConfig;
use crate::metrics::PredictMetrics;
use classifier::ClassifierHandle;
use records::ClassificationStore;
use std::sync::Arc;

pub struct AppState<B> {
    pub classifier: ClassifierHandle<B>,
    pub store: Arc<dyn ClassificationStore>,
    pub config: Arc<GatewayConfig>,
    pub metrics: PredictMetrics,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            classifier: self.classifier.clone(),
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
            metrics: self.metrics.clone(),
        }
    }
}

impl<B> AppState<B> {
    pub fn new(
        classifier: ClassifierHandle<B>,
        store: Arc<dyn ClassificationStore>,
        config: GatewayConfig,
    ) -> Self {
        Self {
            classifier,
            store,
            config: Arc::new(config),
            metrics: PredictMetrics::new("gateway"),
        }
    }
}
