use crate::backend::InferenceBackend;
use crate::config::ClassifierConfig;
use crate::engine::InferenceEngine;
use crate::error::{ClassifierError, Result};
use crate::labels::LabelSet;
use crate::service::Classifier;

/// Loads the bundled model and label list. Run once at startup; every error
/// is a `Configuration` error and is not retried.
pub struct ModelLoader {
    config: ClassifierConfig,
}

impl ModelLoader {
    pub fn new(config: ClassifierConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    #[tracing::instrument(
        name = "model_load",
        skip_all,
        fields(model_path = %self.config.model_path.display())
    )]
    pub fn initialize<B: InferenceBackend>(&self) -> Result<Classifier<B>> {
        let labels = LabelSet::load(&self.config.labels_path)?;

        tracing::info!("Loading inference model");
        let backend = B::load_model(&self.config).map_err(|e| {
            ClassifierError::Configuration(format!(
                "failed to load model from {}: {:#}",
                self.config.model_path.display(),
                e
            ))
        })?;

        let classifier = Classifier::new(InferenceEngine::new(backend), labels)?;

        tracing::info!(
            num_labels = classifier.labels().len(),
            "Model loaded successfully"
        );

        Ok(classifier)
    }
}
