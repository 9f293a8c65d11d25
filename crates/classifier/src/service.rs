use crate::backend::InferenceBackend;
use crate::engine::InferenceEngine;
use crate::error::{ClassifierError, Result};
use crate::labels::LabelSet;
use crate::postprocessing::{PredictionResult, assemble};
use crate::preprocessing::{CHANNELS, DEFAULT_INPUT_SIZE, ImagePreprocessor};
use std::sync::{Arc, OnceLock};

/// The full pipeline: preprocess, forward pass, assemble.
///
/// Immutable after construction; share it behind an `Arc` (or a
/// [`ClassifierHandle`]) and call `predict` from any number of threads.
pub struct Classifier<B> {
    preprocessor: ImagePreprocessor,
    engine: InferenceEngine<B>,
    labels: LabelSet,
}

impl<B: InferenceBackend> Classifier<B> {
    /// Checks the model signature against the preprocessor output and the
    /// label set, so a mismatched artifact fails at startup instead of on
    /// every request.
    pub fn new(engine: InferenceEngine<B>, labels: LabelSet) -> Result<Self> {
        let preprocessor = ImagePreprocessor::new(DEFAULT_INPUT_SIZE);
        let metadata = engine.metadata();

        let expected_input = [
            1,
            preprocessor.input_size.1 as usize,
            preprocessor.input_size.0 as usize,
            CHANNELS,
        ];
        if !metadata.accepts(&expected_input) {
            return Err(ClassifierError::Configuration(format!(
                "model input '{}' has shape {:?}, preprocessing produces {:?}",
                metadata.input_name, metadata.input_shape, expected_input
            )));
        }

        match metadata.num_classes() {
            Some(num_classes) if num_classes != labels.len() => {
                return Err(ClassifierError::Configuration(format!(
                    "model output '{}' has {} classes but {} labels were loaded",
                    metadata.output_name,
                    num_classes,
                    labels.len()
                )));
            }
            Some(_) => {}
            None => tracing::warn!(
                output = %metadata.output_name,
                "Model output dimension is dynamic, label count checked per request"
            ),
        }

        Ok(Self {
            preprocessor,
            engine,
            labels,
        })
    }

    pub fn labels(&self) -> &LabelSet {
        &self.labels
    }

    pub fn engine(&self) -> &InferenceEngine<B> {
        &self.engine
    }

    #[tracing::instrument(name = "predict", skip_all, fields(image_bytes = image_bytes.len()))]
    pub fn predict(&self, image_bytes: &[u8]) -> Result<PredictionResult> {
        let tensor = self.preprocessor.preprocess(image_bytes)?;
        let scores = self.engine.run(&tensor)?;
        drop(tensor);

        let result = assemble(&scores, &self.labels)?;

        tracing::debug!(
            predicted_class = result.predicted_class(),
            confidence = result.confidence(),
            "Prediction complete"
        );

        Ok(result)
    }
}

/// Shared slot for a classifier that is loaded after the handle is handed out.
///
/// Requests arriving before [`install`](Self::install) fail fast with
/// `NotInitialized`; once installed the classifier is never replaced.
pub struct ClassifierHandle<B> {
    inner: Arc<OnceLock<Classifier<B>>>,
}

impl<B> Clone for ClassifierHandle<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<B> Default for ClassifierHandle<B> {
    fn default() -> Self {
        Self {
            inner: Arc::new(OnceLock::new()),
        }
    }
}

impl<B: InferenceBackend> ClassifierHandle<B> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that is ready from the start.
    pub fn ready(classifier: Classifier<B>) -> Self {
        let handle = Self::default();
        let _ = handle.inner.set(classifier);
        handle
    }

    pub fn install(&self, classifier: Classifier<B>) -> Result<()> {
        self.inner.set(classifier).map_err(|_| {
            ClassifierError::Configuration("classifier is already initialized".to_string())
        })
    }

    pub fn is_ready(&self) -> bool {
        self.inner.get().is_some()
    }

    pub fn get(&self) -> Result<&Classifier<B>> {
        self.inner.get().ok_or(ClassifierError::NotInitialized)
    }

    pub fn predict(&self, image_bytes: &[u8]) -> Result<PredictionResult> {
        self.get()?.predict(image_bytes)
    }
}
