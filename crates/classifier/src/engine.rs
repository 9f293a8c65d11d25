use crate::backend::{InferenceBackend, InferenceOutput, ModelMetadata};
use crate::error::{ClassifierError, Result};
use crate::preprocessing::InputTensor;
use ndarray::Axis;

/// Per-class scores for one image, index-aligned with the label set.
#[derive(Debug, Clone, PartialEq)]
pub struct RawScores(Vec<f32>);

impl RawScores {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<f32>> for RawScores {
    fn from(scores: Vec<f32>) -> Self {
        Self(scores)
    }
}

pub struct InferenceEngine<B> {
    backend: B,
}

impl<B: InferenceBackend> InferenceEngine<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn metadata(&self) -> &ModelMetadata {
        self.backend.metadata()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// One forward pass. A tensor the model cannot accept is a preprocessing
    /// bug and fails without touching the session.
    #[tracing::instrument(name = "model_inference", skip_all)]
    pub fn run(&self, tensor: &InputTensor) -> Result<RawScores> {
        let metadata = self.backend.metadata();

        if !metadata.accepts(tensor.shape()) {
            return Err(ClassifierError::Inference(format!(
                "tensor shape {:?} does not match input '{}' {:?}",
                tensor.shape(),
                metadata.input_name,
                metadata.input_shape
            )));
        }

        let output = self
            .backend
            .infer(tensor)
            .map_err(|e| ClassifierError::Inference(format!("{:#}", e)))?;

        let scores = Self::first_row(output)?;

        tracing::trace!(num_scores = scores.len(), "Forward pass complete");

        Ok(scores)
    }

    /// Row 0 of a `[batch, classes]` output; a bare `[classes]` vector is taken as is.
    fn first_row(output: InferenceOutput) -> Result<RawScores> {
        let scores = output.scores;

        match scores.ndim() {
            1 => Ok(RawScores(scores.iter().copied().collect())),
            2 if scores.shape()[0] > 0 => Ok(RawScores(
                scores.index_axis(Axis(0), 0).iter().copied().collect(),
            )),
            _ => Err(ClassifierError::Inference(format!(
                "unexpected output shape {:?}, expected [1, num_classes]",
                scores.shape()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClassifierConfig;
    use ndarray::{Array4, ArrayD, IxDyn};
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Backend returning a fixed output and counting forward passes
    struct FixedBackend {
        metadata: ModelMetadata,
        output_shape: Vec<usize>,
        output: Vec<f32>,
        calls: AtomicUsize,
    }

    impl FixedBackend {
        fn new(output_shape: Vec<usize>, output: Vec<f32>) -> Self {
            Self {
                metadata: ModelMetadata {
                    input_name: "input_1".to_string(),
                    input_shape: vec![None, Some(224), Some(224), Some(3)],
                    output_name: "predictions".to_string(),
                    output_shape: vec![None, Some(3)],
                },
                output_shape,
                output,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl InferenceBackend for FixedBackend {
        fn load_model(_config: &ClassifierConfig) -> anyhow::Result<Self> {
            anyhow::bail!("not loadable")
        }

        fn metadata(&self) -> &ModelMetadata {
            &self.metadata
        }

        fn infer(&self, _input: &InputTensor) -> anyhow::Result<InferenceOutput> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.output.is_empty() {
                anyhow::bail!("runtime exploded");
            }
            Ok(InferenceOutput {
                scores: ArrayD::from_shape_vec(IxDyn(&self.output_shape), self.output.clone())?,
            })
        }
    }

    fn tensor(h: usize, w: usize) -> InputTensor {
        Array4::<f32>::zeros((1, h, w, 3)).into()
    }

    #[test]
    fn test_run_returns_first_row() {
        let engine = InferenceEngine::new(FixedBackend::new(vec![1, 3], vec![0.1, 0.7, 0.2]));
        let scores = engine.run(&tensor(224, 224)).unwrap();
        assert_eq!(scores.as_slice(), &[0.1, 0.7, 0.2]);
    }

    #[test]
    fn test_run_accepts_flat_output() {
        let engine = InferenceEngine::new(FixedBackend::new(vec![3], vec![1.0, 2.0, 3.0]));
        assert_eq!(engine.run(&tensor(224, 224)).unwrap().len(), 3);
    }

    #[test]
    fn test_shape_mismatch_is_rejected_before_inference() {
        let engine = InferenceEngine::new(FixedBackend::new(vec![1, 3], vec![0.1, 0.7, 0.2]));

        let err = engine.run(&tensor(112, 112)).unwrap_err();

        assert!(matches!(err, ClassifierError::Inference(_)));
        assert!(err.to_string().contains("input_1"));
        assert_eq!(engine.backend().calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_backend_failure_maps_to_inference_error() {
        let engine = InferenceEngine::new(FixedBackend::new(vec![1, 3], vec![]));
        let err = engine.run(&tensor(224, 224)).unwrap_err();
        assert_eq!(
            err,
            ClassifierError::Inference("runtime exploded".to_string())
        );
    }

    #[test]
    fn test_unexpected_output_rank_is_inference_error() {
        let engine =
            InferenceEngine::new(FixedBackend::new(vec![1, 1, 3], vec![0.1, 0.7, 0.2]));
        let err = engine.run(&tensor(224, 224)).unwrap_err();
        assert!(err.to_string().contains("unexpected output shape"));
    }
}
