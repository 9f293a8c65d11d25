use crate::config::ClassifierConfig;
use crate::preprocessing::InputTensor;
use ndarray::ArrayD;

#[cfg(feature = "ort-backend")]
pub mod ort;

/// A loaded model session.
///
/// Implementations are shared by every request for the process lifetime, so
/// `infer` takes `&self`: a backend whose runtime needs exclusive access must
/// guard its session internally.
pub trait InferenceBackend: Send + Sync {
    fn load_model(config: &ClassifierConfig) -> anyhow::Result<Self>
    where
        Self: Sized;

    /// Input/output names and shapes as declared by the model.
    fn metadata(&self) -> &ModelMetadata;

    /// Run one forward pass, binding `input` to the model's single input.
    fn infer(&self, input: &InputTensor) -> anyhow::Result<InferenceOutput>;
}

pub struct InferenceOutput {
    pub scores: ArrayD<f32>, // [1, num_classes] raw class scores
}

/// Tensor signature discovered from the model. `None` marks a dynamic dimension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelMetadata {
    pub input_name: String,
    pub input_shape: Vec<Option<usize>>,
    pub output_name: String,
    pub output_shape: Vec<Option<usize>>,
}

impl ModelMetadata {
    /// Output dimensionality, when the model declares it statically.
    pub fn num_classes(&self) -> Option<usize> {
        self.output_shape.last().copied().flatten()
    }

    /// Whether a tensor of `shape` can be bound to the model input.
    pub fn accepts(&self, shape: &[usize]) -> bool {
        self.input_shape.len() == shape.len()
            && self
                .input_shape
                .iter()
                .zip(shape)
                .all(|(declared, actual)| declared.is_none_or(|d| d == *actual))
    }
}
