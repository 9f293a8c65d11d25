use super::{InferenceBackend, InferenceOutput, ModelMetadata};
use crate::config::{ClassifierConfig, ExecutionProvider};
use crate::preprocessing::InputTensor;
use ndarray::{ArrayD, IxDyn};
use ort::{
    session::{Session, builder::GraphOptimizationLevel},
    value::{TensorRef, ValueType},
};
use std::path::Path;
use std::sync::Mutex;

/// ONNX Runtime session. `Session::run` needs `&mut`, so concurrent requests
/// take turns on the mutex.
pub struct OrtBackend {
    session: Mutex<Session>,
    metadata: ModelMetadata,
}

impl OrtBackend {
    /// Load model with specified execution provider
    pub fn load_model_with_provider(
        path: &Path,
        provider: ExecutionProvider,
        intra_threads: usize,
    ) -> anyhow::Result<Self> {
        // Initialize ORT environment (idempotent)
        let _ = ort::init().commit();

        let mut builder = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .with_intra_threads(intra_threads)?;

        match provider {
            ExecutionProvider::Cuda => {
                tracing::info!("Initializing ONNX Runtime with CUDA execution provider");
                builder = builder.with_execution_providers([
                    ort::execution_providers::CUDAExecutionProvider::default()
                        .with_device_id(0)
                        .build()
                        .error_on_failure(),
                ])?;
            }
            ExecutionProvider::Cpu => {
                tracing::info!("Initializing ONNX Runtime with CPU execution provider");
            }
        }

        let session = builder.commit_from_file(path)?;
        let metadata = Self::read_metadata(&session)?;

        tracing::info!(
            path = %path.display(),
            input = %metadata.input_name,
            input_shape = ?metadata.input_shape,
            output = %metadata.output_name,
            output_shape = ?metadata.output_shape,
            "Model loaded"
        );

        Ok(Self {
            session: Mutex::new(session),
            metadata,
        })
    }

    fn read_metadata(session: &Session) -> anyhow::Result<ModelMetadata> {
        let input = match session.inputs.as_slice() {
            [input] => input,
            inputs => anyhow::bail!(
                "Model must declare exactly one input, found {}",
                inputs.len()
            ),
        };

        let output = session
            .outputs
            .first()
            .ok_or_else(|| anyhow::anyhow!("Model declares no outputs"))?;

        let input_shape = tensor_dims(&input.input_type)
            .ok_or_else(|| anyhow::anyhow!("Model input '{}' is not a tensor", input.name))?;
        let output_shape = tensor_dims(&output.output_type)
            .ok_or_else(|| anyhow::anyhow!("Model output '{}' is not a tensor", output.name))?;

        Ok(ModelMetadata {
            input_name: input.name.clone(),
            input_shape,
            output_name: output.name.clone(),
            output_shape,
        })
    }
}

fn tensor_dims(value_type: &ValueType) -> Option<Vec<Option<usize>>> {
    match value_type {
        ValueType::Tensor { shape, .. } => Some(dims_from_shape(shape)),
        _ => None,
    }
}

/// Negative (symbolic) dimensions become `None`.
fn dims_from_shape(shape: &[i64]) -> Vec<Option<usize>> {
    shape.iter().map(|&dim| usize::try_from(dim).ok()).collect()
}

impl InferenceBackend for OrtBackend {
    fn load_model(config: &ClassifierConfig) -> anyhow::Result<Self> {
        Self::load_model_with_provider(
            &config.model_path,
            config.execution_provider,
            config.intra_threads,
        )
    }

    fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    fn infer(&self, input: &InputTensor) -> anyhow::Result<InferenceOutput> {
        let data = input
            .as_slice()
            .ok_or_else(|| anyhow::anyhow!("Input tensor is not in standard layout"))?;
        let tensor = TensorRef::from_array_view((input.dims(), data))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| anyhow::anyhow!("Model session lock poisoned"))?;

        let outputs = session.run(ort::inputs![self.metadata.input_name.as_str() => tensor])?;

        let (shape, scores) =
            outputs[self.metadata.output_name.as_str()].try_extract_tensor::<f32>()?;
        let dims: Vec<usize> = shape.iter().map(|&d| d as usize).collect();

        Ok(InferenceOutput {
            scores: ArrayD::from_shape_vec(IxDyn(&dims), scores.to_vec())?,
        })
    }
}
