pub mod backend;
pub mod config;
pub mod engine;
pub mod error;
pub mod labels;
pub mod loader;
pub mod postprocessing;
pub mod preprocessing;
pub mod service;

// Re-export commonly used types for convenience
pub use backend::{InferenceBackend, InferenceOutput, ModelMetadata};
pub use config::{ClassifierConfig, ExecutionProvider};
pub use engine::{InferenceEngine, RawScores};
pub use error::ClassifierError;
pub use labels::LabelSet;
pub use loader::ModelLoader;
pub use postprocessing::{PredictionResult, assemble};
pub use preprocessing::{ImagePreprocessor, InputTensor};
pub use service::{Classifier, ClassifierHandle};
