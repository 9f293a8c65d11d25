use std::{env, fmt, path::PathBuf, str::FromStr};

pub const DEFAULT_MODEL_PATH: &str = "resources/model_effb0_mixup.onnx";
pub const DEFAULT_LABELS_PATH: &str = "resources/labels.txt";
pub const DEFAULT_INTRA_THREADS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionProvider {
    #[default]
    Cpu,
    Cuda,
}

impl FromStr for ExecutionProvider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cpu" => Ok(ExecutionProvider::Cpu),
            "cuda" | "gpu" => Ok(ExecutionProvider::Cuda),
            other => anyhow::bail!(
                "{} is not a supported execution provider. Use either `cpu` or `cuda`.",
                other
            ),
        }
    }
}

impl fmt::Display for ExecutionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutionProvider::Cpu => f.write_str("cpu"),
            ExecutionProvider::Cuda => f.write_str("cuda"),
        }
    }
}

/// Locations of the bundled model artifacts and session settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifierConfig {
    pub model_path: PathBuf,
    pub labels_path: PathBuf,
    pub intra_threads: usize,
    pub execution_provider: ExecutionProvider,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            labels_path: PathBuf::from(DEFAULT_LABELS_PATH),
            intra_threads: DEFAULT_INTRA_THREADS,
            execution_provider: ExecutionProvider::Cpu,
        }
    }
}

impl ClassifierConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let model_path = env::var("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_MODEL_PATH));

        let labels_path = env::var("LABELS_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_LABELS_PATH));

        let intra_threads = env::var("INTRA_THREADS")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(DEFAULT_INTRA_THREADS);

        let execution_provider = match env::var("EXECUTION_PROVIDER") {
            Ok(value) => value.parse()?,
            Err(_) => ExecutionProvider::Cpu,
        };

        Ok(Self {
            model_path,
            labels_path,
            intra_threads,
            execution_provider,
        })
    }
}
