use classifier::ClassifierConfig;
use std::env;
use std::time::Duration;

pub use common::Environment;

pub const DEFAULT_ADDR: &str = "0.0.0.0:8080";
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_PREDICT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub environment: Environment,
    pub addr: String,
    pub max_upload_bytes: usize,
    /// `None` disables the per-request deadline.
    pub predict_timeout: Option<Duration>,
    pub cors_origin: String,
    pub otel_endpoint: Option<String>,
    pub classifier: ClassifierConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            addr: DEFAULT_ADDR.to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            predict_timeout: Some(Duration::from_millis(DEFAULT_PREDICT_TIMEOUT_MS)),
            cors_origin: DEFAULT_CORS_ORIGIN.to_string(),
            otel_endpoint: None,
            classifier: ClassifierConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Load configuration from environment variables with sensible defaults
    pub fn from_env() -> anyhow::Result<Self> {
        let environment = Environment::from_env();

        let addr = env::var("GATEWAY_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());

        let max_upload_bytes = env::var("GATEWAY_MAX_UPLOAD_BYTES")
            .ok()
            .and_then(|s| s.parse().ok())
            .filter(|&n: &usize| n > 0)
            .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES);

        let timeout_ms = env::var("GATEWAY_PREDICT_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DEFAULT_PREDICT_TIMEOUT_MS);
        let predict_timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));

        let cors_origin =
            env::var("GATEWAY_CORS_ORIGIN").unwrap_or_else(|_| DEFAULT_CORS_ORIGIN.to_string());

        let otel_endpoint = env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
            .ok()
            .filter(|s| !s.is_empty());

        Ok(Self {
            environment,
            addr,
            max_upload_bytes,
            predict_timeout,
            cors_origin,
            otel_endpoint,
            classifier: ClassifierConfig::from_env()?,
        })
    }
}
