use crate::config::Environment;
use tracing_subscriber::{
    EnvFilter, Layer, Registry, layer::SubscriberExt, util::SubscriberInitExt,
};

pub(crate) type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Initialize tracing subscriber with pretty formatting for development
/// and JSON formatting for production.
///
/// Uses RUST_LOG environment variable for filtering (defaults to "info" if not set).
///
/// Used when no OTLP endpoint is configured; `TelemetryGuard::init` installs its
/// own subscriber with the same formatting plus the OpenTelemetry layer.
pub fn setup_logging(environment: Environment) {
    init_subscriber(environment, None);
}

/// Installs the global subscriber: env filter, the formatter for `environment`
/// and an optional extra layer (the OpenTelemetry bridge).
pub(crate) fn init_subscriber(environment: Environment, extra: Option<BoxedLayer>) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into());

    let fmt_layer: BoxedLayer = match environment {
        Environment::Production => tracing_subscriber::fmt::layer()
            .json()
            .with_level(true)
            .boxed(),
        Environment::Development => tracing_subscriber::fmt::layer()
            .pretty()
            .with_ansi(true)
            .boxed(),
    };

    let mut layers = vec![fmt_layer];
    layers.extend(extra);

    tracing_subscriber::registry()
        .with(layers)
        .with(env_filter)
        .init();
}

/// Creates an info-level span and enters it.
#[macro_export]
macro_rules! span {
    ($name:literal) => {
        tracing::info_span!($name).entered()
    };
}
