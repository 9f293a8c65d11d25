use classifier::{ClassifierHandle, ModelLoader};
use common::{TelemetryGuard, setup_logging};
use gateway::{AppState, GatewayConfig, build_router};
use records::InMemoryStore;
use std::sync::Arc;

#[cfg(feature = "ort-backend")]
use classifier::backend::ort::OrtBackend as Backend;

#[cfg(not(feature = "ort-backend"))]
compile_error!("The gateway binary needs an inference backend: enable the 'ort-backend' feature");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GatewayConfig::from_env()?;

    let telemetry = config
        .otel_endpoint
        .as_ref()
        .map(|endpoint| TelemetryGuard::init("gateway", endpoint, config.environment))
        .transpose()?;

    if telemetry.is_none() {
        setup_logging(config.environment);
    }

    tracing::info!(config = ?config, "Loaded configuration");

    let handle: ClassifierHandle<Backend> = ClassifierHandle::new();
    let state = AppState::new(handle.clone(), Arc::new(InMemoryStore::new()), config.clone());
    let app = build_router(state)?;

    let listener = tokio::net::TcpListener::bind(&config.addr).await?;
    tracing::info!("HTTP server listening on {}", config.addr);

    let server = tokio::spawn(async move { axum::serve(listener, app).await });

    // Requests get 503 until the model is installed
    let loader = ModelLoader::new(config.classifier.clone());
    let loaded = tokio::task::spawn_blocking(move || loader.initialize::<Backend>()).await?;

    if let Err(e) = loaded.and_then(|classifier| handle.install(classifier)) {
        tracing::error!(error = %e, "Model initialization failed, shutting down");
        server.abort();
        return Err(e.into());
    }
    tracing::info!("Classifier ready");

    server.await??;

    Ok(())
}
