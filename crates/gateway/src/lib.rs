pub mod config;
pub mod error;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::GatewayConfig;
pub use error::ApiError;
pub use routes::build_router;
pub use state::AppState;
