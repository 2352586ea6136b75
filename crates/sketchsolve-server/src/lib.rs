//! Sketchsolve HTTP server: routes, CORS, error mapping, shared state.

pub mod error;
#[cfg(feature = "metrics")]
pub mod metrics;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use server::start_server;
pub use state::AppState;
