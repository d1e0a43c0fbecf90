//! `savor-server` exposes restaurant recommendations, structured model
//! output and retrieval-augmented chat over HTTP.

pub mod config;
pub mod error;
pub mod extract;
pub mod models;
pub mod prompts;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{ModelProvider, ServerConfig};
pub use error::{ApiError, ApiResult};
pub use server::{app_router, build_state, run_server};
pub use state::AppState;
