//! Session and profile synchronization client for the ions job-marketplace API.
//!
//! Flow: `Session::restore` → `TokenManager` → `ApiClient` → reconcile into the session.

pub mod api_client;
pub mod config;
pub mod errors;
pub mod models;
pub mod session;
pub mod state;
pub mod tokens;

pub use api_client::{ApiClient, ApiError};
pub use errors::AppError;
pub use session::{HydrationState, Session};
pub use state::AppState;
pub use tokens::{FileTokenStore, MemoryTokenStore, TokenManager, TokenStore};
