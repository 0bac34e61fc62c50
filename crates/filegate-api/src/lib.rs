//! FileGate API Library
//!
//! HTTP handlers, authentication, the file and audit services, and application setup.

mod api_doc;
pub mod constants;
mod handlers;
mod telemetry;

pub mod auth;
pub mod error;
pub mod services;
pub mod setup;
pub mod state;

pub use api_doc::ApiDoc;
pub use error::{ErrorResponse, HttpAppError};
pub use state::AppState;
