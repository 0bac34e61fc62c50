//! FileGate Core Library
//!
//! Domain models, identity, the authorization engine, error types,
//! configuration and upload validation shared by every FileGate crate.

pub mod authz;
pub mod config;
pub mod error;
pub mod models;
pub mod password;
pub mod validation;

pub use authz::{can, list_scope, Action, FileScope, Resource};
pub use config::{BaseConfig, Config, FileGateConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use validation::UploadPolicy;
