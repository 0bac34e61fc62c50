//! Data models for the application
//!
//! Users and tenants are owned by the credential store; file records and audit
//! entries reference them by id (audit entries by username, denormalized).

mod audit;
mod file;
mod identity;
mod tenant;
mod user;

// Re-export all models for convenient imports
pub use audit::*;
pub use file::*;
pub use identity::*;
pub use tenant::*;
pub use user::*;
