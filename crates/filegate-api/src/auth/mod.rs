pub mod credentials;
pub mod middleware;
pub mod models;
pub mod service;
pub mod token;

pub use credentials::CredentialStore;
pub use models::{AuthContext, Claims, LoginRequest, TokenResponse};
pub use service::AuthService;
pub use token::{IssuedToken, TokenService};
