pub mod tenant;
pub mod user;

pub use tenant::{PostgresTenantRepository, TenantRepositoryTrait};
pub use user::{PostgresUserRepository, UserRepositoryTrait};
