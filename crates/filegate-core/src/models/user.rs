use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use utoipa::ToSchema;

use super::TenantId;

pub type UserId = i64;

/// Persisted role of a user. Converted into a [`super::Principal`] before any
/// authorization decision is made.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "user_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Admin,
    Employee,
    Client,
}

impl Display for UserRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UserRole::Admin => write!(f, "admin"),
            UserRole::Employee => write!(f, "employee"),
            UserRole::Client => write!(f, "client"),
        }
    }
}

impl FromStr for UserRole {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "admin" => Ok(UserRole::Admin),
            "employee" => Ok(UserRole::Employee),
            "client" => Ok(UserRole::Client),
            _ => Err(anyhow::anyhow!("Invalid user role: {}", s)),
        }
    }
}

/// User record held by the credential store
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub tenant_id: Option<TenantId>,
    pub created_at: DateTime<Utc>,
}

/// Input for onboarding a new user. The password must already be hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub role: UserRole,
    pub tenant_id: Option<TenantId>,
}

impl NewUser {
    /// Admins have no tenant; employees and clients must have one.
    pub fn check_tenant_scope(&self) -> Result<(), crate::AppError> {
        match (self.role, self.tenant_id) {
            (UserRole::Admin, Some(_)) => Err(crate::AppError::InvalidInput(
                "Admin users cannot belong to a tenant".to_string(),
            )),
            (UserRole::Employee | UserRole::Client, None) => Err(crate::AppError::InvalidInput(
                format!("A {} user requires a tenant", self.role),
            )),
            _ => Ok(()),
        }
    }
}
