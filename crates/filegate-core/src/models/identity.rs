//! Resolved request identity.
//!
//! An [`Identity`] is built fresh from the credential store on every request and
//! never cached across requests, so a role or tenant change is visible on the next
//! call even while an older token is still unexpired.

use serde::Serialize;
use utoipa::ToSchema;

use super::{TenantId, User, UserId, UserRole};
use crate::AppError;

/// Role together with the scope it carries. Employees are bound to a tenant;
/// client users are bound to a tenant and act only on their own uploads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Principal {
    Admin,
    Employee { tenant_id: TenantId },
    Client { tenant_id: TenantId, user_id: UserId },
}

impl Principal {
    pub fn role(&self) -> UserRole {
        match self {
            Principal::Admin => UserRole::Admin,
            Principal::Employee { .. } => UserRole::Employee,
            Principal::Client { .. } => UserRole::Client,
        }
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        match *self {
            Principal::Admin => None,
            Principal::Employee { tenant_id } | Principal::Client { tenant_id, .. } => {
                Some(tenant_id)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: UserId,
    pub username: String,
    pub principal: Principal,
}

impl Identity {
    /// Build an identity from a stored user. Rows whose tenant reference does not
    /// fit their role are rejected rather than guessed at.
    pub fn from_user(user: &User) -> Result<Self, AppError> {
        let principal = match (user.role, user.tenant_id) {
            (UserRole::Admin, None) => Principal::Admin,
            (UserRole::Employee, Some(tenant_id)) => Principal::Employee { tenant_id },
            (UserRole::Client, Some(tenant_id)) => Principal::Client {
                tenant_id,
                user_id: user.id,
            },
            (role, tenant_id) => {
                tracing::error!(
                    user_id = user.id,
                    role = %role,
                    tenant_id = ?tenant_id,
                    "User record has a tenant reference inconsistent with its role"
                );
                return Err(AppError::Forbidden(
                    "Account is not configured for access".to_string(),
                ));
            }
        };

        Ok(Self {
            user_id: user.id,
            username: user.username.clone(),
            principal,
        })
    }

    pub fn role(&self) -> UserRole {
        self.principal.role()
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.principal.tenant_id()
    }

    pub fn is_admin(&self) -> bool {
        matches!(self.principal, Principal::Admin)
    }
}

/// Identity as returned to the caller
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IdentityResponse {
    pub id: UserId,
    pub username: String,
    pub role: UserRole,
    pub client_id: Option<TenantId>,
}

impl From<&Identity> for IdentityResponse {
    fn from(identity: &Identity) -> Self {
        Self {
            id: identity.user_id,
            username: identity.username.clone(),
            role: identity.role(),
            client_id: identity.tenant_id(),
        }
    }
}
