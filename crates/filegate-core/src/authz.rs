//! Authorization engine
//!
//! Pure decision functions over `(identity, action, resource)`. Nothing in this
//! module performs I/O or mutates state; callers act and write the audit trail
//! only after a positive decision.
//!
//! | Role     | list                    | upload                 | download / delete          |
//! |----------|-------------------------|------------------------|----------------------------|
//! | admin    | all, optional tenant    | any tenant (explicit)  | any record                 |
//! | employee | own tenant              | own tenant             | record.tenant == own       |
//! | client   | own uploads             | own tenant             | record.uploaded_by == self |

use crate::models::{FileRecord, Identity, Principal, TenantId, UserId};
use crate::AppError;

/// Operations on file records gated by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// See the record in a listing or history view
    List,
    Upload,
    Download,
    Delete,
}

/// What an action is applied to: an existing record, or the tenant a new upload
/// would be filed under.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    File(&'a FileRecord),
    NewFile { tenant_id: TenantId },
}

/// Decide whether `identity` may perform `action` on `resource`.
///
/// Uploads only make sense against [`Resource::NewFile`] and every other action
/// only against [`Resource::File`]; mismatched pairs are denied.
pub fn can(identity: &Identity, action: Action, resource: Resource<'_>) -> bool {
    match (action, resource) {
        (Action::Upload, Resource::NewFile { tenant_id }) => match identity.principal {
            Principal::Admin => true,
            Principal::Employee { tenant_id: own } | Principal::Client { tenant_id: own, .. } => {
                own == tenant_id
            }
        },
        (Action::List | Action::Download | Action::Delete, Resource::File(record)) => {
            list_scope(identity).admits(record)
        }
        (Action::Upload, Resource::File(_))
        | (Action::List | Action::Download | Action::Delete, Resource::NewFile { .. }) => false,
    }
}

/// Set of records an identity may see, usable as a store-side filter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileScope {
    All,
    Tenant(TenantId),
    Uploader(UserId),
}

impl FileScope {
    pub fn admits(&self, record: &FileRecord) -> bool {
        match *self {
            FileScope::All => true,
            FileScope::Tenant(tenant_id) => record.tenant_id == tenant_id,
            FileScope::Uploader(user_id) => record.uploaded_by == user_id,
        }
    }
}

pub fn list_scope(identity: &Identity) -> FileScope {
    match identity.principal {
        Principal::Admin => FileScope::All,
        Principal::Employee { tenant_id } => FileScope::Tenant(tenant_id),
        Principal::Client { user_id, .. } => FileScope::Uploader(user_id),
    }
}

/// The audit log is readable by admins only.
pub fn can_view_audit_log(identity: &Identity) -> bool {
    matches!(identity.principal, Principal::Admin)
}

/// Tenant directory and per-tenant administration views.
pub fn can_manage_tenants(identity: &Identity) -> bool {
    matches!(identity.principal, Principal::Admin)
}

/// Work out which tenant an upload is filed under.
///
/// Admins must name the tenant explicitly; a missing tenant is a validation error,
/// not a denial. Everyone else defaults to their own tenant, and an explicit
/// tenant is passed through unchanged so [`can`] can deny a foreign one.
pub fn resolve_upload_tenant(
    identity: &Identity,
    requested: Option<TenantId>,
) -> Result<TenantId, AppError> {
    match identity.principal {
        Principal::Admin => requested.ok_or_else(|| {
            AppError::InvalidInput("tenant_id is required when an admin uploads".to_string())
        }),
        Principal::Employee { tenant_id } | Principal::Client { tenant_id, .. } => {
            Ok(requested.unwrap_or(tenant_id))
        }
    }
}
