//! Storage key layout shared by all backends.

use filegate_core::models::{FileId, TenantId};

/// Key under which the blob of file `file_id` lives.
///
/// `filename` must already be sanitized; the id segment keeps two uploads with
/// the same name apart.
pub fn file_key(tenant_id: TenantId, file_id: FileId, filename: &str) -> String {
    format!("files/{}/{}/{}", tenant_id, file_id, filename)
}

/// A key is usable when it is relative, non-empty and free of traversal.
pub(crate) fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key.starts_with('/')
        && !key.contains('\\')
        && !key.split('/').any(|segment| segment.is_empty() || segment == "." || segment == "..")
}
