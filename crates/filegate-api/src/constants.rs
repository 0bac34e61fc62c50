//! API constants

/// API base path prefix (version-independent)
pub const API_BASE: &str = "/api";

pub const API_VERSION: &str = "v0";

/// Prefix every versioned route is nested under
pub const API_PREFIX: &str = "/api/v0";

/// Allowance on top of the upload ceiling for multipart framing and form fields
pub const MULTIPART_OVERHEAD_BYTES: usize = 1024 * 1024;

pub const BEARER_PREFIX: &str = "Bearer ";
