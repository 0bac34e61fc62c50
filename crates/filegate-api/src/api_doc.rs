//! OpenAPI documentation, served at /api/openapi.json and rendered at /docs.

use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::auth;
use crate::error;
use crate::handlers;
use filegate_core::models;

struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "FileGate API",
        version = "0.1.0",
        description = "Multi-tenant spreadsheet exchange between an accounting firm and its clients. All endpoints except /health and login require a bearer token."
    ),
    paths(
        handlers::health::health_check,
        // Auth
        handlers::auth::login,
        handlers::auth::me,
        // Files
        handlers::files::upload_file,
        handlers::files::list_files,
        handlers::files::download_file,
        handlers::files::delete_file,
        // Audit
        handlers::audit::list_audit_entries,
        // Admin
        handlers::admin::list_tenants,
        handlers::admin::tenant_files,
    ),
    components(
        schemas(
            auth::LoginRequest,
            auth::TokenResponse,
            models::IdentityResponse,
            models::UserRole,
            models::FileResponse,
            models::AuditEntry,
            models::AuditAction,
            models::Tenant,
            handlers::health::HealthResponse,
            error::ErrorResponse,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "health", description = "Liveness"),
        (name = "auth", description = "Login and identity"),
        (name = "files", description = "Upload, list, download and delete spreadsheets"),
        (name = "audit", description = "Audit log of file actions"),
        (name = "admin", description = "Client administration")
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_versioned_paths() {
        let spec = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/v0/auth/login",
            "/api/v0/files",
            "/api/v0/files/{id}/download",
            "/api/v0/audit",
            "/api/v0/admin/tenants/{id}/files",
        ] {
            assert!(spec.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
