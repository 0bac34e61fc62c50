use crate::auth::AuthContext;
use crate::error::{ErrorResponse, HttpAppError};
use crate::services::UploadRequest;
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{
        multipart::{Field, MultipartError, MultipartRejection},
        Multipart, Path, Query, State,
    },
    http::{header, Response, StatusCode},
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use filegate_core::models::{FileId, FileResponse, TenantId};
use filegate_core::validation::parse_calendar_date;
use filegate_core::AppError;
use serde::Deserialize;
use std::sync::Arc;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
pub struct ListFilesQuery {
    /// Only return files of this client
    #[serde(alias = "client_id")]
    pub tenant_id: Option<TenantId>,
}

fn multipart_error(e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge("Upload exceeds the request size limit".to_string())
    } else {
        AppError::InvalidInput(format!("Failed to read multipart: {}", e.body_text()))
    }
}

async fn text_field(field: Field<'_>) -> Result<String, AppError> {
    field
        .text()
        .await
        .map(|value| value.trim().to_string())
        .map_err(multipart_error)
}

/// Read the upload form. Unknown fields are ignored.
async fn read_upload_form(mut multipart: Multipart) -> Result<UploadRequest, AppError> {
    let mut file: Option<(String, Bytes)> = None;
    let mut start_date = None;
    let mut end_date = None;
    let mut tenant_id = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                if file.is_some() {
                    return Err(AppError::InvalidInput(
                        "Send exactly one field named 'file'".to_string(),
                    ));
                }
                let filename = field.file_name().unwrap_or_default().to_string();
                let data = field.bytes().await.map_err(multipart_error)?;
                file = Some((filename, data));
            }
            "start_date" => {
                start_date = Some(parse_calendar_date("start_date", &text_field(field).await?)?)
            }
            "end_date" => end_date = Some(parse_calendar_date("end_date", &text_field(field).await?)?),
            "tenant_id" | "client_id" => {
                let value = text_field(field).await?;
                if !value.is_empty() {
                    tenant_id = Some(value.parse::<TenantId>().map_err(|_| {
                        AppError::InvalidInput(format!("{} must be an integer", name))
                    })?);
                }
            }
            _ => {}
        }
    }

    let (filename, data) =
        file.ok_or_else(|| AppError::InvalidInput("No file provided".to_string()))?;

    Ok(UploadRequest {
        filename,
        data,
        start_date: start_date
            .ok_or_else(|| AppError::InvalidInput("start_date is required".to_string()))?,
        end_date: end_date
            .ok_or_else(|| AppError::InvalidInput("end_date is required".to_string()))?,
        tenant_id,
    })
}

#[utoipa::path(
    post,
    path = "/api/v0/files",
    tag = "files",
    request_body(content = inline(Object), content_type = "multipart/form-data",
        description = "Fields: file, start_date (YYYY-MM-DD), end_date (YYYY-MM-DD), tenant_id (required for admins)"),
    responses(
        (status = 201, description = "File uploaded", body = FileResponse),
        (status = 400, description = "Invalid input", body = ErrorResponse),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not allowed to upload for this client", body = ErrorResponse),
        (status = 404, description = "Client not found", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    AuthContext(identity): AuthContext,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, HttpAppError> {
    let multipart = multipart.map_err(|e| {
        AppError::InvalidInput(format!("Expected a multipart form: {}", e.body_text()))
    })?;
    let request = read_upload_form(multipart).await?;

    let record = state.files.upload(&identity, request).await?;
    Ok((StatusCode::CREATED, Json(FileResponse::from(record))))
}

#[utoipa::path(
    get,
    path = "/api/v0/files",
    tag = "files",
    params(ListFilesQuery),
    responses(
        (status = 200, description = "Files visible to the caller, oldest first", body = Vec<FileResponse>),
        (status = 401, description = "Not authenticated", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    AuthContext(identity): AuthContext,
    Query(query): Query<ListFilesQuery>,
) -> Result<impl IntoResponse, HttpAppError> {
    let files = state.files.list(&identity, query.tenant_id).await?;
    Ok(Json(
        files.into_iter().map(FileResponse::from).collect::<Vec<_>>(),
    ))
}

fn spreadsheet_content_type(filename: &str) -> &'static str {
    match filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase()) {
        Some(ext) if ext == "xlsx" => {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        }
        Some(ext) if ext == "xls" => "application/vnd.ms-excel",
        _ => "application/octet-stream",
    }
}

#[utoipa::path(
    get,
    path = "/api/v0/files/{id}/download",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 200, description = "File content", content_type = "application/octet-stream"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not allowed to access this file", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
#[tracing::instrument(skip(state, identity), fields(user_id = identity.user_id, file_id = id))]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    AuthContext(identity): AuthContext,
    Path(id): Path<FileId>,
) -> Result<impl IntoResponse, HttpAppError> {
    let (record, data) = state.files.download(&identity, id).await?;

    // Stored names are sanitized to [A-Za-z0-9._-], safe inside quotes
    let content_disposition = format!("attachment; filename=\"{}\"", record.filename);

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, spreadsheet_content_type(&record.filename))
        .header(header::CONTENT_DISPOSITION, content_disposition.as_str())
        .header(header::CONTENT_LENGTH, data.len())
        .header(header::CACHE_CONTROL, "private, no-store")
        .body(Body::from(data))
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))?;

    Ok(response)
}

#[utoipa::path(
    delete,
    path = "/api/v0/files/{id}",
    tag = "files",
    params(
        ("id" = i64, Path, description = "File ID")
    ),
    responses(
        (status = 204, description = "File deleted"),
        (status = 401, description = "Not authenticated", body = ErrorResponse),
        (status = 403, description = "Not allowed to delete this file", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse)
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    AuthContext(identity): AuthContext,
    Path(id): Path<FileId>,
) -> Result<impl IntoResponse, HttpAppError> {
    state.files.delete(&identity, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spreadsheet_content_type() {
        assert_eq!(
            spreadsheet_content_type("report.XLSX"),
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        );
        assert_eq!(spreadsheet_content_type("old.xls"), "application/vnd.ms-excel");
        assert_eq!(spreadsheet_content_type("noext"), "application/octet-stream");
    }
}
