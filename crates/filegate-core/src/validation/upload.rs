//! Upload input rules
//!
//! Everything here runs before any metadata row is reserved, so a rejected
//! upload never leaves state behind.

use chrono::NaiveDate;

use crate::AppError;

pub const MAX_FILENAME_LENGTH: usize = 255;

/// Limits applied to every upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_size_bytes: u64,
    /// Lowercase extensions without the leading dot
    pub allowed_extensions: Vec<String>,
}

impl UploadPolicy {
    pub fn new(max_size_bytes: u64, allowed_extensions: Vec<String>) -> Self {
        Self {
            max_size_bytes,
            allowed_extensions: allowed_extensions
                .into_iter()
                .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    /// Check name and size of an incoming file and return the sanitized name
    /// it will be stored under.
    pub fn check(&self, filename: &str, size_bytes: u64) -> Result<String, AppError> {
        if size_bytes == 0 {
            return Err(AppError::InvalidInput("Uploaded file is empty".to_string()));
        }
        validate_file_size(size_bytes, self.max_size_bytes)?;

        let sanitized = sanitize_filename(filename)?;
        validate_file_extension(&sanitized, &self.allowed_extensions)?;
        Ok(sanitized)
    }
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self::new(
            100 * 1024 * 1024,
            vec!["xls".to_string(), "xlsx".to_string()],
        )
    }
}

pub fn validate_file_size(file_size: u64, max_size: u64) -> Result<(), AppError> {
    if file_size > max_size {
        return Err(AppError::PayloadTooLarge(format!(
            "File size exceeds maximum allowed size of {} MB",
            max_size / 1024 / 1024
        )));
    }
    Ok(())
}

/// Returns the lowercased extension when it is on the allow-list.
pub fn validate_file_extension(
    filename: &str,
    allowed_extensions: &[String],
) -> Result<String, AppError> {
    let extension = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    };

    if !allowed_extensions.contains(&extension) {
        return Err(AppError::InvalidInput(format!(
            "Invalid file extension. Allowed extensions: {}",
            allowed_extensions.join(", ")
        )));
    }

    Ok(extension)
}

/// Strip any directory part, reject traversal, and replace characters outside
/// `[A-Za-z0-9._-]` with `_`.
pub fn sanitize_filename(filename: &str) -> Result<String, AppError> {
    let filename_only = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename)
        .trim();

    if filename_only.contains("..") {
        return Err(AppError::InvalidInput(
            "Filename contains invalid path traversal".to_string(),
        ));
    }

    let sanitized: String = filename_only
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let sanitized = truncate_keeping_extension(sanitized);

    if sanitized.trim_matches(['.', '_']).is_empty() {
        return Err(AppError::InvalidInput("Filename is empty".to_string()));
    }

    Ok(sanitized)
}

/// Shorten the stem so the name fits in `MAX_FILENAME_LENGTH` with its
/// extension intact. Input is ASCII after sanitizing.
fn truncate_keeping_extension(name: String) -> String {
    if name.len() <= MAX_FILENAME_LENGTH {
        return name;
    }
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && ext.len() < MAX_FILENAME_LENGTH => {
            let keep = MAX_FILENAME_LENGTH - ext.len() - 1;
            format!("{}.{}", &stem[..keep], ext)
        }
        _ => name[..MAX_FILENAME_LENGTH].to_string(),
    }
}

/// Parse an ISO-8601 calendar date (`YYYY-MM-DD`) supplied as a form field.
pub fn parse_calendar_date(field: &str, value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        AppError::InvalidInput(format!("{} must be a date in YYYY-MM-DD format", field))
    })
}
