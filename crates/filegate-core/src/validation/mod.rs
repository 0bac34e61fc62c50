//! Validation modules

pub mod upload;

pub use upload::{
    parse_calendar_date, sanitize_filename, validate_file_extension, validate_file_size,
    UploadPolicy, MAX_FILENAME_LENGTH,
};
