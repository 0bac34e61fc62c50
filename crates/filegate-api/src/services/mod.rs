pub mod audit;
pub mod files;
pub mod upload;

pub use audit::AuditRecorder;
pub use files::FileService;
pub use upload::{FileUploadTransaction, UploadRequest};
