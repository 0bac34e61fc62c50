//! File service: upload, list, download and delete with authorization and audit.

use bytes::Bytes;
use filegate_core::authz::{
    can, can_manage_tenants, list_scope, resolve_upload_tenant, Action, Resource,
};
use filegate_core::models::{
    AuditAction, FileId, FileRecord, Identity, NewFileRecord, TenantId, ValidityWindow,
};
use filegate_core::{AppError, UploadPolicy};
use filegate_db::{FileFilter, FileRepositoryTrait, TenantRepositoryTrait};
use filegate_storage::{Storage, StorageError};
use std::sync::Arc;
use std::time::Duration;

use super::audit::AuditRecorder;
use super::upload::{FileUploadTransaction, UploadRequest};

#[derive(Clone)]
pub struct FileService {
    files: Arc<dyn FileRepositoryTrait>,
    tenants: Arc<dyn TenantRepositoryTrait>,
    storage: Arc<dyn Storage>,
    audit: AuditRecorder,
    policy: UploadPolicy,
    storage_timeout: Duration,
}

impl FileService {
    pub fn new(
        files: Arc<dyn FileRepositoryTrait>,
        tenants: Arc<dyn TenantRepositoryTrait>,
        storage: Arc<dyn Storage>,
        audit: AuditRecorder,
        policy: UploadPolicy,
        storage_timeout: Duration,
    ) -> Self {
        Self {
            files,
            tenants,
            storage,
            audit,
            policy,
            storage_timeout,
        }
    }

    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.storage
    }

    #[tracing::instrument(
        skip(self, identity, request),
        fields(user_id = identity.user_id, filename = %request.filename, size = request.data.len())
    )]
    pub async fn upload(
        &self,
        identity: &Identity,
        request: UploadRequest,
    ) -> Result<FileRecord, AppError> {
        let filename = self
            .policy
            .check(&request.filename, request.data.len() as u64)?;
        let validity = ValidityWindow::new(request.start_date, request.end_date)?;

        let tenant_id = resolve_upload_tenant(identity, request.tenant_id)?;
        if !can(identity, Action::Upload, Resource::NewFile { tenant_id }) {
            return Err(AppError::Forbidden(
                "Cannot upload files for another client".to_string(),
            ));
        }
        if identity.is_admin() {
            self.require_tenant(tenant_id).await?;
        }

        let record = NewFileRecord {
            filename,
            size_bytes: request.data.len() as i64,
            uploaded_by: identity.user_id,
            tenant_id,
            validity,
        };

        let committed = FileUploadTransaction::new(
            self.files.as_ref(),
            self.storage.as_ref(),
            self.storage_timeout,
        )
        .execute(record, request.data)
        .await?;

        self.audit.record(identity, AuditAction::Upload, committed.id);
        Ok(committed)
    }

    /// Files visible to `identity`, optionally narrowed to one tenant.
    #[tracing::instrument(skip(self, identity), fields(user_id = identity.user_id))]
    pub async fn list(
        &self,
        identity: &Identity,
        tenant_filter: Option<TenantId>,
    ) -> Result<Vec<FileRecord>, AppError> {
        let filter = FileFilter::new(list_scope(identity)).with_tenant(tenant_filter);
        self.files.list(&filter).await
    }

    /// All committed files of one tenant. Admin only.
    #[tracing::instrument(skip(self, identity), fields(user_id = identity.user_id))]
    pub async fn tenant_files(
        &self,
        identity: &Identity,
        tenant_id: TenantId,
    ) -> Result<Vec<FileRecord>, AppError> {
        if !can_manage_tenants(identity) {
            return Err(AppError::Forbidden(
                "Only administrators can browse tenants".to_string(),
            ));
        }
        self.require_tenant(tenant_id).await?;
        self.list(identity, Some(tenant_id)).await
    }

    #[tracing::instrument(skip(self, identity), fields(user_id = identity.user_id))]
    pub async fn download(
        &self,
        identity: &Identity,
        id: FileId,
    ) -> Result<(FileRecord, Bytes), AppError> {
        let record = self.authorized(identity, Action::Download, id).await?;
        let storage_key = record
            .storage_key
            .as_deref()
            .ok_or_else(|| AppError::NotFound(format!("File {} not found", id)))?;

        let data = match tokio::time::timeout(self.storage_timeout, self.storage.get(storage_key))
            .await
        {
            Ok(Ok(data)) => data,
            Ok(Err(StorageError::NotFound(_))) => {
                tracing::error!(
                    file_id = id,
                    storage_key = %storage_key,
                    "Committed file has no blob"
                );
                return Err(AppError::Storage(format!("Blob for file {} is missing", id)));
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => {
                return Err(AppError::Storage(format!(
                    "Blob read timed out after {}s",
                    self.storage_timeout.as_secs()
                )))
            }
        };

        self.audit.record(identity, AuditAction::Download, id);
        Ok((record, data))
    }

    #[tracing::instrument(skip(self, identity), fields(user_id = identity.user_id))]
    pub async fn delete(&self, identity: &Identity, id: FileId) -> Result<(), AppError> {
        let record = self.authorized(identity, Action::Delete, id).await?;

        if !self.files.delete(id).await? {
            return Err(AppError::NotFound(format!("File {} not found", id)));
        }

        if let Some(storage_key) = record.storage_key.as_deref() {
            match self.storage.delete(storage_key).await {
                Ok(()) => {}
                Err(StorageError::NotFound(_)) => {
                    tracing::debug!(file_id = id, storage_key = %storage_key, "Blob already gone");
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        file_id = id,
                        storage_key = %storage_key,
                        "Failed to delete blob; metadata already removed"
                    );
                }
            }
        }

        self.audit.record(identity, AuditAction::Delete, id);
        Ok(())
    }

    /// Load a committed record and check `action` against it. Missing records
    /// are `NotFound` for everyone; existing ones the caller cannot act on are
    /// `Forbidden`.
    async fn authorized(
        &self,
        identity: &Identity,
        action: Action,
        id: FileId,
    ) -> Result<FileRecord, AppError> {
        let record = self.files.get(id).await?;
        if !can(identity, action, Resource::File(&record)) {
            tracing::debug!(file_id = id, action = ?action, "Access denied");
            return Err(AppError::Forbidden(format!(
                "Not allowed to access file {}",
                id
            )));
        }
        Ok(record)
    }

    async fn require_tenant(&self, tenant_id: TenantId) -> Result<(), AppError> {
        match self.tenants.get(tenant_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::NotFound(format!("Client {} not found", tenant_id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use filegate_core::models::{NewUser, UserRole};
    use filegate_db::{MemoryDatabase, UserRepositoryTrait};
    use filegate_storage::LocalStorage;

    struct Fixture {
        _dir: tempfile::TempDir,
        db: MemoryDatabase,
        service: FileService,
        audit: AuditRecorder,
        admin: Identity,
        employee_a: Identity,
        client_a: Identity,
        client_a2: Identity,
        employee_b: Identity,
        tenant_a: TenantId,
        tenant_b: TenantId,
    }

    async fn user(
        db: &MemoryDatabase,
        name: &str,
        role: UserRole,
        tenant: Option<TenantId>,
    ) -> Identity {
        let user = UserRepositoryTrait::create(
            db,
            NewUser {
                username: name.to_string(),
                password_hash: "x".to_string(),
                role,
                tenant_id: tenant,
            },
        )
        .await
        .unwrap();
        Identity::from_user(&user).unwrap()
    }

    async fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path()).await.unwrap();
        let db = MemoryDatabase::default();
        let tenant_a = TenantRepositoryTrait::create(&db, "Acme").await.unwrap().id;
        let tenant_b = TenantRepositoryTrait::create(&db, "Globex").await.unwrap().id;

        let audit = AuditRecorder::new(Arc::new(db.clone()), 100);
        let service = FileService::new(
            Arc::new(db.clone()),
            Arc::new(db.clone()),
            Arc::new(storage),
            audit.clone(),
            UploadPolicy::default(),
            Duration::from_secs(5),
        );

        Fixture {
            admin: user(&db, "admin", UserRole::Admin, None).await,
            employee_a: user(&db, "employee_a", UserRole::Employee, Some(tenant_a)).await,
            client_a: user(&db, "client_a", UserRole::Client, Some(tenant_a)).await,
            client_a2: user(&db, "client_a2", UserRole::Client, Some(tenant_a)).await,
            employee_b: user(&db, "employee_b", UserRole::Employee, Some(tenant_b)).await,
            _dir: dir,
            db,
            service,
            audit,
            tenant_a,
            tenant_b,
        }
    }

    fn request(filename: &str, tenant_id: Option<TenantId>) -> UploadRequest {
        UploadRequest {
            filename: filename.to_string(),
            data: Bytes::from_static(b"PK\x03\x04 spreadsheet"),
            start_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            tenant_id,
        }
    }

    #[tokio::test]
    async fn test_admin_upload_requires_existing_tenant() {
        let f = fixture().await;

        let missing = f.service.upload(&f.admin, request("report.xlsx", None)).await;
        assert!(matches!(missing, Err(AppError::InvalidInput(_))));

        let unknown = f.service.upload(&f.admin, request("report.xlsx", Some(999))).await;
        assert!(matches!(unknown, Err(AppError::NotFound(_))));

        let ok = f
            .service
            .upload(&f.admin, request("report.xlsx", Some(f.tenant_a)))
            .await
            .unwrap();
        assert_eq!(ok.tenant_id, f.tenant_a);
        assert_eq!(ok.uploaded_by, f.admin.user_id);
    }

    #[tokio::test]
    async fn test_non_admin_upload_defaults_to_own_tenant_and_rejects_foreign() {
        let f = fixture().await;

        let own = f
            .service
            .upload(&f.employee_a, request("report.xls", None))
            .await
            .unwrap();
        assert_eq!(own.tenant_id, f.tenant_a);

        let foreign = f
            .service
            .upload(&f.client_a, request("report.xlsx", Some(f.tenant_b)))
            .await;
        assert!(matches!(foreign, Err(AppError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_upload_validation_happens_before_any_write() {
        let f = fixture().await;

        let wrong_ext = f.service.upload(&f.employee_a, request("notes.csv", None)).await;
        assert!(matches!(wrong_ext, Err(AppError::InvalidInput(_))));

        let mut reversed = request("report.xlsx", None);
        reversed.start_date = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let reversed = f.service.upload(&f.employee_a, reversed).await;
        assert!(matches!(reversed, Err(AppError::InvalidInput(_))));

        assert_eq!(f.db.file_row_count(), 0);
    }

    #[tokio::test]
    async fn test_listing_is_scoped_by_role() {
        let f = fixture().await;
        let by_client = f
            .service
            .upload(&f.client_a, request("mine.xlsx", None))
            .await
            .unwrap();
        let by_employee = f
            .service
            .upload(&f.employee_a, request("team.xlsx", None))
            .await
            .unwrap();
        let other_tenant = f
            .service
            .upload(&f.employee_b, request("other.xlsx", None))
            .await
            .unwrap();

        let ids = |records: Vec<FileRecord>| records.into_iter().map(|r| r.id).collect::<Vec<_>>();

        assert_eq!(
            ids(f.service.list(&f.admin, None).await.unwrap()),
            vec![by_client.id, by_employee.id, other_tenant.id]
        );
        assert_eq!(
            ids(f.service.list(&f.admin, Some(f.tenant_b)).await.unwrap()),
            vec![other_tenant.id]
        );
        assert_eq!(
            ids(f.service.list(&f.employee_a, None).await.unwrap()),
            vec![by_client.id, by_employee.id]
        );
        assert_eq!(
            ids(f.service.list(&f.client_a, None).await.unwrap()),
            vec![by_client.id]
        );
        assert!(f.service.list(&f.client_a2, None).await.unwrap().is_empty());
        assert!(f
            .service
            .list(&f.employee_a, Some(f.tenant_b))
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn test_download_checks_existence_then_permission() {
        let f = fixture().await;
        let record = f
            .service
            .upload(&f.client_a, request("mine.xlsx", None))
            .await
            .unwrap();

        let (meta, data) = f.service.download(&f.employee_a, record.id).await.unwrap();
        assert_eq!(meta.id, record.id);
        assert_eq!(data, Bytes::from_static(b"PK\x03\x04 spreadsheet"));

        assert!(matches!(
            f.service.download(&f.client_a2, record.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.download(&f.employee_b, record.id).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            f.service.download(&f.admin, 12345).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_removes_row_and_blob_and_is_audited() {
        let f = fixture().await;
        let record = f
            .service
            .upload(&f.client_a, request("mine.xlsx", None))
            .await
            .unwrap();
        let key = record.storage_key.clone().unwrap();

        assert!(matches!(
            f.service.delete(&f.client_a2, record.id).await,
            Err(AppError::Forbidden(_))
        ));

        f.service.delete(&f.client_a, record.id).await.unwrap();
        assert!(!f.service.storage().exists(&key).await.unwrap());
        assert!(matches!(
            f.service.delete(&f.client_a, record.id).await,
            Err(AppError::NotFound(_))
        ));

        f.audit.flush().await;
        let mut actions: Vec<_> = f
            .db
            .audit_entries()
            .into_iter()
            .map(|e| (e.actor_username, e.action.to_string()))
            .collect();
        actions.sort();
        assert_eq!(
            actions,
            vec![
                ("client_a".to_string(), "delete".to_string()),
                ("client_a".to_string(), "upload".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_tenant_files_is_admin_only() {
        let f = fixture().await;
        f.service
            .upload(&f.employee_a, request("team.xlsx", None))
            .await
            .unwrap();

        assert_eq!(
            f.service.tenant_files(&f.admin, f.tenant_a).await.unwrap().len(),
            1
        );
        assert!(matches!(
            f.service.tenant_files(&f.admin, 999).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            f.service.tenant_files(&f.employee_a, f.tenant_a).await,
            Err(AppError::Forbidden(_))
        ));
    }
}
