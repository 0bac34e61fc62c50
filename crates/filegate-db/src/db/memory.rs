//! In-memory repositories
//!
//! All four repositories share one [`MemoryDatabase`] so that cross-table rules
//! (tenant must exist, tenant deletion refused while referenced) behave like the
//! PostgreSQL schema. Used by the API integration tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use filegate_core::{
    models::{
        AuditEntry, AuditEntryId, FileId, FileRecord, NewAuditEntry, NewFileRecord, NewUser,
        Tenant, TenantId, User, UserId,
    },
    AppError,
};

use crate::db::{
    AuditRepositoryTrait, FileFilter, FileRepositoryTrait, TenantRepositoryTrait,
    UserRepositoryTrait, MAX_AUDIT_PAGE,
};

#[derive(Default)]
struct State {
    tenants: BTreeMap<TenantId, Tenant>,
    users: BTreeMap<UserId, User>,
    files: BTreeMap<FileId, FileRecord>,
    audit: Vec<AuditEntry>,
    next_tenant_id: TenantId,
    next_user_id: UserId,
    next_file_id: FileId,
    next_audit_id: AuditEntryId,
}

impl State {
    fn next_id(counter: &mut i64) -> i64 {
        *counter += 1;
        *counter
    }
}

/// Shared in-memory backing store. Cloning yields another handle to the same data.
#[derive(Clone, Default)]
pub struct MemoryDatabase {
    state: Arc<Mutex<State>>,
    fail_audit_appends: Arc<AtomicBool>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, AppError> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("In-memory store lock poisoned".to_string()))
    }

    /// Make every subsequent audit append fail, to exercise best-effort auditing.
    pub fn set_fail_audit_appends(&self, fail: bool) {
        self.fail_audit_appends.store(fail, Ordering::SeqCst);
    }

    /// Number of file rows, pending ones included.
    pub fn file_row_count(&self) -> usize {
        self.lock().map(|state| state.files.len()).unwrap_or(0)
    }

    /// Audit entries in append order.
    pub fn audit_entries(&self) -> Vec<AuditEntry> {
        self.lock()
            .map(|state| state.audit.clone())
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl UserRepositoryTrait for MemoryDatabase {
    async fn get_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let state = self.lock()?;
        Ok(state
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn get(&self, id: UserId) -> Result<Option<User>, AppError> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn create(&self, user: NewUser) -> Result<User, AppError> {
        user.check_tenant_scope()?;

        let mut state = self.lock()?;
        if let Some(tenant_id) = user.tenant_id {
            if !state.tenants.contains_key(&tenant_id) {
                return Err(AppError::NotFound(format!("Tenant {} not found", tenant_id)));
            }
        }
        if state.users.values().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(format!(
                "Username '{}' is already taken",
                user.username
            )));
        }

        let id = State::next_id(&mut state.next_user_id);
        let created = User {
            id,
            username: user.username,
            password_hash: user.password_hash,
            role: user.role,
            tenant_id: user.tenant_id,
            created_at: Utc::now(),
        };
        state.users.insert(id, created.clone());
        Ok(created)
    }
}

#[async_trait::async_trait]
impl TenantRepositoryTrait for MemoryDatabase {
    async fn list(&self) -> Result<Vec<Tenant>, AppError> {
        Ok(self.lock()?.tenants.values().cloned().collect())
    }

    async fn get(&self, id: TenantId) -> Result<Option<Tenant>, AppError> {
        Ok(self.lock()?.tenants.get(&id).cloned())
    }

    async fn create(&self, name: &str) -> Result<Tenant, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("Tenant name must not be empty".to_string()));
        }

        let mut state = self.lock()?;
        if state.tenants.values().any(|t| t.name == name) {
            return Err(AppError::Conflict(format!("Tenant '{}' already exists", name)));
        }

        let id = State::next_id(&mut state.next_tenant_id);
        let tenant = Tenant {
            id,
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.tenants.insert(id, tenant.clone());
        Ok(tenant)
    }

    async fn delete(&self, id: TenantId) -> Result<(), AppError> {
        let mut state = self.lock()?;
        if !state.tenants.contains_key(&id) {
            return Err(AppError::NotFound(format!("Tenant {} not found", id)));
        }

        let user_count = state.users.values().filter(|u| u.tenant_id == Some(id)).count();
        let file_count = state.files.values().filter(|f| f.tenant_id == id).count();
        if user_count > 0 || file_count > 0 {
            return Err(AppError::Conflict(format!(
                "Tenant {} still has {} users and {} files",
                id, user_count, file_count
            )));
        }

        state.tenants.remove(&id);
        Ok(())
    }
}

#[async_trait::async_trait]
impl FileRepositoryTrait for MemoryDatabase {
    async fn reserve(&self, record: NewFileRecord) -> Result<FileRecord, AppError> {
        let mut state = self.lock()?;
        if !state.tenants.contains_key(&record.tenant_id) {
            return Err(AppError::NotFound(format!(
                "Tenant {} not found",
                record.tenant_id
            )));
        }

        let id = State::next_id(&mut state.next_file_id);
        let reserved = FileRecord {
            id,
            filename: record.filename,
            storage_key: None,
            size_bytes: record.size_bytes,
            uploaded_by: record.uploaded_by,
            tenant_id: record.tenant_id,
            start_date: record.validity.start(),
            end_date: record.validity.end(),
            uploaded_at: Utc::now(),
        };
        state.files.insert(id, reserved.clone());
        Ok(reserved)
    }

    async fn attach_locator(&self, id: FileId, storage_key: &str) -> Result<FileRecord, AppError> {
        let mut state = self.lock()?;
        let record = state
            .files
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound(format!("File {} not found", id)))?;
        record.storage_key = Some(storage_key.to_string());
        Ok(record.clone())
    }

    async fn find(&self, id: FileId) -> Result<Option<FileRecord>, AppError> {
        Ok(self
            .lock()?
            .files
            .get(&id)
            .filter(|r| r.is_committed())
            .cloned())
    }

    async fn list(&self, filter: &FileFilter) -> Result<Vec<FileRecord>, AppError> {
        Ok(self
            .lock()?
            .files
            .values()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    async fn delete(&self, id: FileId) -> Result<bool, AppError> {
        Ok(self.lock()?.files.remove(&id).is_some())
    }

    async fn rollback(&self, id: FileId) -> Result<bool, AppError> {
        let mut state = self.lock()?;
        match state.files.get(&id) {
            Some(record) if !record.is_committed() => {
                state.files.remove(&id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait::async_trait]
impl AuditRepositoryTrait for MemoryDatabase {
    async fn append(&self, entry: NewAuditEntry) -> Result<AuditEntry, AppError> {
        if self.fail_audit_appends.load(Ordering::SeqCst) {
            return Err(AppError::Storage("audit store unavailable".to_string()));
        }

        let mut state = self.lock()?;
        let id = State::next_id(&mut state.next_audit_id);
        let appended = AuditEntry {
            id,
            actor_username: entry.actor_username,
            action: entry.action,
            file_id: entry.file_id,
            created_at: Utc::now(),
        };
        state.audit.push(appended.clone());
        Ok(appended)
    }

    async fn list_recent(&self, limit: i64) -> Result<Vec<AuditEntry>, AppError> {
        let limit = limit.clamp(1, MAX_AUDIT_PAGE) as usize;
        let state = self.lock()?;
        let mut entries = state.audit.clone();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        entries.truncate(limit);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use filegate_core::authz::FileScope;
    use chrono::NaiveDate;
    use filegate_core::models::{AuditAction, UserRole, ValidityWindow};

    fn window() -> ValidityWindow {
        ValidityWindow::new(
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
        )
        .unwrap()
    }

    async fn seed(db: &MemoryDatabase) -> (Tenant, Tenant, User) {
        let a = TenantRepositoryTrait::create(db, "Acme").await.unwrap();
        let b = TenantRepositoryTrait::create(db, "Globex").await.unwrap();
        let client = UserRepositoryTrait::create(
            db,
            NewUser {
                username: "client1".to_string(),
                password_hash: "x".to_string(),
                role: UserRole::Client,
                tenant_id: Some(a.id),
            },
        )
        .await
        .unwrap();
        (a, b, client)
    }

    fn new_file(tenant_id: TenantId, uploaded_by: UserId) -> NewFileRecord {
        NewFileRecord {
            filename: "report.xlsx".to_string(),
            size_bytes: 10,
            uploaded_by,
            tenant_id,
            validity: window(),
        }
    }

    #[tokio::test]
    async fn test_pending_rows_are_invisible_until_committed() {
        let db = MemoryDatabase::new();
        let (a, _, client) = seed(&db).await;

        let reserved = db.reserve(new_file(a.id, client.id)).await.unwrap();
        assert!(db.find(reserved.id).await.unwrap().is_none());
        assert!(FileRepositoryTrait::list(&db, &FileFilter::new(FileScope::All))
            .await
            .unwrap()
            .is_empty());

        db.attach_locator(reserved.id, "files/1/1/report.xlsx")
            .await
            .unwrap();
        assert!(db.find(reserved.id).await.unwrap().is_some());
        assert!(!db.rollback(reserved.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_rollback_removes_pending_row() {
        let db = MemoryDatabase::new();
        let (a, _, client) = seed(&db).await;

        let reserved = db.reserve(new_file(a.id, client.id)).await.unwrap();
        assert!(db.rollback(reserved.id).await.unwrap());
        assert_eq!(db.file_row_count(), 0);
    }

    #[tokio::test]
    async fn test_list_filter_intersects_scope_and_tenant() {
        let db = MemoryDatabase::new();
        let (a, b, client) = seed(&db).await;

        for tenant in [a.id, b.id, a.id] {
            let r = db.reserve(new_file(tenant, client.id)).await.unwrap();
            db.attach_locator(r.id, "k").await.unwrap();
        }

        let tenant_a = FileRepositoryTrait::list(&db, &FileFilter::new(FileScope::Tenant(a.id)))
            .await
            .unwrap();
        assert_eq!(tenant_a.iter().map(|r| r.id).collect::<Vec<_>>(), vec![1, 3]);

        let filter = FileFilter::new(FileScope::Tenant(a.id)).with_tenant(Some(b.id));
        let none = FileRepositoryTrait::list(&db, &filter).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn test_tenant_delete_refused_while_referenced() {
        let db = MemoryDatabase::new();
        let (a, b, _) = seed(&db).await;

        assert!(matches!(
            TenantRepositoryTrait::delete(&db, a.id).await,
            Err(AppError::Conflict(_))
        ));
        TenantRepositoryTrait::delete(&db, b.id).await.unwrap();
        assert!(matches!(
            TenantRepositoryTrait::delete(&db, b.id).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_username_conflicts() {
        let db = MemoryDatabase::new();
        let (a, _, _) = seed(&db).await;
        let err = UserRepositoryTrait::create(
            &db,
            NewUser {
                username: "client1".to_string(),
                password_hash: "y".to_string(),
                role: UserRole::Employee,
                tenant_id: Some(a.id),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_audit_list_is_newest_first_and_bounded() {
        let db = MemoryDatabase::new();
        for file_id in 1..=5 {
            db.append(NewAuditEntry {
                actor_username: "admin".to_string(),
                action: AuditAction::Download,
                file_id,
            })
            .await
            .unwrap();
        }

        let recent = db.list_recent(3).await.unwrap();
        assert_eq!(
            recent.iter().map(|e| e.file_id).collect::<Vec<_>>(),
            vec![5, 4, 3]
        );

        db.set_fail_audit_appends(true);
        assert!(db
            .append(NewAuditEntry {
                actor_username: "admin".to_string(),
                action: AuditAction::Delete,
                file_id: 9,
            })
            .await
            .is_err());
    }
}
