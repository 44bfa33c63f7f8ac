use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use officemate_core::audit::{AuditAction, AuditLog};
use officemate_core::storage::{AuditLogRepository, Page, PageRequest};

/// Records changes to user-owned entities.
///
/// Every entry goes to the `audit` tracing target and to the audit log
/// repository. A failed write is logged and never fails the change itself.
#[derive(Clone)]
pub struct AuditTrail {
    logs: Arc<dyn AuditLogRepository>,
}

impl AuditTrail {
    pub fn new(logs: Arc<dyn AuditLogRepository>) -> Self {
        Self { logs }
    }

    pub async fn record(&self, log: AuditLog) {
        tracing::info!(
            target: "audit",
            user_id = %log.user_id,
            entity_type = %log.entity_type,
            entity_id = %log.entity_id,
            action = log.action.as_str(),
            field = log.field_name.as_deref(),
            "Entity changed"
        );

        if let Err(e) = self.logs.record_audit(&log).await {
            tracing::error!(
                target: "audit",
                user_id = %log.user_id,
                audit_id = %log.audit_id,
                error = %e,
                "Failed to persist audit log"
            );
        }
    }

    pub async fn created(&self, user_id: Uuid, entity_type: &str, entity_id: Uuid) {
        self.record(AuditLog::new(
            user_id,
            entity_type,
            entity_id,
            AuditAction::Create,
            Utc::now(),
        ))
        .await;
    }

    pub async fn deleted(&self, user_id: Uuid, entity_type: &str, entity_id: Uuid) {
        self.record(AuditLog::new(
            user_id,
            entity_type,
            entity_id,
            AuditAction::Delete,
            Utc::now(),
        ))
        .await;
    }

    /// A single field moving from `old` to `new`.
    pub async fn changed(
        &self,
        user_id: Uuid,
        entity_type: &str,
        entity_id: Uuid,
        field: &str,
        old: Option<String>,
        new: Option<String>,
    ) {
        self.record(
            AuditLog::new(user_id, entity_type, entity_id, AuditAction::Update, Utc::now())
                .with_change(field, old, new),
        )
        .await;
    }

    /// Several fields replaced by one request.
    pub async fn updated(&self, user_id: Uuid, entity_type: &str, entity_id: Uuid, reason: &str) {
        self.record(
            AuditLog::new(
                user_id,
                entity_type,
                entity_id,
                AuditAction::BulkUpdate,
                Utc::now(),
            )
            .with_reason(reason),
        )
        .await;
    }

    /// A user's entries, newest first.
    pub async fn history(&self, user_id: Uuid, page: PageRequest) -> Result<Page<AuditLog>> {
        Ok(self
            .logs
            .list_audit_logs(user_id, page.normalized())
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryRepository;
    use async_trait::async_trait;
    use officemate_core::storage::{RepositoryError, Result as RepoResult};

    struct BrokenLogs;

    #[async_trait]
    impl AuditLogRepository for BrokenLogs {
        async fn record_audit(&self, _log: &AuditLog) -> RepoResult<()> {
            Err(RepositoryError::ConnectionFailed("down".to_string()))
        }

        async fn list_audit_logs(
            &self,
            _user_id: Uuid,
            page: PageRequest,
        ) -> RepoResult<Page<AuditLog>> {
            Ok(Page::new(Vec::new(), page, 0))
        }
    }

    #[tokio::test]
    async fn test_field_change_is_persisted() {
        let repo = InMemoryRepository::new();
        let trail = AuditTrail::new(Arc::new(repo.clone()));
        let user_id = Uuid::new_v4();
        let wallet_id = Uuid::new_v4();

        trail.created(user_id, "Wallet", wallet_id).await;
        trail
            .changed(
                user_id,
                "Wallet",
                wallet_id,
                "bank_linked",
                Some("false".into()),
                Some("true".into()),
            )
            .await;

        let page = trail.history(user_id, PageRequest::new(0, 20)).await.unwrap();
        assert_eq!(page.total_items, 2);
        let change = page
            .items
            .iter()
            .find(|l| l.action == AuditAction::Update)
            .unwrap();
        assert_eq!(change.field_name.as_deref(), Some("bank_linked"));
        assert_eq!(change.new_value.as_deref(), Some("true"));
        assert_eq!(change.entity_id, wallet_id);
    }

    #[tokio::test]
    async fn test_storage_failure_does_not_panic() {
        let trail = AuditTrail::new(Arc::new(BrokenLogs));
        trail.deleted(Uuid::new_v4(), "DriverProfile", Uuid::new_v4()).await;
    }
}
