use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use officemate_auth::CurrentUser;
use officemate_core::audit::AuditLog;
use officemate_core::storage::{Page, PageRequest, DEFAULT_PAGE_SIZE};

use crate::handlers::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQuery {
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub size: Option<u32>,
}

impl AuditLogQuery {
    fn page(&self) -> PageRequest {
        PageRequest::new(
            self.page.unwrap_or(0),
            self.size.unwrap_or(DEFAULT_PAGE_SIZE),
        )
    }
}

/// The user's change history, newest first
/// (GET /api/users/{user_id}/audit-logs).
pub async fn list_audit_logs(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Query(query): Query<AuditLogQuery>,
) -> Result<Json<Page<AuditLog>>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.audit.history(user_id, query.page()).await?))
}
