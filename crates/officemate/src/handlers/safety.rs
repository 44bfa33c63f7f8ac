use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use officemate_auth::CurrentUser;
use officemate_core::safety::{
    EmergencyContact, EmergencyContactRequest, FamilySharingContact, FamilySharingRequest,
    LocationShare, LocationShareRequest, LocationUpdateRequest, ResolveSosRequest, SosAlert,
    TriggerSosRequest,
};

use crate::handlers::AppError;
use crate::services::SafetySettings;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RideUpdatesRequest {
    pub enabled: bool,
}

// ----------------------------------------------------------------------
// Emergency contacts
// ----------------------------------------------------------------------

/// POST /api/users/{user_id}/emergency-contacts
pub async fn add_emergency_contact(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<EmergencyContactRequest>,
) -> Result<(StatusCode, Json<EmergencyContact>), AppError> {
    current.ensure_owner(user_id)?;
    let contact = state.safety.add_emergency_contact(user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// GET /api/users/{user_id}/emergency-contacts
pub async fn list_emergency_contacts(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<EmergencyContact>>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.safety.list_emergency_contacts(user_id).await?))
}

/// GET /api/users/{user_id}/emergency-contacts/primary
pub async fn primary_emergency_contact(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Option<EmergencyContact>>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.safety.primary_emergency_contact(user_id).await?))
}

/// PUT /api/users/{user_id}/emergency-contacts/{contact_id}
pub async fn update_emergency_contact(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, contact_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<EmergencyContactRequest>,
) -> Result<Json<EmergencyContact>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state
            .safety
            .update_emergency_contact(user_id, contact_id, &request)
            .await?,
    ))
}

/// PUT /api/users/{user_id}/emergency-contacts/{contact_id}/primary
pub async fn set_primary_emergency_contact(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, contact_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<EmergencyContact>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state
            .safety
            .set_primary_emergency_contact(user_id, contact_id)
            .await?,
    ))
}

/// DELETE /api/users/{user_id}/emergency-contacts/{contact_id}
pub async fn delete_emergency_contact(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, contact_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    current.ensure_owner(user_id)?;
    state
        .safety
        .delete_emergency_contact(user_id, contact_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

// ----------------------------------------------------------------------
// Family sharing
// ----------------------------------------------------------------------

/// POST /api/users/{user_id}/family-sharing
pub async fn add_family_contact(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<FamilySharingRequest>,
) -> Result<(StatusCode, Json<FamilySharingContact>), AppError> {
    current.ensure_owner(user_id)?;
    let contact = state.safety.add_family_contact(user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(contact)))
}

/// GET /api/users/{user_id}/family-sharing
pub async fn list_family_contacts(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<FamilySharingContact>>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.safety.list_family_contacts(user_id).await?))
}

/// PUT /api/users/{user_id}/family-sharing/{sharing_id}
pub async fn update_family_contact(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, sharing_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<FamilySharingRequest>,
) -> Result<Json<FamilySharingContact>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state
            .safety
            .update_family_contact(user_id, sharing_id, &request)
            .await?,
    ))
}

/// PUT /api/users/{user_id}/family-sharing/{sharing_id}/ride-updates
pub async fn set_ride_updates(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, sharing_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<RideUpdatesRequest>,
) -> Result<Json<FamilySharingContact>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state
            .safety
            .set_ride_updates(user_id, sharing_id, request.enabled)
            .await?,
    ))
}

/// DELETE /api/users/{user_id}/family-sharing/{sharing_id}
pub async fn delete_family_contact(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, sharing_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    current.ensure_owner(user_id)?;
    state
        .safety
        .delete_family_contact(user_id, sharing_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users/{user_id}/safety-settings
pub async fn safety_settings(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<SafetySettings>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.safety.safety_settings(user_id).await?))
}

// ----------------------------------------------------------------------
// SOS
// ----------------------------------------------------------------------

/// Raise an SOS alert and notify emergency contacts (POST /api/users/{user_id}/sos).
pub async fn trigger_sos(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<TriggerSosRequest>,
) -> Result<(StatusCode, Json<SosAlert>), AppError> {
    current.ensure_owner(user_id)?;
    let alert = state.safety.trigger_sos(user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(alert)))
}

/// GET /api/users/{user_id}/sos
pub async fn list_sos_alerts(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<SosAlert>>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.safety.list_sos_alerts(user_id).await?))
}

/// GET /api/users/{user_id}/sos/active
pub async fn active_sos_alert(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Option<SosAlert>>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.safety.active_sos_alert(user_id).await?))
}

/// POST /api/users/{user_id}/sos/{alert_id}/resolve
pub async fn resolve_sos(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, alert_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<ResolveSosRequest>,
) -> Result<Json<SosAlert>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state
            .safety
            .resolve_sos(user_id, alert_id, request.notes)
            .await?,
    ))
}

/// POST /api/users/{user_id}/sos/{alert_id}/cancel
pub async fn cancel_sos(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, alert_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<SosAlert>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.safety.cancel_sos(user_id, alert_id).await?))
}

// ----------------------------------------------------------------------
// Location sharing
// ----------------------------------------------------------------------

/// POST /api/users/{user_id}/location-sharing
pub async fn start_location_sharing(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<LocationShareRequest>,
) -> Result<(StatusCode, Json<LocationShare>), AppError> {
    current.ensure_owner(user_id)?;
    let share = state
        .safety
        .start_location_sharing(user_id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(share)))
}

/// GET /api/users/{user_id}/location-sharing/active
pub async fn active_location_share(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Option<LocationShare>>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.safety.active_location_share(user_id).await?))
}

/// PUT /api/users/{user_id}/location-sharing/{share_id}
pub async fn update_shared_location(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, share_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<LocationUpdateRequest>,
) -> Result<Json<LocationShare>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state
            .safety
            .update_shared_location(user_id, share_id, &request)
            .await?,
    ))
}

/// DELETE /api/users/{user_id}/location-sharing/{share_id}
pub async fn end_location_sharing(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, share_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<LocationShare>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state
            .safety
            .end_location_sharing(user_id, share_id)
            .await?,
    ))
}

/// DELETE /api/users/{user_id}/location-sharing
pub async fn end_all_location_sharing(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    current.ensure_owner(user_id)?;
    let ended = state.safety.end_all_location_sharing(user_id).await?;
    Ok(Json(json!({ "shares_ended": ended })))
}

/// Follow a live share by its token (GET /api/location-shares/{token}). No login required.
pub async fn location_share_by_token(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<LocationShare>, AppError> {
    Ok(Json(state.safety.location_share_by_token(&token).await?))
}
