use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use officemate_auth::CurrentUser;
use officemate_core::auth::Permission;
use officemate_core::route::{RoutePreference, RoutePreferencesInput, RouteType};

use crate::handlers::AppError;
use crate::state::AppState;

/// Save both commute legs (PUT /api/users/{user_id}/route-preferences).
pub async fn save_route_preferences(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(input): Json<RoutePreferencesInput>,
) -> Result<Json<Vec<RoutePreference>>, AppError> {
    current.ensure_owner(user_id)?;
    current.require(Permission::AccessRideFeatures)?;
    Ok(Json(
        state.routes.save_route_preferences(user_id, &input).await?,
    ))
}

/// GET /api/users/{user_id}/route-preferences
pub async fn list_route_preferences(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<RoutePreference>>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.routes.list_route_preferences(user_id).await?))
}

/// GET /api/users/{user_id}/route-preferences/{route_type}
pub async fn get_route_preference(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, route_type)): Path<(Uuid, String)>,
) -> Result<Json<RoutePreference>, AppError> {
    current.ensure_owner(user_id)?;
    let route_type: RouteType = route_type.to_ascii_uppercase().parse()?;
    Ok(Json(
        state
            .routes
            .get_route_preference(user_id, route_type)
            .await?,
    ))
}

/// DELETE /api/users/{user_id}/route-preferences
pub async fn delete_route_preferences(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    current.ensure_owner(user_id)?;
    state.routes.delete_route_preferences(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
