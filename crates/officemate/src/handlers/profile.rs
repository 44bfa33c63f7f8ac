use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use officemate_auth::CurrentUser;
use officemate_core::profile::{
    CreateProfileRequest, DriverProfile, DriverProfileRequest, GenderPreference, ProfileError,
    ProfileView, RiderProfile, RiderProfileRequest, UpdateDriverProfileRequest,
    UpdateProfileRequest, UpdateRiderProfileRequest, VehicleType,
};

use crate::handlers::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GenderPreferenceRequest {
    pub gender_preference: GenderPreference,
}

fn vehicle_type(raw: &str) -> Result<VehicleType, ProfileError> {
    raw.to_ascii_uppercase().parse().map_err(ProfileError::Validation)
}

/// Create the basic profile (POST /api/users/{user_id}/profile).
pub async fn create_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<CreateProfileRequest>,
) -> Result<(StatusCode, Json<ProfileView>), AppError> {
    current.ensure_owner(user_id)?;
    let view = state.profiles.create_basic_profile(user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/users/{user_id}/profile
pub async fn get_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<ProfileView>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.profiles.get_profile(user_id).await?))
}

/// PUT /api/users/{user_id}/profile
pub async fn update_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileView>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.profiles.update_profile(user_id, &request).await?))
}

/// POST /api/users/{user_id}/profile/driver
pub async fn create_driver_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<DriverProfileRequest>,
) -> Result<(StatusCode, Json<DriverProfile>), AppError> {
    current.ensure_owner(user_id)?;
    let driver = state
        .profiles
        .create_driver_profile(user_id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(driver)))
}

/// GET /api/users/{user_id}/profile/driver
pub async fn get_driver_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<DriverProfile>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.profiles.get_driver_profile(user_id).await?))
}

/// PUT /api/users/{user_id}/profile/driver
pub async fn update_driver_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateDriverProfileRequest>,
) -> Result<Json<DriverProfile>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state
            .profiles
            .update_driver_profile(user_id, &request)
            .await?,
    ))
}

/// Mark the driver's license as checked (POST /api/users/{user_id}/profile/driver/verify-license).
pub async fn verify_driver_license(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<DriverProfile>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.profiles.verify_driver_license(user_id).await?))
}

/// DELETE /api/users/{user_id}/profile/driver
pub async fn delete_driver_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    current.ensure_owner(user_id)?;
    state.profiles.delete_driver_profile(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/users/{user_id}/profile/rider
pub async fn create_rider_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<RiderProfileRequest>,
) -> Result<(StatusCode, Json<RiderProfile>), AppError> {
    current.ensure_owner(user_id)?;
    let rider = state.profiles.create_rider_profile(user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(rider)))
}

/// GET /api/users/{user_id}/profile/rider
pub async fn get_rider_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<Json<RiderProfile>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(state.profiles.get_rider_profile(user_id).await?))
}

/// PUT /api/users/{user_id}/profile/rider
pub async fn update_rider_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<UpdateRiderProfileRequest>,
) -> Result<Json<RiderProfile>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state.profiles.update_rider_profile(user_id, &request).await?,
    ))
}

/// PUT /api/users/{user_id}/profile/rider/gender-preference
pub async fn set_gender_preference(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
    Json(request): Json<GenderPreferenceRequest>,
) -> Result<Json<RiderProfile>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state
            .profiles
            .set_gender_preference(user_id, request.gender_preference)
            .await?,
    ))
}

/// POST /api/users/{user_id}/profile/rider/vehicle-types/{vehicle_type}
pub async fn add_vehicle_type_preference(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, raw)): Path<(Uuid, String)>,
) -> Result<Json<RiderProfile>, AppError> {
    current.ensure_owner(user_id)?;
    let vehicle_type = vehicle_type(&raw)?;
    Ok(Json(
        state
            .profiles
            .add_vehicle_type_preference(user_id, vehicle_type)
            .await?,
    ))
}

/// DELETE /api/users/{user_id}/profile/rider/vehicle-types/{vehicle_type}
pub async fn remove_vehicle_type_preference(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, raw)): Path<(Uuid, String)>,
) -> Result<Json<RiderProfile>, AppError> {
    current.ensure_owner(user_id)?;
    let vehicle_type = vehicle_type(&raw)?;
    Ok(Json(
        state
            .profiles
            .remove_vehicle_type_preference(user_id, vehicle_type)
            .await?,
    ))
}

/// POST /api/users/{user_id}/profile/rider/favorite-drivers/{driver_id}
pub async fn add_favorite_driver(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, driver_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RiderProfile>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state.profiles.add_favorite_driver(user_id, driver_id).await?,
    ))
}

/// DELETE /api/users/{user_id}/profile/rider/favorite-drivers/{driver_id}
pub async fn remove_favorite_driver(
    State(state): State<AppState>,
    current: CurrentUser,
    Path((user_id, driver_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<RiderProfile>, AppError> {
    current.ensure_owner(user_id)?;
    Ok(Json(
        state
            .profiles
            .remove_favorite_driver(user_id, driver_id)
            .await?,
    ))
}

/// DELETE /api/users/{user_id}/profile/rider
pub async fn delete_rider_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    current.ensure_owner(user_id)?;
    state.profiles.delete_rider_profile(user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
