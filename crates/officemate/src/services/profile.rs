use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use uuid::Uuid;

use officemate_core::account::UserAccount;
use officemate_core::profile::{
    add_unique, apply_driver_update, apply_profile_update, apply_rider_update,
    build_driver_profile, build_rider_profile, build_user_profile, remove_item,
    CreateProfileRequest, DriverProfile, DriverProfileRequest, GenderPreference, ProfileError,
    ProfileView, RiderProfile, RiderProfileRequest, UpdateDriverProfileRequest,
    UpdateProfileRequest, UpdateRiderProfileRequest, VehicleType,
};
use officemate_core::route::RoutePreferencesInput;
use officemate_core::storage::{
    AccountRepository, ProfileRepository, RepositoryError, WalletRepository,
};

use super::{AuditTrail, RoutePreferenceService};

/// Basic, driver and rider profiles.
///
/// Creating any profile requires a fully verified account. Route preferences
/// submitted with a driver or rider profile are stored through
/// [`RoutePreferenceService`] and shared between both roles.
#[derive(Clone)]
pub struct ProfileService {
    accounts: Arc<dyn AccountRepository>,
    profiles: Arc<dyn ProfileRepository>,
    wallets: Arc<dyn WalletRepository>,
    routes: RoutePreferenceService,
    audit: AuditTrail,
}

impl ProfileService {
    pub fn new(
        accounts: Arc<dyn AccountRepository>,
        profiles: Arc<dyn ProfileRepository>,
        wallets: Arc<dyn WalletRepository>,
        routes: RoutePreferenceService,
        audit: AuditTrail,
    ) -> Self {
        Self {
            accounts,
            profiles,
            wallets,
            routes,
            audit,
        }
    }

    pub async fn create_basic_profile(
        &self,
        user_id: Uuid,
        request: &CreateProfileRequest,
    ) -> Result<ProfileView> {
        self.verified_account(user_id).await?;
        if self.profiles.get_profile(user_id).await?.is_some() {
            return Err(ProfileError::ProfileExists.into());
        }

        let profile = build_user_profile(user_id, request, Utc::now())?;
        match self.profiles.create_profile(&profile).await {
            Ok(()) => {}
            Err(RepositoryError::AlreadyExists { .. }) => {
                return Err(ProfileError::ProfileExists.into())
            }
            Err(e) => return Err(e.into()),
        }

        tracing::info!(user_id = %user_id, "Profile created");
        self.audit.created(user_id, "UserProfile", user_id).await;
        self.get_profile(user_id).await
    }

    /// Aggregated view with driver, rider and wallet sections.
    pub async fn get_profile(&self, user_id: Uuid) -> Result<ProfileView> {
        let account = self.account(user_id).await?;
        let profile = self
            .profiles
            .get_profile(user_id)
            .await?
            .ok_or(ProfileError::ProfileNotFound)?;
        let driver = self.profiles.get_driver_profile(user_id).await?;
        let rider = self.profiles.get_rider_profile(user_id).await?;
        let wallet = self.wallets.get_wallet_by_user(user_id).await?;

        Ok(ProfileView::assemble(
            &profile,
            &account,
            driver,
            rider,
            wallet.as_ref(),
        ))
    }

    pub async fn update_profile(
        &self,
        user_id: Uuid,
        request: &UpdateProfileRequest,
    ) -> Result<ProfileView> {
        let mut profile = self
            .profiles
            .get_profile(user_id)
            .await?
            .ok_or(ProfileError::ProfileNotFound)?;
        apply_profile_update(&mut profile, request, Utc::now())?;
        self.profiles.update_profile(&profile).await?;

        tracing::info!(user_id = %user_id, "Profile updated");
        self.audit
            .updated(user_id, "UserProfile", user_id, "Profile updated")
            .await;
        self.get_profile(user_id).await
    }

    /// One driver profile per user; license numbers are unique across drivers.
    pub async fn create_driver_profile(
        &self,
        user_id: Uuid,
        request: &DriverProfileRequest,
    ) -> Result<DriverProfile> {
        self.verified_account(user_id).await?;
        if self.profiles.get_driver_profile(user_id).await?.is_some() {
            return Err(ProfileError::DriverProfileExists.into());
        }
        self.ensure_license_available(user_id, &request.license_number)
            .await?;

        let driver = build_driver_profile(user_id, request, Utc::now())?;
        self.profiles.save_driver_profile(&driver).await?;
        self.save_routes(user_id, request.route_preferences.as_ref())
            .await?;

        tracing::info!(
            user_id = %user_id,
            vehicle_type = driver.vehicle.vehicle_type.as_str(),
            "Driver profile created"
        );
        self.audit.created(user_id, "DriverProfile", user_id).await;
        Ok(driver)
    }

    pub async fn get_driver_profile(&self, user_id: Uuid) -> Result<DriverProfile> {
        Ok(self
            .profiles
            .get_driver_profile(user_id)
            .await?
            .ok_or(ProfileError::DriverProfileNotFound)?)
    }

    /// A changed license number or expiry puts the license back to unverified.
    pub async fn update_driver_profile(
        &self,
        user_id: Uuid,
        request: &UpdateDriverProfileRequest,
    ) -> Result<DriverProfile> {
        let mut driver = self.get_driver_profile(user_id).await?;
        if let Some(number) = request
            .license_number
            .as_ref()
            .filter(|number| **number != driver.license_number)
        {
            self.ensure_license_available(user_id, number).await?;
        }

        let license_changed = apply_driver_update(&mut driver, request, Utc::now())?;
        self.profiles.save_driver_profile(&driver).await?;
        self.save_routes(user_id, request.route_preferences.as_ref())
            .await?;

        tracing::info!(
            user_id = %user_id,
            license_changed,
            "Driver profile updated"
        );
        self.audit
            .updated(user_id, "DriverProfile", user_id, "Driver profile updated")
            .await;
        Ok(driver)
    }

    pub async fn verify_driver_license(&self, user_id: Uuid) -> Result<DriverProfile> {
        let mut driver = self.get_driver_profile(user_id).await?;
        let was_verified = driver.license_verified;
        driver.license_verified = true;
        driver.updated_at = Utc::now();
        self.profiles.save_driver_profile(&driver).await?;

        tracing::info!(user_id = %user_id, "Driver license verified");
        self.audit
            .changed(
                user_id,
                "DriverProfile",
                user_id,
                "license_verified",
                Some(was_verified.to_string()),
                Some("true".to_string()),
            )
            .await;
        Ok(driver)
    }

    /// Route preferences go too unless a rider profile still uses them.
    pub async fn delete_driver_profile(&self, user_id: Uuid) -> Result<()> {
        self.get_driver_profile(user_id).await?;
        self.profiles.delete_driver_profile(user_id).await?;
        if self.profiles.get_rider_profile(user_id).await?.is_none() {
            self.routes.delete_route_preferences(user_id).await?;
        }

        tracing::info!(user_id = %user_id, "Driver profile deleted");
        self.audit.deleted(user_id, "DriverProfile", user_id).await;
        Ok(())
    }

    pub async fn create_rider_profile(
        &self,
        user_id: Uuid,
        request: &RiderProfileRequest,
    ) -> Result<RiderProfile> {
        self.verified_account(user_id).await?;
        if self.profiles.get_rider_profile(user_id).await?.is_some() {
            return Err(ProfileError::RiderProfileExists.into());
        }

        let rider = build_rider_profile(user_id, request, Utc::now())?;
        self.profiles.save_rider_profile(&rider).await?;
        self.save_routes(user_id, Some(&request.route_preferences))
            .await?;

        tracing::info!(user_id = %user_id, "Rider profile created");
        self.audit.created(user_id, "RiderProfile", user_id).await;
        Ok(rider)
    }

    pub async fn get_rider_profile(&self, user_id: Uuid) -> Result<RiderProfile> {
        Ok(self
            .profiles
            .get_rider_profile(user_id)
            .await?
            .ok_or(ProfileError::RiderProfileNotFound)?)
    }

    pub async fn update_rider_profile(
        &self,
        user_id: Uuid,
        request: &UpdateRiderProfileRequest,
    ) -> Result<RiderProfile> {
        let mut rider = self.get_rider_profile(user_id).await?;
        apply_rider_update(&mut rider, request, Utc::now())?;
        self.profiles.save_rider_profile(&rider).await?;
        self.save_routes(user_id, request.route_preferences.as_ref())
            .await?;

        tracing::info!(user_id = %user_id, "Rider profile updated");
        self.audit
            .updated(user_id, "RiderProfile", user_id, "Rider profile updated")
            .await;
        Ok(rider)
    }

    pub async fn set_gender_preference(
        &self,
        user_id: Uuid,
        preference: GenderPreference,
    ) -> Result<RiderProfile> {
        self.edit_rider(user_id, |rider| {
            rider.gender_preference = preference;
            Ok(())
        })
        .await
    }

    pub async fn add_vehicle_type_preference(
        &self,
        user_id: Uuid,
        vehicle_type: VehicleType,
    ) -> Result<RiderProfile> {
        self.edit_rider(user_id, |rider| {
            add_unique(&mut rider.vehicle_type_preferences, vehicle_type);
            Ok(())
        })
        .await
    }

    pub async fn remove_vehicle_type_preference(
        &self,
        user_id: Uuid,
        vehicle_type: VehicleType,
    ) -> Result<RiderProfile> {
        self.edit_rider(user_id, |rider| {
            remove_item(&mut rider.vehicle_type_preferences, &vehicle_type);
            Ok(())
        })
        .await
    }

    pub async fn add_favorite_driver(&self, user_id: Uuid, driver_id: Uuid) -> Result<RiderProfile> {
        self.edit_rider(user_id, |rider| {
            if driver_id == rider.rider_id {
                return Err(ProfileError::Validation(
                    "Riders cannot add themselves as a favorite driver".to_string(),
                ));
            }
            add_unique(&mut rider.favorite_drivers, driver_id);
            Ok(())
        })
        .await
    }

    pub async fn remove_favorite_driver(
        &self,
        user_id: Uuid,
        driver_id: Uuid,
    ) -> Result<RiderProfile> {
        self.edit_rider(user_id, |rider| {
            remove_item(&mut rider.favorite_drivers, &driver_id);
            Ok(())
        })
        .await
    }

    pub async fn delete_rider_profile(&self, user_id: Uuid) -> Result<()> {
        self.get_rider_profile(user_id).await?;
        self.profiles.delete_rider_profile(user_id).await?;
        if self.profiles.get_driver_profile(user_id).await?.is_none() {
            self.routes.delete_route_preferences(user_id).await?;
        }

        tracing::info!(user_id = %user_id, "Rider profile deleted");
        self.audit.deleted(user_id, "RiderProfile", user_id).await;
        Ok(())
    }

    async fn edit_rider(
        &self,
        user_id: Uuid,
        edit: impl FnOnce(&mut RiderProfile) -> Result<(), ProfileError>,
    ) -> Result<RiderProfile> {
        let mut rider = self.get_rider_profile(user_id).await?;
        edit(&mut rider)?;
        rider.updated_at = Utc::now();
        self.profiles.save_rider_profile(&rider).await?;
        self.audit
            .updated(user_id, "RiderProfile", user_id, "Rider preferences updated")
            .await;
        Ok(rider)
    }

    async fn save_routes(
        &self,
        user_id: Uuid,
        input: Option<&RoutePreferencesInput>,
    ) -> Result<()> {
        if let Some(input) = input {
            self.routes.save_route_preferences(user_id, input).await?;
        }
        Ok(())
    }

    async fn ensure_license_available(&self, user_id: Uuid, license_number: &str) -> Result<()> {
        match self.profiles.find_driver_by_license(license_number).await? {
            Some(existing) if existing.driver_id != user_id => {
                tracing::warn!(user_id = %user_id, "License number already registered");
                Err(ProfileError::LicenseAlreadyRegistered(license_number.to_string()).into())
            }
            _ => Ok(()),
        }
    }

    async fn account(&self, user_id: Uuid) -> Result<UserAccount> {
        Ok(self
            .accounts
            .get_account(user_id)
            .await?
            .ok_or(ProfileError::AccountNotFound)?)
    }

    async fn verified_account(&self, user_id: Uuid) -> Result<UserAccount> {
        let account = self.account(user_id).await?;
        if !account.is_fully_verified() {
            tracing::warn!(
                user_id = %user_id,
                mobile_verified = account.phone_verified,
                email_verified = account.email_verified,
                "Profile access denied, verification incomplete"
            );
            return Err(ProfileError::VerificationRequired {
                mobile_verified: account.phone_verified,
                email_verified: account.email_verified,
            }
            .into());
        }
        Ok(account)
    }
}
