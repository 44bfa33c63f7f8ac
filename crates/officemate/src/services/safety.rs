use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use officemate_core::audit::{SecurityEvent, SecurityEventType, Severity};
use officemate_core::notify::{location_share_sms, sos_alert_sms, SmsSender};
use officemate_core::safety::{
    validate_coordinates, validate_emergency_contact, validate_family_contact, EmergencyContact,
    EmergencyContactRequest, FamilySharingContact, FamilySharingRequest, LocationShare,
    LocationShareRequest, LocationUpdateRequest, SafetyError, SosAlert, TriggerSosRequest,
    MAX_EMERGENCY_CONTACTS, MAX_FAMILY_SHARING_CONTACTS,
};
use officemate_core::storage::{
    EmergencyContactRepository, FamilySharingRepository, LocationShareRepository,
    ProfileRepository, RepositoryError, SecurityEventRepository, SosAlertRepository,
};

use super::AuditTrail;

/// Contacts and live state shown on the safety settings screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetySettings {
    pub emergency_contacts: Vec<EmergencyContact>,
    pub family_sharing_contacts: Vec<FamilySharingContact>,
    pub has_active_sos_alert: bool,
    pub location_sharing_active: bool,
}

/// Repositories behind [`SafetyService`].
#[derive(Clone)]
pub struct SafetyStores {
    pub emergency_contacts: Arc<dyn EmergencyContactRepository>,
    pub family_contacts: Arc<dyn FamilySharingRepository>,
    pub alerts: Arc<dyn SosAlertRepository>,
    pub shares: Arc<dyn LocationShareRepository>,
    pub profiles: Arc<dyn ProfileRepository>,
    pub security_events: Arc<dyn SecurityEventRepository>,
}

/// Emergency contacts, family sharing, SOS alerts and live location sharing.
///
/// Notification failures during an SOS never fail the alert itself; they are
/// logged and the remaining contacts are still tried.
#[derive(Clone)]
pub struct SafetyService {
    stores: SafetyStores,
    sms: Arc<dyn SmsSender>,
    audit: AuditTrail,
}

impl SafetyService {
    pub fn new(stores: SafetyStores, sms: Arc<dyn SmsSender>, audit: AuditTrail) -> Self {
        Self { stores, sms, audit }
    }

    // ------------------------------------------------------------------
    // Emergency contacts
    // ------------------------------------------------------------------

    pub async fn add_emergency_contact(
        &self,
        user_id: Uuid,
        request: &EmergencyContactRequest,
    ) -> Result<EmergencyContact> {
        validate_emergency_contact(request)?;

        let now = Utc::now();
        let contact = EmergencyContact {
            contact_id: Uuid::new_v4(),
            user_id,
            name: request.name.trim().to_string(),
            phone_number: request.phone_number.trim().to_string(),
            relationship: request.relationship.clone(),
            is_primary: request.is_primary,
            created_at: now,
            updated_at: now,
        };
        if !self
            .stores
            .emergency_contacts
            .create_emergency_contact(&contact, MAX_EMERGENCY_CONTACTS)
            .await?
        {
            return Err(SafetyError::EmergencyContactLimit(MAX_EMERGENCY_CONTACTS).into());
        }

        tracing::info!(
            user_id = %user_id,
            contact_id = %contact.contact_id,
            is_primary = contact.is_primary,
            "Emergency contact added"
        );
        self.audit
            .created(user_id, "EmergencyContact", contact.contact_id)
            .await;
        Ok(contact)
    }

    /// Primary contact first.
    pub async fn list_emergency_contacts(&self, user_id: Uuid) -> Result<Vec<EmergencyContact>> {
        Ok(self
            .stores
            .emergency_contacts
            .list_emergency_contacts(user_id)
            .await?)
    }

    pub async fn primary_emergency_contact(
        &self,
        user_id: Uuid,
    ) -> Result<Option<EmergencyContact>> {
        Ok(self
            .list_emergency_contacts(user_id)
            .await?
            .into_iter()
            .find(|c| c.is_primary))
    }

    pub async fn update_emergency_contact(
        &self,
        user_id: Uuid,
        contact_id: Uuid,
        request: &EmergencyContactRequest,
    ) -> Result<EmergencyContact> {
        validate_emergency_contact(request)?;
        let mut contact = self.owned_emergency_contact(user_id, contact_id).await?;

        contact.name = request.name.trim().to_string();
        contact.phone_number = request.phone_number.trim().to_string();
        contact.relationship = request.relationship.clone();
        contact.is_primary = request.is_primary;
        contact.updated_at = Utc::now();
        self.stores
            .emergency_contacts
            .update_emergency_contact(&contact)
            .await?;

        tracing::info!(user_id = %user_id, contact_id = %contact_id, "Emergency contact updated");
        self.audit
            .updated(user_id, "EmergencyContact", contact_id, "Emergency contact updated")
            .await;
        Ok(contact)
    }

    pub async fn set_primary_emergency_contact(
        &self,
        user_id: Uuid,
        contact_id: Uuid,
    ) -> Result<EmergencyContact> {
        let mut contact = self.owned_emergency_contact(user_id, contact_id).await?;
        contact.is_primary = true;
        contact.updated_at = Utc::now();
        self.stores
            .emergency_contacts
            .update_emergency_contact(&contact)
            .await?;

        tracing::info!(user_id = %user_id, contact_id = %contact_id, "Primary emergency contact set");
        self.audit
            .changed(
                user_id,
                "EmergencyContact",
                contact_id,
                "is_primary",
                None,
                Some("true".to_string()),
            )
            .await;
        Ok(contact)
    }

    pub async fn delete_emergency_contact(&self, user_id: Uuid, contact_id: Uuid) -> Result<()> {
        self.owned_emergency_contact(user_id, contact_id).await?;
        self.stores
            .emergency_contacts
            .delete_emergency_contact(contact_id)
            .await?;

        tracing::info!(user_id = %user_id, contact_id = %contact_id, "Emergency contact deleted");
        self.audit
            .deleted(user_id, "EmergencyContact", contact_id)
            .await;
        Ok(())
    }

    async fn owned_emergency_contact(
        &self,
        user_id: Uuid,
        contact_id: Uuid,
    ) -> Result<EmergencyContact> {
        Ok(self
            .stores
            .emergency_contacts
            .get_emergency_contact(contact_id)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or(SafetyError::EmergencyContactNotFound)?)
    }

    // ------------------------------------------------------------------
    // Family sharing
    // ------------------------------------------------------------------

    /// Ride updates default to on.
    pub async fn add_family_contact(
        &self,
        user_id: Uuid,
        request: &FamilySharingRequest,
    ) -> Result<FamilySharingContact> {
        validate_family_contact(request)?;

        let now = Utc::now();
        let contact = FamilySharingContact {
            sharing_id: Uuid::new_v4(),
            user_id,
            name: request.name.trim().to_string(),
            phone_number: request.phone_number.clone(),
            email: request.email.clone(),
            receive_ride_updates: request.receive_ride_updates.unwrap_or(true),
            created_at: now,
            updated_at: now,
        };
        if !self
            .stores
            .family_contacts
            .create_family_contact(&contact, MAX_FAMILY_SHARING_CONTACTS)
            .await?
        {
            return Err(SafetyError::FamilySharingLimit(MAX_FAMILY_SHARING_CONTACTS).into());
        }

        tracing::info!(user_id = %user_id, sharing_id = %contact.sharing_id, "Family contact added");
        self.audit
            .created(user_id, "FamilySharingContact", contact.sharing_id)
            .await;
        Ok(contact)
    }

    pub async fn list_family_contacts(&self, user_id: Uuid) -> Result<Vec<FamilySharingContact>> {
        Ok(self
            .stores
            .family_contacts
            .list_family_contacts(user_id)
            .await?)
    }

    /// An absent `receive_ride_updates` keeps the current setting.
    pub async fn update_family_contact(
        &self,
        user_id: Uuid,
        sharing_id: Uuid,
        request: &FamilySharingRequest,
    ) -> Result<FamilySharingContact> {
        validate_family_contact(request)?;
        let mut contact = self.owned_family_contact(user_id, sharing_id).await?;

        contact.name = request.name.trim().to_string();
        contact.phone_number = request.phone_number.clone();
        contact.email = request.email.clone();
        if let Some(enabled) = request.receive_ride_updates {
            contact.receive_ride_updates = enabled;
        }
        contact.updated_at = Utc::now();
        self.stores
            .family_contacts
            .update_family_contact(&contact)
            .await?;

        tracing::info!(user_id = %user_id, sharing_id = %sharing_id, "Family contact updated");
        self.audit
            .updated(user_id, "FamilySharingContact", sharing_id, "Family contact updated")
            .await;
        Ok(contact)
    }

    pub async fn set_ride_updates(
        &self,
        user_id: Uuid,
        sharing_id: Uuid,
        enabled: bool,
    ) -> Result<FamilySharingContact> {
        let mut contact = self.owned_family_contact(user_id, sharing_id).await?;
        contact.receive_ride_updates = enabled;
        contact.updated_at = Utc::now();
        self.stores
            .family_contacts
            .update_family_contact(&contact)
            .await?;

        tracing::info!(
            user_id = %user_id,
            sharing_id = %sharing_id,
            enabled,
            "Family ride updates toggled"
        );
        self.audit
            .changed(
                user_id,
                "FamilySharingContact",
                sharing_id,
                "receive_ride_updates",
                None,
                Some(enabled.to_string()),
            )
            .await;
        Ok(contact)
    }

    pub async fn delete_family_contact(&self, user_id: Uuid, sharing_id: Uuid) -> Result<()> {
        self.owned_family_contact(user_id, sharing_id).await?;
        self.stores
            .family_contacts
            .delete_family_contact(sharing_id)
            .await?;

        tracing::info!(user_id = %user_id, sharing_id = %sharing_id, "Family contact deleted");
        self.audit
            .deleted(user_id, "FamilySharingContact", sharing_id)
            .await;
        Ok(())
    }

    async fn owned_family_contact(
        &self,
        user_id: Uuid,
        sharing_id: Uuid,
    ) -> Result<FamilySharingContact> {
        Ok(self
            .stores
            .family_contacts
            .get_family_contact(sharing_id)
            .await?
            .filter(|c| c.user_id == user_id)
            .ok_or(SafetyError::FamilyContactNotFound)?)
    }

    pub async fn safety_settings(&self, user_id: Uuid) -> Result<SafetySettings> {
        Ok(SafetySettings {
            emergency_contacts: self.list_emergency_contacts(user_id).await?,
            family_sharing_contacts: self.list_family_contacts(user_id).await?,
            has_active_sos_alert: self.active_sos_alert(user_id).await?.is_some(),
            location_sharing_active: self.active_location_share(user_id).await?.is_some(),
        })
    }

    // ------------------------------------------------------------------
    // SOS
    // ------------------------------------------------------------------

    /// Raises an alert, texts every emergency contact and starts location
    /// sharing if none is running.
    pub async fn trigger_sos(&self, user_id: Uuid, request: &TriggerSosRequest) -> Result<SosAlert> {
        let (latitude, longitude) = validate_coordinates(request.latitude, request.longitude)?;
        if self.stores.alerts.get_active_alert(user_id).await?.is_some() {
            return Err(SafetyError::ActiveSosExists.into());
        }

        let now = Utc::now();
        let alert = SosAlert::trigger(
            user_id,
            request.ride_id,
            latitude,
            longitude,
            request.message.clone(),
            now,
        );
        match self.stores.alerts.create_alert(&alert).await {
            Ok(()) => {}
            Err(RepositoryError::AlreadyExists { .. }) => {
                return Err(SafetyError::ActiveSosExists.into())
            }
            Err(e) => return Err(e.into()),
        }
        tracing::warn!(
            user_id = %user_id,
            alert_id = %alert.alert_id,
            "SOS alert triggered"
        );

        self.notify_emergency_contacts(&alert).await;

        match self.stores.shares.get_active_share(user_id).await {
            Ok(Some(_)) => {}
            Ok(None) => {
                let share = LocationShare::start(user_id, request.ride_id, latitude, longitude, now);
                match self.stores.shares.create_share(&share).await {
                    Ok(()) => {
                        tracing::info!(
                            user_id = %user_id,
                            share_id = %share.share_id,
                            "Location sharing started for SOS"
                        );
                        self.notify_family_contacts(&share).await;
                    }
                    Err(e) => {
                        tracing::error!(user_id = %user_id, error = %e, "Failed to start SOS location sharing")
                    }
                }
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Failed to check location sharing")
            }
        }

        let event = SecurityEvent::new(
            Some(user_id),
            SecurityEventType::SosTriggered,
            Severity::High,
            format!("SOS alert {} triggered", alert.alert_id),
            now,
        );
        if let Err(e) = self.stores.security_events.record_event(&event).await {
            tracing::error!(user_id = %user_id, error = %e, "Failed to record SOS event");
        }

        Ok(alert)
    }

    /// Newest first.
    pub async fn list_sos_alerts(&self, user_id: Uuid) -> Result<Vec<SosAlert>> {
        Ok(self.stores.alerts.list_alerts(user_id).await?)
    }

    pub async fn active_sos_alert(&self, user_id: Uuid) -> Result<Option<SosAlert>> {
        Ok(self.stores.alerts.get_active_alert(user_id).await?)
    }

    pub async fn resolve_sos(
        &self,
        user_id: Uuid,
        alert_id: Uuid,
        notes: Option<String>,
    ) -> Result<SosAlert> {
        let mut alert = self.owned_alert(user_id, alert_id).await?;
        alert.resolve(user_id, notes, Utc::now())?;
        self.stores.alerts.update_alert(&alert).await?;

        tracing::info!(user_id = %user_id, alert_id = %alert_id, "SOS alert resolved");
        Ok(alert)
    }

    pub async fn cancel_sos(&self, user_id: Uuid, alert_id: Uuid) -> Result<SosAlert> {
        let mut alert = self.owned_alert(user_id, alert_id).await?;
        alert.cancel(Utc::now())?;
        self.stores.alerts.update_alert(&alert).await?;

        tracing::info!(user_id = %user_id, alert_id = %alert_id, "SOS alert cancelled");
        Ok(alert)
    }

    async fn owned_alert(&self, user_id: Uuid, alert_id: Uuid) -> Result<SosAlert> {
        Ok(self
            .stores
            .alerts
            .get_alert(alert_id)
            .await?
            .filter(|a| a.user_id == user_id)
            .ok_or(SafetyError::SosNotFound)?)
    }

    async fn notify_emergency_contacts(&self, alert: &SosAlert) {
        let contacts = match self.list_emergency_contacts(alert.user_id).await {
            Ok(contacts) => contacts,
            Err(e) => {
                tracing::error!(user_id = %alert.user_id, error = %e, "Failed to load emergency contacts");
                return;
            }
        };
        if contacts.is_empty() {
            tracing::warn!(user_id = %alert.user_id, "No emergency contacts to notify");
            return;
        }

        let name = self.display_name(alert.user_id).await;
        let text = sos_alert_sms(
            &name,
            alert.latitude,
            alert.longitude,
            alert.message.as_deref(),
        );
        let mut delivered = 0usize;
        for contact in &contacts {
            match self.sms.send_sms(&contact.phone_number, &text).await {
                Ok(_) => delivered += 1,
                Err(e) => tracing::error!(
                    contact_id = %contact.contact_id,
                    error = %e,
                    "Failed to notify emergency contact"
                ),
            }
        }

        tracing::info!(
            alert_id = %alert.alert_id,
            delivered,
            total = contacts.len(),
            "Emergency contacts notified"
        );
    }

    // ------------------------------------------------------------------
    // Location sharing
    // ------------------------------------------------------------------

    /// Reuses the active share when there is one, moving it to the new position.
    pub async fn start_location_sharing(
        &self,
        user_id: Uuid,
        request: &LocationShareRequest,
    ) -> Result<LocationShare> {
        let (latitude, longitude) =
            validate_coordinates(Some(request.latitude), Some(request.longitude))?;
        let now = Utc::now();

        if let Some(mut share) = self.stores.shares.get_active_share(user_id).await? {
            share.update_location(latitude, longitude, now)?;
            self.stores.shares.update_share(&share).await?;
            tracing::debug!(user_id = %user_id, share_id = %share.share_id, "Active share reused");
            return Ok(share);
        }

        let share = LocationShare::start(user_id, request.ride_id, latitude, longitude, now);
        self.stores.shares.create_share(&share).await?;
        tracing::info!(user_id = %user_id, share_id = %share.share_id, "Location sharing started");

        self.notify_family_contacts(&share).await;
        Ok(share)
    }

    pub async fn update_shared_location(
        &self,
        user_id: Uuid,
        share_id: Uuid,
        request: &LocationUpdateRequest,
    ) -> Result<LocationShare> {
        let (latitude, longitude) =
            validate_coordinates(Some(request.latitude), Some(request.longitude))?;
        let mut share = self.owned_share(user_id, share_id).await?;
        share.update_location(latitude, longitude, Utc::now())?;
        self.stores.shares.update_share(&share).await?;
        Ok(share)
    }

    pub async fn active_location_share(&self, user_id: Uuid) -> Result<Option<LocationShare>> {
        Ok(self.stores.shares.get_active_share(user_id).await?)
    }

    /// Public lookup used by family contacts following a share.
    pub async fn location_share_by_token(&self, share_token: &str) -> Result<LocationShare> {
        let share = self
            .stores
            .shares
            .get_share_by_token(share_token)
            .await?
            .ok_or(SafetyError::LocationShareNotFound)?;
        if !share.is_active {
            return Err(SafetyError::LocationShareNotActive.into());
        }
        Ok(share)
    }

    pub async fn end_location_sharing(&self, user_id: Uuid, share_id: Uuid) -> Result<LocationShare> {
        let mut share = self.owned_share(user_id, share_id).await?;
        if !share.is_active {
            return Err(SafetyError::LocationShareNotActive.into());
        }
        share.end(Utc::now());
        self.stores.shares.update_share(&share).await?;

        tracing::info!(user_id = %user_id, share_id = %share_id, "Location sharing ended");
        Ok(share)
    }

    /// Returns how many shares were ended.
    pub async fn end_all_location_sharing(&self, user_id: Uuid) -> Result<usize> {
        let now = Utc::now();
        let shares = self.stores.shares.list_active_shares(user_id).await?;
        for mut share in shares.iter().cloned() {
            share.end(now);
            self.stores.shares.update_share(&share).await?;
        }

        tracing::info!(user_id = %user_id, ended = shares.len(), "All location sharing ended");
        Ok(shares.len())
    }

    async fn owned_share(&self, user_id: Uuid, share_id: Uuid) -> Result<LocationShare> {
        Ok(self
            .stores
            .shares
            .get_share(share_id)
            .await?
            .filter(|s| s.user_id == user_id)
            .ok_or(SafetyError::LocationShareNotFound)?)
    }

    /// Texts the share token to family contacts who receive ride updates.
    async fn notify_family_contacts(&self, share: &LocationShare) {
        let contacts = match self.list_family_contacts(share.user_id).await {
            Ok(contacts) => contacts,
            Err(e) => {
                tracing::error!(user_id = %share.user_id, error = %e, "Failed to load family contacts");
                return;
            }
        };

        let name = self.display_name(share.user_id).await;
        let text = location_share_sms(&name, &share.share_token);
        for contact in contacts.iter().filter(|c| c.receive_ride_updates) {
            let Some(phone) = &contact.phone_number else {
                continue;
            };
            if let Err(e) = self.sms.send_sms(phone, &text).await {
                tracing::error!(
                    sharing_id = %contact.sharing_id,
                    error = %e,
                    "Failed to notify family contact"
                );
            }
        }
    }

    async fn display_name(&self, user_id: Uuid) -> String {
        match self.stores.profiles.get_profile(user_id).await {
            Ok(Some(profile)) => format!("{} {}", profile.first_name, profile.last_name),
            _ => "An OfficeMate member".to_string(),
        }
    }
}
