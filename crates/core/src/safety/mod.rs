//! Emergency contacts, family sharing, SOS alerts and live location sharing.

mod error;
mod operations;
mod requests;
mod types;

pub use error::SafetyError;
pub use operations::{
    is_valid_phone, validate_coordinates, validate_emergency_contact, validate_family_contact,
    MAX_EMERGENCY_CONTACTS, MAX_FAMILY_SHARING_CONTACTS,
};
pub use requests::{
    EmergencyContactRequest, FamilySharingRequest, LocationShareRequest, LocationUpdateRequest,
    ResolveSosRequest, TriggerSosRequest,
};
pub use types::{EmergencyContact, FamilySharingContact, LocationShare, SosAlert, SosStatus};
