use std::sync::LazyLock;

use regex::Regex;

use super::{EmergencyContactRequest, FamilySharingRequest, SafetyError};
use crate::email::is_valid_email_format;

pub const MAX_EMERGENCY_CONTACTS: usize = 5;
pub const MAX_FAMILY_SHARING_CONTACTS: usize = 10;

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[1-9]\d{1,14}$").expect("valid phone regex"));

/// Loose international phone check, ignoring spaces and dashes.
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone
        .chars()
        .filter(|c| !matches!(c, ' ' | '-'))
        .collect();
    PHONE_PATTERN.is_match(&compact)
}

pub fn validate_emergency_contact(request: &EmergencyContactRequest) -> Result<(), SafetyError> {
    if request.name.trim().is_empty() {
        return Err(SafetyError::Validation("Contact name is required".to_string()));
    }
    if request.phone_number.trim().is_empty() {
        return Err(SafetyError::Validation("Phone number is required".to_string()));
    }
    if !is_valid_phone(&request.phone_number) {
        return Err(SafetyError::Validation(
            "Invalid phone number format".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_family_contact(request: &FamilySharingRequest) -> Result<(), SafetyError> {
    if request.name.trim().is_empty() {
        return Err(SafetyError::Validation("Contact name is required".to_string()));
    }
    if request.phone_number.is_none() && request.email.is_none() {
        return Err(SafetyError::Validation(
            "Either phone number or email is required".to_string(),
        ));
    }
    if let Some(phone) = &request.phone_number {
        if !is_valid_phone(phone) {
            return Err(SafetyError::Validation(
                "Invalid phone number format".to_string(),
            ));
        }
    }
    if let Some(email) = &request.email {
        if !is_valid_email_format(email) {
            return Err(SafetyError::Validation("Invalid email format".to_string()));
        }
    }
    Ok(())
}

/// Requires both coordinates and checks their ranges.
pub fn validate_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<(f64, f64), SafetyError> {
    let (Some(latitude), Some(longitude)) = (latitude, longitude) else {
        return Err(SafetyError::MissingCoordinates);
    };
    if !(-90.0..=90.0).contains(&latitude) {
        return Err(SafetyError::InvalidLatitude);
    }
    if !(-180.0..=180.0).contains(&longitude) {
        return Err(SafetyError::InvalidLongitude);
    }
    Ok((latitude, longitude))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emergency(name: &str, phone: &str) -> EmergencyContactRequest {
        EmergencyContactRequest {
            name: name.to_string(),
            phone_number: phone.to_string(),
            relationship: Some("Sister".to_string()),
            is_primary: false,
        }
    }

    #[test]
    fn phone_check_accepts_common_formats() {
        assert!(is_valid_phone("+91 98765-43210"));
        assert!(is_valid_phone("9876543210"));
        assert!(!is_valid_phone("0123"));
        assert!(!is_valid_phone("call me"));
    }

    #[test]
    fn emergency_contact_requires_name_and_valid_phone() {
        assert!(validate_emergency_contact(&emergency("Meera", "+919812345678")).is_ok());
        assert_eq!(
            validate_emergency_contact(&emergency(" ", "+919812345678")),
            Err(SafetyError::Validation("Contact name is required".to_string()))
        );
        assert_eq!(
            validate_emergency_contact(&emergency("Meera", "")),
            Err(SafetyError::Validation("Phone number is required".to_string()))
        );
        assert_eq!(
            validate_emergency_contact(&emergency("Meera", "abc")),
            Err(SafetyError::Validation("Invalid phone number format".to_string()))
        );
    }

    #[test]
    fn family_contact_needs_phone_or_email() {
        let mut request = FamilySharingRequest {
            name: "Dad".to_string(),
            phone_number: None,
            email: None,
            receive_ride_updates: None,
        };
        assert_eq!(
            validate_family_contact(&request),
            Err(SafetyError::Validation(
                "Either phone number or email is required".to_string()
            ))
        );
        request.email = Some("dad@example.com".to_string());
        assert!(validate_family_contact(&request).is_ok());
        request.email = Some("not-an-email".to_string());
        assert!(validate_family_contact(&request).is_err());
    }

    #[test]
    fn coordinates_are_required_and_bounded() {
        assert_eq!(
            validate_coordinates(None, Some(77.0)),
            Err(SafetyError::MissingCoordinates)
        );
        assert_eq!(
            validate_coordinates(Some(91.0), Some(77.0)),
            Err(SafetyError::InvalidLatitude)
        );
        assert_eq!(
            validate_coordinates(Some(12.0), Some(-181.0)),
            Err(SafetyError::InvalidLongitude)
        );
        assert_eq!(validate_coordinates(Some(12.5), Some(77.5)), Ok((12.5, 77.5)));
    }
}
