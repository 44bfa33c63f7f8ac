use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SafetyError {
    #[error("Maximum number of emergency contacts ({0}) reached")]
    EmergencyContactLimit(usize),
    #[error("Maximum number of family sharing contacts ({0}) reached")]
    FamilySharingLimit(usize),
    #[error("{0}")]
    Validation(String),
    #[error("Emergency contact not found")]
    EmergencyContactNotFound,
    #[error("Family sharing contact not found")]
    FamilyContactNotFound,
    #[error("Location coordinates are required for SOS alert")]
    MissingCoordinates,
    #[error("Invalid latitude value")]
    InvalidLatitude,
    #[error("Invalid longitude value")]
    InvalidLongitude,
    #[error("An active SOS alert already exists for this user")]
    ActiveSosExists,
    #[error("SOS alert not found")]
    SosNotFound,
    #[error("SOS alert is not active")]
    SosNotActive,
    #[error("Location share not found")]
    LocationShareNotFound,
    #[error("Location share is not active")]
    LocationShareNotActive,
}

impl SafetyError {
    /// Lookups that failed rather than rule violations.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::EmergencyContactNotFound
                | Self::FamilyContactNotFound
                | Self::SosNotFound
                | Self::LocationShareNotFound
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_messages_include_maximum() {
        assert_eq!(
            SafetyError::EmergencyContactLimit(5).to_string(),
            "Maximum number of emergency contacts (5) reached"
        );
        assert_eq!(
            SafetyError::FamilySharingLimit(10).to_string(),
            "Maximum number of family sharing contacts (10) reached"
        );
    }

    #[test]
    fn test_not_found_classification() {
        assert!(SafetyError::SosNotFound.is_not_found());
        assert!(!SafetyError::SosNotActive.is_not_found());
    }
}
