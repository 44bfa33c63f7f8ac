//! DynamoDB error mapping for route preference operations.
//!
//! The route table is written without condition expressions, so the only
//! service errors worth telling apart are a missing table and throttling.
//! Everything else is reported with the operation and the user it was for.

use std::fmt::{self, Debug};

use aws_sdk_dynamodb::error::{ProvideErrorMetadata, SdkError};
use officemate_core::storage::RepositoryError;
use uuid::Uuid;

/// Route preference operation that produced an SDK error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferenceOp {
    Save,
    Get,
    List,
    Delete,
}

impl fmt::Display for PreferenceOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PreferenceOp::Save => "save",
            PreferenceOp::Get => "get",
            PreferenceOp::List => "list",
            PreferenceOp::Delete => "delete",
        })
    }
}

const THROTTLING_CODES: [&str; 3] = [
    "ProvisionedThroughputExceededException",
    "RequestLimitExceeded",
    "ThrottlingException",
];

/// Maps any DynamoDB SDK error raised while handling a user's preferences.
pub fn map_preference_error<E, R>(
    err: SdkError<E, R>,
    op: PreferenceOp,
    user_id: Uuid,
) -> RepositoryError
where
    E: ProvideErrorMetadata + Debug,
    R: Debug,
{
    match err {
        SdkError::TimeoutError(_) => RepositoryError::ConnectionFailed(format!(
            "DynamoDB timed out during route preference {op}"
        )),
        SdkError::DispatchFailure(_) => {
            RepositoryError::ConnectionFailed("Could not reach DynamoDB".to_string())
        }
        SdkError::ServiceError(context) => {
            let service = context.err();
            from_service_code(service.code(), service.message(), op, user_id)
        }
        other => RepositoryError::QueryFailed(format!(
            "Route preference {op} for user {user_id} failed: {other:?}"
        )),
    }
}

fn from_service_code(
    code: Option<&str>,
    message: Option<&str>,
    op: PreferenceOp,
    user_id: Uuid,
) -> RepositoryError {
    match code {
        Some("ResourceNotFoundException") => {
            RepositoryError::QueryFailed("Route preferences table does not exist".to_string())
        }
        Some(code) if THROTTLING_CODES.contains(&code) => RepositoryError::QueryFailed(format!(
            "Route preference {op} throttled, please retry"
        )),
        code => RepositoryError::QueryFailed(format!(
            "Route preference {op} for user {user_id} failed: {}: {}",
            code.unwrap_or("Unknown"),
            message.unwrap_or("no message")
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_dynamodb::operation::get_item::GetItemError;

    #[test]
    fn test_missing_table_is_reported_without_user() {
        let err = from_service_code(
            Some("ResourceNotFoundException"),
            Some("Requested resource not found"),
            PreferenceOp::List,
            Uuid::new_v4(),
        );
        assert_eq!(
            err,
            RepositoryError::QueryFailed("Route preferences table does not exist".to_string())
        );
    }

    #[test]
    fn test_throttling_names_the_operation() {
        for code in THROTTLING_CODES {
            let err = from_service_code(Some(code), None, PreferenceOp::Save, Uuid::new_v4());
            assert_eq!(
                err,
                RepositoryError::QueryFailed(
                    "Route preference save throttled, please retry".to_string()
                )
            );
        }
    }

    #[test]
    fn test_other_failures_carry_user_and_code() {
        let user_id = Uuid::new_v4();
        let err = from_service_code(
            Some("ValidationException"),
            Some("key schema mismatch"),
            PreferenceOp::Delete,
            user_id,
        );
        assert_eq!(
            err,
            RepositoryError::QueryFailed(format!(
                "Route preference delete for user {user_id} failed: ValidationException: key schema mismatch"
            ))
        );
    }

    #[test]
    fn test_timeout_is_a_connection_failure() {
        let err: SdkError<GetItemError, ()> = SdkError::timeout_error("slow");
        let mapped = map_preference_error(err, PreferenceOp::Get, Uuid::new_v4());
        assert!(matches!(mapped, RepositoryError::ConnectionFailed(_)));
    }
}
