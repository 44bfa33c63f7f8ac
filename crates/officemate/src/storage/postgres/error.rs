//! Postgres error mapping.
//!
//! Maps `sqlx::Error` to `RepositoryError` from `officemate_core::storage`.

use officemate_core::storage::RepositoryError;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

/// Maps a sqlx error to a RepositoryError.
///
/// - unique violation → `AlreadyExists`
/// - foreign key violation → `InvalidData`
/// - pool and I/O failures → `ConnectionFailed`
/// - row decoding failures → `Serialization`
/// - everything else → `QueryFailed`
pub fn map_sqlx_error(err: sqlx::Error, entity_type: &'static str) -> RepositoryError {
    map_sqlx_error_with_id(err, entity_type, "unknown")
}

/// Maps a sqlx error when the entity ID is known at the call site.
pub fn map_sqlx_error_with_id(
    err: sqlx::Error,
    entity_type: &'static str,
    id: impl ToString,
) -> RepositoryError {
    match &err {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            RepositoryError::already_exists(entity_type, id)
        }
        sqlx::Error::Database(db) if db.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
            RepositoryError::InvalidData(format!(
                "Foreign key constraint violation for {entity_type}"
            ))
        }
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            RepositoryError::ConnectionFailed(err.to_string())
        }
        sqlx::Error::RowNotFound => RepositoryError::not_found(entity_type, id),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            RepositoryError::Serialization(err.to_string())
        }
        _ => RepositoryError::QueryFailed(err.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_timeout_maps_to_connection_failed() {
        let result = map_sqlx_error(sqlx::Error::PoolTimedOut, "Wallet");

        assert!(matches!(result, RepositoryError::ConnectionFailed(_)));
    }

    #[test]
    fn test_row_not_found_keeps_id() {
        let result = map_sqlx_error_with_id(sqlx::Error::RowNotFound, "UserAccount", "abc-123");

        assert_eq!(result, RepositoryError::not_found("UserAccount", "abc-123"));
    }

    #[test]
    fn test_other_errors_map_to_query_failed() {
        let result = map_sqlx_error(sqlx::Error::Protocol("bad frame".to_string()), "SosAlert");

        assert!(matches!(result, RepositoryError::QueryFailed(_)));
    }
}
