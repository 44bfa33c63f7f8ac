//! DynamoDB key layout for the route preferences table.
//!
//! Partition key is the user ID, sort key is the route type, so a single
//! `Query` on the partition returns every preference of a user.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use officemate_core::route::RouteType;
use uuid::Uuid;

pub const PARTITION_KEY: &str = "userId";
pub const SORT_KEY: &str = "routeType";

/// Partition key value for a user.
pub fn user_pk(user_id: Uuid) -> AttributeValue {
    AttributeValue::S(user_id.to_string())
}

/// Sort key value for a route type.
///
/// Pattern: `HOME_TO_WORK` | `WORK_TO_HOME`
pub fn route_sk(route_type: RouteType) -> AttributeValue {
    AttributeValue::S(route_type.as_str().to_string())
}

/// Full primary key of one preference item.
pub fn route_key(user_id: Uuid, route_type: RouteType) -> HashMap<String, AttributeValue> {
    HashMap::from([
        (PARTITION_KEY.to_string(), user_pk(user_id)),
        (SORT_KEY.to_string(), route_sk(route_type)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_key_contains_both_attributes() {
        let user_id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap();

        let key = route_key(user_id, RouteType::WorkToHome);

        assert_eq!(
            key.get(PARTITION_KEY),
            Some(&AttributeValue::S(
                "550e8400-e29b-41d4-a716-446655440001".to_string()
            ))
        );
        assert_eq!(
            key.get(SORT_KEY),
            Some(&AttributeValue::S("WORK_TO_HOME".to_string()))
        );
    }
}
