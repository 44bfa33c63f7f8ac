//! DynamoDB attribute conversion functions.
//!
//! Pure functions for converting between DynamoDB AttributeValue maps and
//! route preferences. Testable without DynamoDB access.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::AttributeValue;
use chrono::{DateTime, Utc};
use officemate_core::route::{RoutePoint, RoutePreference, RouteType};
use officemate_core::storage::RepositoryError;
use uuid::Uuid;

use super::keys::{self, PARTITION_KEY, SORT_KEY};

/// Convert a RoutePreference to a DynamoDB item.
pub fn preference_to_item(preference: &RoutePreference) -> HashMap<String, AttributeValue> {
    let mut item = keys::route_key(preference.user_id, preference.route_type);

    insert_point(&mut item, "start", &preference.start);
    insert_point(&mut item, "end", &preference.end);
    item.insert(
        "preferredStartTimes".to_string(),
        AttributeValue::L(
            preference
                .preferred_start_times
                .iter()
                .map(|t| AttributeValue::S(t.clone()))
                .collect(),
        ),
    );
    item.insert(
        "isActive".to_string(),
        AttributeValue::Bool(preference.is_active),
    );
    item.insert(
        "createdAt".to_string(),
        AttributeValue::S(preference.created_at.to_rfc3339()),
    );
    item.insert(
        "updatedAt".to_string(),
        AttributeValue::S(preference.updated_at.to_rfc3339()),
    );

    item
}

/// Convert a DynamoDB item to a RoutePreference.
pub fn item_to_preference(
    item: &HashMap<String, AttributeValue>,
) -> Result<RoutePreference, RepositoryError> {
    let route_type: RouteType = get_string(item, SORT_KEY)?
        .parse()
        .map_err(|e| RepositoryError::InvalidData(format!("Invalid routeType: {}", e)))?;

    Ok(RoutePreference {
        user_id: get_uuid(item, PARTITION_KEY)?,
        route_type,
        start: get_point(item, "start")?,
        end: get_point(item, "end")?,
        preferred_start_times: get_string_list(item, "preferredStartTimes"),
        is_active: item
            .get("isActive")
            .and_then(|v| v.as_bool().ok())
            .copied()
            .unwrap_or(true),
        created_at: get_datetime(item, "createdAt")?,
        updated_at: get_datetime(item, "updatedAt")?,
    })
}

fn insert_point(item: &mut HashMap<String, AttributeValue>, prefix: &str, point: &RoutePoint) {
    item.insert(
        format!("{prefix}Latitude"),
        AttributeValue::N(point.latitude.to_string()),
    );
    item.insert(
        format!("{prefix}Longitude"),
        AttributeValue::N(point.longitude.to_string()),
    );
    item.insert(
        format!("{prefix}Address"),
        AttributeValue::S(point.address.clone()),
    );
}

fn get_point(
    item: &HashMap<String, AttributeValue>,
    prefix: &str,
) -> Result<RoutePoint, RepositoryError> {
    Ok(RoutePoint {
        latitude: get_number(item, &format!("{prefix}Latitude"))?,
        longitude: get_number(item, &format!("{prefix}Longitude"))?,
        address: get_string(item, &format!("{prefix}Address"))?,
    })
}

// ============================================================================
// Helper functions
// ============================================================================

/// Get a required string attribute.
fn get_string(
    item: &HashMap<String, AttributeValue>,
    key: &str,
) -> Result<String, RepositoryError> {
    item.get(key)
        .and_then(|v| v.as_s().ok())
        .map(|s| s.to_string())
        .ok_or_else(|| RepositoryError::InvalidData(format!("Missing or invalid field: {}", key)))
}

fn get_number(item: &HashMap<String, AttributeValue>, key: &str) -> Result<f64, RepositoryError> {
    item.get(key)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
        .ok_or_else(|| RepositoryError::InvalidData(format!("Missing or invalid field: {}", key)))
}

/// Missing lists read as empty.
fn get_string_list(item: &HashMap<String, AttributeValue>, key: &str) -> Vec<String> {
    item.get(key)
        .and_then(|v| v.as_l().ok())
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v.as_s().ok().cloned())
                .collect()
        })
        .unwrap_or_default()
}

fn get_uuid(item: &HashMap<String, AttributeValue>, key: &str) -> Result<Uuid, RepositoryError> {
    let s = get_string(item, key)?;
    Uuid::parse_str(&s)
        .map_err(|e| RepositoryError::InvalidData(format!("Invalid UUID {}: {}", key, e)))
}

/// Get a required datetime attribute (RFC 3339 format).
fn get_datetime(
    item: &HashMap<String, AttributeValue>,
    key: &str,
) -> Result<DateTime<Utc>, RepositoryError> {
    let s = get_string(item, key)?;
    DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::InvalidData(format!("Invalid datetime {}: {}", key, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_preference() -> RoutePreference {
        let at = DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        RoutePreference {
            user_id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440001").unwrap(),
            route_type: RouteType::HomeToWork,
            start: RoutePoint {
                latitude: 12.9716,
                longitude: 77.5946,
                address: "Indiranagar, Bengaluru".to_string(),
            },
            end: RoutePoint {
                latitude: 12.9352,
                longitude: 77.6245,
                address: "Koramangala, Bengaluru".to_string(),
            },
            preferred_start_times: vec!["08:30".to_string(), "09:00".to_string()],
            is_active: true,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_item_uses_camel_case_attributes() {
        let item = preference_to_item(&sample_preference());

        assert_eq!(
            item.get("routeType"),
            Some(&AttributeValue::S("HOME_TO_WORK".to_string()))
        );
        assert_eq!(
            item.get("startLatitude"),
            Some(&AttributeValue::N("12.9716".to_string()))
        );
        assert_eq!(
            item.get("endAddress"),
            Some(&AttributeValue::S("Koramangala, Bengaluru".to_string()))
        );
        assert_eq!(item.get("isActive"), Some(&AttributeValue::Bool(true)));
    }

    #[test]
    fn test_preference_survives_conversion() {
        let preference = sample_preference();

        let parsed = item_to_preference(&preference_to_item(&preference)).unwrap();

        assert_eq!(parsed, preference);
    }

    #[test]
    fn test_missing_start_times_read_as_empty() {
        let mut item = preference_to_item(&sample_preference());
        item.remove("preferredStartTimes");

        let parsed = item_to_preference(&item).unwrap();

        assert!(parsed.preferred_start_times.is_empty());
    }

    #[test]
    fn test_unknown_route_type_is_invalid_data() {
        let mut item = preference_to_item(&sample_preference());
        item.insert(
            "routeType".to_string(),
            AttributeValue::S("OFFICE_TO_GYM".to_string()),
        );

        assert!(matches!(
            item_to_preference(&item),
            Err(RepositoryError::InvalidData(_))
        ));
    }
}
