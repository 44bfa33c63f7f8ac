use chrono::{DateTime, NaiveTime, Utc};
use uuid::Uuid;

use super::{RouteError, RoutePoint, RoutePreference, RoutePreferencesInput, RouteType};

fn check_latitude(value: f64) -> Result<(), RouteError> {
    if (-90.0..=90.0).contains(&value) {
        Ok(())
    } else {
        Err(RouteError::Validation(
            "Latitude must be between -90 and 90".to_string(),
        ))
    }
}

fn check_longitude(value: f64) -> Result<(), RouteError> {
    if (-180.0..=180.0).contains(&value) {
        Ok(())
    } else {
        Err(RouteError::Validation(
            "Longitude must be between -180 and 180".to_string(),
        ))
    }
}

/// Validates coordinates, addresses and `HH:MM` start times.
pub fn validate_route_input(input: &RoutePreferencesInput) -> Result<(), RouteError> {
    check_latitude(input.start_latitude)?;
    check_longitude(input.start_longitude)?;
    check_latitude(input.end_latitude)?;
    check_longitude(input.end_longitude)?;

    if input.start_address.trim().is_empty() {
        return Err(RouteError::Validation("Start address is required".to_string()));
    }
    if input.end_address.trim().is_empty() {
        return Err(RouteError::Validation("End address is required".to_string()));
    }
    if input.preferred_start_times.is_empty() {
        return Err(RouteError::Validation(
            "At least one preferred start time is required".to_string(),
        ));
    }
    for time in &input.preferred_start_times {
        if NaiveTime::parse_from_str(time, "%H:%M").is_err() {
            return Err(RouteError::Validation(format!(
                "Invalid start time (expected HH:MM): {}",
                time
            )));
        }
    }
    Ok(())
}

/// Swaps start and end of a leg, producing the opposite direction.
pub fn reverse_route(preference: &RoutePreference) -> RoutePreference {
    RoutePreference {
        route_type: preference.route_type.opposite(),
        start: preference.end.clone(),
        end: preference.start.clone(),
        ..preference.clone()
    }
}

/// Builds the home-to-work leg from `input` and its reversed work-to-home leg.
///
/// `created_at` is kept from an existing preference when updating.
pub fn build_route_pair(
    user_id: Uuid,
    input: &RoutePreferencesInput,
    created_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<[RoutePreference; 2], RouteError> {
    validate_route_input(input)?;

    let home_to_work = RoutePreference {
        user_id,
        route_type: RouteType::HomeToWork,
        start: RoutePoint {
            latitude: input.start_latitude,
            longitude: input.start_longitude,
            address: input.start_address.trim().to_string(),
        },
        end: RoutePoint {
            latitude: input.end_latitude,
            longitude: input.end_longitude,
            address: input.end_address.trim().to_string(),
        },
        preferred_start_times: input.preferred_start_times.clone(),
        is_active: input.is_active,
        created_at: created_at.unwrap_or(now),
        updated_at: now,
    };
    let work_to_home = reverse_route(&home_to_work);
    Ok([home_to_work, work_to_home])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input() -> RoutePreferencesInput {
        RoutePreferencesInput {
            start_latitude: 12.9716,
            start_longitude: 77.5946,
            start_address: "Indiranagar, Bengaluru".to_string(),
            end_latitude: 12.9352,
            end_longitude: 77.6245,
            end_address: "Koramangala Tech Park".to_string(),
            preferred_start_times: vec!["08:30".to_string(), "09:00".to_string()],
            is_active: true,
        }
    }

    #[test]
    fn build_route_pair_reverses_second_leg() {
        let now = Utc::now();
        let [outbound, inbound] = build_route_pair(Uuid::new_v4(), &input(), None, now).unwrap();
        assert_eq!(outbound.route_type, RouteType::HomeToWork);
        assert_eq!(inbound.route_type, RouteType::WorkToHome);
        assert_eq!(inbound.start, outbound.end);
        assert_eq!(inbound.end, outbound.start);
        assert_eq!(inbound.preferred_start_times, outbound.preferred_start_times);
        assert_eq!(outbound.created_at, now);
    }

    #[test]
    fn build_route_pair_keeps_original_creation_time() {
        let now = Utc::now();
        let created = now - chrono::Duration::days(3);
        let [outbound, _] = build_route_pair(Uuid::new_v4(), &input(), Some(created), now).unwrap();
        assert_eq!(outbound.created_at, created);
        assert_eq!(outbound.updated_at, now);
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let mut bad = input();
        bad.end_longitude = 181.0;
        assert_eq!(
            validate_route_input(&bad),
            Err(RouteError::Validation(
                "Longitude must be between -180 and 180".to_string()
            ))
        );
    }

    #[test]
    fn rejects_malformed_start_times() {
        let mut bad = input();
        bad.preferred_start_times = vec!["8.30am".to_string()];
        assert!(validate_route_input(&bad).is_err());

        bad.preferred_start_times.clear();
        assert_eq!(
            validate_route_input(&bad),
            Err(RouteError::Validation(
                "At least one preferred start time is required".to_string()
            ))
        );
    }

    #[test]
    fn route_type_parses_and_flips() {
        let route: RouteType = "WORK_TO_HOME".parse().unwrap();
        assert_eq!(route.opposite(), RouteType::HomeToWork);
        assert!("SIDEWAYS".parse::<RouteType>().is_err());
    }
}
