//! Commute route preferences.

mod error;
mod operations;
mod types;

pub use error::RouteError;
pub use operations::{build_route_pair, reverse_route, validate_route_input};
pub use types::{RoutePoint, RoutePreference, RoutePreferencesInput, RouteType};
