//! DynamoDB storage backend for commute route preferences.
//!
//! One item per (user, route type) in the `<prefix>_route_preferences`
//! table, written with `aws-sdk-dynamodb`.

mod conversions;
mod error;
mod keys;
mod repository;

pub use repository::DynamoDbRepository;
