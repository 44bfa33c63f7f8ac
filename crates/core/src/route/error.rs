use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("{0}")]
    Validation(String),
    #[error("Invalid route type: {0}")]
    InvalidRouteType(String),
}
