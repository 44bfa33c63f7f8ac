mod error;
mod functions;
mod phone;
mod types;

pub use error::AccountError;
pub use functions::mask_identifier;
pub use phone::{normalize_phone_number, DEFAULT_COUNTRY_CODE};
pub use types::{AccountStatus, UserAccount};
