pub mod dates;
pub mod password;
pub mod validation;

pub use dates::{format_instant, parse_instant, serialize_instant, validate_instant};
pub use password::{hash_password, validate_password_strength, verify_password, Password, PasswordHashString};
pub use validation::ValidatedJson;
