use std::borrow::Cow;

use validator::ValidationError;

use crate::infrastructure::crypto::password::MAX_PASSWORD_BYTES;

pub const MIN_PASSWORD_BYTES: usize = 6;

/// Password length in UTF-8 bytes, the unit bcrypt truncates on.
pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if (MIN_PASSWORD_BYTES..=MAX_PASSWORD_BYTES).contains(&password.len()) {
        return Ok(());
    }
    let mut err = ValidationError::new("password_length");
    err.message = Some(Cow::Borrowed(
        "password must be 6-72 bytes (multi-byte characters count more than once)",
    ));
    Err(err)
}
