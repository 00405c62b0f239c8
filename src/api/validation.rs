use super::ApiError;
use crate::constants::limits::{PASSWORD_MIN_LEN, USERNAME_MAX_LEN, USERNAME_MIN_LEN};

pub fn validate_username(username: &str) -> Result<&str, ApiError> {
    let len = username.chars().count();
    if !(USERNAME_MIN_LEN..=USERNAME_MAX_LEN).contains(&len) {
        return Err(ApiError::validation(format!(
            "Username must be between {} and {} characters",
            USERNAME_MIN_LEN, USERNAME_MAX_LEN
        )));
    }

    if username.trim() != username {
        return Err(ApiError::validation(
            "Username cannot start or end with whitespace",
        ));
    }

    Ok(username)
}

pub fn validate_password(password: &str) -> Result<&str, ApiError> {
    if password.chars().count() < PASSWORD_MIN_LEN {
        return Err(ApiError::validation(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN_LEN
        )));
    }
    Ok(password)
}

pub fn validate_coffee_name(name: &str) -> Result<&str, ApiError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ApiError::validation("Coffee name cannot be empty"));
    }
    Ok(trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("ann").is_ok());
        assert!(validate_username(&"a".repeat(25)).is_ok());
        assert!(validate_username("al").is_err());
        assert!(validate_username(&"a".repeat(26)).is_err());
        assert!(validate_username(" ann").is_err());
    }

    #[test]
    fn test_validate_password() {
        assert!(validate_password("secret").is_ok());
        assert!(validate_password("short").is_err());
    }

    #[test]
    fn test_validate_coffee_name() {
        assert_eq!(validate_coffee_name("  latte ").unwrap(), "latte");
        assert!(validate_coffee_name("   ").is_err());
    }
}
