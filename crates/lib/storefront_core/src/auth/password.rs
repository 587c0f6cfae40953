//! Password hashing via bcrypt, and the password policy.

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a password with bcrypt (cost 10).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::Internal(format!("bcrypt verify: {e}")))
}

/// At least eight characters with an uppercase letter, a lowercase letter and a digit.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    let long_enough = password.chars().count() >= MIN_PASSWORD_LENGTH;
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if long_enough && has_upper && has_lower && has_digit {
        Ok(())
    } else {
        Err(AuthError::ValidationError(
            "Password must be at least 8 characters long and contain an uppercase letter, \
             a lowercase letter and a number"
                .into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("Password123").unwrap();
        assert_ne!(hash, "Password123");
        assert!(verify_password("Password123", &hash).unwrap());
        assert!(!verify_password("password123", &hash).unwrap());
    }

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("Password123").unwrap();
        let b = hash_password("Password123").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn policy() {
        assert!(validate_password("Password123").is_ok());
        assert!(validate_password("Pass12").is_err(), "too short");
        assert!(validate_password("password123").is_err(), "no uppercase");
        assert!(validate_password("PASSWORD123").is_err(), "no lowercase");
        assert!(validate_password("Passwordxyz").is_err(), "no digit");
    }
}
