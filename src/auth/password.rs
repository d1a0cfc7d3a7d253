use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use rand::thread_rng;

use crate::error::AuthError;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_PASSWORD_LEN: usize = 128;

/// Password policy, checked in order: emptiness, minimum length, maximum
/// length, letter+digit composition. The first violated rule names itself.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.is_empty() {
        return Err(AuthError::WeakPassword("Password cannot be empty"));
    }
    if password.len() < MIN_PASSWORD_LEN {
        return Err(AuthError::WeakPassword(
            "Password must be at least 8 characters long",
        ));
    }
    if password.len() > MAX_PASSWORD_LEN {
        return Err(AuthError::WeakPassword(
            "Password must not exceed 128 characters",
        ));
    }
    let has_letter = password.chars().any(|c| c.is_ascii_alphabetic());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !has_letter || !has_digit {
        return Err(AuthError::WeakPassword(
            "Password must contain at least one letter and one number",
        ));
    }
    Ok(())
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut thread_rng());
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| AuthError::Internal(format!("password hashing failed: {err}")))?
        .to_string();
    Ok(hash)
}

/// Malformed digests verify as `false`; this never errors outward.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy_message(password: &str) -> &'static str {
        match validate_password(password) {
            Err(AuthError::WeakPassword(message)) => message,
            other => panic!("expected WeakPassword, got {other:?}"),
        }
    }

    #[test]
    fn policy_rules_fire_in_order() {
        assert_eq!(policy_message(""), "Password cannot be empty");
        assert_eq!(
            policy_message("short1"),
            "Password must be at least 8 characters long"
        );
        assert_eq!(
            policy_message(&"a1".repeat(80)),
            "Password must not exceed 128 characters"
        );
        assert_eq!(
            policy_message("alllettersnodigit"),
            "Password must contain at least one letter and one number"
        );
        assert_eq!(
            policy_message("12345678"),
            "Password must contain at least one letter and one number"
        );
    }

    #[test]
    fn policy_accepts_compliant_passwords() {
        assert!(validate_password("Password1").is_ok());
        assert!(validate_password("Passw0rd").is_ok());
    }

    #[test]
    fn hash_and_verify_round_trip() {
        let hash = hash_password("Password1").expect("hashing succeeds");
        assert!(verify_password("Password1", &hash));
        assert!(!verify_password("Password2", &hash));
    }

    #[test]
    fn distinct_salts_produce_distinct_digests() {
        let a = hash_password("Password1").unwrap();
        let b = hash_password("Password1").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_digest_verifies_false() {
        assert!(!verify_password("Password1", "not-a-digest"));
        assert!(!verify_password("Password1", ""));
    }
}
