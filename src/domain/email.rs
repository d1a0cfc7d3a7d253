use std::sync::LazyLock;

use regex_lite::Regex;

use crate::error::AuthError;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Trim, lowercase and validate an email address. Emails are compared
/// case-insensitively everywhere, so the normalized form is what gets
/// persisted and looked up.
pub fn normalize_email(raw: &str) -> Result<String, AuthError> {
    let email = raw.trim().to_lowercase();
    if EMAIL_RE.is_match(&email) {
        Ok(email)
    } else {
        Err(AuthError::InvalidEmail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_and_normalizes_valid_addresses() {
        assert_eq!(
            normalize_email("  Alice@Example.COM ").unwrap(),
            "alice@example.com"
        );
        assert_eq!(normalize_email("a@b.co").unwrap(), "a@b.co");
    }

    #[test]
    fn rejects_malformed_addresses() {
        for bad in ["", "plain", "@nolocal.com", "no-at.example.com", "a b@c.com", "a@b"] {
            assert!(
                matches!(normalize_email(bad), Err(AuthError::InvalidEmail)),
                "expected rejection for {bad:?}"
            );
        }
    }
}
