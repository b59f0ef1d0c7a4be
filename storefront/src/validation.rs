use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{StorefrontError, StorefrontResult};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

/// Trimmed, lowercased email, or a validation error.
pub fn normalize_email(email: &str) -> StorefrontResult<String> {
    let email = email.trim().to_lowercase();
    if !EMAIL_RE.is_match(&email) {
        return Err(StorefrontError::validation("Please enter a valid email address"));
    }
    Ok(email)
}

pub fn require_name(name: &str) -> StorefrontResult<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StorefrontError::validation("Please enter your full name"));
    }
    Ok(name)
}
