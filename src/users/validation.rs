use lazy_static::lazy_static;
use regex::Regex;

pub const MIN_PASSWORD_LEN: usize = 8;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Structural checks run before a request reaches the user service.
/// Returns the message sent back with a 400.
pub(crate) fn check_credentials(email: &str, password: &str) -> Result<(), &'static str> {
    if !is_valid_email(email) {
        return Err("Invalid email");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}

pub(crate) fn check_profile(email: &str, password: &str, username: &str) -> Result<(), &'static str> {
    check_credentials(email, password)?;
    if username.trim().is_empty() {
        return Err("Username is required");
    }
    Ok(())
}
