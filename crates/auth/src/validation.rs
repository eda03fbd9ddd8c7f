//! Input validation that runs before any external call.
//!
//! Validators collect every problem instead of stopping at the first, so a
//! client gets the full list in one round trip.

use std::sync::LazyLock;

use regex::Regex;

use crate::AuthError;

pub const MIN_PASSWORD_LEN: usize = 6;

// Conservative `local@domain.tld` shape.
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("static email regex"));

pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

fn is_blank(value: Option<&str>) -> bool {
    value.map(str::trim).is_none_or(str::is_empty)
}

fn check_email(email: Option<&str>, errors: &mut Vec<String>) {
    match email {
        _ if is_blank(email) => errors.push("email is required".to_string()),
        Some(email) if !is_valid_email(email) => errors.push("email is not valid".to_string()),
        _ => {}
    }
}

fn check_password(password: Option<&str>, errors: &mut Vec<String>) {
    match password {
        _ if is_blank(password) => errors.push("password is required".to_string()),
        Some(password) if password.chars().count() < MIN_PASSWORD_LEN => errors.push(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )),
        _ => {}
    }
}

fn finish(errors: Vec<String>) -> Result<(), AuthError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(AuthError::Validation(errors))
    }
}

/// Registration: email shape and password length. The display name is optional.
pub fn validate_registration(email: Option<&str>, password: Option<&str>) -> Result<(), AuthError> {
    let mut errors = Vec::new();
    check_email(email, &mut errors);
    check_password(password, &mut errors);
    finish(errors)
}

/// Admin-side account creation additionally requires a name.
pub fn validate_new_account(
    email: Option<&str>,
    password: Option<&str>,
    name: Option<&str>,
) -> Result<(), AuthError> {
    let mut errors = Vec::new();
    if is_blank(name) {
        errors.push("name is required".to_string());
    }
    check_email(email, &mut errors);
    check_password(password, &mut errors);
    finish(errors)
}

/// Login only checks presence; the identity provider judges the rest.
pub fn validate_login(email: Option<&str>, password: Option<&str>) -> Result<(), AuthError> {
    let mut errors = Vec::new();
    if is_blank(email) {
        errors.push("email is required".to_string());
    }
    if is_blank(password) {
        errors.push("password is required".to_string());
    }
    finish(errors)
}

pub fn validate_reset(email: Option<&str>) -> Result<(), AuthError> {
    let mut errors = Vec::new();
    check_email(email, &mut errors);
    finish(errors)
}
