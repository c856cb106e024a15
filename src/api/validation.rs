//! Input validation for API requests.
//!
//! GUIDs deliberately have no format validation here: an identifier that
//! does not resolve to a row is reported as not-found by the handlers, not
//! as malformed input.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating usernames (letters, digits, underscore, dot, dash)
    static ref USERNAME_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9_][A-Za-z0-9_.-]*$"
    ).unwrap();
}

/// Validate a username
pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username is required".to_string());
    }

    if username.len() < 3 {
        return Err("Username is too short (min 3 characters)".to_string());
    }

    if username.len() > 64 {
        return Err("Username is too long (max 64 characters)".to_string());
    }

    if !USERNAME_REGEX.is_match(username) {
        return Err(
            "Username may only contain letters, digits, underscores, dots and dashes".to_string(),
        );
    }

    Ok(())
}

/// Validate a password
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.is_empty() {
        return Err("Password is required".to_string());
    }

    if password.len() < 8 {
        return Err("Password is too short (min 8 characters)".to_string());
    }

    if password.len() > 128 {
        return Err("Password is too long (max 128 characters)".to_string());
    }

    Ok(())
}

/// Validate a deck name
pub fn validate_deck_name(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Deck name is required".to_string());
    }

    if name.len() > 100 {
        return Err("Deck name is too long (max 100 characters)".to_string());
    }

    Ok(())
}

/// Validate card text (optional field; empty text is allowed)
pub fn validate_card_text(text: &Option<String>, field_name: &str) -> Result<(), String> {
    if let Some(t) = text {
        if t.len() > 2000 {
            return Err(format!("{} is too long (max 2000 characters)", field_name));
        }
    }

    Ok(())
}
