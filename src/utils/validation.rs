//! Input validation utilities

use validator::ValidateEmail;

use crate::constants::MAX_AGE;

/// Validate a competitor name field
pub fn validate_name(value: &str, field: &str) -> Result<(), String> {
    if sanitize_string(value).is_empty() {
        return Err(format!("Entry missing {}", field));
    }
    Ok(())
}

/// Validate an e-mail address before a notification goes out
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.trim().validate_email() {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Check an age against the accepted range `0..=MAX_AGE`
pub fn check_age(age: i64) -> Result<u32, String> {
    if age < 0 {
        return Err(format!("{} is not a valid age, must be >= 0", age));
    }
    match u32::try_from(age) {
        Ok(age) if age <= MAX_AGE => Ok(age),
        _ => Err(format!("{} is not a valid age, must be <= {}", age, MAX_AGE)),
    }
}

/// Parse an age cell, which must be an integer in `0..=MAX_AGE`
pub fn parse_age(value: &str) -> Result<u32, String> {
    let trimmed = value.trim();
    let age = trimmed
        .parse::<i64>()
        .map_err(|_| format!("{} is not a valid age", trimmed))?;
    check_age(age)
}

/// Sanitize string input (remove control characters, trim whitespace)
pub fn sanitize_string(input: &str) -> String {
    input
        .chars()
        .filter(|c| !c.is_control())
        .collect::<String>()
        .trim()
        .to_string()
}
