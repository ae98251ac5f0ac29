//! Input validation for API requests.
//!
//! Validators return `Result<(), String>` so handlers can collect failures
//! per field with the `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating email addresses (pragmatic, not RFC-complete)
    static ref EMAIL_REGEX: Regex =
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$").unwrap();

    /// Regex for industry tags (lowercase alphanumeric with dashes)
    static ref TAG_REGEX: Regex = Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").unwrap();

    /// Regex for ISO 8601 calendar dates (YYYY-MM-DD)
    static ref DATE_REGEX: Regex = Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap();
}

/// Validate a startup or milestone/task display name
pub fn validate_name(name: &str, field: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err(format!("{} is required", field));
    }

    if name.len() < 2 {
        return Err(format!("{} is too short (min 2 characters)", field));
    }

    if name.len() > 120 {
        return Err(format!("{} is too long (max 120 characters)", field));
    }

    Ok(())
}

/// Validate free-form text fields (description, pitch, feedback, bodies)
pub fn validate_text(text: &str, field: &str, max_len: usize) -> Result<(), String> {
    if text.len() > max_len {
        return Err(format!("{} is too long (max {} characters)", field, max_len));
    }

    Ok(())
}

/// Validate an email address
pub fn validate_email(email: &str) -> Result<(), String> {
    if email.is_empty() {
        return Err("Email is required".to_string());
    }

    if email.len() > 254 {
        return Err("Email is too long (max 254 characters)".to_string());
    }

    if !EMAIL_REGEX.is_match(email) {
        return Err("Invalid email format".to_string());
    }

    Ok(())
}

/// Validate an industry tag list
pub fn validate_tags(tags: &[String]) -> Result<(), String> {
    if tags.len() > 10 {
        return Err("Too many industry tags (max 10)".to_string());
    }

    for tag in tags {
        if tag.is_empty() || tag.len() > 40 {
            return Err("Industry tags must be 1-40 characters".to_string());
        }
        if !TAG_REGEX.is_match(tag) {
            return Err(format!(
                "Invalid industry tag '{}'. Tags are lowercase alphanumeric with dashes",
                tag
            ));
        }
    }

    Ok(())
}

/// Validate a review sub-score (1-10 inclusive)
pub fn validate_score(score: i64, field: &str) -> Result<(), String> {
    if !(1..=10).contains(&score) {
        return Err(format!("{} must be between 1 and 10", field));
    }

    Ok(())
}

/// Validate a money amount in integer cents
pub fn validate_amount(amount: i64) -> Result<(), String> {
    if amount <= 0 {
        return Err("Amount must be greater than zero".to_string());
    }

    // One billion dollars in cents; anything above is a typo
    if amount > 100_000_000_000 {
        return Err("Amount is too large".to_string());
    }

    Ok(())
}

/// Validate a funding goal (zero means "not set")
pub fn validate_funding_goal(goal: i64) -> Result<(), String> {
    if goal < 0 {
        return Err("Funding goal cannot be negative".to_string());
    }

    if goal > 100_000_000_000 {
        return Err("Funding goal is too large".to_string());
    }

    Ok(())
}

/// Validate an optional ISO 8601 date field
pub fn validate_date(date: &Option<String>, field: &str) -> Result<(), String> {
    if let Some(d) = date {
        if d.is_empty() {
            return Ok(()); // Empty string treated as unset
        }

        if !DATE_REGEX.is_match(d) {
            return Err(format!("{} must be an ISO date (YYYY-MM-DD)", field));
        }

        if chrono::NaiveDate::parse_from_str(d, "%Y-%m-%d").is_err() {
            return Err(format!("{} is not a valid calendar date", field));
        }
    }

    Ok(())
}

/// Validate a document URL (http or https)
pub fn validate_url(url: &str) -> Result<(), String> {
    if url.is_empty() {
        return Err("URL is required".to_string());
    }

    if url.len() > 2048 {
        return Err("URL is too long (max 2048 characters)".to_string());
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err("URL must start with http:// or https://".to_string());
    }

    Ok(())
}

/// Validate a UUID string
pub fn validate_uuid(id: &str, field_name: &str) -> Result<(), String> {
    if id.is_empty() {
        return Err(format!("{} is required", field_name));
    }

    if uuid::Uuid::parse_str(id).is_err() {
        return Err(format!("Invalid {} format", field_name));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert!(validate_name("Gridline Energy", "name").is_ok());
        assert!(validate_name("io", "name").is_ok());

        assert!(validate_name("", "name").is_err());
        assert!(validate_name("   ", "name").is_err());
        assert!(validate_name("x", "name").is_err());
        assert!(validate_name(&"x".repeat(121), "name").is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("founder@example.com").is_ok());
        assert!(validate_email("a.b+tag@sub.domain.io").is_ok());

        assert!(validate_email("").is_err());
        assert!(validate_email("not-an-email").is_err());
        assert!(validate_email("missing@tld").is_err());
    }

    #[test]
    fn test_validate_tags() {
        assert!(validate_tags(&["fintech".into(), "b2b-saas".into()]).is_ok());
        assert!(validate_tags(&[]).is_ok());

        assert!(validate_tags(&["Fin Tech".into()]).is_err());
        assert!(validate_tags(&["-leading".into()]).is_err());
        assert!(validate_tags(&[String::new()]).is_err());
        let many: Vec<String> = (0..11).map(|i| format!("tag{}", i)).collect();
        assert!(validate_tags(&many).is_err());
    }

    #[test]
    fn test_validate_score() {
        assert!(validate_score(1, "team_score").is_ok());
        assert!(validate_score(10, "team_score").is_ok());

        assert!(validate_score(0, "team_score").is_err());
        assert!(validate_score(11, "team_score").is_err());
        assert!(validate_score(-3, "team_score").is_err());
    }

    #[test]
    fn test_validate_amount() {
        assert!(validate_amount(1).is_ok());
        assert!(validate_amount(50_000_00).is_ok());

        assert!(validate_amount(0).is_err());
        assert!(validate_amount(-500).is_err());
        assert!(validate_amount(100_000_000_001).is_err());
    }

    #[test]
    fn test_validate_funding_goal_allows_zero() {
        assert!(validate_funding_goal(0).is_ok());
        assert!(validate_funding_goal(-1).is_err());
    }

    #[test]
    fn test_validate_date() {
        assert!(validate_date(&Some("2026-08-15".to_string()), "due_date").is_ok());
        assert!(validate_date(&Some(String::new()), "due_date").is_ok());
        assert!(validate_date(&None, "due_date").is_ok());

        assert!(validate_date(&Some("15/08/2026".to_string()), "due_date").is_err());
        assert!(validate_date(&Some("2026-02-30".to_string()), "due_date").is_err());
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://files.example.com/deck.pdf").is_ok());
        assert!(validate_url("http://localhost:9000/bucket/file").is_ok());

        assert!(validate_url("").is_err());
        assert!(validate_url("ftp://example.com/file").is_err());
        assert!(validate_url("files/deck.pdf").is_err());
    }

    #[test]
    fn test_validate_uuid() {
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000", "startup_id").is_ok());
        assert!(validate_uuid("", "startup_id").is_err());
        assert!(validate_uuid("not-a-uuid", "startup_id").is_err());
    }
}
