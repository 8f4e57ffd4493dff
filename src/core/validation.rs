//! Input validation for composition flows
//!
//! Provides the structural checks applied to operator input:
//! - Button URLs (http/https only, must parse)
//! - Taxonomy names (trimmed, non-empty)
//! - Button labels

use url::Url;

use crate::core::error::{AppError, AppResult};

/// Checks that a button URL uses http(s) and is well formed.
///
/// Reachability is never checked.
///
/// # Examples
/// ```
/// use chanpost::core::validation::is_valid_button_url;
///
/// assert!(is_valid_button_url("https://shop.example"));
/// assert!(is_valid_button_url("http://x"));
/// assert!(!is_valid_button_url("ftp://x"));
/// assert!(!is_valid_button_url("shop.example"));
/// ```
pub fn is_valid_button_url(url: &str) -> bool {
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return false;
    }
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https") && parsed.host_str().is_some(),
        Err(_) => false,
    }
}

/// Validated button URL, trimmed
pub fn validate_button_url(raw: &str) -> AppResult<String> {
    let url = raw.trim();
    if is_valid_button_url(url) {
        Ok(url.to_string())
    } else {
        Err(AppError::Validation(
            "URL must start with http:// or https://".to_string(),
        ))
    }
}

/// Trimmed taxonomy name, `None` when nothing is left
pub fn normalize_name(raw: &str) -> Option<String> {
    let name = raw.trim();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

/// Validated taxonomy name (category, subcategory or template name)
pub fn validate_name(raw: &str, what: &str) -> AppResult<String> {
    normalize_name(raw).ok_or_else(|| AppError::Validation(format!("{} must not be empty", what)))
}

/// Validated button label
pub fn validate_label(raw: &str) -> AppResult<String> {
    validate_name(raw, "Button text")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_button_url_schemes() {
        assert!(is_valid_button_url("https://shop.example/path?q=1"));
        assert!(is_valid_button_url("http://info.example"));
        assert!(!is_valid_button_url("ftp://x"));
        assert!(!is_valid_button_url("tg://user?id=1"));
        assert!(!is_valid_button_url("https://"));
        assert!(!is_valid_button_url(""));
    }

    #[test]
    fn test_validate_button_url_trims() {
        assert_eq!(validate_button_url("  https://x  ").unwrap(), "https://x");
        assert!(matches!(validate_button_url("ftp://x"), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_names() {
        assert_eq!(normalize_name("  Game "), Some("Game".to_string()));
        assert_eq!(normalize_name("   "), None);
        assert!(validate_name("", "Category").is_err());
        assert!(validate_label("Buy").is_ok());
    }
}
