use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email shape regex must compile")
});

/// Loose `local@domain.tld` shape check. Not RFC 5322.
pub fn is_valid_email(candidate: &str) -> bool {
    EMAIL_SHAPE.is_match(candidate)
}

/// Lowercased form used as the contact dedup key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
