use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+",
        r"@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?",
        r"(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$",
    ))
    .expect("email pattern must compile")
});

/// Advisory address check. A rejected address is reported, never excluded.
pub trait EmailValidator: Send + Sync {
    fn is_valid(&self, email: &str) -> bool;
}

// key: email-validator -> syntax check
#[derive(Debug, Clone, Copy, Default)]
pub struct RegexEmailValidator;

impl EmailValidator for RegexEmailValidator {
    fn is_valid(&self, email: &str) -> bool {
        email.len() <= 254 && EMAIL_PATTERN.is_match(email)
    }
}
