use std::str::FromStr;

use once_cell::sync::Lazy;

/// Minimum span length, in days, at which a subscription is treated as a lifetime grant.
/// Also applied to a subscription type's nominal length. Defaults to 99 years of 365 days.
pub static SUBSCRIPTION_LIFETIME_THRESHOLD_DAYS: Lazy<i64> = Lazy::new(|| {
    positive_number(std::env::var("SUBSCRIPTION_LIFETIME_THRESHOLD_DAYS").ok()).unwrap_or(99 * 365)
});

/// When set to a truthy value, lifetime spans that have not started yet are skipped as
/// extension targets too, not only the one currently covering `now`. Defaults to `false`.
pub static SUBSCRIPTION_EXTENSION_SKIP_FUTURE_LIFETIME: Lazy<bool> = Lazy::new(|| {
    truthy(std::env::var("SUBSCRIPTION_EXTENSION_SKIP_FUTURE_LIFETIME").ok())
});

// key: generator-config -> registration source tag
pub static GENERATOR_REGISTRATION_SOURCE: Lazy<String> = Lazy::new(|| {
    non_empty(std::env::var("GENERATOR_REGISTRATION_SOURCE").ok())
        .unwrap_or_else(|| "subscriptiongenerator".to_string())
});

// key: generator-config -> in-process sink capacity
pub static GENERATOR_DISPATCH_CAPACITY: Lazy<usize> = Lazy::new(|| {
    positive_number(std::env::var("GENERATOR_DISPATCH_CAPACITY").ok()).unwrap_or(32)
});

// key: generator-config -> message type of dispatched payloads
pub static GENERATOR_MESSAGE_TYPE: Lazy<String> = Lazy::new(|| {
    non_empty(std::env::var("GENERATOR_MESSAGE_TYPE").ok())
        .unwrap_or_else(|| "generate-subscription".to_string())
});

/// Parses a strictly positive number; anything else falls back to the caller's default.
fn positive_number<T>(value: Option<String>) -> Option<T>
where
    T: FromStr + PartialOrd + Default,
{
    value
        .and_then(|value| value.trim().parse::<T>().ok())
        .filter(|value| *value > T::default())
}

fn truthy(value: Option<String>) -> bool {
    value
        .map(|value| {
            let normalized = value.trim().to_ascii_lowercase();
            matches!(normalized.as_str(), "1" | "true" | "yes")
        })
        .unwrap_or(false)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
