use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

// key: subscription-type-model -> plan definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionType {
    pub id: i32,
    pub code: String,
    pub name: String,
    pub length_days: i64,
    pub active: bool,
}

impl SubscriptionType {
    /// `None` when the day count does not fit a `Duration`.
    pub fn length(&self) -> Option<Duration> {
        Duration::try_days(self.length_days)
    }

    /// A type whose nominal length reaches the lifetime threshold never expires in practice.
    pub fn is_lifetime(&self, threshold_days: i64) -> bool {
        self.length_days >= threshold_days
    }
}

/// Mechanism through which a subscription was granted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionKind {
    #[default]
    Regular,
    Free,
    Donation,
    Gift,
    Special,
    Upgrade,
    Prepaid,
}

impl SubscriptionKind {
    pub const ALL: [SubscriptionKind; 7] = [
        SubscriptionKind::Regular,
        SubscriptionKind::Free,
        SubscriptionKind::Donation,
        SubscriptionKind::Gift,
        SubscriptionKind::Special,
        SubscriptionKind::Upgrade,
        SubscriptionKind::Prepaid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionKind::Regular => "regular",
            SubscriptionKind::Free => "free",
            SubscriptionKind::Donation => "donation",
            SubscriptionKind::Gift => "gift",
            SubscriptionKind::Special => "special",
            SubscriptionKind::Upgrade => "upgrade",
            SubscriptionKind::Prepaid => "prepaid",
        }
    }
}

impl FromStr for SubscriptionKind {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        SubscriptionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or_else(|| AppError::BadRequest(format!("unknown subscription kind `{value}`")))
    }
}

impl fmt::Display for SubscriptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// key: subscription-span-model -> one granted [start, end) interval
/// Spans are never rewritten once granted; extending a subscription produces a new span that
/// starts where an existing one ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionSpan {
    pub id: i32,
    pub user_id: i32,
    pub subscription_type_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_paid: bool,
    pub kind: SubscriptionKind,
}

impl SubscriptionSpan {
    /// Covers `at`: `start <= at < end`.
    pub fn is_actual(&self, at: DateTime<Utc>) -> bool {
        self.start_time <= at && at < self.end_time
    }

    pub fn is_lifetime(&self, threshold: Duration) -> bool {
        self.end_time - self.start_time >= threshold
    }

    pub fn is_of_type(&self, subscription_type: &SubscriptionType) -> bool {
        self.subscription_type_id == subscription_type.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub email: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn span(start: DateTime<Utc>, end: DateTime<Utc>) -> SubscriptionSpan {
        SubscriptionSpan {
            id: 1,
            user_id: 1,
            subscription_type_id: 1,
            start_time: start,
            end_time: end,
            is_paid: false,
            kind: SubscriptionKind::Regular,
        }
    }

    #[test]
    fn actual_is_half_open() {
        let start = Utc.with_ymd_and_hms(2021, 2, 1, 0, 0, 0).unwrap();
        let end = start + Duration::days(25);
        let span = span(start, end);

        assert!(span.is_actual(start));
        assert!(span.is_actual(end - Duration::seconds(1)));
        assert!(!span.is_actual(end));
        assert!(!span.is_actual(start - Duration::seconds(1)));
    }

    #[test]
    fn lifetime_detection_uses_span_length() {
        let start = Utc.with_ymd_and_hms(2021, 1, 27, 0, 0, 0).unwrap();
        let lifetime = span(start, Utc.with_ymd_and_hms(2121, 1, 27, 0, 0, 0).unwrap());
        let monthly = span(start, start + Duration::days(30));
        let threshold = Duration::days(99 * 365);

        assert!(lifetime.is_lifetime(threshold));
        assert!(!monthly.is_lifetime(threshold));
    }

    #[test]
    fn type_lifetime_compares_length_against_threshold() {
        let mut plan = SubscriptionType {
            id: 1,
            code: "lifetime".into(),
            name: "Lifetime".into(),
            length_days: 99 * 365,
            active: true,
        };
        assert!(plan.is_lifetime(99 * 365));

        plan.length_days = 365;
        assert!(!plan.is_lifetime(99 * 365));
        assert_eq!(plan.length(), Some(Duration::days(365)));

        plan.length_days = i64::MAX;
        assert_eq!(plan.length(), None);
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!(
            " Gift ".parse::<SubscriptionKind>().unwrap(),
            SubscriptionKind::Gift
        );
        assert!("lifetime".parse::<SubscriptionKind>().is_err());
        assert_eq!(SubscriptionKind::Prepaid.to_string(), "prepaid");
    }
}
