use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::subscriptions::models::{SubscriptionKind, SubscriptionType};

/// Bucket an address falls into during a generator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cohort {
    NewlyRegistered,
    Inactive,
    Active,
}

impl Cohort {
    pub fn as_str(&self) -> &'static str {
        match self {
            Cohort::NewlyRegistered => "newly_registered",
            Cohort::Inactive => "inactive",
            Cohort::Active => "active",
        }
    }

    pub fn counter(&self) -> Counter {
        match self {
            Cohort::NewlyRegistered => Counter::NewlyRegistered,
            Cohort::Inactive => Counter::Inactive,
            Cohort::Active => Counter::Active,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    Registrations,
    NewlyRegistered,
    Inactive,
    Active,
    Skipped,
}

impl Counter {
    /// Reporting order.
    pub const ALL: [Counter; 5] = [
        Counter::Registrations,
        Counter::NewlyRegistered,
        Counter::Inactive,
        Counter::Active,
        Counter::Skipped,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Counter::Registrations => "registrations",
            Counter::NewlyRegistered => "newly_registered",
            Counter::Inactive => "inactive",
            Counter::Active => "active",
            Counter::Skipped => "skipped",
        }
    }
}

// key: generator-counters -> per-run tallies
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortCounters {
    pub registrations: u32,
    pub newly_registered: u32,
    pub inactive: u32,
    pub active: u32,
    pub skipped: u32,
}

impl CohortCounters {
    pub fn get(&self, counter: Counter) -> u32 {
        match counter {
            Counter::Registrations => self.registrations,
            Counter::NewlyRegistered => self.newly_registered,
            Counter::Inactive => self.inactive,
            Counter::Active => self.active,
            Counter::Skipped => self.skipped,
        }
    }

    pub fn increment(&mut self, counter: Counter) {
        let slot = match counter {
            Counter::Registrations => &mut self.registrations,
            Counter::NewlyRegistered => &mut self.newly_registered,
            Counter::Inactive => &mut self.inactive,
            Counter::Active => &mut self.active,
            Counter::Skipped => &mut self.skipped,
        };
        *slot += 1;
    }

    pub fn iter(&self) -> impl Iterator<Item = (Counter, u32)> + '_ {
        Counter::ALL.into_iter().map(|counter| (counter, self.get(counter)))
    }

    /// Addresses that reached a terminal cohort or were skipped. Registrations overlap with
    /// `newly_registered`/`skipped` and are left out.
    pub fn classified_total(&self) -> u32 {
        self.newly_registered + self.inactive + self.active + self.skipped
    }
}

// key: generator-flags -> who gets registered and granted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantFlags {
    pub create_users: bool,
    pub include_groups: BTreeSet<Cohort>,
}

impl Default for GrantFlags {
    fn default() -> Self {
        Self {
            create_users: true,
            include_groups: [Cohort::NewlyRegistered, Cohort::Inactive]
                .into_iter()
                .collect(),
        }
    }
}

impl GrantFlags {
    pub fn includes(&self, cohort: Cohort) -> bool {
        self.include_groups.contains(&cohort)
    }
}

// key: generator-window -> shared [start, end) for every grant of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl GrantWindow {
    /// Start falls back to `now`, end to `start + length_days`. A lifetime type has no usable
    /// nominal end, so the caller has to pass one explicitly.
    pub fn resolve(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        subscription_type: &SubscriptionType,
        lifetime_threshold_days: i64,
        now: DateTime<Utc>,
    ) -> AppResult<Self> {
        let start = start.unwrap_or(now);
        if let Some(end) = end {
            return Ok(Self { start, end });
        }

        if subscription_type.is_lifetime(lifetime_threshold_days) {
            return Err(AppError::BadRequest(format!(
                "subscription type `{}` is a lifetime plan; an end time is required",
                subscription_type.code
            )));
        }
        let end = subscription_type
            .length()
            .and_then(|length| start.checked_add_signed(length))
            .ok_or_else(|| {
                AppError::BadRequest(format!(
                    "subscription type `{}` length of {} days overflows the grant window",
                    subscription_type.code, subscription_type.length_days
                ))
            })?;
        Ok(Self { start, end })
    }
}

/// Account creation request for an unknown address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationJob {
    pub email: String,
    pub send_email: bool,
    pub source: String,
    pub check_email: bool,
}

impl RegistrationJob {
    pub fn new(email: &str, source: &str) -> Self {
        Self {
            email: email.to_string(),
            send_email: true,
            source: source.to_string(),
            check_email: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantJob {
    pub subscription_type_id: i32,
    pub email: String,
    #[serde(rename = "type")]
    pub kind: SubscriptionKind,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_paid: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorJobs {
    #[serde(rename = "register")]
    pub registrations: Vec<RegistrationJob>,
    #[serde(rename = "subscribe")]
    pub grants: Vec<GrantJob>,
}

impl GeneratorJobs {
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty() && self.grants.is_empty()
    }
}

// key: generator-payload -> single async message per generate run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorPayload {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub message_type: String,
    pub created_at: DateTime<Utc>,
    pub payload: GeneratorJobs,
}

impl GeneratorPayload {
    pub fn new(message_type: &str, created_at: DateTime<Utc>, jobs: GeneratorJobs) -> Self {
        Self {
            id: Uuid::new_v4(),
            message_type: message_type.to_string(),
            created_at,
            payload: jobs,
        }
    }
}

/// Address the validator rejected. Still processed like any other.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvalidEmail {
    pub email: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "cohort", rename_all = "snake_case")]
pub enum EmailOutcome {
    /// Unknown address while account creation is off. Not counted.
    Dropped,
    Skipped(Cohort),
    Granted(Cohort),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedEmail {
    pub email: String,
    pub registered: bool,
    pub outcome: EmailOutcome,
}

// key: generator-request -> operator input for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorRequest {
    pub subscription_type_id: i32,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_paid: bool,
    #[serde(rename = "type")]
    pub kind: SubscriptionKind,
    pub emails: String,
    #[serde(flatten)]
    pub flags: GrantFlags,
    /// `false` is a dry-run: summary only, nothing dispatched.
    pub generate: bool,
}

impl GeneratorRequest {
    pub fn new(subscription_type_id: i32, emails: impl Into<String>) -> Self {
        Self {
            subscription_type_id,
            start_time: None,
            end_time: None,
            is_paid: false,
            kind: SubscriptionKind::Free,
            emails: emails.into(),
            flags: GrantFlags::default(),
            generate: false,
        }
    }
}
