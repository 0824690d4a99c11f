use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::directory::{SubscriptionLookup, UserLookup};
use crate::email::EmailValidator;
use crate::error::AppResult;
use crate::subscriptions::models::{SubscriptionKind, SubscriptionType};

use super::models::{
    ClassifiedEmail, Cohort, CohortCounters, Counter, EmailOutcome, GeneratorJobs, GrantFlags,
    GrantJob, GrantWindow, InvalidEmail, RegistrationJob,
};

/// Splits operator input into addresses: one per line, trimmed, blanks dropped. Order and
/// duplicates are kept.
pub fn parse_email_lines(text: &str) -> Vec<String> {
    text.split('\n')
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Everything a grant job shares across one run.
#[derive(Debug, Clone)]
pub struct GrantBatch {
    pub subscription_type: SubscriptionType,
    pub window: GrantWindow,
    pub kind: SubscriptionKind,
    pub is_paid: bool,
    pub flags: GrantFlags,
}

impl GrantBatch {
    fn grant_job(&self, email: &str) -> GrantJob {
        GrantJob {
            subscription_type_id: self.subscription_type.id,
            email: email.to_string(),
            kind: self.kind,
            start_time: self.window.start,
            end_time: self.window.end,
            is_paid: self.is_paid,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Classification {
    pub jobs: GeneratorJobs,
    pub counters: CohortCounters,
    pub invalid_emails: Vec<InvalidEmail>,
    pub outcomes: Vec<ClassifiedEmail>,
}

// key: generator-classifier -> cohorts, counters and job lists
pub struct BatchClassifier<'a> {
    users: &'a dyn UserLookup,
    subscriptions: &'a dyn SubscriptionLookup,
    validator: &'a dyn EmailValidator,
    registration_source: &'a str,
    now: DateTime<Utc>,
}

impl<'a> BatchClassifier<'a> {
    pub fn new(
        users: &'a dyn UserLookup,
        subscriptions: &'a dyn SubscriptionLookup,
        validator: &'a dyn EmailValidator,
        registration_source: &'a str,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            users,
            subscriptions,
            validator,
            registration_source,
            now,
        }
    }

    /// Processes addresses strictly in input order. Only lookup failures abort the run.
    pub async fn classify(
        &self,
        raw_emails: &[String],
        batch: &GrantBatch,
    ) -> AppResult<Classification> {
        let mut result = Classification::default();

        for raw in raw_emails {
            let email = raw.trim();
            if email.is_empty() {
                continue;
            }
            if !self.validator.is_valid(email) {
                warn!(email = %email, "generator input contains invalid email");
                result.invalid_emails.push(InvalidEmail {
                    email: email.to_string(),
                });
            }

            let classified = self.classify_one(email, batch, &mut result).await?;
            debug!(
                email = %classified.email,
                registered = classified.registered,
                outcome = ?classified.outcome,
                "classified generator address"
            );
            result.outcomes.push(classified);
        }

        Ok(result)
    }

    async fn classify_one(
        &self,
        email: &str,
        batch: &GrantBatch,
        result: &mut Classification,
    ) -> AppResult<ClassifiedEmail> {
        let Some(user) = self.users.find_user_by_email(email).await? else {
            return Ok(self.classify_unknown(email, batch, result));
        };

        let actual = self
            .subscriptions
            .actual_subscription(user.id, self.now)
            .await?
            .is_some();
        let cohort = if actual {
            Cohort::Active
        } else {
            Cohort::Inactive
        };

        let outcome = if batch.flags.includes(cohort) {
            result.counters.increment(cohort.counter());
            result.jobs.grants.push(batch.grant_job(&user.email));
            EmailOutcome::Granted(cohort)
        } else {
            result.counters.increment(Counter::Skipped);
            EmailOutcome::Skipped(cohort)
        };

        Ok(ClassifiedEmail {
            email: user.email,
            registered: false,
            outcome,
        })
    }

    fn classify_unknown(
        &self,
        email: &str,
        batch: &GrantBatch,
        result: &mut Classification,
    ) -> ClassifiedEmail {
        if !batch.flags.create_users {
            return ClassifiedEmail {
                email: email.to_string(),
                registered: false,
                outcome: EmailOutcome::Dropped,
            };
        }

        result
            .jobs
            .registrations
            .push(RegistrationJob::new(email, self.registration_source));
        result.counters.increment(Counter::Registrations);

        let cohort = Cohort::NewlyRegistered;
        let outcome = if batch.flags.includes(cohort) {
            result.jobs.grants.push(batch.grant_job(email));
            result.counters.increment(Counter::NewlyRegistered);
            EmailOutcome::Granted(cohort)
        } else {
            result.counters.increment(Counter::Skipped);
            EmailOutcome::Skipped(cohort)
        };

        ClassifiedEmail {
            email: email.to_string(),
            registered: true,
            outcome,
        }
    }
}
