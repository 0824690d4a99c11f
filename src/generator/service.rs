use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::config;
use crate::directory::{SubscriptionLookup, SubscriptionTypeLookup, UserLookup};
use crate::email::{EmailValidator, RegexEmailValidator};
use crate::error::{AppError, AppResult};

use super::classifier::{parse_email_lines, BatchClassifier, GrantBatch};
use super::dispatch::JobSink;
use super::models::{
    ClassifiedEmail, CohortCounters, GeneratorJobs, GeneratorPayload, GeneratorRequest,
    GrantWindow, InvalidEmail,
};
use super::summary::RunSummary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    pub registration_source: String,
    pub message_type: String,
    /// Types at least this many days long are treated as lifetime plans.
    pub lifetime_threshold_days: i64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            registration_source: config::GENERATOR_REGISTRATION_SOURCE.clone(),
            message_type: config::GENERATOR_MESSAGE_TYPE.clone(),
            lifetime_threshold_days: *config::SUBSCRIPTION_LIFETIME_THRESHOLD_DAYS,
        }
    }
}

/// Outcome of one generator run, dry or not.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratorReport {
    pub window: GrantWindow,
    pub counters: CohortCounters,
    pub summary: RunSummary,
    pub invalid_emails: Vec<InvalidEmail>,
    pub outcomes: Vec<ClassifiedEmail>,
    pub jobs: GeneratorJobs,
    /// Message id of the dispatched payload; `None` on dry-run.
    pub dispatched: Option<Uuid>,
}

// key: generator-service -> bulk registration and grant runs
#[derive(Clone)]
pub struct GeneratorService {
    users: Arc<dyn UserLookup>,
    subscriptions: Arc<dyn SubscriptionLookup>,
    types: Arc<dyn SubscriptionTypeLookup>,
    validator: Arc<dyn EmailValidator>,
    sink: Arc<dyn JobSink>,
    config: GeneratorConfig,
    now: Option<DateTime<Utc>>,
}

impl GeneratorService {
    pub fn new<D>(directory: Arc<D>, sink: Arc<dyn JobSink>) -> Self
    where
        D: UserLookup + SubscriptionLookup + SubscriptionTypeLookup + 'static,
    {
        Self {
            users: directory.clone(),
            subscriptions: directory.clone(),
            types: directory,
            validator: Arc::new(RegexEmailValidator),
            sink,
            config: GeneratorConfig::default(),
            now: None,
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn EmailValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_config(mut self, config: GeneratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn set_now(&mut self, now: DateTime<Utc>) {
        self.now = Some(now);
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    pub async fn run(&self, request: &GeneratorRequest) -> AppResult<GeneratorReport> {
        let now = self.now();
        let subscription_type = self
            .types
            .find_type(request.subscription_type_id)
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "subscription type {}",
                    request.subscription_type_id
                ))
            })?;

        let window = GrantWindow::resolve(
            request.start_time,
            request.end_time,
            &subscription_type,
            self.config.lifetime_threshold_days,
            now,
        )?;
        let batch = GrantBatch {
            subscription_type,
            window,
            kind: request.kind,
            is_paid: request.is_paid,
            flags: request.flags.clone(),
        };

        let emails = parse_email_lines(&request.emails);
        let classifier = BatchClassifier::new(
            self.users.as_ref(),
            self.subscriptions.as_ref(),
            self.validator.as_ref(),
            &self.config.registration_source,
            now,
        );
        let classification = classifier.classify(&emails, &batch).await?;
        let summary = RunSummary::build(
            &classification.counters,
            &classification.invalid_emails,
            request.generate,
        );

        let dispatched = if request.generate {
            let payload = GeneratorPayload::new(
                &self.config.message_type,
                now,
                classification.jobs.clone(),
            );
            let id = payload.id;
            self.sink.dispatch(payload).await?;
            Some(id)
        } else {
            None
        };

        let counters = classification.counters;
        info!(
            subscription_type = batch.subscription_type.id,
            generate = request.generate,
            addresses = emails.len(),
            registrations = counters.registrations,
            newly_registered = counters.newly_registered,
            inactive = counters.inactive,
            active = counters.active,
            skipped = counters.skipped,
            invalid = classification.invalid_emails.len(),
            dispatched = ?dispatched,
            "subscription generator run finished"
        );

        Ok(GeneratorReport {
            window,
            counters,
            summary,
            invalid_emails: classification.invalid_emails,
            outcomes: classification.outcomes,
            jobs: classification.jobs,
            dispatched,
        })
    }
}
