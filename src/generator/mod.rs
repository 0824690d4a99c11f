//! Bulk subscription generator: classify a list of addresses, then register and grant.

pub mod classifier;
pub mod dispatch;
pub mod models;
pub mod service;
pub mod summary;

pub use classifier::{parse_email_lines, BatchClassifier, Classification, GrantBatch};
pub use dispatch::{ChannelJobSink, JobSink, PgJobQueue};
pub use models::{
    ClassifiedEmail, Cohort, CohortCounters, Counter, EmailOutcome, GeneratorJobs,
    GeneratorPayload, GeneratorRequest, GrantFlags, GrantJob, GrantWindow, InvalidEmail,
    RegistrationJob,
};
pub use service::{GeneratorConfig, GeneratorReport, GeneratorService};
pub use summary::{RunSummary, Severity, SummaryMessage};
