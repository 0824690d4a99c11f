use serde::{Deserialize, Serialize};

use super::models::{CohortCounters, Counter, InvalidEmail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryMessage {
    pub counter: Option<Counter>,
    pub count: u32,
    pub severity: Severity,
    pub text: String,
}

// key: generator-summary -> operator facing report of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub messages: Vec<SummaryMessage>,
}

impl RunSummary {
    /// One line per counter. Counters read as info on a generate run and as warnings on a
    /// dry-run; skipped addresses are always a warning. Rejected addresses follow as warnings.
    pub fn build(
        counters: &CohortCounters,
        invalid_emails: &[InvalidEmail],
        generate: bool,
    ) -> Self {
        let run_severity = if generate {
            Severity::Info
        } else {
            Severity::Warning
        };

        let mut messages: Vec<SummaryMessage> = counters
            .iter()
            .map(|(counter, count)| SummaryMessage {
                counter: Some(counter),
                count,
                severity: if counter == Counter::Skipped {
                    Severity::Warning
                } else {
                    run_severity
                },
                text: counter_text(counter, count, generate),
            })
            .collect();

        messages.extend(invalid_emails.iter().map(|invalid| SummaryMessage {
            counter: None,
            count: 1,
            severity: Severity::Warning,
            text: format!("Invalid email address: {}", invalid.email),
        }));

        Self { messages }
    }

    pub fn warnings(&self) -> impl Iterator<Item = &SummaryMessage> {
        self.messages
            .iter()
            .filter(|message| message.severity == Severity::Warning)
    }
}

fn counter_text(counter: Counter, count: u32, generate: bool) -> String {
    let verb = if generate { "will be" } else { "would be" };
    match counter {
        Counter::Registrations => format!("{count} users {verb} registered"),
        Counter::NewlyRegistered => {
            format!("{count} newly registered users {verb} granted a subscription")
        }
        Counter::Inactive => format!("{count} inactive users {verb} granted a subscription"),
        Counter::Active => format!("{count} active users {verb} granted a subscription"),
        Counter::Skipped => format!("{count} users were skipped"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn counters() -> CohortCounters {
        CohortCounters {
            registrations: 2,
            newly_registered: 1,
            inactive: 3,
            active: 0,
            skipped: 1,
        }
    }

    #[test]
    fn dry_run_reports_everything_as_warning() {
        let summary = RunSummary::build(&counters(), &[], false);
        assert_eq!(summary.messages.len(), 5);
        assert!(summary
            .messages
            .iter()
            .all(|message| message.severity == Severity::Warning));
        assert_eq!(summary.messages[0].text, "2 users would be registered");
    }

    #[test]
    fn generate_run_keeps_skipped_as_warning() {
        let summary = RunSummary::build(&counters(), &[], true);
        let skipped = summary
            .messages
            .iter()
            .find(|message| message.counter == Some(Counter::Skipped))
            .expect("skipped line");
        assert_eq!(skipped.severity, Severity::Warning);
        assert_eq!(summary.warnings().count(), 1);
        assert_eq!(summary.messages[2].count, 3);
    }

    #[test]
    fn invalid_addresses_are_appended() {
        let invalid = [InvalidEmail {
            email: "broken@".into(),
        }];
        let summary = RunSummary::build(&counters(), &invalid, true);
        let last = summary.messages.last().unwrap();
        assert_eq!(last.counter, None);
        assert!(last.text.contains("broken@"));
    }
}
