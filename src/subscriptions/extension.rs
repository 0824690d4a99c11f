use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tracing::debug;

use crate::config;

use super::models::{SubscriptionSpan, SubscriptionType};

// key: extension-config -> lifetime handling knobs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtensionConfig {
    pub lifetime_threshold: Duration,
    /// Also skip lifetime spans that have not started yet. Off by default: only the lifetime
    /// span covering `now` is ignored.
    pub skip_future_lifetime: bool,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            lifetime_threshold: Duration::days(*config::SUBSCRIPTION_LIFETIME_THRESHOLD_DAYS),
            skip_future_lifetime: *config::SUBSCRIPTION_EXTENSION_SKIP_FUTURE_LIFETIME,
        }
    }
}

/// Start date for a new subscription and whether it continues an existing same-type span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedStart {
    pub date: DateTime<Utc>,
    pub extending: bool,
}

impl ResolvedStart {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            date: now,
            extending: false,
        }
    }
}

// key: extension-resolver -> start time for a new grant
/// Single pass over the user's spans keeping two running maxima:
/// - latest end among spans of the target type that have not ended before `now`
/// - latest end among spans of any type covering `now`
///
/// A same-type candidate wins and marks the result as extending. Otherwise an actual span of
/// another type pushes the start to its end without extending. A lifetime span covering `now`
/// takes part in neither maximum.
pub fn resolve_start(
    now: DateTime<Utc>,
    spans: &[SubscriptionSpan],
    target: &SubscriptionType,
    config: &ExtensionConfig,
) -> ResolvedStart {
    let mut same_type_end: Option<DateTime<Utc>> = None;
    let mut actual_end: Option<DateTime<Utc>> = None;

    for span in spans {
        let actual = span.is_actual(now);
        if span.is_lifetime(config.lifetime_threshold) && (actual || config.skip_future_lifetime) {
            continue;
        }
        if span.is_of_type(target) && span.end_time >= now {
            same_type_end = same_type_end.max(Some(span.end_time));
        }
        if actual {
            actual_end = actual_end.max(Some(span.end_time));
        }
    }

    match (same_type_end, actual_end) {
        (Some(date), _) => ResolvedStart {
            date,
            extending: true,
        },
        (None, Some(date)) => ResolvedStart {
            date,
            extending: false,
        },
        (None, None) => ResolvedStart::fresh(now),
    }
}

/// Resolver with an injectable clock.
#[derive(Debug, Clone, Default)]
pub struct ExtensionResolver {
    config: ExtensionConfig,
    now: Option<DateTime<Utc>>,
}

impl ExtensionResolver {
    pub fn new(config: ExtensionConfig) -> Self {
        Self { config, now: None }
    }

    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn set_now(&mut self, now: DateTime<Utc>) {
        self.now = Some(now);
    }

    pub fn config(&self) -> &ExtensionConfig {
        &self.config
    }

    /// The fixed instant when one was set, the wall clock otherwise.
    pub fn now(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now)
    }

    pub fn resolve(&self, spans: &[SubscriptionSpan], target: &SubscriptionType) -> ResolvedStart {
        let now = self.now();
        let resolved = resolve_start(now, spans, target, &self.config);
        debug!(
            subscription_type = target.id,
            spans = spans.len(),
            start = %resolved.date,
            extending = resolved.extending,
            "resolved subscription start"
        );
        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscriptions::models::SubscriptionKind;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2021, 2, 1, 0, 0, 0).unwrap()
    }

    fn days(n: i64) -> DateTime<Utc> {
        now() + Duration::days(n)
    }

    fn subscription_type(id: i32) -> SubscriptionType {
        SubscriptionType {
            id,
            code: format!("type-{id}"),
            name: format!("Type {id}"),
            length_days: 30,
            active: true,
        }
    }

    fn span(type_id: i32, start: DateTime<Utc>, end: DateTime<Utc>) -> SubscriptionSpan {
        SubscriptionSpan {
            id: 0,
            user_id: 1,
            subscription_type_id: type_id,
            start_time: start,
            end_time: end,
            is_paid: false,
            kind: SubscriptionKind::Regular,
        }
    }

    fn resolve(spans: &[SubscriptionSpan], target: i32) -> ResolvedStart {
        ExtensionResolver::new(ExtensionConfig {
            lifetime_threshold: Duration::days(99 * 365),
            skip_future_lifetime: false,
        })
        .with_now(now())
        .resolve(spans, &subscription_type(target))
    }

    #[test]
    fn empty_history_starts_now() {
        assert_eq!(resolve(&[], 1), ResolvedStart::fresh(now()));
    }

    #[test]
    fn actual_same_type_extends_from_its_end() {
        let result = resolve(&[span(1, now(), days(25))], 1);
        assert_eq!(result.date, days(25));
        assert!(result.extending);
    }

    #[test]
    fn expired_same_type_starts_now() {
        let result = resolve(&[span(1, days(-35), days(-5))], 1);
        assert_eq!(result, ResolvedStart::fresh(now()));
    }

    #[test]
    fn actual_other_type_anchors_without_extending() {
        let result = resolve(&[span(1, days(-5), days(25))], 2);
        assert_eq!(result.date, days(25));
        assert!(!result.extending);
    }

    #[test]
    fn expired_other_type_starts_now() {
        let result = resolve(&[span(1, days(-35), days(-5))], 2);
        assert_eq!(result, ResolvedStart::fresh(now()));
    }

    #[test]
    fn overlapping_same_type_spans_pick_latest_end() {
        let spans = [span(1, days(-5), days(25)), span(1, days(-10), days(20))];
        let result = resolve(&spans, 1);
        assert_eq!(result.date, days(25));
        assert!(result.extending);
    }

    #[test]
    fn later_other_type_span_does_not_displace_same_type_chain() {
        let spans = [
            span(1, days(-5), days(25)),
            span(1, days(50), days(80)),
            span(2, days(60), days(90)),
        ];
        let result = resolve(&spans, 1);
        assert_eq!(result.date, days(80));
        assert!(result.extending);
    }

    #[test]
    fn future_same_type_span_is_extended() {
        let result = resolve(&[span(1, days(10), days(40))], 1);
        assert_eq!(result.date, days(40));
        assert!(result.extending);
    }

    #[test]
    fn actual_lifetime_same_type_is_not_extended() {
        let lifetime_end = Utc.with_ymd_and_hms(2121, 1, 27, 0, 0, 0).unwrap();
        let result = resolve(&[span(1, days(-5), lifetime_end)], 1);
        assert_eq!(result, ResolvedStart::fresh(now()));
    }

    #[test]
    fn actual_lifetime_other_type_does_not_anchor() {
        let lifetime_end = Utc.with_ymd_and_hms(2121, 1, 27, 0, 0, 0).unwrap();
        let result = resolve(&[span(2, days(-5), lifetime_end)], 1);
        assert_eq!(result, ResolvedStart::fresh(now()));
    }

    #[test]
    fn future_lifetime_same_type_is_an_extension_target() {
        let lifetime_end = days(25) + Duration::days(36525);
        let spans = [span(1, days(-5), days(25)), span(1, days(25), lifetime_end)];
        let result = resolve(&spans, 1);
        assert_eq!(result.date, lifetime_end);
        assert!(result.extending);
    }

    #[test]
    fn future_lifetime_can_be_skipped_by_config() {
        let lifetime_end = days(25) + Duration::days(36525);
        let spans = [span(1, days(-5), days(25)), span(1, days(25), lifetime_end)];
        let resolver = ExtensionResolver::new(ExtensionConfig {
            lifetime_threshold: Duration::days(99 * 365),
            skip_future_lifetime: true,
        })
        .with_now(now());

        let result = resolver.resolve(&spans, &subscription_type(1));
        assert_eq!(result.date, days(25));
        assert!(result.extending);
    }

    #[test]
    fn fixed_now_is_used_instead_of_wall_clock() {
        let mut resolver = ExtensionResolver::default();
        resolver.set_now(now());
        assert_eq!(resolver.now(), now());
        assert_eq!(resolver.resolve(&[], &subscription_type(1)).date, now());
    }
}
