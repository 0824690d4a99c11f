use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use crate::error::AppResult;
use crate::subscriptions::models::{SubscriptionKind, SubscriptionSpan, SubscriptionType, User};

use super::{SubscriptionLookup, SubscriptionTypeLookup, UserLookup};

// key: directory-memory -> process-local users, types and spans
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    users: DashMap<String, User>,
    types: DashMap<i32, SubscriptionType>,
    spans: DashMap<i32, Vec<SubscriptionSpan>>,
    next_user_id: AtomicI32,
    next_span_id: AtomicI32,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `email`, returning the existing user when the address is already known.
    pub fn add_user(&self, email: &str) -> User {
        let key = normalize(email);
        self.users
            .entry(key)
            .or_insert_with(|| User {
                id: self.next_user_id.fetch_add(1, Ordering::SeqCst) + 1,
                email: email.trim().to_string(),
            })
            .clone()
    }

    pub fn add_type(&self, subscription_type: SubscriptionType) {
        self.types.insert(subscription_type.id, subscription_type);
    }

    pub fn add_subscription(
        &self,
        user: &User,
        subscription_type: &SubscriptionType,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        is_paid: bool,
        kind: SubscriptionKind,
    ) -> SubscriptionSpan {
        let span = SubscriptionSpan {
            id: self.next_span_id.fetch_add(1, Ordering::SeqCst) + 1,
            user_id: user.id,
            subscription_type_id: subscription_type.id,
            start_time,
            end_time,
            is_paid,
            kind,
        };
        self.spans.entry(user.id).or_default().push(span.clone());
        span
    }
}

fn normalize(email: &str) -> String {
    email.trim().to_lowercase()
}

#[async_trait]
impl UserLookup for InMemoryDirectory {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self.users.get(&normalize(email)).map(|entry| entry.clone()))
    }
}

#[async_trait]
impl SubscriptionLookup for InMemoryDirectory {
    async fn actual_subscription(
        &self,
        user_id: i32,
        at: DateTime<Utc>,
    ) -> AppResult<Option<SubscriptionSpan>> {
        let Some(spans) = self.spans.get(&user_id) else {
            return Ok(None);
        };
        let actual = spans
            .iter()
            .filter(|span| span.is_actual(at))
            .max_by_key(|span| span.end_time)
            .cloned();
        Ok(actual)
    }

    async fn user_subscriptions(&self, user_id: i32) -> AppResult<Vec<SubscriptionSpan>> {
        Ok(self
            .spans
            .get(&user_id)
            .map(|spans| spans.clone())
            .unwrap_or_default())
    }
}

#[async_trait]
impl SubscriptionTypeLookup for InMemoryDirectory {
    async fn find_type(&self, id: i32) -> AppResult<Option<SubscriptionType>> {
        Ok(self.types.get(&id).map(|entry| entry.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn monthly() -> SubscriptionType {
        SubscriptionType {
            id: 7,
            code: "monthly".into(),
            name: "Monthly".into(),
            length_days: 30,
            active: true,
        }
    }

    #[tokio::test]
    async fn email_lookup_ignores_case_and_padding() {
        let directory = InMemoryDirectory::new();
        let user = directory.add_user("Reader@Example.com");

        let found = directory
            .find_user_by_email("  reader@example.COM ")
            .await
            .unwrap()
            .expect("user should be found");
        assert_eq!(found, user);
        assert_eq!(directory.add_user("reader@example.com").id, user.id);
    }

    #[tokio::test]
    async fn actual_subscription_respects_half_open_interval() {
        let directory = InMemoryDirectory::new();
        let user = directory.add_user("a@example.com");
        let subscription_type = monthly();
        let start = Utc.with_ymd_and_hms(2021, 2, 1, 0, 0, 0).unwrap();
        let end = start + Duration::days(30);
        directory.add_subscription(
            &user,
            &subscription_type,
            start,
            end,
            true,
            SubscriptionKind::Regular,
        );

        assert!(directory
            .actual_subscription(user.id, start)
            .await
            .unwrap()
            .is_some());
        assert!(directory
            .actual_subscription(user.id, end)
            .await
            .unwrap()
            .is_none());
        assert_eq!(directory.user_subscriptions(user.id).await.unwrap().len(), 1);
        assert!(directory.user_subscriptions(999).await.unwrap().is_empty());
    }
}
