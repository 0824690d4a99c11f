//! Lookups the subscription core consumes from the user and subscription stores.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::AppResult;
use crate::subscriptions::models::{SubscriptionSpan, SubscriptionType, User};

pub use memory::InMemoryDirectory;
pub use postgres::PgDirectory;

#[async_trait]
pub trait UserLookup: Send + Sync {
    /// Case-insensitive match on the stored address.
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
}

#[async_trait]
pub trait SubscriptionLookup: Send + Sync {
    /// Span of any type covering `at`, if the user has one.
    async fn actual_subscription(
        &self,
        user_id: i32,
        at: DateTime<Utc>,
    ) -> AppResult<Option<SubscriptionSpan>>;

    async fn user_subscriptions(&self, user_id: i32) -> AppResult<Vec<SubscriptionSpan>>;
}

#[async_trait]
pub trait SubscriptionTypeLookup: Send + Sync {
    async fn find_type(&self, id: i32) -> AppResult<Option<SubscriptionType>>;
}
