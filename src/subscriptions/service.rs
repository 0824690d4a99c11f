use std::sync::Arc;

use tracing::info;

use crate::directory::SubscriptionLookup;
use crate::error::AppResult;

use super::extension::{ExtensionResolver, ResolvedStart};
use super::models::{SubscriptionType, User};

// key: extension-service -> start time for a user's next grant
#[derive(Clone)]
pub struct ExtensionService {
    subscriptions: Arc<dyn SubscriptionLookup>,
    resolver: ExtensionResolver,
}

impl ExtensionService {
    pub fn new(subscriptions: Arc<dyn SubscriptionLookup>, resolver: ExtensionResolver) -> Self {
        Self {
            subscriptions,
            resolver,
        }
    }

    pub fn resolver(&self) -> &ExtensionResolver {
        &self.resolver
    }

    pub fn resolver_mut(&mut self) -> &mut ExtensionResolver {
        &mut self.resolver
    }

    pub async fn start_time(
        &self,
        user: &User,
        subscription_type: &SubscriptionType,
    ) -> AppResult<ResolvedStart> {
        let spans = self.subscriptions.user_subscriptions(user.id).await?;
        let resolved = self.resolver.resolve(&spans, subscription_type);
        info!(
            user_id = user.id,
            subscription_type = %subscription_type.code,
            start = %resolved.date,
            extending = resolved.extending,
            "computed subscription start time"
        );
        Ok(resolved)
    }
}
