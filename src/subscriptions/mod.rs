pub mod extension;
pub mod models;
pub mod service;

pub use extension::{resolve_start, ExtensionConfig, ExtensionResolver, ResolvedStart};
pub use models::{SubscriptionKind, SubscriptionSpan, SubscriptionType, User};
pub use service::ExtensionService;
