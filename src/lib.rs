pub mod config;
pub mod directory;
pub mod email;
pub mod error;
pub mod generator;
pub mod subscriptions;
pub mod telemetry;

pub use error::{AppError, AppResult};
