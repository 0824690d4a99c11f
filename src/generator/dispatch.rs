use async_trait::async_trait;
use sqlx::PgPool;
use tokio::sync::mpsc::{channel, Receiver, Sender};
use tracing::info;

use crate::config;
use crate::error::{AppError, AppResult};

use super::models::GeneratorPayload;

// key: generator-sink -> hand-off to the registration/subscription workers
#[async_trait]
pub trait JobSink: Send + Sync {
    async fn dispatch(&self, payload: GeneratorPayload) -> AppResult<()>;
}

/// In-process sink backed by a bounded channel. The receiver belongs to whoever creates the
/// accounts and subscriptions.
#[derive(Clone)]
pub struct ChannelJobSink {
    sender: Sender<GeneratorPayload>,
}

impl ChannelJobSink {
    pub fn new(capacity: usize) -> (Self, Receiver<GeneratorPayload>) {
        let (sender, receiver) = channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    pub fn with_default_capacity() -> (Self, Receiver<GeneratorPayload>) {
        Self::new(*config::GENERATOR_DISPATCH_CAPACITY)
    }
}

#[async_trait]
impl JobSink for ChannelJobSink {
    async fn dispatch(&self, payload: GeneratorPayload) -> AppResult<()> {
        let id = payload.id;
        self.sender
            .send(payload)
            .await
            .map_err(|err| AppError::Dispatch(format!("generator channel closed: {err}")))?;
        info!(%id, "generator payload queued in process");
        Ok(())
    }
}

/// Persists payloads into `job_queue` for an out-of-process consumer.
#[derive(Clone)]
pub struct PgJobQueue {
    pool: PgPool,
}

impl PgJobQueue {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl JobSink for PgJobQueue {
    async fn dispatch(&self, payload: GeneratorPayload) -> AppResult<()> {
        let value = serde_json::to_value(&payload)?;
        let job_id: i32 =
            sqlx::query_scalar("INSERT INTO job_queue (payload) VALUES ($1) RETURNING id")
                .bind(value)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    tracing::error!(?e, "DB error enqueueing generator payload");
                    AppError::Db(e)
                })?;
        info!(%job_id, message = %payload.id, "generator payload persisted to job queue");
        Ok(())
    }
}
