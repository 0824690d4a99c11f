use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::error::{AppError, AppResult};
use crate::subscriptions::models::{SubscriptionSpan, SubscriptionType, User};

use super::{SubscriptionLookup, SubscriptionTypeLookup, UserLookup};

// key: directory-postgres -> read-only lookups against the subscriptions schema
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

const SPAN_COLUMNS: &str =
    "id, user_id, subscription_type_id, start_time, end_time, is_paid, type";

fn span_from_row(row: &PgRow) -> AppResult<SubscriptionSpan> {
    let kind: String = row.try_get("type")?;
    Ok(SubscriptionSpan {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        subscription_type_id: row.try_get("subscription_type_id")?,
        start_time: row.try_get("start_time")?,
        end_time: row.try_get("end_time")?,
        is_paid: row.try_get("is_paid")?,
        kind: kind.parse().map_err(|_| {
            AppError::Message(format!("subscription row carries unknown type `{kind}`"))
        })?,
    })
}

#[async_trait]
impl UserLookup for PgDirectory {
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT id, email FROM users WHERE LOWER(email) = LOWER($1) LIMIT 1")
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!(?e, "DB error looking up user by email");
                AppError::Db(e)
            })?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(User {
            id: row.try_get("id")?,
            email: row.try_get("email")?,
        }))
    }
}

#[async_trait]
impl SubscriptionLookup for PgDirectory {
    async fn actual_subscription(
        &self,
        user_id: i32,
        at: DateTime<Utc>,
    ) -> AppResult<Option<SubscriptionSpan>> {
        let row = sqlx::query(&format!(
            "SELECT {SPAN_COLUMNS} FROM subscriptions \
             WHERE user_id = $1 AND start_time <= $2 AND end_time > $2 \
             ORDER BY end_time DESC LIMIT 1"
        ))
        .bind(user_id)
        .bind(at)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(span_from_row).transpose()
    }

    async fn user_subscriptions(&self, user_id: i32) -> AppResult<Vec<SubscriptionSpan>> {
        let rows = sqlx::query(&format!(
            "SELECT {SPAN_COLUMNS} FROM subscriptions WHERE user_id = $1 ORDER BY end_time DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(span_from_row).collect()
    }
}

#[async_trait]
impl SubscriptionTypeLookup for PgDirectory {
    async fn find_type(&self, id: i32) -> AppResult<Option<SubscriptionType>> {
        let row = sqlx::query(
            "SELECT id, code, name, length, active FROM subscription_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let length: i32 = row.try_get("length")?;
        Ok(Some(SubscriptionType {
            id: row.try_get("id")?,
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            length_days: i64::from(length),
            active: row.try_get("active")?,
        }))
    }
}
