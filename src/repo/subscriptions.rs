use uuid::Uuid;

use chrono::{DateTime, Utc};

use sqlx::PgPool;

use crate::domain::Frequency;
use crate::model::{Subscription, SubscriptionDraft};

/// Errors surfaced by subscription storage
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    /// A unique constraint was hit (email or token already stored)
    #[error("Subscription already exists")]
    Conflict,
    /// No row matched the lookup or mutation
    #[error("Subscription not found")]
    NotFound,
    #[error("Stored subscription {id} is malformed: {reason}")]
    Malformed { id: Uuid, reason: String },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Subscription repository trait, must be implemented for each storage backend.
/// NOTE: Intended to facilitate easier testing/mocking
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait SubscriptionRepo: Send + Sync {
    /// Insert a new, unconfirmed subscription and return the stored record
    async fn create(&self, draft: &SubscriptionDraft) -> RepoResult<Subscription>;

    /// Find a subscription by its exact email
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Subscription>>;

    /// Find a subscription by its confirmation token
    async fn get_by_token(&self, confirm_token: &str) -> RepoResult<Option<Subscription>>;

    /// Persist every mutable field of an existing subscription
    async fn update(&self, subscription: &Subscription) -> RepoResult<()>;

    /// Delete the subscription owning `unsubscribe_token`.
    /// Fails with [`RepoError::NotFound`] if nothing was deleted.
    async fn unsubscribe_by_token(&self, unsubscribe_token: &str) -> RepoResult<()>;

    /// Fetch all subscriptions that have been confirmed
    async fn get_all_confirmed(&self) -> RepoResult<Vec<Subscription>>;
}

/// Postgres Subscription Repository
#[derive(Debug, Clone)]
pub struct PgSubscriptionRepo {
    pool: PgPool,
}

impl PgSubscriptionRepo {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl SubscriptionRepo for PgSubscriptionRepo {
    #[tracing::instrument(name = "Insert subscription", skip(self, draft), fields(email = %draft.email))]
    async fn create(&self, draft: &SubscriptionDraft) -> RepoResult<Subscription> {
        let row = sqlx::query_as!(
            SubscriptionRow,
            "insert into subscriptions(id, email, city, frequency, confirm_token, unsubscribe_token) values ($1, $2, $3, $4, $5, $6) returning *",
            Uuid::new_v4(),
            draft.email,
            draft.city,
            draft.frequency.as_str(),
            draft.confirm_token,
            draft.unsubscribe_token,
        )
        .fetch_one(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.try_into()
    }

    #[tracing::instrument(name = "Find subscription by email", skip(self))]
    async fn find_by_email(&self, email: &str) -> RepoResult<Option<Subscription>> {
        sqlx::query_as!(
            SubscriptionRow,
            "select * from subscriptions where email=$1",
            email
        )
        .fetch_optional(&self.pool)
        .await?
        .map(Subscription::try_from)
        .transpose()
    }

    #[tracing::instrument(name = "Find subscription by confirmation token", skip_all)]
    async fn get_by_token(&self, confirm_token: &str) -> RepoResult<Option<Subscription>> {
        sqlx::query_as!(
            SubscriptionRow,
            "select * from subscriptions where confirm_token=$1",
            confirm_token
        )
        .fetch_optional(&self.pool)
        .await?
        .map(Subscription::try_from)
        .transpose()
    }

    #[tracing::instrument(name = "Update subscription", skip(self, subscription), fields(id = %subscription.id))]
    async fn update(&self, subscription: &Subscription) -> RepoResult<()> {
        let result = sqlx::query!(
            "update subscriptions set email=$2, city=$3, frequency=$4, confirmed=$5, confirm_token=$6, unsubscribe_token=$7, last_sent_at=$8 where id=$1",
            subscription.id,
            subscription.email,
            subscription.city,
            subscription.frequency.as_str(),
            subscription.confirmed,
            subscription.confirm_token,
            subscription.unsubscribe_token,
            subscription.last_sent_at,
        )
        .execute(&self.pool)
        .await
        .map_err(map_unique_violation)?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    #[tracing::instrument(name = "Delete subscription by unsubscribe token", skip_all)]
    async fn unsubscribe_by_token(&self, unsubscribe_token: &str) -> RepoResult<()> {
        let result = sqlx::query!(
            "delete from subscriptions where unsubscribe_token=$1",
            unsubscribe_token
        )
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }

    #[tracing::instrument(name = "Fetch all confirmed subscriptions", skip(self))]
    async fn get_all_confirmed(&self) -> RepoResult<Vec<Subscription>> {
        let rows = sqlx::query_as!(
            SubscriptionRow,
            "select * from subscriptions where confirmed order by created_at"
        )
        .fetch_all(&self.pool)
        .await?;

        let subscriptions = rows
            .into_iter()
            .filter_map(|row| match Subscription::try_from(row) {
                Ok(subscription) => Some(subscription),
                Err(error) => {
                    tracing::warn!(
                        error.cause_chain = ?error,
                        "Skipping a malformed confirmed subscription"
                    );
                    None
                }
            })
            .collect();

        Ok(subscriptions)
    }
}

/// Email and token columns carry unique indexes, a violation means the subscription already exists
fn map_unique_violation(e: sqlx::Error) -> RepoError {
    match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => RepoError::Conflict,
        other => RepoError::Database(other),
    }
}

/// Raw `subscriptions` row, before the frequency is parsed back into a [`Frequency`]
#[derive(Debug)]
struct SubscriptionRow {
    id: Uuid,
    email: String,
    city: String,
    frequency: String,
    confirmed: bool,
    confirm_token: String,
    unsubscribe_token: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    last_sent_at: Option<DateTime<Utc>>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = RepoError;

    fn try_from(row: SubscriptionRow) -> RepoResult<Self> {
        let frequency: Frequency = row.frequency.parse().map_err(|reason| RepoError::Malformed {
            id: row.id,
            reason,
        })?;

        Ok(Self {
            id: row.id,
            email: row.email,
            city: row.city,
            frequency,
            confirmed: row.confirmed,
            confirm_token: row.confirm_token,
            unsubscribe_token: row.unsubscribe_token,
            created_at: row.created_at,
            updated_at: row.updated_at,
            last_sent_at: row.last_sent_at,
        })
    }
}
