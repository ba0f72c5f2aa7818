use std::sync::Arc;

use crate::client::Mailer;
use crate::crypto::{generate_token, TokenError};
use crate::model::{NewSubscription, Subscription, SubscriptionDraft};
use crate::repo::{RepoError, SubscriptionRepo};

/// Lifecycle failures of a subscription
#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("Email already subscribed")]
    AlreadyExists,
    #[error("Subscription not found")]
    NotFound,
    #[error("Subscription already confirmed")]
    AlreadyConfirmed,
    #[error("Failed to update subscription")]
    UpdateFailed(#[source] RepoError),
    #[error("Failed to generate subscription token")]
    TokenGeneration(#[from] TokenError),
    #[error("Failed to send email")]
    SendEmail(#[source] anyhow::Error),
    #[error("Subscription storage failure")]
    Storage(#[source] RepoError),
}

impl From<RepoError> for SubscriptionError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::Conflict => Self::AlreadyExists,
            RepoError::NotFound => Self::NotFound,
            other => Self::Storage(other),
        }
    }
}

pub type SubscriptionResult<T> = Result<T, SubscriptionError>;

/// Owns the subscription lifecycle: unconfirmed -> confirmed -> deleted
#[derive(Clone)]
pub struct SubscriptionService {
    repo: Arc<dyn SubscriptionRepo>,
    mailer: Arc<dyn Mailer>,
}

impl SubscriptionService {
    pub fn new(repo: Arc<dyn SubscriptionRepo>, mailer: Arc<dyn Mailer>) -> Self {
        Self { repo, mailer }
    }

    /// Create an unconfirmed subscription and email its confirmation link
    ///
    /// The confirmation email is best effort: a delivery failure is logged and
    /// the created subscription is still returned.
    #[tracing::instrument(
        name = "Subscribe",
        skip(self, new_subscription),
        fields(email = %new_subscription.email, city = %new_subscription.city)
    )]
    pub async fn subscribe(&self, new_subscription: NewSubscription) -> SubscriptionResult<Subscription> {
        if self
            .repo
            .find_by_email(new_subscription.email.as_ref())
            .await
            .map_err(SubscriptionError::Storage)?
            .is_some()
        {
            return Err(SubscriptionError::AlreadyExists);
        }

        let draft = SubscriptionDraft {
            email: new_subscription.email.as_ref().to_string(),
            city: new_subscription.city.as_ref().to_string(),
            frequency: new_subscription.frequency,
            confirm_token: generate_token()?,
            unsubscribe_token: generate_token()?,
        };

        // The unique index on email turns a lost check-then-insert race into a conflict
        let subscription = self.repo.create(&draft).await?;

        if let Err(error) = self
            .mailer
            .send_confirmation(&subscription.email, &subscription.confirm_token)
            .await
        {
            tracing::warn!(
                error.cause_chain = ?error,
                subscription.id = %subscription.id,
                "Failed to send confirmation email"
            );
        }

        Ok(subscription)
    }

    /// Confirm the subscription owning `token`
    #[tracing::instrument(name = "Confirm subscription", skip_all)]
    pub async fn confirm_subscription(&self, token: &str) -> SubscriptionResult<()> {
        let mut subscription = self
            .repo
            .get_by_token(token)
            .await
            .map_err(SubscriptionError::Storage)?
            .ok_or(SubscriptionError::NotFound)?;

        if subscription.confirmed {
            return Err(SubscriptionError::AlreadyConfirmed);
        }

        subscription.confirmed = true;
        self.repo
            .update(&subscription)
            .await
            .map_err(SubscriptionError::UpdateFailed)
    }

    /// Delete the subscription owning the unsubscribe `token`
    #[tracing::instrument(name = "Unsubscribe", skip_all)]
    pub async fn unsubscribe(&self, token: &str) -> SubscriptionResult<()> {
        self.repo.unsubscribe_by_token(token).await?;
        Ok(())
    }

    /// All confirmed subscriptions, for the weather mail job
    pub async fn get_all_confirmed(&self) -> SubscriptionResult<Vec<Subscription>> {
        self.repo
            .get_all_confirmed()
            .await
            .map_err(SubscriptionError::Storage)
    }

    /// Persist changes made to a subscription
    pub async fn update(&self, subscription: &Subscription) -> SubscriptionResult<()> {
        self.repo
            .update(subscription)
            .await
            .map_err(SubscriptionError::UpdateFailed)
    }

    /// Deliver a composed weather update
    pub async fn send_weather_update(&self, email: &str, body: &str) -> SubscriptionResult<()> {
        self.mailer
            .send_weather_update(email, body)
            .await
            .map_err(SubscriptionError::SendEmail)
    }
}
