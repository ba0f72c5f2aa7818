mod subscriptions;

pub use subscriptions::{PgSubscriptionRepo, RepoError, RepoResult, SubscriptionRepo};

#[cfg(test)]
pub use subscriptions::MockSubscriptionRepo;
