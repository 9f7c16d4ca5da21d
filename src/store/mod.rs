mod memory;
mod postgres;

use std::fmt;

use async_trait::async_trait;

pub use memory::InMemoryUserStore;
pub use postgres::PgUserStore;

use crate::domain::{EmailAddress, User};
use crate::utils::error_chain_fmt;

/// User store error type
#[derive(thiserror::Error)]
pub enum StoreError {
    #[error("The user record was modified by a concurrent request")]
    Conflict,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl fmt::Debug for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        error_chain_fmt(self, f)
    }
}

/// Persistent collection of user records, keyed by email address
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Find the user registered with an email address
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, StoreError>;

    /// Insert a new user, failing with `StoreError::Conflict` if the email is already taken
    async fn insert(&self, user: &User) -> Result<(), StoreError>;

    /// Persist the subscription list of an existing user
    ///
    /// The write only succeeds if the stored version still equals `user.version`,
    /// in which case the stored version is incremented. Otherwise it fails with
    /// `StoreError::Conflict`.
    async fn update_subscriptions(&self, user: &User) -> Result<(), StoreError>;
}
