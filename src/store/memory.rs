use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::{EmailAddress, User};
use crate::store::{StoreError, UserStore};

/// User store kept in process memory
///
/// Clones share the same underlying map.
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<String, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Check whether the store holds no users
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, User>> {
        self.users.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>, StoreError> {
        Ok(self.lock().get(email.as_ref()).cloned())
    }

    async fn insert(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.lock();
        if users.contains_key(user.email.as_ref()) {
            return Err(StoreError::Conflict);
        }
        users.insert(user.email.as_ref().to_owned(), user.clone());
        Ok(())
    }

    async fn update_subscriptions(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.lock();
        match users.get_mut(user.email.as_ref()) {
            Some(stored) if stored.version == user.version => {
                let mut updated = user.clone();
                updated.version += 1;
                *stored = updated;
                Ok(())
            }
            _ => Err(StoreError::Conflict),
        }
    }
}
