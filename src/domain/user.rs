use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Crn, EmailAddress, Subscription};

/// User record, holding the list of course sections the user is subscribed to
///
/// A CRN appears at most once in `subscriptions`. `version` is bumped by the
/// store on every successful update and is used to detect concurrent writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub user_id: Uuid,
    pub email: EmailAddress,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    subscriptions: Vec<Subscription>,
}

impl User {
    /// Create a new user with no subscriptions
    pub fn new(email: EmailAddress) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            email,
            version: 0,
            created_at: Utc::now(),
            subscriptions: Vec::new(),
        }
    }

    /// Rebuild a user from its stored representation, dropping repeated CRNs
    pub fn restore(
        user_id: Uuid,
        email: EmailAddress,
        subscriptions: Vec<Subscription>,
        version: i64,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut user = Self {
            user_id,
            email,
            version,
            created_at,
            subscriptions: Vec::with_capacity(subscriptions.len()),
        };
        for subscription in subscriptions {
            user.add_subscription(subscription);
        }
        user
    }

    /// Current subscriptions, in the order they were added
    pub fn subscriptions(&self) -> &[Subscription] {
        &self.subscriptions
    }

    /// Subscribed CRNs, in the order they were added
    pub fn subscribed_crns(&self) -> Vec<Crn> {
        self.subscriptions.iter().map(|s| s.crn.clone()).collect()
    }

    /// Check whether the user is subscribed to a CRN
    pub fn is_subscribed(&self, crn: &Crn) -> bool {
        self.subscriptions.iter().any(|s| &s.crn == crn)
    }

    /// Append a subscription, returning `false` if the CRN is already subscribed
    pub fn add_subscription(&mut self, subscription: Subscription) -> bool {
        if self.is_subscribed(&subscription.crn) {
            return false;
        }
        self.subscriptions.push(subscription);
        true
    }

    /// Remove every subscription matching a CRN and return how many were removed
    pub fn remove_subscription(&mut self, crn: &Crn) -> usize {
        let before = self.subscriptions.len();
        self.subscriptions.retain(|s| &s.crn != crn);
        before - self.subscriptions.len()
    }

    /// Remove all subscriptions and return how many were removed
    pub fn clear_subscriptions(&mut self) -> usize {
        let removed = self.subscriptions.len();
        self.subscriptions.clear();
        removed
    }
}
