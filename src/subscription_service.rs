use std::fmt;
use std::future::Future;
use std::sync::Arc;

use anyhow::Context;

use crate::course_data::CourseData;
use crate::domain::{Course, Crn, EmailAddress, Subscription, User};
use crate::notifications::{Notification, NotificationQueue};
use crate::store::{StoreError, UserStore};
use crate::utils::error_chain_fmt;

/// Subscription error type
#[derive(thiserror::Error)]
pub enum SubscriptionError {
    #[error("There is no user registered with the provided email address")]
    UnknownUser,
    #[error("The user is already subscribed to CRN {0}")]
    AlreadySubscribed(Crn),
    #[error("The user record kept changing while it was being updated")]
    ConcurrentModification,
    #[error(transparent)]
    UnexpectedError(#[from] anyhow::Error),
}

impl fmt::Debug for SubscriptionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        error_chain_fmt(self, f)
    }
}

impl From<StoreError> for SubscriptionError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => Self::ConcurrentModification,
            StoreError::UnexpectedError(e) => Self::UnexpectedError(e),
        }
    }
}

/// Subscribe/unsubscribe users to course sections and notify them by email
pub struct SubscriptionService {
    store: Arc<dyn UserStore>,
    course_data: Arc<dyn CourseData>,
    notifications: NotificationQueue,
    max_write_attempts: u32,
}

impl SubscriptionService {
    pub fn new(
        store: Arc<dyn UserStore>,
        course_data: Arc<dyn CourseData>,
        notifications: NotificationQueue,
        max_write_attempts: u32,
    ) -> Self {
        Self {
            store,
            course_data,
            notifications,
            max_write_attempts: max_write_attempts.max(1),
        }
    }

    /// Subscribe a user to a course, creating the user on first subscription
    #[tracing::instrument(
        name = "Subscribing user to a course",
        skip(self, user_email, course),
        fields(user_email = %user_email, crn = %course.crn)
    )]
    pub async fn subscribe_course(
        &self,
        user_email: &EmailAddress,
        course: Course,
    ) -> Result<Course, SubscriptionError> {
        let subscription = Subscription::from(&course);
        self.retry_on_conflict(|| self.try_subscribe(user_email, &subscription))
            .await?;

        self.notifications
            .enqueue(Notification::subscribed(user_email, &course));
        Ok(course)
    }

    async fn try_subscribe(
        &self,
        user_email: &EmailAddress,
        subscription: &Subscription,
    ) -> Result<(), SubscriptionError> {
        match self.store.find_by_email(user_email).await? {
            Some(mut user) => {
                if !user.add_subscription(subscription.clone()) {
                    return Err(SubscriptionError::AlreadySubscribed(
                        subscription.crn.clone(),
                    ));
                }
                self.store.update_subscriptions(&user).await?;
            }
            None => {
                let mut user = User::new(user_email.clone());
                user.add_subscription(subscription.clone());
                self.store.insert(&user).await?;
            }
        }
        Ok(())
    }

    /// Remove every subscription of a user matching the course CRN
    ///
    /// An unknown user or CRN leaves the store untouched; the notification is
    /// sent either way.
    #[tracing::instrument(
        name = "Unsubscribing user from a course",
        skip(self, user_email, course),
        fields(user_email = %user_email, crn = %course.crn)
    )]
    pub async fn unsubscribe_course(
        &self,
        user_email: &EmailAddress,
        course: Course,
    ) -> Result<Course, SubscriptionError> {
        self.retry_on_conflict(|| self.try_unsubscribe(user_email, &course.crn))
            .await?;

        self.notifications
            .enqueue(Notification::unsubscribed(user_email, &course));
        Ok(course)
    }

    async fn try_unsubscribe(
        &self,
        user_email: &EmailAddress,
        crn: &Crn,
    ) -> Result<(), SubscriptionError> {
        let Some(mut user) = self.store.find_by_email(user_email).await? else {
            tracing::info!("No user registered with this email, nothing to remove");
            return Ok(());
        };
        if user.remove_subscription(crn) > 0 {
            self.store.update_subscriptions(&user).await?;
        }
        Ok(())
    }

    /// Remove all subscriptions of a user and return how many were removed
    #[tracing::instrument(
        name = "Unsubscribing user from all courses",
        skip(self, user_email),
        fields(user_email = %user_email)
    )]
    pub async fn unsubscribe_all_courses(
        &self,
        user_email: &EmailAddress,
    ) -> Result<usize, SubscriptionError> {
        self.retry_on_conflict(|| self.try_unsubscribe_all(user_email))
            .await
    }

    async fn try_unsubscribe_all(
        &self,
        user_email: &EmailAddress,
    ) -> Result<usize, SubscriptionError> {
        let Some(mut user) = self.store.find_by_email(user_email).await? else {
            return Ok(0);
        };
        let removed = user.clear_subscriptions();
        if removed > 0 {
            self.store.update_subscriptions(&user).await?;
        }
        Ok(removed)
    }

    /// Subscriptions of a user, empty if the user does not exist
    #[tracing::instrument(
        name = "Get user subscriptions",
        skip(self, user_email),
        fields(user_email = %user_email)
    )]
    pub async fn get_user_subscriptions(
        &self,
        user_email: &EmailAddress,
    ) -> Result<Vec<Subscription>, SubscriptionError> {
        let user = self.store.find_by_email(user_email).await?;
        Ok(user.map_or_else(Vec::new, |u| u.subscriptions().to_vec()))
    }

    /// CRNs a user is subscribed to, empty if the user does not exist
    #[tracing::instrument(
        name = "Get user subscribed CRNs",
        skip(self, user_email),
        fields(user_email = %user_email)
    )]
    pub async fn get_user_subscribed_crns(
        &self,
        user_email: &EmailAddress,
    ) -> Result<Vec<Crn>, SubscriptionError> {
        let user = self.store.find_by_email(user_email).await?;
        Ok(user.map_or_else(Vec::new, |u| u.subscribed_crns()))
    }

    /// Course records a user is subscribed to, or `None` if the user does not exist
    #[tracing::instrument(
        name = "Get user subscribed courses",
        skip(self, user_email),
        fields(user_email = %user_email)
    )]
    pub async fn get_user_subscribed_courses(
        &self,
        user_email: &EmailAddress,
    ) -> Result<Option<Vec<Course>>, SubscriptionError> {
        let Some(user) = self.store.find_by_email(user_email).await? else {
            return Ok(None);
        };

        let crns = user.subscribed_crns();
        if crns.is_empty() {
            return Ok(Some(Vec::new()));
        }
        let courses = self
            .course_data
            .get_courses_by_crns(&crns)
            .await
            .context("Failed to resolve subscribed CRNs to courses")?;
        Ok(Some(courses))
    }

    /// Run a read-modify-write cycle again whenever it lost a race with another writer
    async fn retry_on_conflict<T, F, Fut>(&self, mut attempt: F) -> Result<T, SubscriptionError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, SubscriptionError>>,
    {
        let mut attempts = 1;
        loop {
            match attempt().await {
                Err(SubscriptionError::ConcurrentModification)
                    if attempts < self.max_write_attempts =>
                {
                    tracing::warn!(attempts, "User record changed concurrently, retrying");
                    attempts += 1;
                }
                outcome => return outcome,
            }
        }
    }
}
