use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::field::display;
use tracing::Span;

use crate::domain::{Course, EmailAddress};
use crate::email_client::EmailSender;

/// Notification email waiting for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub recipient: EmailAddress,
    pub subject: String,
    pub html_content: String,
    pub text_content: String,
}

impl Notification {
    /// Notification confirming a new subscription
    pub fn subscribed(recipient: &EmailAddress, course: &Course) -> Self {
        let subject = format!(
            "CRN:{} Title:\"{}\" is now subscribed!",
            course.crn, course.title
        );
        let text_content = format!(
            "You have successfully subscribed to {} {}. \
            You will receive email notifications when the course status changes.",
            course.crn, course.title
        );
        Self::new(recipient, subject, text_content)
    }

    /// Notification confirming a removed subscription
    pub fn unsubscribed(recipient: &EmailAddress, course: &Course) -> Self {
        let subject = format!(
            "CRN:{} Title:\"{}\" is now unsubscribed!",
            course.crn, course.title
        );
        let text_content = format!(
            "You have successfully unsubscribed from {} {}. \
            You will no longer receive email notifications when the course status changes.",
            course.crn, course.title
        );
        Self::new(recipient, subject, text_content)
    }

    fn new(recipient: &EmailAddress, subject: String, text_content: String) -> Self {
        Self {
            recipient: recipient.clone(),
            subject,
            html_content: format!("<p>{text_content}</p>"),
            text_content,
        }
    }
}

/// Sending half of the notification queue
#[derive(Clone)]
pub struct NotificationQueue {
    sender: mpsc::UnboundedSender<Notification>,
}

impl NotificationQueue {
    /// Hand a notification over to the worker without waiting for delivery
    pub fn enqueue(&self, notification: Notification) {
        if let Err(e) = self.sender.send(notification) {
            tracing::error!(
                user_email = %e.0.recipient,
                "Dropping a notification because the delivery worker has stopped"
            );
        }
    }
}

/// Background worker draining the notification queue
pub struct NotificationWorker {
    receiver: mpsc::UnboundedReceiver<Notification>,
    email_sender: Arc<dyn EmailSender>,
}

/// Create a notification queue and the worker delivering its messages
pub fn notification_channel(
    email_sender: Arc<dyn EmailSender>,
) -> (NotificationQueue, NotificationWorker) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        NotificationQueue { sender },
        NotificationWorker {
            receiver,
            email_sender,
        },
    )
}

impl NotificationWorker {
    /// Deliver notifications in order until every queue handle has been dropped
    pub async fn run_until_stopped(mut self) -> anyhow::Result<()> {
        while let Some(notification) = self.receiver.recv().await {
            self.deliver(notification).await;
        }
        Ok(())
    }

    /// Take the queue over without delivering anything
    #[cfg(test)]
    pub(crate) fn into_receiver(self) -> mpsc::UnboundedReceiver<Notification> {
        self.receiver
    }

    /// Try delivering a single notification, logging the failure if any
    #[tracing::instrument(skip_all, fields(user_email = tracing::field::Empty))]
    async fn deliver(&self, notification: Notification) {
        Span::current().record("user_email", display(&notification.recipient));

        // TODO: retry transient delivery failures with backoff instead of dropping them
        if let Err(e) = self
            .email_sender
            .send_email(
                &notification.recipient,
                &notification.subject,
                &notification.html_content,
                &notification.text_content,
            )
            .await
        {
            tracing::error!(
                error.cause_chain = ?e,
                error.message = %e,
                "Failed to deliver notification to {}", notification.recipient
            );
        }
    }
}
