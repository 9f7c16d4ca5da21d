use std::time;

use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use url::Url;

use crate::domain::EmailAddress;

/// Anything able to deliver an email message to a single recipient
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send an email message
    async fn send_email(
        &self,
        recipient: &EmailAddress,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> anyhow::Result<()>;
}

/// Email client data
pub struct EmailClient {
    http_client: Client,
    base_url: Url,
    sender: EmailAddress,
    authorization_token: SecretString,
}

/// Request body expected by Postmark's email API
#[derive(serde::Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
}

impl EmailClient {
    pub fn new(
        base_url: Url,
        sender: EmailAddress,
        authorization_token: SecretString,
        timeout: time::Duration,
    ) -> anyhow::Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build the email HTTP client")?;
        Ok(Self {
            http_client,
            base_url,
            sender,
            authorization_token,
        })
    }
}

#[async_trait]
impl EmailSender for EmailClient {
    /// Send an email using Postmark's REST API
    /// <https://postmarkapp.com/developer/user-guide/send-email-with-api>
    #[tracing::instrument(name = "Send email", skip(self, subject, html_content, text_content))]
    async fn send_email(
        &self,
        recipient: &EmailAddress,
        subject: &str,
        html_content: &str,
        text_content: &str,
    ) -> anyhow::Result<()> {
        let url = self
            .base_url
            .join("/email")
            .context("Failed to build the email API URL")?;
        let request_body = SendEmailRequest {
            from: self.sender.as_ref(),
            to: recipient.as_ref(),
            subject,
            html_body: html_content,
            text_body: text_content,
        };

        self.http_client
            .post(url)
            .header(
                "X-Postmark-Server-Token",
                self.authorization_token.expose_secret(),
            )
            .json(&request_body)
            .send()
            .await
            .context("Failed to reach the email API")?
            .error_for_status()
            .context("The email API rejected the request")?;

        Ok(())
    }
}
