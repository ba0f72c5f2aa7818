use std::time::Duration;

use anyhow::Context;

use reqwest::Client;

use serde::Serialize;

use secrecy::Secret;

use url::Url;

use crate::domain::EmailAddress;

const POSTMARK_TOKEN_HEADER: &str = "X-Postmark-Server-Token";

/// REST client for the transactional email API
#[derive(Debug)]
pub struct EmailClient {
    client: Client,
    sender: EmailAddress,

    api_send_email_url: Url,
    api_auth_token: Secret<String>,
}

impl EmailClient {
    pub fn new(
        sender: EmailAddress,
        api_timeout: Duration,
        api_base_url: Url,
        api_auth_token: Secret<String>,
    ) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(api_timeout)
            .build()
            .context("Failed to build http client")?;

        let api_send_email_url = api_base_url
            .join("email")
            .context("Failed to create send email endpoint URL")?;

        Ok(Self {
            client,
            sender,
            api_send_email_url,
            api_auth_token,
        })
    }

    #[tracing::instrument(
        name = "Send an email via API",
        skip(self, email),
        fields(recipient = %email.recipient, tag = email.tag)
    )]
    pub async fn send(&self, email: &Email) -> reqwest::Result<()> {
        use secrecy::ExposeSecret;

        let body = email.as_request(&self.sender);

        self.client
            .post(self.api_send_email_url.clone())
            .header(POSTMARK_TOKEN_HEADER, self.api_auth_token.expose_secret())
            .json(&body)
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

/// An outgoing email
#[derive(Debug, Clone)]
pub struct Email {
    pub recipient: EmailAddress,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    /// Category of the message, used by the email API for stats
    pub tag: &'static str,
}

impl Email {
    fn as_request<'e>(&'e self, sender: &'e EmailAddress) -> SendEmailRequest<'e> {
        SendEmailRequest {
            to: self.recipient.as_ref(),
            from: sender.as_ref(),
            subject: &self.subject,
            html_body: &self.html_body,
            text_body: &self.text_body,
            tag: self.tag,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    to: &'a str,
    from: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
    tag: &'a str,
}
