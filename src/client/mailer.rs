use anyhow::Context;

use handlebars::Handlebars;

use serde_json::json;

use url::Url;

use crate::domain::EmailAddress;

use super::{Email, EmailClient};

/// Outbound mail port used by the subscription service
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait Mailer: Send + Sync {
    /// Send the link a new subscriber has to follow to confirm their address
    async fn send_confirmation(&self, email: &str, token: &str) -> anyhow::Result<()>;

    /// Send an already composed weather update
    async fn send_weather_update(&self, email: &str, body: &str) -> anyhow::Result<()>;
}

const CONFIRMATION_HTML: &str = "confirmation_html";
const WEATHER_UPDATE_HTML: &str = "weather_update_html";

/// [`Mailer`] that composes emails and delivers them through the [`EmailClient`]
///
/// HTML parts are rendered from handlebars templates, which escape every `{{value}}`.
#[derive(Debug)]
pub struct EmailMailer {
    client: EmailClient,
    /// Public URL of this service, used to build confirmation links
    base_url: Url,
    templates: Handlebars<'static>,
}

impl EmailMailer {
    pub fn new(client: EmailClient, base_url: Url) -> anyhow::Result<Self> {
        let mut templates = Handlebars::new();
        templates.set_strict_mode(true);
        templates
            .register_template_string(
                CONFIRMATION_HTML,
                r#"<h1>Almost there!</h1><p>Click <a href="{{link}}">here</a> to confirm your weather subscription.</p>"#,
            )
            .context("Failed to register confirmation template")?;
        templates
            .register_template_string(WEATHER_UPDATE_HTML, "<pre>{{body}}</pre>")
            .context("Failed to register weather update template")?;

        Ok(Self {
            client,
            base_url,
            templates,
        })
    }

    /// Link that confirms the subscription owning `token`
    pub fn confirmation_link(&self, token: &str) -> anyhow::Result<Url> {
        self.base_url
            .join(&format!("api/confirm/{}", token))
            .context("Failed to build confirmation link")
    }

    fn render(&self, template: &str, data: &serde_json::Value) -> anyhow::Result<String> {
        self.templates
            .render(template, data)
            .with_context(|| format!("Failed to render {} template", template))
    }
}

#[async_trait::async_trait]
impl Mailer for EmailMailer {
    async fn send_confirmation(&self, email: &str, token: &str) -> anyhow::Result<()> {
        let recipient = parse_recipient(email)?;
        let link = self.confirmation_link(token)?;

        let email = Email {
            recipient,
            subject: "Confirm your weather subscription".into(),
            html_body: self.render(CONFIRMATION_HTML, &json!({ "link": link.as_str() }))?,
            text_body: format!("To confirm your subscription, click the link: {}", link),
            tag: "confirmation",
        };

        self.client
            .send(&email)
            .await
            .context("Failed to send confirmation email")
    }

    async fn send_weather_update(&self, email: &str, body: &str) -> anyhow::Result<()> {
        let recipient = parse_recipient(email)?;

        let email = Email {
            recipient,
            subject: "Your weather update".into(),
            html_body: self.render(WEATHER_UPDATE_HTML, &json!({ "body": body }))?,
            text_body: body.to_string(),
            tag: "weather-update",
        };

        self.client
            .send(&email)
            .await
            .context("Failed to send weather update")
    }
}

fn parse_recipient(email: &str) -> anyhow::Result<EmailAddress> {
    email
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))
        .with_context(|| format!("Invalid recipient address {:?}", email))
}
