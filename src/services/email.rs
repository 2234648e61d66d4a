//! Email delivery
//!
//! [`EmailSender`] is the seam between the notification/reminder flows and the
//! transport. Three implementations exist: SMTP via `lettre`, an HTTP mail API
//! authenticated with the OAuth2 client-credentials flow, and a disabled sender
//! that only logs.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use regex::{Captures, Regex};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tokio::sync::Mutex;
use tracing::{debug, info};
use crate::config::settings::{EmailConfig, EmailProvider, OAuth2MailConfig, SmtpConfig};
use crate::utils::errors::{EmailError, EmailResult, Result, SkiClubError};
use crate::utils::logging::log_email_delivery;

/// Refresh the access token this long before it expires
const TOKEN_EXPIRY_MARGIN_SECONDS: i64 = 60;

/// A single rendered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub to: String,
    pub to_name: Option<String>,
    pub subject: String,
    pub html_body: String,
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send(&self, email: &OutgoingEmail) -> EmailResult<()>;

    /// Transport name for logs
    fn name(&self) -> &'static str;
}

/// Replace `{{ name }}` variables; unknown names are left as written.
///
/// Substitution is a single pass, so values that themselves contain
/// `{{...}}` are not expanded again.
pub fn render_template(text: &str, vars: &HashMap<&str, String>) -> String {
    static TOKEN: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(token) = TOKEN
        .get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z0-9_]+)\s*\}\}").ok())
        .as_ref()
    else {
        return text.to_string();
    };

    token
        .replace_all(text, |caps: &Captures| match vars.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Escape text inserted into an HTML body
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Pick the sender implementation named by the configuration
pub fn build_sender(config: &EmailConfig) -> Result<Arc<dyn EmailSender>> {
    match config.provider {
        EmailProvider::Smtp => {
            let smtp = config.smtp.as_ref()
                .ok_or_else(|| SkiClubError::Config("email.smtp section is required for the smtp provider".to_string()))?;
            Ok(Arc::new(SmtpEmailSender::new(smtp, &config.from_address, &config.from_name)?))
        }
        EmailProvider::Oauth2 => {
            let oauth2 = config.oauth2.as_ref()
                .ok_or_else(|| SkiClubError::Config("email.oauth2 section is required for the oauth2 provider".to_string()))?;
            Ok(Arc::new(OAuth2EmailSender::new(oauth2.clone(), &config.from_address, &config.from_name)))
        }
        EmailProvider::Disabled => Ok(Arc::new(DisabledEmailSender)),
    }
}

/// SMTP relay with STARTTLS and app-password credentials
pub struct SmtpEmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpEmailSender {
    pub fn new(config: &SmtpConfig, from_address: &str, from_name: &str) -> Result<Self> {
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(EmailError::from)?
            .port(config.port)
            .credentials(Credentials::new(config.username.clone(), config.password.clone()))
            .build();

        let from = Mailbox::new(Some(from_name.to_string()), from_address.parse().map_err(EmailError::from)?);

        Ok(Self { transport, from })
    }
}

#[async_trait]
impl EmailSender for SmtpEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> EmailResult<()> {
        let to = Mailbox::new(email.to_name.clone(), email.to.parse()?);

        let message = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(email.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(email.html_body.clone())
            .map_err(|e| EmailError::Build(e.to_string()))?;

        self.transport.send(message).await?;

        debug!(to = %email.to, "Email sent over SMTP");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "smtp"
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Mail API client; the access token is cached until shortly before expiry
pub struct OAuth2EmailSender {
    client: reqwest::Client,
    config: OAuth2MailConfig,
    from_address: String,
    from_name: String,
    token: Mutex<Option<CachedToken>>,
}

impl OAuth2EmailSender {
    pub fn new(config: OAuth2MailConfig, from_address: &str, from_name: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            from_address: from_address.to_string(),
            from_name: from_name.to_string(),
            token: Mutex::new(None),
        }
    }

    async fn access_token(&self) -> EmailResult<String> {
        let mut cached = self.token.lock().await;

        if let Some(token) = cached.as_ref() {
            if token.expires_at > Utc::now() {
                return Ok(token.value.clone());
            }
        }

        let response = self.client
            .post(&self.config.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("scope", self.config.scope.as_str()),
            ])
            .send()
            .await
            .map_err(|e| EmailError::Authentication(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Authentication(format!("token endpoint returned {status}: {body}")));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| EmailError::Authentication(e.to_string()))?;

        let lifetime = token.expires_in.unwrap_or(3600) - TOKEN_EXPIRY_MARGIN_SECONDS;
        *cached = Some(CachedToken {
            value: token.access_token.clone(),
            expires_at: Utc::now() + Duration::seconds(lifetime.max(0)),
        });

        debug!("Mail API access token refreshed");
        Ok(token.access_token)
    }

    async fn forget_token(&self) {
        *self.token.lock().await = None;
    }

    fn send_url(&self) -> String {
        self.config.send_url.replace("{sender}", &self.from_address)
    }
}

#[async_trait]
impl EmailSender for OAuth2EmailSender {
    async fn send(&self, email: &OutgoingEmail) -> EmailResult<()> {
        let token = self.access_token().await?;

        let payload = json!({
            "message": {
                "subject": email.subject,
                "body": { "contentType": "HTML", "content": email.html_body },
                "from": { "emailAddress": { "address": self.from_address, "name": self.from_name } },
                "toRecipients": [
                    { "emailAddress": { "address": email.to, "name": email.to_name } }
                ]
            },
            "saveToSentItems": false
        });

        let response = self.client
            .post(self.send_url())
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| EmailError::Api(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.forget_token().await;
            return Err(EmailError::Authentication("mail API rejected the access token".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EmailError::Api(format!("mail API returned {status}: {body}")));
        }

        debug!(to = %email.to, "Email sent over mail API");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "oauth2"
    }
}

/// Logs messages instead of sending them
pub struct DisabledEmailSender;

#[async_trait]
impl EmailSender for DisabledEmailSender {
    async fn send(&self, email: &OutgoingEmail) -> EmailResult<()> {
        info!(to = %email.to, subject = %email.subject, "Email delivery disabled, message dropped");
        Ok(())
    }

    fn name(&self) -> &'static str {
        "disabled"
    }
}

/// Send one message, logging but not propagating the failure
pub async fn send_logged<S>(sender: &S, email: &OutgoingEmail) -> std::result::Result<(), String>
where
    S: EmailSender + ?Sized,
{
    match sender.send(email).await {
        Ok(()) => {
            log_email_delivery(&email.to, &email.subject, None);
            Ok(())
        }
        Err(e) => {
            let error = format!("{} ({})", e, sender.name());
            log_email_delivery(&email.to, &email.subject, Some(&error));
            Err(error)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("first_name", "Anna".to_string()),
            ("trip", "Zakopane".to_string()),
        ])
    }

    #[test]
    fn test_render_replaces_known_variables() {
        let rendered = render_template("Hi {{first_name}}, see you in {{ trip }}!", &vars());
        assert_eq!(rendered, "Hi Anna, see you in Zakopane!");
    }

    #[test]
    fn test_render_keeps_unknown_variables() {
        let rendered = render_template("Hi {{nickname}}", &vars());
        assert_eq!(rendered, "Hi {{nickname}}");
    }

    #[test]
    fn test_render_does_not_expand_values() {
        let vars = HashMap::from([("a", "{{b}}".to_string()), ("b", "x".to_string())]);
        assert_eq!(render_template("{{a}}", &vars), "{{b}}");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>\"O'Neil\" & co</b>"), "&lt;b&gt;&quot;O&#39;Neil&quot; &amp; co&lt;/b&gt;");
    }

    #[test]
    fn test_build_sender_requires_section() {
        let config = EmailConfig {
            provider: EmailProvider::Smtp,
            from_address: "club@example.pl".to_string(),
            from_name: "Club".to_string(),
            batch_size: 10,
            batch_delay_ms: 0,
            smtp: None,
            oauth2: None,
        };
        assert!(matches!(build_sender(&config), Err(SkiClubError::Config(_))));

        let disabled = EmailConfig { provider: EmailProvider::Disabled, ..config };
        assert_eq!(build_sender(&disabled).unwrap().name(), "disabled");
    }

    #[tokio::test]
    async fn test_disabled_sender_succeeds() {
        let email = OutgoingEmail {
            to: "parent@example.pl".to_string(),
            to_name: None,
            subject: "Test".to_string(),
            html_body: "<p>Test</p>".to_string(),
        };
        assert!(DisabledEmailSender.send(&email).await.is_ok());
    }
}
