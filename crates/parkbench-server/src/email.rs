//! Outbound email via the Brevo transactional API, with a console fallback
//! for development.

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::Config;
use crate::tokens::{EMAIL_VERIFICATION_TTL_MINUTES, MAGIC_LINK_TTL_MINUTES};

const BREVO_SEND_URL: &str = "https://api.brevo.com/v3/smtp/email";

#[derive(Debug, Error)]
pub enum EmailError {
    #[error("email request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("email provider returned status {0}")]
    Rejected(u16),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoEmailAddress {
    email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BrevoSendEmailBody {
    sender: BrevoEmailAddress,
    to: Vec<BrevoEmailAddress>,
    subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    html_content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    text_content: Option<String>,
}

fn is_success_status(status: u16) -> bool {
    (200..=299).contains(&status)
}

#[derive(Debug, Clone)]
pub enum Mailer {
    /// Logs the message instead of sending it; the development default.
    Console,
    Brevo(BrevoMailer),
}

#[derive(Debug, Clone)]
pub struct BrevoMailer {
    client: reqwest::Client,
    api_key: String,
    sender_email: String,
    sender_name: Option<String>,
}

impl Mailer {
    pub fn from_config(config: &Config) -> Self {
        match (&config.brevo_api_key, &config.brevo_sender_email) {
            (Some(api_key), Some(sender_email)) => Self::Brevo(BrevoMailer {
                client: reqwest::Client::new(),
                api_key: api_key.clone(),
                sender_email: sender_email.clone(),
                sender_name: config.brevo_sender_name.clone(),
            }),
            _ => {
                info!("Brevo is not configured; emails will be logged to the console");
                Self::Console
            }
        }
    }

    pub async fn send(
        &self,
        to: &str,
        subject: &str,
        html: String,
        text: String,
    ) -> Result<(), EmailError> {
        match self {
            Self::Console => {
                info!("--- Sending Email (Console) ---\nTo: {to}\nSubject: {subject}\n{text}");
                Ok(())
            }
            Self::Brevo(mailer) => mailer.send(to, subject, html, text).await,
        }
    }
}

impl BrevoMailer {
    async fn send(
        &self,
        to: &str,
        subject: &str,
        html: String,
        text: String,
    ) -> Result<(), EmailError> {
        let body = BrevoSendEmailBody {
            sender: BrevoEmailAddress {
                email: self.sender_email.clone(),
                name: self.sender_name.clone(),
            },
            to: vec![BrevoEmailAddress {
                email: to.to_string(),
                name: None,
            }],
            subject: subject.to_string(),
            html_content: Some(html),
            text_content: Some(text),
        };

        let resp = self
            .client
            .post(BREVO_SEND_URL)
            .header("api-key", &self.api_key)
            .header("Accept", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if !is_success_status(status) {
            return Err(EmailError::Rejected(status));
        }

        Ok(())
    }
}

/// (subject, html, text) for a magic-link sign-in email.
pub fn magic_link_email(link: &str) -> (String, String, String) {
    let subject = "Your Parkbench Magic Link".to_string();
    let html = format!(
        "Hello!<br><br>Click this link to sign in to your Parkbench account: \
         <a href=\"{link}\">Sign In</a>. This link will expire in \
         {MAGIC_LINK_TTL_MINUTES} minutes."
    );
    let text = format!(
        "Hello!\n\nCopy and paste this URL into your browser to sign in to your \
         Parkbench account: {link}\nThis link will expire in \
         {MAGIC_LINK_TTL_MINUTES} minutes."
    );
    (subject, html, text)
}

/// (subject, html, text) for an email-verification email.
pub fn verification_email(link: &str) -> (String, String, String) {
    let subject = "Verify your email for Parkbench".to_string();
    let html = format!(
        "Hello!<br><br>Click this link to verify your email and activate your \
         Parkbench account: <a href=\"{link}\">Verify Email</a>. This link will \
         expire in {EMAIL_VERIFICATION_TTL_MINUTES} minutes."
    );
    let text = format!(
        "Hello!\n\nCopy and paste this URL into your browser to verify your email \
         and activate your Parkbench account: {link}\nThis link will expire in \
         {EMAIL_VERIFICATION_TTL_MINUTES} minutes."
    );
    (subject, html, text)
}
