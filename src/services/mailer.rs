//! Outgoing mail
//!
//! Donation requests and contact-form messages leave the service through a
//! [`Mailer`]. `HttpMailer` posts to a transactional mail API; `LogMailer`
//! only logs and is used when no API is configured.

use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::types::{AppError, Result};

/// A single plain-text message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub text: String,
    #[serde(rename = "replyTo", skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: OutgoingMail) -> Result<()>;
}

#[derive(Serialize)]
struct MailRequest<'a> {
    from: &'a str,
    #[serde(flatten)]
    mail: &'a OutgoingMail,
}

/// Mailer backed by an HTTP mail API
pub struct HttpMailer {
    http_client: reqwest::Client,
    api_url: String,
    api_key: Option<String>,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_key: Option<String>, from: String, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("bloodline/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            http_client,
            api_url,
            api_key,
            from,
        }
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        let mut request = self.http_client.post(&self.api_url).json(&MailRequest {
            from: &self.from,
            mail: &mail,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!(
                "Mail API returned {}: {}",
                status, body
            )));
        }

        info!("Mail sent to {} ({})", mail.to, mail.subject);
        Ok(())
    }
}

/// Mailer that only writes to the log
#[derive(Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        info!(to = %mail.to, subject = %mail.subject, "Mail delivery not configured, logging only");
        debug!("{}", mail.text);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_mailer_accepts_everything() {
        let mail = OutgoingMail {
            to: "d@x.com".into(),
            subject: "Blood donation request".into(),
            text: "Please help".into(),
            reply_to: None,
        };
        assert!(LogMailer.send(mail).await.is_ok());
    }

    #[test]
    fn test_request_body_shape() {
        let mail = OutgoingMail {
            to: "d@x.com".into(),
            subject: "S".into(),
            text: "T".into(),
            reply_to: Some("r@x.com".into()),
        };
        let body = serde_json::to_value(MailRequest {
            from: "no-reply@x.com",
            mail: &mail,
        })
        .unwrap();
        assert_eq!(body["from"], "no-reply@x.com");
        assert_eq!(body["to"], "d@x.com");
        assert_eq!(body["replyTo"], "r@x.com");
    }
}
