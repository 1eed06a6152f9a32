//! Configuration for bloodline
//!
//! CLI arguments and environment variable handling using clap.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;

/// Secret used when `--dev-mode` is on and no secret was supplied
const DEV_JWT_SECRET: &str = "dev-only-insecure-secret-do-not-deploy-0000";

/// Minimum accepted signing secret length
pub const MIN_SECRET_LEN: usize = 32;

/// One year, the fixed credential validity window
pub const DEFAULT_SESSION_TTL_SECONDS: u64 = 365 * 24 * 60 * 60;

/// Log output format
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Bloodline - session, role and admin gateway for the donation platform
#[derive(Parser, Debug, Clone)]
#[command(name = "bloodline")]
#[command(about = "Session, role and admin gateway for a blood donation platform")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:5000")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "Blood-Donation")]
    pub mongodb_db: String,

    /// Secret for signing session credentials (required in production)
    #[arg(long, env = "ACCESS_TOKEN_SECRET")]
    pub jwt_secret: Option<String>,

    /// Session credential lifetime in seconds (also the cookie Max-Age)
    #[arg(long, env = "SESSION_TTL_SECONDS", default_value_t = DEFAULT_SESSION_TTL_SECONDS)]
    pub session_ttl_seconds: u64,

    /// Comma-separated list of browser origins allowed to send credentials
    #[arg(long, env = "CORS_ORIGINS", default_value = "http://localhost:5173")]
    pub cors_origins: String,

    /// Enable development mode (dev secret, in-memory store fallback)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Log output format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Request timeout in milliseconds
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value = "30000")]
    pub request_timeout_ms: u64,

    /// Largest accepted request body in bytes
    #[arg(long, env = "MAX_BODY_BYTES", default_value = "1048576")]
    pub max_body_bytes: usize,

    /// Put /update-role behind the admin gate and only accept user, donator, admin
    #[arg(long, env = "GUARD_ROLE_UPDATES", default_value = "false")]
    pub guard_role_updates: bool,

    /// Payment processor configuration
    #[command(flatten)]
    pub payment: PaymentArgs,

    /// Mail delivery configuration
    #[command(flatten)]
    pub mail: MailArgs,
}

/// Payment processor configuration
#[derive(Parser, Debug, Clone)]
pub struct PaymentArgs {
    /// Payment processor secret key
    #[arg(long, env = "PAYMENT_SECRET_KEY")]
    pub payment_secret_key: Option<String>,

    /// Payment processor API base URL
    #[arg(long, env = "PAYMENT_API_URL", default_value = "https://api.stripe.com/v1")]
    pub payment_api_url: String,

    /// Currency used for payment intents
    #[arg(long, env = "PAYMENT_CURRENCY", default_value = "usd")]
    pub payment_currency: String,
}

/// Mail delivery configuration
#[derive(Parser, Debug, Clone)]
pub struct MailArgs {
    /// Transactional mail HTTP endpoint (mails are only logged when unset)
    #[arg(long, env = "MAIL_API_URL")]
    pub mail_api_url: Option<String>,

    /// Bearer key for the mail endpoint
    #[arg(long, env = "MAIL_API_KEY")]
    pub mail_api_key: Option<String>,

    /// Sender address
    #[arg(long, env = "MAIL_FROM", default_value = "no-reply@bloodline.local")]
    pub mail_from: String,

    /// Recipient of contact form messages
    #[arg(long, env = "CONTACT_INBOX", default_value = "admin@bloodline.local")]
    pub contact_inbox: String,
}

impl Args {
    /// Get effective JWT secret (uses default in dev mode)
    pub fn jwt_secret(&self) -> Option<String> {
        match (&self.jwt_secret, self.dev_mode) {
            (Some(secret), _) => Some(secret.clone()),
            (None, true) => Some(DEV_JWT_SECRET.to_string()),
            (None, false) => None,
        }
    }

    /// Allowed CORS origins, parsed from the comma-separated list
    pub fn cors_origin_list(&self) -> Vec<String> {
        self.cors_origins
            .split(',')
            .map(|s| s.trim().trim_end_matches('/').to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// MongoDB URI with any `user:pass@` replaced, for logging
    pub fn mongodb_uri_redacted(&self) -> String {
        let uri = &self.mongodb_uri;
        let Some(scheme_end) = uri.find("://").map(|i| i + 3) else {
            return uri.clone();
        };
        let rest = &uri[scheme_end..];
        let authority_end = rest.find(['/', '?']).unwrap_or(rest.len());
        match rest[..authority_end].rfind('@') {
            Some(at) => format!("{}***@{}", &uri[..scheme_end], &rest[at + 1..]),
            None => uri.clone(),
        }
    }

    /// Request deadline
    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_timeout_ms)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        match self.jwt_secret() {
            None => return Err("ACCESS_TOKEN_SECRET is required in production mode".to_string()),
            Some(secret) if secret.len() < MIN_SECRET_LEN => {
                return Err(format!(
                    "ACCESS_TOKEN_SECRET must be at least {} characters",
                    MIN_SECRET_LEN
                ));
            }
            Some(_) => {}
        }

        if self.session_ttl_seconds == 0 {
            return Err("SESSION_TTL_SECONDS must be greater than zero".to_string());
        }

        if self.request_timeout_ms == 0 {
            return Err("REQUEST_TIMEOUT_MS must be greater than zero".to_string());
        }

        Ok(())
    }
}
