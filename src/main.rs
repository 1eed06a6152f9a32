//! Bloodline - session, role and admin gateway for a blood donation platform

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bloodline::{
    config::{Args, LogFormat},
    db::MongoClient,
    server::{self, AppState, StorageBackend},
    store::Stores,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("bloodline={},info", log_level).into());
    match args.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Text => tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Bloodline - donation platform API");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} (db {})", args.mongodb_uri_redacted(), args.mongodb_db);
    info!("CORS origins: {}", args.cors_origin_list().join(", "));
    info!("Session lifetime: {}s", args.session_ttl_seconds);
    info!(
        "Role updates: {}",
        if args.guard_role_updates { "admin only" } else { "open" }
    );
    info!("======================================");

    // MongoDB is optional in dev mode
    let (stores, storage) = match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
        Ok(client) => (Stores::mongo(&client).await?, StorageBackend::Mongo),
        Err(e) => {
            if args.dev_mode {
                warn!("MongoDB connection failed (dev mode, using in-memory stores): {}", e);
                (Stores::in_memory(), StorageBackend::Memory)
            } else {
                error!("MongoDB connection failed: {}", e);
                std::process::exit(1);
            }
        }
    };

    if args.payment.payment_secret_key.is_none() {
        warn!("PAYMENT_SECRET_KEY not set - /create-payment-intent will answer 503");
    }
    if args.mail.mail_api_url.is_none() {
        info!("MAIL_API_URL not set - outgoing mail is logged only");
    }

    let state = Arc::new(AppState::new(args, stores, storage)?);

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
            std::future::pending::<()>().await;
        }
    };

    server::run(state, shutdown).await?;

    info!("bloodline stopped");
    Ok(())
}
