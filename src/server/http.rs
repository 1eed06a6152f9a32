//! HTTP server
//!
//! One tokio task per connection. The transport collects the body under the
//! configured limit, applies the request deadline, and hands a
//! `Request<Bytes>` to the router.

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tracing::{debug, error, info, warn};

use crate::auth::{AccessGate, RoleResolver, SessionTokens};
use crate::config::Args;
use crate::routes::{self, cors, response::status_shape, FullBody};
use crate::services::{HttpMailer, LogMailer, Mailer, PaymentProcessor, StripeProcessor};
use crate::store::Stores;
use crate::types::AppError;

/// Where records are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Mongo,
    Memory,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageBackend::Mongo => "mongodb",
            StorageBackend::Memory => "memory",
        }
    }
}

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub stores: Stores,
    pub gate: AccessGate,
    /// Outgoing mail for donation requests and the contact form
    pub mailer: Arc<dyn Mailer>,
    /// Card payment processor, absent when no secret key is configured
    pub payments: Option<Arc<dyn PaymentProcessor>>,
    pub storage: StorageBackend,
    pub cors_origins: Vec<String>,
    pub started_at: Instant,
}

impl AppState {
    /// Build state from configuration, wiring collaborators from `args`
    pub fn new(args: Args, stores: Stores, storage: StorageBackend) -> Result<Self, AppError> {
        let secret = args.jwt_secret().ok_or_else(|| {
            AppError::Config("ACCESS_TOKEN_SECRET is required to issue credentials".into())
        })?;
        let tokens = SessionTokens::new(&secret, args.session_ttl_seconds)?;
        let gate = AccessGate::new(tokens, RoleResolver::new(Arc::clone(&stores.users)));

        let mailer: Arc<dyn Mailer> = match &args.mail.mail_api_url {
            Some(url) => Arc::new(HttpMailer::new(
                url.clone(),
                args.mail.mail_api_key.clone(),
                args.mail.mail_from.clone(),
                args.request_timeout(),
            )),
            None => Arc::new(LogMailer),
        };

        let payments = args.payment.payment_secret_key.clone().map(|key| {
            Arc::new(StripeProcessor::new(
                &args.payment.payment_api_url,
                key,
                args.request_timeout(),
            )) as Arc<dyn PaymentProcessor>
        });

        Ok(Self {
            cors_origins: args.cors_origin_list(),
            args,
            stores,
            gate,
            mailer,
            payments,
            storage,
            started_at: Instant::now(),
        })
    }

    /// Replace the mailer
    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }

    /// Replace the payment processor
    pub fn with_payments(mut self, payments: Arc<dyn PaymentProcessor>) -> Self {
        self.payments = Some(payments);
        self
    }
}

/// Accept connections until `shutdown` resolves
pub async fn run(
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()>,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!("bloodline listening on {}", state.args.listen);

    if state.args.dev_mode {
        warn!("Development mode enabled - do not deploy");
    }

    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, addr)) => {
                    let state = Arc::clone(&state);
                    tokio::spawn(async move {
                        let io = TokioIo::new(stream);

                        let service = service_fn(move |req| {
                            let state = Arc::clone(&state);
                            async move { handle_request(state, addr, req).await }
                        });

                        if let Err(err) = http1::Builder::new()
                            .serve_connection(io, service)
                            .await
                        {
                            debug!("Error serving connection from {}: {:?}", addr, err);
                        }
                    });
                }
                Err(e) => {
                    error!("Error accepting connection: {:?}", e);
                }
            },
            _ = &mut shutdown => {
                info!("Shutdown signal received, no longer accepting connections");
                return Ok(());
            }
        }
    }
}

/// Collect, time-box and route one request
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> Result<Response<FullBody>, Infallible> {
    let request_id = uuid::Uuid::new_v4();
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let origin = cors::allowed_origin(req.headers(), &state.cors_origins).cloned();

    info!(%request_id, "[{}] {} {}", addr, method, path);

    let (parts, body) = req.into_parts();
    let deadline = state.args.request_timeout();

    let work = async {
        let bytes = match Limited::new(body, state.args.max_body_bytes).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                let err = AppError::PayloadTooLarge("Request body too large".into());
                return cors::decorate(status_shape(&err), origin.as_ref());
            }
            Err(e) => {
                warn!(%request_id, "Failed to read request body: {}", e);
                let err = AppError::BadRequest("Failed to read request body".into());
                return cors::decorate(status_shape(&err), origin.as_ref());
            }
        };
        routes::route(&state, Request::from_parts(parts, bytes)).await
    };

    let response = match tokio::time::timeout(deadline, work).await {
        Ok(response) => response,
        Err(_) => {
            warn!(%request_id, "{} {} timed out after {:?}", method, path, deadline);
            let err = AppError::Timeout("Request timed out".into());
            cors::decorate(status_shape(&err), origin.as_ref())
        }
    };

    debug!(
        %request_id,
        status = response.status().as_u16(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "{} {} done",
        method,
        path
    );

    Ok(response)
}
