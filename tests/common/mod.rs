//! Shared fixtures for the HTTP-level tests

#![allow(dead_code)]

use async_trait::async_trait;
use bson::oid::ObjectId;
use bytes::Bytes;
use clap::Parser;
use http_body_util::BodyExt;
use hyper::header::{HeaderValue, CONTENT_TYPE, COOKIE, SET_COOKIE};
use hyper::{Method, Request, Response, StatusCode};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bloodline::config::Args;
use bloodline::db::schemas::UserDoc;
use bloodline::routes::{self, FullBody};
use bloodline::services::{Mailer, OutgoingMail, PaymentProcessor};
use bloodline::store::{MemoryUserStore, Stores, UserStore};
use bloodline::{AppError, AppState, Result, StorageBackend};

pub const SECRET: &str = "integration-secret-that-is-at-least-32-chars";

pub fn args(extra: &[&str]) -> Args {
    let mut argv = vec!["bloodline", "--jwt-secret", SECRET];
    argv.extend_from_slice(extra);
    Args::try_parse_from(argv).unwrap()
}

/// Mailer that keeps everything it was asked to send
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingMail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, mail: OutgoingMail) -> Result<()> {
        self.sent.lock().unwrap().push(mail);
        Ok(())
    }
}

/// Payment processor that records amounts and returns a fixed secret
#[derive(Default)]
pub struct FakeProcessor {
    pub intents: Mutex<Vec<(i64, String)>>,
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_intent(&self, amount_minor: i64, currency: &str) -> Result<String> {
        self.intents
            .lock()
            .unwrap()
            .push((amount_minor, currency.to_string()));
        Ok(format!("pi_test_secret_{}", amount_minor))
    }
}

/// User store wrapper counting every call that reaches it
pub struct CountingUserStore {
    inner: MemoryUserStore,
    pub calls: AtomicUsize,
}

impl CountingUserStore {
    pub fn new() -> Self {
        Self {
            inner: MemoryUserStore::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl UserStore for CountingUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        self.tick();
        self.inner.find_by_email(email).await
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<UserDoc>> {
        self.tick();
        self.inner.find_by_id(id).await
    }

    async fn list(&self) -> Result<Vec<UserDoc>> {
        self.tick();
        self.inner.list().await
    }

    async fn insert(&self, user: UserDoc) -> Result<ObjectId> {
        self.tick();
        self.inner.insert(user).await
    }

    async fn set_role_by_email(&self, email: &str, role: &str) -> Result<bool> {
        self.tick();
        self.inner.set_role_by_email(email, role).await
    }

    async fn set_role_by_id(&self, id: ObjectId, role: &str) -> Result<bool> {
        self.tick();
        self.inner.set_role_by_id(id, role).await
    }

    async fn delete(&self, id: ObjectId) -> Result<bool> {
        self.tick();
        self.inner.delete(id).await
    }

    async fn count(&self) -> Result<u64> {
        self.tick();
        self.inner.count().await
    }
}

/// User store that behaves like an unreachable database
pub struct FailingUserStore;

fn unreachable_db<T>() -> Result<T> {
    Err(AppError::Database("server selection timeout at 10.0.0.4:27017".into()))
}

#[async_trait]
impl UserStore for FailingUserStore {
    async fn find_by_email(&self, _: &str) -> Result<Option<UserDoc>> {
        unreachable_db()
    }

    async fn find_by_id(&self, _: ObjectId) -> Result<Option<UserDoc>> {
        unreachable_db()
    }

    async fn list(&self) -> Result<Vec<UserDoc>> {
        unreachable_db()
    }

    async fn insert(&self, _: UserDoc) -> Result<ObjectId> {
        unreachable_db()
    }

    async fn set_role_by_email(&self, _: &str, _: &str) -> Result<bool> {
        unreachable_db()
    }

    async fn set_role_by_id(&self, _: ObjectId, _: &str) -> Result<bool> {
        unreachable_db()
    }

    async fn delete(&self, _: ObjectId) -> Result<bool> {
        unreachable_db()
    }

    async fn count(&self) -> Result<u64> {
        unreachable_db()
    }
}

pub struct Harness {
    pub state: AppState,
    pub mailer: Arc<RecordingMailer>,
    pub processor: Arc<FakeProcessor>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with(Stores::in_memory(), &[])
    }

    pub fn with(stores: Stores, extra_args: &[&str]) -> Self {
        let mailer = Arc::new(RecordingMailer::default());
        let processor = Arc::new(FakeProcessor::default());
        let state = AppState::new(args(extra_args), stores, StorageBackend::Memory)
            .unwrap()
            .with_mailer(mailer.clone())
            .with_payments(processor.clone());
        Self {
            state,
            mailer,
            processor,
        }
    }

    pub async fn send(&self, req: Request<Bytes>) -> Response<FullBody> {
        routes::route(&self.state, req).await
    }

    /// Send and decode the JSON body
    pub async fn call(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> (StatusCode, Value) {
        let response = self.send(request(method, uri, body, cookie)).await;
        let status = response.status();
        (status, json_body(response).await)
    }

    /// Register a user and give them `role`
    pub async fn user_with_role(&self, email: &str, role: &str) -> ObjectId {
        let id = self
            .state
            .stores
            .users
            .insert(UserDoc::new(email, email))
            .await
            .unwrap();
        self.state
            .stores
            .users
            .set_role_by_id(id, role)
            .await
            .unwrap();
        id
    }

    /// Log in through POST /jwt and return the `token=...` cookie pair
    pub async fn login(&self, email: &str) -> String {
        let response = self
            .send(request(
                Method::POST,
                "/jwt",
                Some(serde_json::json!({ "email": email })),
                None,
            ))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let set_cookie = response.headers()[SET_COOKIE].to_str().unwrap().to_string();
        set_cookie.split(';').next().unwrap().to_string()
    }
}

pub fn request(method: Method, uri: &str, body: Option<Value>, cookie: Option<&str>) -> Request<Bytes> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, HeaderValue::from_str(cookie).unwrap());
    }
    let bytes = match body {
        Some(value) => {
            builder = builder.header(CONTENT_TYPE, "application/json");
            Bytes::from(serde_json::to_vec(&value).unwrap())
        }
        None => Bytes::new(),
    };
    builder.body(bytes).unwrap()
}

pub async fn json_body(response: Response<FullBody>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).into_owned(),
        ))
    }
}
