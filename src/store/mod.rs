//! Persistence seams
//!
//! Handlers and services only see these traits. The MongoDB implementations
//! back production; the in-memory ones back dev mode and the tests.

mod memory;
mod mongo;

pub use memory::{MemoryDonorStore, MemoryPaymentStore, MemoryReviewStore, MemoryUserStore};
pub use mongo::{MongoDonorStore, MongoPaymentStore, MongoReviewStore, MongoUserStore};

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use std::sync::Arc;

use crate::db::schemas::{DonorDoc, DonorFilter, PaymentDoc, ReviewDoc, UserDoc};
use crate::db::MongoClient;
use crate::types::Result;

/// User records, unique by email
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<UserDoc>>;

    async fn list(&self) -> Result<Vec<UserDoc>>;

    /// Insert a new user; `AppError::Conflict` if the email is taken
    async fn insert(&self, user: UserDoc) -> Result<ObjectId>;

    /// Overwrite the role of the user with this email. Returns whether a
    /// record matched.
    async fn set_role_by_email(&self, email: &str, role: &str) -> Result<bool>;

    /// Overwrite the role of the user with this id. Returns whether a record
    /// matched.
    async fn set_role_by_id(&self, id: ObjectId, role: &str) -> Result<bool>;

    async fn delete(&self, id: ObjectId) -> Result<bool>;

    async fn count(&self) -> Result<u64>;
}

/// Donor profiles
#[async_trait]
pub trait DonorStore: Send + Sync {
    async fn list(&self, filter: &DonorFilter) -> Result<Vec<DonorDoc>>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<DonorDoc>>;

    async fn insert(&self, donor: DonorDoc) -> Result<ObjectId>;

    /// Set the given top-level fields. Returns whether a record matched.
    async fn update(&self, id: ObjectId, fields: Document) -> Result<bool>;

    async fn delete(&self, id: ObjectId) -> Result<bool>;

    async fn count(&self) -> Result<u64>;
}

/// Payment records
#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert(&self, payment: PaymentDoc) -> Result<ObjectId>;

    /// All payments, or only those made by `email`
    async fn list(&self, email: Option<&str>) -> Result<Vec<PaymentDoc>>;

    /// Raw `amount` values of every payment
    async fn amounts(&self) -> Result<Vec<Bson>>;
}

/// Site reviews
#[async_trait]
pub trait ReviewStore: Send + Sync {
    /// Newest first
    async fn list(&self) -> Result<Vec<ReviewDoc>>;

    async fn insert(&self, review: ReviewDoc) -> Result<ObjectId>;

    async fn delete(&self, id: ObjectId) -> Result<bool>;
}

/// Every store the service needs, behind shared handles
#[derive(Clone)]
pub struct Stores {
    pub users: Arc<dyn UserStore>,
    pub donors: Arc<dyn DonorStore>,
    pub payments: Arc<dyn PaymentStore>,
    pub reviews: Arc<dyn ReviewStore>,
}

impl Stores {
    /// Stores backed by MongoDB collections (indexes applied on open)
    pub async fn mongo(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            users: Arc::new(MongoUserStore::open(client).await?),
            donors: Arc::new(MongoDonorStore::open(client).await?),
            payments: Arc::new(MongoPaymentStore::open(client).await?),
            reviews: Arc::new(MongoReviewStore::open(client).await?),
        })
    }

    /// Process-local stores, empty on start
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(MemoryUserStore::new()),
            donors: Arc::new(MemoryDonorStore::new()),
            payments: Arc::new(MemoryPaymentStore::new()),
            reviews: Arc::new(MemoryReviewStore::new()),
        }
    }
}
