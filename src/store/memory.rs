//! In-memory stores
//!
//! Used in dev mode when MongoDB is unreachable, and by the test suite.
//! Listing order is insertion order (ObjectIds are monotonic per process),
//! reviews newest first.

use async_trait::async_trait;
use bson::{oid::ObjectId, Bson, Document};
use dashmap::{mapref::entry::Entry, DashMap};

use super::{DonorStore, PaymentStore, ReviewStore, UserStore};
use crate::db::schemas::{DonorDoc, DonorFilter, Metadata, PaymentDoc, ReviewDoc, UserDoc};
use crate::types::{AppError, Result};

fn sorted<T: Clone>(map: &DashMap<ObjectId, T>) -> Vec<T> {
    let mut entries: Vec<(ObjectId, T)> = map
        .iter()
        .map(|e| (*e.key(), e.value().clone()))
        .collect();
    entries.sort_by_key(|(id, _)| *id);
    entries.into_iter().map(|(_, v)| v).collect()
}

/// Users keyed by id, with a unique email index
#[derive(Default)]
pub struct MemoryUserStore {
    users: DashMap<ObjectId, UserDoc>,
    by_email: DashMap<String, ObjectId>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn id_for(&self, email: &str) -> Option<ObjectId> {
        self.by_email.get(email).map(|id| *id.value())
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        Ok(self
            .id_for(email)
            .and_then(|id| self.users.get(&id).map(|u| u.clone())))
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<UserDoc>> {
        Ok(self.users.get(&id).map(|u| u.clone()))
    }

    async fn list(&self) -> Result<Vec<UserDoc>> {
        Ok(sorted(&self.users))
    }

    async fn insert(&self, mut user: UserDoc) -> Result<ObjectId> {
        match self.by_email.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(AppError::Conflict("Document already exists".into())),
            Entry::Vacant(slot) => {
                let id = ObjectId::new();
                user._id = Some(id);
                user.metadata = Metadata::new();
                self.users.insert(id, user);
                slot.insert(id);
                Ok(id)
            }
        }
    }

    async fn set_role_by_email(&self, email: &str, role: &str) -> Result<bool> {
        match self.id_for(email) {
            Some(id) => self.set_role_by_id(id, role).await,
            None => Ok(false),
        }
    }

    async fn set_role_by_id(&self, id: ObjectId, role: &str) -> Result<bool> {
        match self.users.get_mut(&id) {
            Some(mut user) => {
                user.role = role.to_string();
                user.metadata.touch();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete(&self, id: ObjectId) -> Result<bool> {
        match self.users.remove(&id) {
            Some((_, user)) => {
                self.by_email.remove(&user.email);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.users.len() as u64)
    }
}

/// Donor profiles keyed by id
#[derive(Default)]
pub struct MemoryDonorStore {
    donors: DashMap<ObjectId, DonorDoc>,
}

impl MemoryDonorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DonorStore for MemoryDonorStore {
    async fn list(&self, filter: &DonorFilter) -> Result<Vec<DonorDoc>> {
        Ok(sorted(&self.donors)
            .into_iter()
            .filter(|d| filter.matches(d))
            .collect())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<DonorDoc>> {
        Ok(self.donors.get(&id).map(|d| d.clone()))
    }

    async fn insert(&self, mut donor: DonorDoc) -> Result<ObjectId> {
        let id = ObjectId::new();
        donor._id = Some(id);
        donor.metadata = Metadata::new();
        self.donors.insert(id, donor);
        Ok(id)
    }

    async fn update(&self, id: ObjectId, fields: Document) -> Result<bool> {
        let Some(mut entry) = self.donors.get_mut(&id) else {
            return Ok(false);
        };

        // Merge through BSON so typed and profile fields update uniformly
        let mut merged = bson::to_document(&*entry)
            .map_err(|e| AppError::Internal(format!("Donor encode failed: {}", e)))?;
        for (key, value) in fields {
            merged.insert(key, value);
        }
        let mut updated: DonorDoc = bson::from_document(merged)
            .map_err(|e| AppError::BadRequest(format!("Invalid donor fields: {}", e)))?;
        updated.metadata.touch();
        *entry = updated;
        Ok(true)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool> {
        Ok(self.donors.remove(&id).is_some())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.donors.len() as u64)
    }
}

/// Payment records keyed by id
#[derive(Default)]
pub struct MemoryPaymentStore {
    payments: DashMap<ObjectId, PaymentDoc>,
}

impl MemoryPaymentStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentStore for MemoryPaymentStore {
    async fn insert(&self, mut payment: PaymentDoc) -> Result<ObjectId> {
        let id = ObjectId::new();
        payment._id = Some(id);
        payment.metadata = Metadata::new();
        self.payments.insert(id, payment);
        Ok(id)
    }

    async fn list(&self, email: Option<&str>) -> Result<Vec<PaymentDoc>> {
        Ok(sorted(&self.payments)
            .into_iter()
            .filter(|p| email.map_or(true, |e| p.email == e))
            .collect())
    }

    async fn amounts(&self) -> Result<Vec<Bson>> {
        Ok(self.payments.iter().map(|p| p.amount.clone()).collect())
    }
}

/// Reviews keyed by id
#[derive(Default)]
pub struct MemoryReviewStore {
    reviews: DashMap<ObjectId, ReviewDoc>,
}

impl MemoryReviewStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ReviewStore for MemoryReviewStore {
    async fn list(&self) -> Result<Vec<ReviewDoc>> {
        let mut reviews = sorted(&self.reviews);
        reviews.reverse();
        Ok(reviews)
    }

    async fn insert(&self, mut review: ReviewDoc) -> Result<ObjectId> {
        let id = ObjectId::new();
        review._id = Some(id);
        review.metadata = Metadata::new();
        self.reviews.insert(id, review);
        Ok(id)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool> {
        Ok(self.reviews.remove(&id).is_some())
    }
}
