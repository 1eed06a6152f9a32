//! MongoDB-backed stores

use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Bson, DateTime, Document};
use mongodb::options::FindOptions;

use super::{DonorStore, PaymentStore, ReviewStore, UserStore};
use crate::db::schemas::{
    DonorDoc, DonorFilter, PaymentDoc, ReviewDoc, UserDoc, DONOR_COLLECTION, PAYMENT_COLLECTION,
    REVIEW_COLLECTION, USER_COLLECTION,
};
use crate::db::{MongoClient, MongoCollection};
use crate::types::{AppError, Result};

fn by_id(id: ObjectId) -> Document {
    doc! { "_id": id }
}

fn oldest_first() -> FindOptions {
    FindOptions::builder().sort(doc! { "_id": 1 }).build()
}

/// Users collection
pub struct MongoUserStore {
    collection: MongoCollection<UserDoc>,
}

impl MongoUserStore {
    pub async fn open(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: client.collection(USER_COLLECTION).await?,
        })
    }

    async fn set_role(&self, filter: Document, role: &str) -> Result<bool> {
        let result = self
            .collection
            .update_one(
                filter,
                doc! { "$set": { "role": role, "metadata.updated_at": DateTime::now() } },
            )
            .await?;
        Ok(result.matched_count > 0)
    }
}

#[async_trait]
impl UserStore for MongoUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<UserDoc>> {
        self.collection.find_one(doc! { "email": email }).await
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<UserDoc>> {
        self.collection.find_one(by_id(id)).await
    }

    async fn list(&self) -> Result<Vec<UserDoc>> {
        self.collection.find_many(doc! {}, Some(oldest_first())).await
    }

    async fn insert(&self, user: UserDoc) -> Result<ObjectId> {
        self.collection.insert_one(user).await
    }

    async fn set_role_by_email(&self, email: &str, role: &str) -> Result<bool> {
        self.set_role(doc! { "email": email }, role).await
    }

    async fn set_role_by_id(&self, id: ObjectId, role: &str) -> Result<bool> {
        self.set_role(by_id(id), role).await
    }

    async fn delete(&self, id: ObjectId) -> Result<bool> {
        Ok(self.collection.delete_one(by_id(id)).await?.deleted_count > 0)
    }

    async fn count(&self) -> Result<u64> {
        self.collection.count(doc! {}).await
    }
}

/// Donors collection
pub struct MongoDonorStore {
    collection: MongoCollection<DonorDoc>,
}

impl MongoDonorStore {
    pub async fn open(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: client.collection(DONOR_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl DonorStore for MongoDonorStore {
    async fn list(&self, filter: &DonorFilter) -> Result<Vec<DonorDoc>> {
        self.collection
            .find_many(filter.to_document(), Some(oldest_first()))
            .await
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<DonorDoc>> {
        self.collection.find_one(by_id(id)).await
    }

    async fn insert(&self, donor: DonorDoc) -> Result<ObjectId> {
        self.collection.insert_one(donor).await
    }

    async fn update(&self, id: ObjectId, mut fields: Document) -> Result<bool> {
        fields.insert("metadata.updated_at", DateTime::now());
        let result = self
            .collection
            .update_one(by_id(id), doc! { "$set": fields })
            .await?;
        Ok(result.matched_count > 0)
    }

    async fn delete(&self, id: ObjectId) -> Result<bool> {
        Ok(self.collection.delete_one(by_id(id)).await?.deleted_count > 0)
    }

    async fn count(&self) -> Result<u64> {
        self.collection.count(doc! {}).await
    }
}

/// Payments collection
pub struct MongoPaymentStore {
    collection: MongoCollection<PaymentDoc>,
}

impl MongoPaymentStore {
    pub async fn open(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: client.collection(PAYMENT_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl PaymentStore for MongoPaymentStore {
    async fn insert(&self, payment: PaymentDoc) -> Result<ObjectId> {
        self.collection.insert_one(payment).await
    }

    async fn list(&self, email: Option<&str>) -> Result<Vec<PaymentDoc>> {
        let filter = match email {
            Some(email) => doc! { "email": email },
            None => doc! {},
        };
        self.collection.find_many(filter, Some(oldest_first())).await
    }

    async fn amounts(&self) -> Result<Vec<Bson>> {
        use futures_util::TryStreamExt;

        let options = FindOptions::builder()
            .projection(doc! { "amount": 1, "_id": 0 })
            .build();

        let docs: Vec<Document> = self
            .collection
            .inner()
            .clone_with_type::<Document>()
            .find(doc! {})
            .with_options(options)
            .await
            .map_err(|e| AppError::Database(format!("Find failed: {}", e)))?
            .try_collect()
            .await
            .map_err(|e| AppError::Database(format!("Cursor failed: {}", e)))?;

        Ok(docs
            .into_iter()
            .map(|mut d| d.remove("amount").unwrap_or(Bson::Null))
            .collect())
    }
}

/// Reviews collection
pub struct MongoReviewStore {
    collection: MongoCollection<ReviewDoc>,
}

impl MongoReviewStore {
    pub async fn open(client: &MongoClient) -> Result<Self> {
        Ok(Self {
            collection: client.collection(REVIEW_COLLECTION).await?,
        })
    }
}

#[async_trait]
impl ReviewStore for MongoReviewStore {
    async fn list(&self) -> Result<Vec<ReviewDoc>> {
        let newest_first = FindOptions::builder().sort(doc! { "_id": -1 }).build();
        self.collection.find_many(doc! {}, Some(newest_first)).await
    }

    async fn insert(&self, review: ReviewDoc) -> Result<ObjectId> {
        self.collection.insert_one(review).await
    }

    async fn delete(&self, id: ObjectId) -> Result<bool> {
        Ok(self.collection.delete_one(by_id(id)).await?.deleted_count > 0)
    }
}
