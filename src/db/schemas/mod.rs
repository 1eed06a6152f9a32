//! Database schemas for bloodline
//!
//! MongoDB document structures for users, donors, payments and reviews.

mod donor;
mod metadata;
mod payment;
mod review;
mod user;

pub use donor::{DonorDoc, DonorFilter, DONOR_COLLECTION, DONOR_RESERVED_FIELDS};
pub use metadata::Metadata;
pub use payment::{amount_from_json, PaymentDoc, PAYMENT_COLLECTION};
pub use review::{ReviewDoc, ReviewView, REVIEW_COLLECTION};
pub use user::{UserDoc, UserView, USER_COLLECTION};
