//! Admin aggregation
//!
//! Live counts plus the payment total, recomputed on every call. Reads are
//! not isolated from concurrent writes.

use bson::Bson;
use serde::Serialize;

use crate::store::Stores;
use crate::types::Result;

/// Platform statistics for the admin dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminStats {
    pub user_count: u64,
    pub donor_count: u64,
    pub total_payment_amount: f64,
}

/// Count users and donors and sum payment amounts, concurrently
pub async fn compute_admin_stats(stores: &Stores) -> Result<AdminStats> {
    let (user_count, donor_count, amounts) = tokio::try_join!(
        stores.users.count(),
        stores.donors.count(),
        stores.payments.amounts(),
    )?;

    Ok(AdminStats {
        user_count,
        donor_count,
        total_payment_amount: amounts.iter().map(coerce_amount).sum(),
    })
}

/// Numeric value of a stored amount; 0 when it cannot be read as a number
pub fn coerce_amount(amount: &Bson) -> f64 {
    let value = match amount {
        Bson::Double(v) => *v,
        Bson::Int32(v) => f64::from(*v),
        Bson::Int64(v) => *v as f64,
        Bson::Decimal128(d) => d.to_string().parse().unwrap_or(0.0),
        Bson::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };

    if value.is_finite() {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schemas::{DonorDoc, PaymentDoc, UserDoc};

    async fn pay(stores: &Stores, amount: Bson) {
        stores
            .payments
            .insert(PaymentDoc {
                email: "p@x.com".into(),
                amount,
                ..Default::default()
            })
            .await
            .unwrap();
    }

    #[test]
    fn test_coerce_amount() {
        assert_eq!(coerce_amount(&Bson::String("10".into())), 10.0);
        assert_eq!(coerce_amount(&Bson::String(" 5.5 ".into())), 5.5);
        assert_eq!(coerce_amount(&Bson::String("bad".into())), 0.0);
        assert_eq!(coerce_amount(&Bson::String("NaN".into())), 0.0);
        assert_eq!(coerce_amount(&Bson::Int32(3)), 3.0);
        assert_eq!(coerce_amount(&Bson::Int64(4)), 4.0);
        assert_eq!(coerce_amount(&Bson::Null), 0.0);
        assert_eq!(coerce_amount(&Bson::Boolean(true)), 0.0);
    }

    #[tokio::test]
    async fn test_total_skips_malformed_amounts() {
        let stores = Stores::in_memory();
        for raw in ["10", "5.5", "bad"] {
            pay(&stores, Bson::String(raw.into())).await;
        }
        let stats = compute_admin_stats(&stores).await.unwrap();
        assert_eq!(stats.total_payment_amount, 15.5);
    }

    #[tokio::test]
    async fn test_empty_platform() {
        let stats = compute_admin_stats(&Stores::in_memory()).await.unwrap();
        assert_eq!(
            stats,
            AdminStats {
                user_count: 0,
                donor_count: 0,
                total_payment_amount: 0.0,
            }
        );
    }

    #[tokio::test]
    async fn test_counts_are_live() {
        let stores = Stores::in_memory();
        stores.users.insert(UserDoc::new("a@x.com", "A")).await.unwrap();
        stores.donors.insert(DonorDoc::default()).await.unwrap();
        stores.donors.insert(DonorDoc::default()).await.unwrap();
        pay(&stores, Bson::Double(2.5)).await;

        let stats = compute_admin_stats(&stores).await.unwrap();
        assert_eq!(stats.user_count, 1);
        assert_eq!(stats.donor_count, 2);
        assert_eq!(stats.total_payment_amount, 2.5);

        stores.users.insert(UserDoc::new("b@x.com", "B")).await.unwrap();
        assert_eq!(compute_admin_stats(&stores).await.unwrap().user_count, 2);
    }
}
