use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::models::{CheckoutKind, CheckoutStatus};

/// Pending payment created by confirm-upgrade and resolved by the payment
/// webhook. `external_id` is the idempotency handle shared with the
/// provider.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "checkout_sessions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub package_id: i64,
    pub kind: CheckoutKind,
    pub amount: i64,
    pub discount: i64,
    pub status: CheckoutStatus,
    #[sea_orm(unique)]
    pub external_id: String,
    pub invoice_url: Option<String>,
    pub provider_reference: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
