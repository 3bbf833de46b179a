use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::models::SubscriptionStatus;

/// A user's membership term. At most one ACTIVE row per user; fulfillment
/// supersedes any existing ACTIVE rows before inserting a new one.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub package_id: i64,
    pub start_date: DateTime<Utc>,
    /// NULL for lifetime packages.
    pub end_date: Option<DateTime<Utc>>,
    /// What the user actually paid, the basis for later proration.
    pub price_paid: i64,
    pub status: SubscriptionStatus,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
