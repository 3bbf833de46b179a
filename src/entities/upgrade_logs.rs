use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

/// Audit trail written when an upgrade is fulfilled.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "upgrade_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub user_id: i64,
    pub old_package_id: Option<i64>,
    pub new_package_id: i64,
    /// Days left on the old plan at fulfillment time.
    pub remaining_days: Option<i64>,
    pub discount_applied: i64,
    pub price_paid: i64,
    pub note: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
