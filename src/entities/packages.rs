use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

use crate::models::DurationType;

/// Catalog package. Immutable reference data as far as the upgrade flow is
/// concerned; only administrators write it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "packages")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub description: Option<String>,
    /// Smallest currency unit (integer rupiah).
    pub price: i64,
    pub duration_type: DurationType,
    pub duration_value: i32,
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
