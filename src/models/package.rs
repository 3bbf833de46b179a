use chrono::{DateTime, Utc};
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::entities::packages;

/// Closed set of billing durations. New variants must be handled in the
/// pricing switch, so an unhandled duration fails to compile instead of
/// silently falling through.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(None)")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DurationType {
    #[sea_orm(string_value = "DAY")]
    Day,
    #[sea_orm(string_value = "MONTH")]
    Month,
    #[sea_orm(string_value = "YEAR")]
    Year,
    #[sea_orm(string_value = "LIFETIME")]
    Lifetime,
}

impl std::fmt::Display for DurationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DurationType::Day => write!(f, "day"),
            DurationType::Month => write!(f, "month"),
            DurationType::Year => write!(f, "year"),
            DurationType::Lifetime => write!(f, "lifetime"),
        }
    }
}

/// Catalog entry as served by `GET /membership/packages`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageResponse {
    pub id: i64,
    pub name: String,
    pub slug: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: i64,
    pub duration_type: DurationType,
    pub duration: i32,
}

impl From<packages::Model> for PackageResponse {
    fn from(p: packages::Model) -> Self {
        Self {
            id: p.id,
            name: p.name,
            slug: p.slug,
            description: p.description,
            price: p.price,
            duration_type: p.duration_type,
            duration: p.duration_value,
        }
    }
}

/// Compact package shape embedded in upgrade quotes.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PackageSummary {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub duration_type: DurationType,
    pub duration: i32,
}

impl From<&packages::Model> for PackageSummary {
    fn from(p: &packages::Model) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            price: p.price,
            duration_type: p.duration_type,
            duration: p.duration_value,
        }
    }
}

/// The caller's current plan as embedded in an upgrade quote: the price is
/// what was actually paid, not the list price.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPackageInfo {
    pub id: i64,
    pub name: String,
    pub price: i64,
    pub duration_type: DurationType,
    pub duration: i32,
    pub end_date: DateTime<Utc>,
    pub remaining_days: i64,
}
