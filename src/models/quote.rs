use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{CurrentPackageInfo, PackageSummary};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalculateUpgradeRequest {
    pub target_package_id: i64,
}

/// Ephemeral pricing quote. Computed fresh on every request, never stored,
/// and recomputed at confirmation time rather than trusted from the client.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeQuote {
    pub can_upgrade: bool,
    pub is_new_purchase: bool,
    pub is_lifetime_upgrade: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_package: Option<CurrentPackageInfo>,
    pub target_package: PackageSummary,
    pub upgrade_price: i64,
    pub discount: i64,
    pub remaining_value: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_days: Option<i64>,
    pub message: String,
}
