use chrono::{DateTime, Utc};

use crate::config::UpgradePolicy;
use crate::entities::packages;
use crate::error::{AppError, AppResult};
use crate::models::{CurrentPackageInfo, DurationType, PackageSummary, UpgradeQuote};

/// Snapshot of the caller's current plan, as loaded by the service layer.
/// The engine itself performs no I/O: same inputs, same quote.
#[derive(Debug, Clone)]
pub struct CurrentPlan {
    pub package: packages::Model,
    pub end_date: Option<DateTime<Utc>>,
    pub price_paid: i64,
}

/// Nominal plan length in days. `None` for lifetime packages.
pub fn nominal_days(duration_type: DurationType, duration_value: i32) -> Option<i64> {
    let value = i64::from(duration_value);
    match duration_type {
        DurationType::Day => Some(value),
        DurationType::Month => Some(value * 30),
        DurationType::Year => Some(value * 365),
        DurationType::Lifetime => None,
    }
}

/// Whole days left until `end`, rounded up. Never negative.
pub fn remaining_days(end: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    let secs = (end - now).num_seconds();
    if secs <= 0 {
        0
    } else {
        (secs + 86_399) / 86_400
    }
}

fn transition_allowed(
    current: &packages::Model,
    target: &packages::Model,
    policy: UpgradePolicy,
) -> AppResult<()> {
    if current.id == target.id {
        return Err(AppError::InvalidState(
            "You already own this package".to_string(),
        ));
    }
    if current.duration_type == DurationType::Lifetime {
        return Err(AppError::InvalidState(
            "A lifetime membership cannot be upgraded".to_string(),
        ));
    }
    match policy {
        UpgradePolicy::PriceAscending => {
            if target.price <= current.price {
                return Err(AppError::InvalidState(
                    "The selected package is not an upgrade over your current one".to_string(),
                ));
            }
        }
        UpgradePolicy::AnyDifferent => {}
    }
    Ok(())
}

/// Compute a purchase/upgrade quote for `target` given the caller's current
/// plan. A subscription whose end date has passed is treated exactly like
/// having no subscription at all.
pub fn quote(
    current: Option<&CurrentPlan>,
    target: &packages::Model,
    policy: UpgradePolicy,
    now: DateTime<Utc>,
) -> AppResult<UpgradeQuote> {
    let active = current.filter(|plan| match plan.end_date {
        Some(end) => end > now,
        None => true,
    });

    let Some(plan) = active else {
        return Ok(UpgradeQuote {
            can_upgrade: true,
            is_new_purchase: true,
            is_lifetime_upgrade: false,
            current_package: None,
            target_package: PackageSummary::from(target),
            upgrade_price: target.price,
            discount: 0,
            remaining_value: 0,
            remaining_days: None,
            message: format!("You are purchasing {} at its regular price.", target.name),
        });
    };

    transition_allowed(&plan.package, target, policy)?;

    // A lifetime current plan was rejected above, so the subscription is
    // time-bounded and must carry an end date.
    let end = plan.end_date.ok_or_else(|| {
        AppError::InternalError("Time-bounded subscription has no end date".to_string())
    })?;
    let days_left = remaining_days(end, now);

    let current_info = CurrentPackageInfo {
        id: plan.package.id,
        name: plan.package.name.clone(),
        price: plan.price_paid,
        duration_type: plan.package.duration_type,
        duration: plan.package.duration_value,
        end_date: end,
        remaining_days: days_left,
    };

    if target.duration_type == DurationType::Lifetime {
        // Business rule: lifetime upgrades are never prorated. The remaining
        // plan value is forfeited in exchange for permanent access.
        return Ok(UpgradeQuote {
            can_upgrade: true,
            is_new_purchase: false,
            is_lifetime_upgrade: true,
            current_package: Some(current_info),
            target_package: PackageSummary::from(target),
            upgrade_price: target.price,
            discount: 0,
            remaining_value: 0,
            remaining_days: Some(days_left),
            message: format!(
                "Upgrading to {} forfeits the {} remaining days on your current plan in exchange for permanent access.",
                target.name, days_left
            ),
        });
    }

    let total_days = nominal_days(plan.package.duration_type, plan.package.duration_value)
        .ok_or_else(|| {
            AppError::InternalError("Time-bounded package has no nominal duration".to_string())
        })?;

    // Linear proration over the plan's nominal length.
    let remaining_value = if total_days > 0 {
        (plan.price_paid * days_left / total_days).max(0)
    } else {
        0
    };
    let discount = remaining_value.min(target.price);
    let upgrade_price = (target.price - discount).max(0);

    let message = if discount > 0 {
        format!(
            "The {} remaining days on {} are worth {}; that amount has been deducted from the price of {}.",
            days_left, plan.package.name, discount, target.name
        )
    } else {
        format!(
            "Your current plan has no remaining value to credit; {} is charged at its regular price.",
            target.name
        )
    };

    Ok(UpgradeQuote {
        can_upgrade: true,
        is_new_purchase: false,
        is_lifetime_upgrade: false,
        current_package: Some(current_info),
        target_package: PackageSummary::from(target),
        upgrade_price,
        discount,
        remaining_value,
        remaining_days: Some(days_left),
        message,
    })
}
