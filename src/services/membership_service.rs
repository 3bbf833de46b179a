use std::sync::Arc;

use chrono::{Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};
use uuid::Uuid;

use crate::config::CheckoutConfig;
use crate::entities::{checkout_sessions, packages, subscriptions, upgrade_logs, users};
use crate::error::{AppError, AppResult};
use crate::external::xendit::{CreateInvoiceRequest, InvoiceCustomer};
use crate::external::XenditService;
use crate::models::{
    CheckoutKind, CheckoutStatus, ConfirmUpgradeResponse, PackageSummary, PaymentCallback,
    SubscriptionResponse, SubscriptionStatus, UpgradeQuote,
};
use crate::services::pricing::{self, CurrentPlan};

// The shared connection lives behind an Arc: DatabaseConnection itself
// is not Clone in every build configuration.
#[derive(Clone)]
pub struct MembershipService {
    db: Arc<DatabaseConnection>,
    xendit: XenditService,
    checkout: CheckoutConfig,
}

impl MembershipService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        xendit: XenditService,
        checkout: CheckoutConfig,
    ) -> Self {
        Self {
            db,
            xendit,
            checkout,
        }
    }

    async fn load_target_package(&self, id: i64) -> AppResult<packages::Model> {
        if id <= 0 {
            return Err(AppError::ValidationError(
                "targetPackageId must be a positive id".to_string(),
            ));
        }
        packages::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
            .filter(|p| p.is_active)
            .ok_or_else(|| AppError::NotFound("Package not found".to_string()))
    }

    /// The user's ACTIVE subscription row with its package, if any. Expiry
    /// is judged by the pricing engine, not here: a row whose end date has
    /// passed is still returned and quoted as a new purchase.
    async fn load_current_plan(&self, user_id: i64) -> AppResult<Option<CurrentPlan>> {
        let sub = subscriptions::Entity::find()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active))
            .one(self.db.as_ref())
            .await?;

        let Some(sub) = sub else {
            return Ok(None);
        };

        let package = packages::Entity::find_by_id(sub.package_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                AppError::InternalError(format!(
                    "Subscription {} references missing package {}",
                    sub.id, sub.package_id
                ))
            })?;

        Ok(Some(CurrentPlan {
            package,
            end_date: sub.end_date,
            price_paid: sub.price_paid,
        }))
    }

    /// Pure read: two point reads plus in-memory arithmetic. Safe to call
    /// repeatedly; identical state yields identical quotes.
    pub async fn calculate_upgrade(
        &self,
        user_id: i64,
        target_package_id: i64,
    ) -> AppResult<UpgradeQuote> {
        let target = self.load_target_package(target_package_id).await?;
        let current = self.load_current_plan(user_id).await?;
        pricing::quote(
            current.as_ref(),
            &target,
            self.checkout.upgrade_policy,
            Utc::now(),
        )
    }

    pub async fn current_subscription(&self, user_id: i64) -> AppResult<SubscriptionResponse> {
        let now = Utc::now();
        let sub = subscriptions::Entity::find()
            .filter(subscriptions::Column::UserId.eq(user_id))
            .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active))
            .one(self.db.as_ref())
            .await?
            // A lapsed row still marked ACTIVE reads the same as none.
            .filter(|s| s.end_date.map_or(true, |end| end > now))
            .ok_or_else(|| AppError::NotFound("No active subscription".to_string()))?;

        let package = packages::Entity::find_by_id(sub.package_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                AppError::InternalError(format!(
                    "Subscription {} references missing package {}",
                    sub.id, sub.package_id
                ))
            })?;

        let remaining = sub.end_date.map(|end| pricing::remaining_days(end, now));
        Ok(SubscriptionResponse {
            id: sub.id,
            package: PackageSummary::from(&package),
            start_date: sub.start_date,
            end_date: sub.end_date,
            price_paid: sub.price_paid,
            status: sub.status,
            remaining_days: remaining,
        })
    }

    /// Recomputes the quote from current server state, then creates (or
    /// reuses) a pending checkout session and the provider invoice for it.
    /// Never trusts a client-supplied quote: time has passed since the
    /// confirmation page was rendered.
    pub async fn confirm_upgrade(
        &self,
        user_id: i64,
        target_package_id: i64,
    ) -> AppResult<ConfirmUpgradeResponse> {
        let target = self.load_target_package(target_package_id).await?;
        let current = self.load_current_plan(user_id).await?;
        let now = Utc::now();
        let quote = pricing::quote(
            current.as_ref(),
            &target,
            self.checkout.upgrade_policy,
            now,
        )?;

        // Double-submit guard: hand back the existing pending session for
        // this user and target instead of minting a duplicate invoice.
        let pending = checkout_sessions::Entity::find()
            .filter(checkout_sessions::Column::UserId.eq(user_id))
            .filter(checkout_sessions::Column::PackageId.eq(target.id))
            .filter(checkout_sessions::Column::Status.eq(CheckoutStatus::Pending))
            .one(self.db.as_ref())
            .await?;

        if let Some(session) = pending {
            // Reuse only while the invoice is live and the recomputed quote
            // still matches what the session was priced at. Proration drifts
            // as days tick by, so a stored amount can go stale.
            let still_valid = session.expires_at.map_or(false, |e| e > now);
            let price_current =
                session.amount == quote.upgrade_price && session.discount == quote.discount;
            match (still_valid && price_current, session.invoice_url.clone()) {
                (true, Some(url)) => {
                    log::info!(
                        "Reusing pending checkout session {} for user {user_id}",
                        session.id
                    );
                    return Ok(ConfirmUpgradeResponse {
                        checkout_url: url,
                        session_id: session.id,
                        amount: session.amount,
                    });
                }
                _ => {
                    log::info!(
                        "Expiring stale checkout session {} for user {user_id}",
                        session.id
                    );
                    let mut stale: checkout_sessions::ActiveModel = session.into();
                    stale.status = Set(CheckoutStatus::Expired);
                    stale.updated_at = Set(Some(now));
                    stale.update(self.db.as_ref()).await?;
                }
            }
        }

        let user = users::Entity::find_by_id(user_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let kind = if quote.is_new_purchase {
            CheckoutKind::Purchase
        } else {
            CheckoutKind::Upgrade
        };
        let external_id = format!("MEMBERSHIP-{}-{}", user_id, Uuid::new_v4().simple());
        let expires_at = now + Duration::hours(self.checkout.payment_expiry_hours);

        let session = checkout_sessions::ActiveModel {
            user_id: Set(user_id),
            package_id: Set(target.id),
            kind: Set(kind),
            amount: Set(quote.upgrade_price),
            discount: Set(quote.discount),
            status: Set(CheckoutStatus::Pending),
            external_id: Set(external_id.clone()),
            expires_at: Set(Some(expires_at)),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await?;

        // A fully credited upgrade owes nothing; fulfill on the spot rather
        // than sending the user to pay a zero-amount invoice.
        if quote.upgrade_price == 0 {
            self.fulfill_session(session.clone(), None).await?;
            return Ok(ConfirmUpgradeResponse {
                checkout_url: self.checkout.success_redirect_url.clone(),
                session_id: session.id,
                amount: 0,
            });
        }

        let invoice_request = CreateInvoiceRequest {
            external_id: external_id.clone(),
            amount: quote.upgrade_price,
            payer_email: user.email.clone(),
            description: format!("Membership: {}", target.name),
            currency: "IDR".to_string(),
            invoice_duration: self.checkout.payment_expiry_hours * 3600,
            success_redirect_url: format!(
                "{}?session_id={}",
                self.checkout.success_redirect_url, session.id
            ),
            failure_redirect_url: format!(
                "{}?session_id={}",
                self.checkout.failure_redirect_url, session.id
            ),
            customer: Some(InvoiceCustomer {
                given_names: user.name.clone(),
                email: user.email,
                mobile_number: user.whatsapp,
            }),
        };

        let invoice = match self.xendit.create_invoice(&invoice_request).await {
            Ok(invoice) => invoice,
            Err(e) => {
                // Leave no dangling pending session behind a failed invoice.
                let mut failed: checkout_sessions::ActiveModel = session.into();
                failed.status = Set(CheckoutStatus::Canceled);
                failed.updated_at = Set(Some(Utc::now()));
                failed.update(self.db.as_ref()).await?;
                return Err(e);
            }
        };

        let session_id = session.id;
        let amount = session.amount;
        let mut active: checkout_sessions::ActiveModel = session.into();
        active.invoice_url = Set(Some(invoice.invoice_url.clone()));
        active.provider_reference = Set(Some(invoice.id));
        active.updated_at = Set(Some(Utc::now()));
        active.update(self.db.as_ref()).await?;

        log::info!(
            "Created checkout session {session_id} ({external_id}) for user {user_id}, amount {amount}"
        );

        Ok(ConfirmUpgradeResponse {
            checkout_url: invoice.invoice_url,
            session_id,
            amount,
        })
    }

    /// Entry point for the payment webhook.
    pub async fn handle_payment_callback(&self, callback: &PaymentCallback) -> AppResult<()> {
        let session = checkout_sessions::Entity::find()
            .filter(checkout_sessions::Column::ExternalId.eq(callback.external_id.clone()))
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "No checkout session for external id {}",
                    callback.external_id
                ))
            })?;

        match callback.status.as_str() {
            "PAID" | "SETTLED" => {
                self.fulfill_session(session, Some(callback.id.clone()))
                    .await
            }
            "EXPIRED" => {
                if session.status == CheckoutStatus::Pending {
                    let mut active: checkout_sessions::ActiveModel = session.into();
                    active.status = Set(CheckoutStatus::Expired);
                    active.updated_at = Set(Some(Utc::now()));
                    active.update(self.db.as_ref()).await?;
                }
                Ok(())
            }
            other => {
                log::info!("Ignoring payment callback status {other}");
                Ok(())
            }
        }
    }

    /// Activate the purchased package: supersede any ACTIVE subscription,
    /// insert the new one, mark the session paid and write the upgrade log.
    /// Idempotent on webhook replays: an already-paid session is a no-op.
    async fn fulfill_session(
        &self,
        session: checkout_sessions::Model,
        provider_reference: Option<String>,
    ) -> AppResult<()> {
        if session.status == CheckoutStatus::Paid {
            log::info!("Checkout session {} already fulfilled", session.id);
            return Ok(());
        }

        let target = packages::Entity::find_by_id(session.package_id)
            .one(self.db.as_ref())
            .await?
            .ok_or_else(|| {
                AppError::InternalError(format!(
                    "Checkout session {} references missing package {}",
                    session.id, session.package_id
                ))
            })?;

        let now = Utc::now();
        let txn = self.db.begin().await?;

        let old_subs = subscriptions::Entity::find()
            .filter(subscriptions::Column::UserId.eq(session.user_id))
            .filter(subscriptions::Column::Status.eq(SubscriptionStatus::Active))
            .all(&txn)
            .await?;

        let mut old_package_id = None;
        let mut old_remaining = None;
        for sub in old_subs {
            old_package_id = Some(sub.package_id);
            old_remaining = sub.end_date.map(|end| pricing::remaining_days(end, now));
            let mut superseded: subscriptions::ActiveModel = sub.into();
            superseded.status = Set(SubscriptionStatus::Superseded);
            superseded.updated_at = Set(Some(now));
            superseded.update(&txn).await?;
        }

        let end_date = pricing::nominal_days(target.duration_type, target.duration_value)
            .map(|days| now + Duration::days(days));

        subscriptions::ActiveModel {
            user_id: Set(session.user_id),
            package_id: Set(target.id),
            start_date: Set(now),
            end_date: Set(end_date),
            price_paid: Set(session.amount),
            status: Set(SubscriptionStatus::Active),
            created_at: Set(Some(now)),
            updated_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        upgrade_logs::ActiveModel {
            user_id: Set(session.user_id),
            old_package_id: Set(old_package_id),
            new_package_id: Set(target.id),
            remaining_days: Set(old_remaining),
            discount_applied: Set(session.discount),
            price_paid: Set(session.amount),
            note: Set(provider_reference
                .as_ref()
                .map(|r| format!("Fulfilled via invoice {r}"))),
            created_at: Set(Some(now)),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let session_id = session.id;
        let user_id = session.user_id;
        let mut paid: checkout_sessions::ActiveModel = session.into();
        paid.status = Set(CheckoutStatus::Paid);
        paid.paid_at = Set(Some(now));
        if provider_reference.is_some() {
            paid.provider_reference = Set(provider_reference);
        }
        paid.updated_at = Set(Some(now));
        paid.update(&txn).await?;

        txn.commit().await?;

        log::info!(
            "Fulfilled checkout session {session_id}: user {user_id} now on {}",
            target.name
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{UpgradePolicy, XenditConfig};
    use crate::models::DurationType;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn checkout_config() -> CheckoutConfig {
        CheckoutConfig {
            payment_expiry_hours: 72,
            success_redirect_url: "https://example.com/checkout/success".to_string(),
            failure_redirect_url: "https://example.com/checkout/failed".to_string(),
            upgrade_policy: UpgradePolicy::PriceAscending,
        }
    }

    fn xendit() -> XenditService {
        XenditService::new(XenditConfig {
            secret_key: "xnd_test".to_string(),
            callback_token: "cb_test".to_string(),
            base_url: "https://api.xendit.co".to_string(),
        })
    }

    fn pkg(id: i64, name: &str, price: i64, dt: DurationType, dv: i32) -> packages::Model {
        packages::Model {
            id,
            name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            description: None,
            price,
            duration_type: dt,
            duration_value: dv,
            is_active: true,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn calculate_upgrade_unknown_package_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<packages::Model>::new()])
            .into_connection();

        let service = MembershipService::new(Arc::new(db), xendit(), checkout_config());
        let err = service.calculate_upgrade(1, 99).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn calculate_upgrade_without_subscription_quotes_list_price() {
        let target = pkg(2, "1-Month", 150_000, DurationType::Month, 1);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![target]])
            .append_query_results([Vec::<subscriptions::Model>::new()])
            .into_connection();

        let service = MembershipService::new(Arc::new(db), xendit(), checkout_config());
        let quote = service.calculate_upgrade(1, 2).await.unwrap();
        assert!(quote.is_new_purchase);
        assert_eq!(quote.upgrade_price, 150_000);
    }

    #[tokio::test]
    async fn calculate_upgrade_prorates_active_subscription() {
        let now = Utc::now();
        let current_pkg = pkg(1, "3-Month", 300_000, DurationType::Month, 3);
        let target = pkg(2, "6-Month", 500_000, DurationType::Month, 6);
        let sub = subscriptions::Model {
            id: 10,
            user_id: 1,
            package_id: 1,
            start_date: now - Duration::days(60),
            end_date: Some(now + Duration::days(30)),
            price_paid: 300_000,
            status: SubscriptionStatus::Active,
            created_at: None,
            updated_at: None,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![target]])
            .append_query_results([vec![sub]])
            .append_query_results([vec![current_pkg]])
            .into_connection();

        let service = MembershipService::new(Arc::new(db), xendit(), checkout_config());
        let quote = service.calculate_upgrade(1, 2).await.unwrap();
        assert!(!quote.is_new_purchase);
        assert_eq!(quote.remaining_value, 100_000);
        assert_eq!(quote.discount, 100_000);
        assert_eq!(quote.upgrade_price, 400_000);
    }

    #[tokio::test]
    async fn callback_for_unknown_session_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<checkout_sessions::Model>::new()])
            .into_connection();

        let service = MembershipService::new(Arc::new(db), xendit(), checkout_config());
        let callback = PaymentCallback {
            id: "inv_1".to_string(),
            external_id: "MEMBERSHIP-1-deadbeef".to_string(),
            status: "PAID".to_string(),
            amount: 150_000,
            paid_at: None,
            payment_method: None,
        };
        let err = service.handle_payment_callback(&callback).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn replayed_callback_on_paid_session_is_a_no_op() {
        let now = Utc::now();
        let session = checkout_sessions::Model {
            id: 5,
            user_id: 1,
            package_id: 2,
            kind: CheckoutKind::Upgrade,
            amount: 400_000,
            discount: 100_000,
            status: CheckoutStatus::Paid,
            external_id: "MEMBERSHIP-1-cafe".to_string(),
            invoice_url: Some("https://invoice.example/abc".to_string()),
            provider_reference: Some("inv_1".to_string()),
            expires_at: Some(now + Duration::hours(72)),
            paid_at: Some(now),
            created_at: Some(now),
            updated_at: Some(now),
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![session]])
            .into_connection();

        let service = MembershipService::new(Arc::new(db), xendit(), checkout_config());
        let callback = PaymentCallback {
            id: "inv_1".to_string(),
            external_id: "MEMBERSHIP-1-cafe".to_string(),
            status: "PAID".to_string(),
            amount: 400_000,
            paid_at: None,
            payment_method: None,
        };
        // No further query results are queued: fulfillment must short-circuit
        // before touching the database again.
        assert!(service.handle_payment_callback(&callback).await.is_ok());
    }

    fn user(id: i64) -> users::Model {
        users::Model {
            id,
            email: format!("user{id}@example.com"),
            name: format!("User {id}"),
            whatsapp: None,
            created_at: None,
        }
    }

    fn session(
        id: i64,
        package_id: i64,
        amount: i64,
        discount: i64,
        status: CheckoutStatus,
        invoice_url: Option<&str>,
        expires_at: Option<chrono::DateTime<Utc>>,
    ) -> checkout_sessions::Model {
        checkout_sessions::Model {
            id,
            user_id: 1,
            package_id,
            kind: CheckoutKind::Upgrade,
            amount,
            discount,
            status,
            external_id: format!("MEMBERSHIP-1-{id:032x}"),
            invoice_url: invoice_url.map(str::to_string),
            provider_reference: None,
            expires_at,
            paid_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn confirm_upgrade_reuses_matching_pending_session() {
        let now = Utc::now();
        let target = pkg(2, "1-Month", 150_000, DurationType::Month, 1);
        let pending = session(
            31,
            2,
            150_000,
            0,
            CheckoutStatus::Pending,
            Some("https://invoice.example/keep"),
            Some(now + Duration::hours(24)),
        );

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![target]])
            .append_query_results([Vec::<subscriptions::Model>::new()])
            .append_query_results([vec![pending]])
            .into_connection();

        let service = MembershipService::new(Arc::new(db), xendit(), checkout_config());
        // No write results are queued: a matching session must be handed back
        // as-is, without minting a new invoice.
        let resp = service.confirm_upgrade(1, 2).await.unwrap();
        assert_eq!(resp.session_id, 31);
        assert_eq!(resp.amount, 150_000);
        assert_eq!(resp.checkout_url, "https://invoice.example/keep");
    }

    #[tokio::test]
    async fn confirm_upgrade_discards_pending_session_with_stale_amount() {
        let now = Utc::now();
        let target = pkg(2, "6-Month", 400_000, DurationType::Month, 6);
        // Priced before the quote drifted: the fresh quote is 400,000.
        let stale = session(
            32,
            2,
            350_000,
            0,
            CheckoutStatus::Pending,
            Some("https://invoice.example/stale"),
            Some(now + Duration::hours(24)),
        );
        let mut expired = stale.clone();
        expired.status = CheckoutStatus::Expired;

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![target]])
            .append_query_results([Vec::<subscriptions::Model>::new()])
            .append_query_results([vec![stale]])
            .append_query_results([vec![expired]])
            .append_query_results([Vec::<users::Model>::new()])
            .into_connection();

        let service = MembershipService::new(Arc::new(db), xendit(), checkout_config());
        // Reaching the user lookup (queued empty) proves the 350,000 session
        // was expired instead of being handed back at its stale amount.
        let err = service.confirm_upgrade(1, 2).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn confirm_upgrade_with_full_credit_fulfills_immediately() {
        let now = Utc::now();
        let current_pkg = pkg(1, "12-Month", 1_200_000, DurationType::Year, 1);
        let target = pkg(2, "6-Month", 500_000, DurationType::Month, 6);
        let sub = subscriptions::Model {
            id: 10,
            user_id: 1,
            package_id: 1,
            start_date: now - Duration::days(65),
            end_date: Some(now + Duration::days(300)),
            price_paid: 1_200_000,
            status: SubscriptionStatus::Active,
            created_at: None,
            updated_at: None,
        };
        // remaining_value is 1,200,000 * 300 / 365, well above the 500,000
        // target price, so the quote comes out at zero.
        let created = session(77, 2, 0, 500_000, CheckoutStatus::Pending, None, Some(now));
        let mut paid = created.clone();
        paid.status = CheckoutStatus::Paid;
        let mut superseded = sub.clone();
        superseded.status = SubscriptionStatus::Superseded;
        let new_sub = subscriptions::Model {
            id: 11,
            user_id: 1,
            package_id: 2,
            start_date: now,
            end_date: Some(now + Duration::days(180)),
            price_paid: 0,
            status: SubscriptionStatus::Active,
            created_at: None,
            updated_at: None,
        };
        let log = upgrade_logs::Model {
            id: 1,
            user_id: 1,
            old_package_id: Some(1),
            new_package_id: 2,
            remaining_days: Some(300),
            discount_applied: 500_000,
            price_paid: 0,
            note: None,
            created_at: None,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![target.clone()]])
            .append_query_results([vec![sub.clone()]])
            .append_query_results([vec![current_pkg]])
            .append_query_results([Vec::<checkout_sessions::Model>::new()])
            .append_query_results([vec![user(1)]])
            .append_query_results([vec![created]]) // session insert
            .append_query_results([vec![target]]) // fulfillment reloads the package
            .append_query_results([vec![sub]])
            .append_query_results([vec![superseded]])
            .append_query_results([vec![new_sub]])
            .append_query_results([vec![log]])
            .append_query_results([vec![paid]])
            .into_connection();

        let config = CheckoutConfig {
            upgrade_policy: UpgradePolicy::AnyDifferent,
            ..checkout_config()
        };
        let service = MembershipService::new(Arc::new(db), xendit(), config);
        let resp = service.confirm_upgrade(1, 2).await.unwrap();
        assert_eq!(resp.amount, 0);
        assert_eq!(resp.session_id, 77);
        // Nothing to pay, so the user skips the invoice page entirely.
        assert_eq!(resp.checkout_url, "https://example.com/checkout/success");
    }

    #[tokio::test]
    async fn paid_callback_fulfills_pending_session() {
        let now = Utc::now();
        let target = pkg(2, "6-Month", 500_000, DurationType::Month, 6);
        let pending = session(
            5,
            2,
            400_000,
            100_000,
            CheckoutStatus::Pending,
            Some("https://invoice.example/abc"),
            Some(now + Duration::hours(72)),
        );
        let mut paid = pending.clone();
        paid.status = CheckoutStatus::Paid;
        paid.paid_at = Some(now);
        let old_sub = subscriptions::Model {
            id: 10,
            user_id: 1,
            package_id: 1,
            start_date: now - Duration::days(60),
            end_date: Some(now + Duration::days(30)),
            price_paid: 300_000,
            status: SubscriptionStatus::Active,
            created_at: None,
            updated_at: None,
        };
        let mut superseded = old_sub.clone();
        superseded.status = SubscriptionStatus::Superseded;
        let new_sub = subscriptions::Model {
            id: 11,
            user_id: 1,
            package_id: 2,
            start_date: now,
            end_date: Some(now + Duration::days(180)),
            price_paid: 400_000,
            status: SubscriptionStatus::Active,
            created_at: None,
            updated_at: None,
        };
        let log = upgrade_logs::Model {
            id: 1,
            user_id: 1,
            old_package_id: Some(1),
            new_package_id: 2,
            remaining_days: Some(30),
            discount_applied: 100_000,
            price_paid: 400_000,
            note: Some("Fulfilled via invoice inv_9".to_string()),
            created_at: None,
        };
        let external_id = pending.external_id.clone();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![pending]])
            .append_query_results([vec![target]])
            .append_query_results([vec![old_sub]])
            .append_query_results([vec![superseded]])
            .append_query_results([vec![new_sub]])
            .append_query_results([vec![log]])
            .append_query_results([vec![paid]])
            .into_connection();

        let service = MembershipService::new(Arc::new(db), xendit(), checkout_config());
        let callback = PaymentCallback {
            id: "inv_9".to_string(),
            external_id,
            status: "PAID".to_string(),
            amount: 400_000,
            paid_at: None,
            payment_method: None,
        };
        assert!(service.handle_payment_callback(&callback).await.is_ok());
    }

    #[tokio::test]
    async fn lapsed_active_row_reads_as_no_subscription() {
        let now = Utc::now();
        let sub = subscriptions::Model {
            id: 10,
            user_id: 1,
            package_id: 1,
            start_date: now - Duration::days(120),
            end_date: Some(now - Duration::days(1)),
            price_paid: 300_000,
            status: SubscriptionStatus::Active,
            created_at: None,
            updated_at: None,
        };

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![sub]])
            .into_connection();

        let service = MembershipService::new(Arc::new(db), xendit(), checkout_config());
        let err = service.current_subscription(1).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
