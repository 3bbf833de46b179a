use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
    Modify,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.as_mut().unwrap();
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        )
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::membership::list_packages,
        handlers::membership::get_package,
        handlers::membership::current_subscription,
        handlers::membership::calculate_upgrade,
        handlers::membership::confirm_upgrade,
        handlers::webhook::payment_webhook,
    ),
    components(
        schemas(
            DurationType,
            PackageResponse,
            PackageSummary,
            CurrentPackageInfo,
            SubscriptionStatus,
            SubscriptionResponse,
            CalculateUpgradeRequest,
            UpgradeQuote,
            CheckoutStatus,
            CheckoutKind,
            ConfirmUpgradeRequest,
            ConfirmUpgradeResponse,
            PaymentCallback,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "membership", description = "Package catalog and upgrade pricing"),
        (name = "webhook", description = "Payment provider callbacks")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    );
}
