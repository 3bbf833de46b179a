use actix_web::{web, HttpMessage, HttpRequest, HttpResponse, ResponseError, Result};

use crate::models::*;
use crate::services::{MembershipService, PackageService};

fn get_user_id_from_request(req: &HttpRequest) -> Option<i64> {
    req.extensions().get::<i64>().copied()
}

#[utoipa::path(
    get,
    path = "/membership/packages",
    tag = "membership",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Active catalog packages", body = [PackageResponse]),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_packages(package_service: web::Data<PackageService>) -> Result<HttpResponse> {
    match package_service.list_active().await {
        Ok(packages) => Ok(HttpResponse::Ok().json(packages)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/membership/packages/{id}",
    tag = "membership",
    params(
        ("id" = i64, Path, description = "Package id")
    ),
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Package detail", body = PackageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Package not found")
    )
)]
pub async fn get_package(
    package_service: web::Data<PackageService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match package_service.get_active(path.into_inner()).await {
        Ok(package) => Ok(HttpResponse::Ok().json(package)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/membership/current",
    tag = "membership",
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Caller's active subscription", body = SubscriptionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No active subscription")
    )
)]
pub async fn current_subscription(
    membership_service: web::Data<MembershipService>,
    req: HttpRequest,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match membership_service.current_subscription(user_id).await {
        Ok(subscription) => Ok(HttpResponse::Ok().json(subscription)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/membership/calculate-upgrade",
    tag = "membership",
    request_body = CalculateUpgradeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Upgrade quote for the target package", body = UpgradeQuote),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Package not found"),
        (status = 409, description = "Upgrade not permitted")
    )
)]
pub async fn calculate_upgrade(
    membership_service: web::Data<MembershipService>,
    req: HttpRequest,
    request: web::Json<CalculateUpgradeRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match membership_service
        .calculate_upgrade(user_id, request.target_package_id)
        .await
    {
        Ok(quote) => Ok(HttpResponse::Ok().json(quote)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/membership/upgrade",
    tag = "membership",
    request_body = ConfirmUpgradeRequest,
    security(
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "Checkout session created", body = ConfirmUpgradeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Package or user not found"),
        (status = 409, description = "Upgrade not permitted"),
        (status = 502, description = "Payment provider failure")
    )
)]
pub async fn confirm_upgrade(
    membership_service: web::Data<MembershipService>,
    req: HttpRequest,
    request: web::Json<ConfirmUpgradeRequest>,
) -> Result<HttpResponse> {
    let user_id = get_user_id_from_request(&req).unwrap_or(0);

    match membership_service
        .confirm_upgrade(user_id, request.target_package_id)
        .await
    {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn membership_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/membership")
            .route("/packages", web::get().to(list_packages))
            .route("/packages/{id}", web::get().to(get_package))
            .route("/current", web::get().to(current_subscription))
            .route("/calculate-upgrade", web::post().to(calculate_upgrade))
            .route("/upgrade", web::post().to(confirm_upgrade)),
    );
}
