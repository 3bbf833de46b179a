use actix_web::{web, HttpRequest, HttpResponse, Result};
use log::{error, info, warn};

use crate::external::XenditService;
use crate::models::PaymentCallback;
use crate::services::MembershipService;

/// Invoice callback from the payment provider. Authenticated by the shared
/// callback token, not a bearer token.
#[utoipa::path(
    post,
    path = "/webhook/payment",
    tag = "webhook",
    request_body = PaymentCallback,
    responses(
        (status = 200, description = "Callback accepted"),
        (status = 401, description = "Invalid callback token")
    )
)]
pub async fn payment_webhook(
    req: HttpRequest,
    callback: web::Json<PaymentCallback>,
    xendit_service: web::Data<XenditService>,
    membership_service: web::Data<MembershipService>,
) -> Result<HttpResponse> {
    let token = req
        .headers()
        .get("x-callback-token")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if xendit_service.verify_callback_token(token).is_err() {
        warn!("Payment callback with invalid token rejected");
        return Ok(HttpResponse::Unauthorized().json(serde_json::json!({
            "error": "Invalid callback token",
            "code": "AUTH_ERROR"
        })));
    }

    info!(
        "Received payment callback for {} (status {})",
        callback.external_id, callback.status
    );

    match membership_service.handle_payment_callback(&callback).await {
        Ok(()) => Ok(HttpResponse::Ok().json(serde_json::json!({
            "received": true
        }))),
        Err(e) => {
            error!("Failed to process payment callback: {e}");
            // 200 so the provider does not hammer retries; the failure is
            // logged for manual follow-up.
            Ok(HttpResponse::Ok().json(serde_json::json!({
                "received": true,
                "error": format!("Processing failed: {}", e)
            })))
        }
    }
}

pub fn webhook_config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::scope("/webhook").route("/payment", web::post().to(payment_webhook)));
}
