use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::XenditConfig;
use crate::error::{AppError, AppResult};

#[derive(Debug, Serialize)]
pub struct CreateInvoiceRequest {
    pub external_id: String,
    pub amount: i64,
    pub payer_email: String,
    pub description: String,
    pub currency: String,
    /// Seconds until the invoice expires.
    pub invoice_duration: i64,
    pub success_redirect_url: String,
    pub failure_redirect_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<InvoiceCustomer>,
}

#[derive(Debug, Serialize)]
pub struct InvoiceCustomer {
    pub given_names: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile_number: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Invoice {
    pub id: String,
    pub external_id: String,
    pub status: String,
    pub amount: i64,
    pub invoice_url: String,
    #[serde(default)]
    pub expiry_date: Option<String>,
}

#[derive(Clone)]
pub struct XenditService {
    client: Client,
    config: XenditConfig,
}

impl XenditService {
    pub fn new(config: XenditConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Create a hosted invoice the user is redirected to for payment.
    pub async fn create_invoice(&self, request: &CreateInvoiceRequest) -> AppResult<Invoice> {
        let url = format!("{}/v2/invoices", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .basic_auth(&self.config.secret_key, Some(""))
            .json(request)
            .send()
            .await?;

        if response.status().is_success() {
            let invoice: Invoice = response.json().await?;
            Ok(invoice)
        } else {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            Err(AppError::ExternalApiError(format!(
                "Failed to create invoice: {error_text}"
            )))
        }
    }

    /// Webhook deliveries carry the shared callback token in the
    /// `x-callback-token` header; checking it against the configured
    /// value is the provider's documented verification scheme.
    pub fn verify_callback_token(&self, token: &str) -> AppResult<()> {
        if token.is_empty() || token != self.config.callback_token {
            return Err(AppError::AuthError("Invalid callback token".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> XenditService {
        XenditService::new(XenditConfig {
            secret_key: "xnd_test".to_string(),
            callback_token: "cb_secret".to_string(),
            base_url: "https://api.xendit.co".to_string(),
        })
    }

    #[test]
    fn accepts_matching_callback_token() {
        assert!(service().verify_callback_token("cb_secret").is_ok());
    }

    #[test]
    fn rejects_wrong_or_empty_callback_token() {
        assert!(service().verify_callback_token("nope").is_err());
        assert!(service().verify_callback_token("").is_err());
    }
}
