//! Hosted-Checkout Gateway Integration
//!
//! The platform never touches card data: initiation hands the buyer to the
//! gateway's hosted page, and settlement trusts only the gateway's
//! server-to-server validation API, not the redirect.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{PaymentError, Result};
use crate::model::TransactionToken;

/// Normalized gateway status meaning "the money is real"
pub const VALID_STATUS: &str = "VALID";

/// Everything the gateway needs to open a hosted-checkout session
#[derive(Clone, Debug, Serialize)]
pub struct CheckoutOrder {
    pub amount: Decimal,
    pub transaction_token: TransactionToken,
    pub name: String,
    pub email: String,
    pub user_id: String,
    pub media_id: String,
    /// Uppercased item kind, carried as gateway metadata
    pub kind: String,
}

/// Result of opening a checkout session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HostedCheckout {
    /// URL to redirect the buyer to
    pub payment_url: String,
}

/// Normalized result of validating a callback payload
#[derive(Clone, Debug)]
pub struct CallbackValidation {
    /// Gateway-vocabulary status; anything but [`VALID_STATUS`] is a failure
    pub status: String,

    /// Token the attempt was initiated with
    pub transaction_token: TransactionToken,

    /// Full validation-API response, attached to the attempt at settlement
    pub raw: serde_json::Value,
}

impl CallbackValidation {
    pub fn is_valid(&self) -> bool {
        self.status == VALID_STATUS
    }
}

/// Payment gateway trait
///
/// Implement this per processor; the settlement flow only sees the
/// normalized types above.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted-checkout session for the order
    async fn initiate_checkout(&self, order: CheckoutOrder) -> Result<HostedCheckout>;

    /// Authenticate a delivered callback against the gateway and normalize it
    async fn validate_callback(&self, raw: serde_json::Value) -> Result<CallbackValidation>;

    /// Gateway name (for logs)
    fn name(&self) -> &str;
}

/// Gateway credentials and endpoints
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub store_id: String,
    pub store_pass: String,
    pub checkout_api: String,
    pub validation_api: String,
    pub success_url: String,
    pub fail_url: String,
    pub cancel_url: String,
}

impl GatewayConfig {
    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        let var = |name: &str| {
            std::env::var(name).map_err(|_| PaymentError::Config(format!("{name} not set")))
        };

        Ok(Self {
            store_id: var("GATEWAY_STORE_ID")?,
            store_pass: var("GATEWAY_STORE_PASS")?,
            checkout_api: var("GATEWAY_CHECKOUT_API")?,
            validation_api: var("GATEWAY_VALIDATION_API")?,
            success_url: var("GATEWAY_SUCCESS_URL")?,
            fail_url: var("GATEWAY_FAIL_URL")?,
            cancel_url: var("GATEWAY_CANCEL_URL")?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CheckoutApiResponse {
    #[serde(default)]
    status: Option<String>,

    #[serde(rename = "GatewayPageURL", default)]
    gateway_page_url: Option<String>,

    #[serde(default)]
    failedreason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValidationApiResponse {
    status: String,
    tran_id: String,
}

/// Store-credential hosted-checkout client
pub struct HostedGatewayClient {
    client: reqwest::Client,
    config: GatewayConfig,
}

impl HostedGatewayClient {
    pub fn new(config: GatewayConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }

    /// Create from environment variables
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(GatewayConfig::from_env()?))
    }
}

#[async_trait]
impl PaymentGateway for HostedGatewayClient {
    async fn initiate_checkout(&self, order: CheckoutOrder) -> Result<HostedCheckout> {
        let amount = order.amount.to_string();
        let form = [
            ("store_id", self.config.store_id.as_str()),
            ("store_passwd", self.config.store_pass.as_str()),
            ("total_amount", amount.as_str()),
            ("currency", "BDT"),
            ("tran_id", order.transaction_token.as_str()),
            ("success_url", self.config.success_url.as_str()),
            ("fail_url", self.config.fail_url.as_str()),
            ("cancel_url", self.config.cancel_url.as_str()),
            ("cus_name", order.name.as_str()),
            ("cus_email", order.email.as_str()),
            ("product_name", order.media_id.as_str()),
            ("product_category", order.kind.as_str()),
            ("value_a", order.user_id.as_str()),
            ("value_b", order.media_id.as_str()),
        ];

        let resp = self
            .client
            .post(&self.config.checkout_api)
            .form(&form)
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        if !status.is_success() {
            return Err(PaymentError::Gateway(format!(
                "checkout API returned {status}: {body}"
            )));
        }

        let parsed: CheckoutApiResponse = serde_json::from_str(&body)
            .map_err(|e| PaymentError::Gateway(format!("unparseable checkout response: {e}")))?;

        match parsed.gateway_page_url {
            Some(url) if !url.is_empty() => Ok(HostedCheckout { payment_url: url }),
            _ => Err(PaymentError::Gateway(format!(
                "no checkout URL returned (status={:?}, reason={:?})",
                parsed.status, parsed.failedreason
            ))),
        }
    }

    async fn validate_callback(&self, raw: serde_json::Value) -> Result<CallbackValidation> {
        let val_id = raw
            .get("val_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PaymentError::InvalidRequest("callback missing val_id".into()))?;

        let resp = self
            .client
            .get(&self.config.validation_api)
            .query(&[
                ("val_id", val_id),
                ("store_id", self.config.store_id.as_str()),
                ("store_passwd", self.config.store_pass.as_str()),
                ("format", "json"),
            ])
            .send()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| PaymentError::Gateway(e.to_string()))?;

        if !status.is_success() {
            return Err(PaymentError::Gateway(format!(
                "validation API returned {status}: {body}"
            )));
        }

        let raw: serde_json::Value = serde_json::from_str(&body)
            .map_err(|e| PaymentError::Gateway(format!("unparseable validation response: {e}")))?;
        let parsed: ValidationApiResponse = serde_json::from_value(raw.clone())
            .map_err(|e| PaymentError::Gateway(format!("unparseable validation response: {e}")))?;

        Ok(CallbackValidation {
            status: parsed.status,
            transaction_token: TransactionToken::from_string(parsed.tran_id),
            raw,
        })
    }

    fn name(&self) -> &str {
        "hosted-checkout"
    }
}

/// Mock gateway (for testing and demo purposes)
///
/// Initiation hands back a sandbox URL; validation echoes the `status` and
/// `tran_id` fields of the delivered payload, which is the shape the real
/// validation API answers with.
pub struct MockGateway {
    fail_initiation: bool,
}

impl Default for MockGateway {
    fn default() -> Self {
        Self::new()
    }
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            fail_initiation: false,
        }
    }

    /// Gateway whose checkout API is down
    pub fn failing() -> Self {
        Self {
            fail_initiation: true,
        }
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn initiate_checkout(&self, order: CheckoutOrder) -> Result<HostedCheckout> {
        if self.fail_initiation {
            return Err(PaymentError::Gateway("checkout API unreachable".into()));
        }

        Ok(HostedCheckout {
            payment_url: format!(
                "https://sandbox.gateway.example/checkout/{}",
                order.transaction_token
            ),
        })
    }

    async fn validate_callback(&self, raw: serde_json::Value) -> Result<CallbackValidation> {
        let status = raw
            .get("status")
            .and_then(|v| v.as_str())
            .unwrap_or("INVALID")
            .to_string();
        let tran_id = raw
            .get("tran_id")
            .and_then(|v| v.as_str())
            .ok_or_else(|| PaymentError::InvalidRequest("callback missing tran_id".into()))?;

        Ok(CallbackValidation {
            status,
            transaction_token: TransactionToken::from_string(tran_id),
            raw,
        })
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order() -> CheckoutOrder {
        CheckoutOrder {
            amount: dec!(100),
            transaction_token: TransactionToken::generate(),
            name: "Test User".into(),
            email: "test@example.com".into(),
            user_id: "u1".into(),
            media_id: "m1".into(),
            kind: "MOVIE".into(),
        }
    }

    #[tokio::test]
    async fn test_mock_checkout_embeds_token() {
        let gateway = MockGateway::new();
        let o = order();
        let token = o.transaction_token.clone();

        let checkout = gateway.initiate_checkout(o).await.unwrap();
        assert!(checkout.payment_url.contains(token.as_str()));
    }

    #[tokio::test]
    async fn test_mock_validation_normalizes_payload() {
        let gateway = MockGateway::new();

        let valid = gateway
            .validate_callback(serde_json::json!({"status": "VALID", "tran_id": "txn_abc"}))
            .await
            .unwrap();
        assert!(valid.is_valid());
        assert_eq!(valid.transaction_token.as_str(), "txn_abc");

        let failed = gateway
            .validate_callback(serde_json::json!({"status": "FAILED", "tran_id": "txn_abc"}))
            .await
            .unwrap();
        assert!(!failed.is_valid());
    }

    #[tokio::test]
    async fn test_mock_validation_requires_token() {
        let gateway = MockGateway::new();
        let err = gateway
            .validate_callback(serde_json::json!({"status": "VALID"}))
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::InvalidRequest(_)));
    }
}
