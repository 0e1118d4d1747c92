//! Settlement Records
//!
//! Durable records of the purchase lifecycle: the payment attempt keyed by
//! its transaction token, the access grant keyed by (user, item), and the
//! watch-history row gated on the grant.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Transaction token (formatted: txn_XXXXXXXXXXXXXXXX)
///
/// Generated at initiation, carried through the gateway round trip, and used
/// by the callback to locate its attempt. Globally unique.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionToken(String);

impl TransactionToken {
    /// Generate a new token
    pub fn generate() -> Self {
        let id = uuid::Uuid::new_v4();
        let hex = id.simple().to_string();
        Self(format!("txn_{}", &hex[0..16]))
    }

    /// Parse from string
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the token as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TransactionToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payment attempt lifecycle status
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentStatus {
    Pending,
    Paid,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "PENDING",
            PaymentStatus::Paid => "PAID",
            PaymentStatus::Failed => "FAILED",
        }
    }
}

/// Payment method recorded on the attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaymentMethod {
    Online,
}

/// A durable record of one purchase-initiation-through-settlement lifecycle
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentAttempt {
    pub id: String,

    pub user_id: String,

    pub media_id: String,

    pub amount: Decimal,

    pub method: PaymentMethod,

    pub status: PaymentStatus,

    pub transaction_token: TransactionToken,

    /// Final gateway response, attached at settlement
    #[serde(default)]
    pub gateway_payload: Option<serde_json::Value>,

    pub created_at: DateTime<Utc>,
}

/// Fields needed to create a fresh attempt
#[derive(Clone, Debug)]
pub struct NewPaymentAttempt {
    pub user_id: String,
    pub media_id: String,
    pub amount: Decimal,
    pub transaction_token: TransactionToken,
}

impl PaymentAttempt {
    /// Build a new pending attempt; only a valid gateway callback moves it
    /// to `Paid`.
    pub fn pending(new: NewPaymentAttempt) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: new.user_id,
            media_id: new.media_id,
            amount: new.amount,
            method: PaymentMethod::Online,
            status: PaymentStatus::Pending,
            transaction_token: new.transaction_token,
            gateway_payload: None,
            created_at: Utc::now(),
        }
    }

    pub fn is_paid(&self) -> bool {
        self.status == PaymentStatus::Paid
    }
}

/// Durable proof that a user may consume a specific item
///
/// Keyed by (user, item), not by transaction: historical attempts for the
/// same pair share one grant.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessGrant {
    pub id: String,

    pub user_id: String,

    pub media_id: String,

    pub granted_at: DateTime<Utc>,
}

impl AccessGrant {
    pub fn new(user_id: impl Into<String>, media_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            media_id: media_id.into(),
            granted_at: Utc::now(),
        }
    }
}

/// One watch-history row per (user, item)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchRecord {
    pub id: String,

    pub user_id: String,

    pub media_id: String,

    pub watched_at: DateTime<Utc>,
}

impl WatchRecord {
    pub fn new(user_id: impl Into<String>, media_id: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            media_id: media_id.into(),
            watched_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_token_generation() {
        let token = TransactionToken::generate();
        assert!(token.as_str().starts_with("txn_"));
        assert_eq!(token.as_str().len(), 20);
        assert_ne!(token, TransactionToken::generate());
    }

    #[test]
    fn test_new_attempt_is_pending() {
        let attempt = PaymentAttempt::pending(NewPaymentAttempt {
            user_id: "u1".into(),
            media_id: "m1".into(),
            amount: dec!(100),
            transaction_token: TransactionToken::generate(),
        });

        assert_eq!(attempt.status, PaymentStatus::Pending);
        assert!(!attempt.is_paid());
        assert!(attempt.gateway_payload.is_none());
    }
}
