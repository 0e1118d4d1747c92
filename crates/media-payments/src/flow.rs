//! Entitlement Settlement Flow
//!
//! Orchestrates purchase initiation, gateway delegation, and the durable
//! reconciliation of gateway callbacks into access grants. All collaborators
//! are injected; the flow holds no global state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use media_core::{CatalogStore, MediaKind};

use crate::error::{PaymentError, Result};
use crate::gateway::{CheckoutOrder, PaymentGateway};
use crate::model::{NewPaymentAttempt, TransactionToken, WatchRecord};
use crate::store::{PaymentStore, Settlement};

/// Buyer-side inputs to purchase initiation
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitiatePurchase {
    pub user_id: String,
    pub kind: MediaKind,
    pub amount: Decimal,
    pub name: String,
    pub email: String,
}

/// Where to send the buyer next
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRedirect {
    pub payment_url: String,
}

/// Human-readable outcome of a callback delivery
#[derive(Clone, Debug, Serialize)]
pub struct SettlementOutcome {
    pub settled: bool,
    pub message: String,
}

impl SettlementOutcome {
    fn success() -> Self {
        Self {
            settled: true,
            message: "Payment success!".into(),
        }
    }

    fn failure() -> Self {
        Self {
            settled: false,
            message: "Payment Failed!".into(),
        }
    }
}

/// The settlement flow
pub struct SettlementFlow {
    catalog: Arc<dyn CatalogStore>,
    store: Arc<dyn PaymentStore>,
    gateway: Arc<dyn PaymentGateway>,
}

impl SettlementFlow {
    pub fn new(
        catalog: Arc<dyn CatalogStore>,
        store: Arc<dyn PaymentStore>,
        gateway: Arc<dyn PaymentGateway>,
    ) -> Self {
        Self {
            catalog,
            store,
            gateway,
        }
    }

    /// Start a purchase: find-or-create the payment attempt for the
    /// (user, item) pair and hand the buyer to the gateway's hosted page.
    pub async fn initiate_purchase(
        &self,
        item_id: &str,
        request: InitiatePurchase,
    ) -> Result<CheckoutRedirect> {
        if item_id.is_empty() || item_id == "undefined" {
            return Err(PaymentError::InvalidRequest(
                "media id is missing or invalid".into(),
            ));
        }

        let item = self
            .catalog
            .find_item(item_id, request.kind)
            .await?
            .ok_or_else(|| {
                PaymentError::NotFound(format!("media {item_id} ({}) not found", request.kind))
            })?;

        let token = match self.store.find_attempt(&request.user_id, item_id).await? {
            Some(existing) if existing.is_paid() => {
                // TODO(product): the pair is already settled; decide whether
                // to short-circuit here instead of re-entering checkout with
                // the old token.
                existing.transaction_token
            }
            Some(existing) => existing.transaction_token,
            None => {
                let attempt = self
                    .store
                    .create_attempt(NewPaymentAttempt {
                        user_id: request.user_id.clone(),
                        media_id: item_id.to_string(),
                        amount: request.amount,
                        transaction_token: TransactionToken::generate(),
                    })
                    .await?;
                attempt.transaction_token
            }
        };

        tracing::info!(
            token = %token,
            user_id = %request.user_id,
            media_id = %item.id,
            kind = %request.kind,
            gateway = self.gateway.name(),
            "Initiating checkout"
        );

        let checkout = self
            .gateway
            .initiate_checkout(CheckoutOrder {
                amount: request.amount,
                transaction_token: token,
                name: request.name,
                email: request.email,
                user_id: request.user_id,
                media_id: item.id,
                kind: request.kind.as_str().to_string(),
            })
            .await?;

        Ok(CheckoutRedirect {
            payment_url: checkout.payment_url,
        })
    }

    /// Reconcile a gateway callback delivery.
    ///
    /// A non-VALID validation result mutates nothing; a VALID one settles
    /// the matching attempt (mark Paid + upsert grant, atomically).
    /// Redelivery of either kind is a clean no-op.
    pub async fn reconcile_callback(
        &self,
        raw_payload: serde_json::Value,
    ) -> Result<SettlementOutcome> {
        let validation = self.gateway.validate_callback(raw_payload).await?;

        if !validation.is_valid() {
            tracing::info!(
                token = %validation.transaction_token,
                status = %validation.status,
                "Callback validation failed, nothing settled"
            );
            return Ok(SettlementOutcome::failure());
        }

        match self
            .store
            .settle(&validation.transaction_token, validation.raw)
            .await?
        {
            Settlement::Settled { attempt, grant } => {
                tracing::info!(
                    token = %attempt.transaction_token,
                    user_id = %attempt.user_id,
                    media_id = %attempt.media_id,
                    grant_id = %grant.id,
                    "Payment settled, access granted"
                );
            }
            Settlement::AlreadySettled { attempt } => {
                tracing::debug!(
                    token = %attempt.transaction_token,
                    "Duplicate callback for settled payment, ignoring"
                );
            }
        }

        Ok(SettlementOutcome::success())
    }

    /// True iff the user has a Paid attempt (equivalently, a grant) for
    /// the item.
    pub async fn check_entitlement(&self, user_id: &str, item_id: &str) -> Result<bool> {
        let attempt = self.store.find_attempt(user_id, item_id).await?;
        Ok(attempt.is_some_and(|a| a.is_paid()))
    }

    /// Record a watch for an entitled user; repeat calls return the
    /// original row.
    pub async fn record_watch(&self, user_id: &str, item_id: &str) -> Result<WatchRecord> {
        if !self.check_entitlement(user_id, item_id).await? {
            return Err(PaymentError::Forbidden(format!(
                "user {user_id} has not paid for media {item_id}"
            )));
        }

        if let Some(existing) = self.store.find_watch(user_id, item_id).await? {
            return Ok(existing);
        }

        self.store.create_watch(user_id, item_id).await
    }

    /// The user's watch history, most recent first
    pub async fn watch_history(&self, user_id: &str) -> Result<Vec<WatchRecord>> {
        self.store.watch_history(user_id).await
    }
}
