//! # media-payments
//!
//! Payment initiation and entitlement settlement for the media platform.
//!
//! ## Flow
//!
//! ```text
//! ┌─────────────┐     ┌──────────────────┐     ┌──────────────┐
//! │  Your Site  │────▶│  Gateway Hosted  │────▶│  IPN / this  │
//! │  (init)     │     │  Checkout Page   │     │  service     │
//! └─────────────┘     └──────────────────┘     └──────────────┘
//! ```
//!
//! 1. `SettlementFlow::initiate_purchase` find-or-creates a pending
//!    `PaymentAttempt` for the (user, item) pair and returns the gateway's
//!    hosted-checkout URL.
//! 2. The gateway later delivers an asynchronous callback. `reconcile_callback`
//!    validates it through the gateway adapter and, for a VALID outcome,
//!    atomically marks the attempt `Paid` and upserts the `AccessGrant`.
//! 3. `check_entitlement` / `record_watch` gate playback on that grant.
//!
//! Duplicate callback deliveries are clean no-ops: settlement of an
//! already-paid attempt never creates a second grant and never errors back
//! to the gateway.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use media_payments::{SettlementFlow, HostedGatewayClient, MemoryPaymentStore};
//!
//! let gateway = HostedGatewayClient::from_env()?;
//! let flow = SettlementFlow::new(catalog, Arc::new(MemoryPaymentStore::new()), Arc::new(gateway));
//!
//! let redirect = flow.initiate_purchase("m1", request).await?;
//! // Redirect user to: redirect.payment_url
//! ```

mod error;
mod flow;
mod gateway;
mod model;
mod store;

pub use error::{PaymentError, Result};
pub use flow::{CheckoutRedirect, InitiatePurchase, SettlementFlow, SettlementOutcome};
pub use gateway::{
    CallbackValidation, CheckoutOrder, GatewayConfig, HostedCheckout, HostedGatewayClient,
    MockGateway, PaymentGateway, VALID_STATUS,
};
pub use model::{
    AccessGrant, NewPaymentAttempt, PaymentAttempt, PaymentMethod, PaymentStatus, TransactionToken,
    WatchRecord,
};
pub use store::{MemoryPaymentStore, PaymentStore, Settlement};
