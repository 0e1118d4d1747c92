//! Application State

use std::sync::Arc;

use media_core::CatalogStore;
use media_payments::SettlementFlow;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Catalog reads for the listing endpoint
    pub catalog: Arc<dyn CatalogStore>,

    /// Payment initiation, settlement, and entitlement checks
    pub flow: Arc<SettlementFlow>,

    /// False when gateway credentials are absent; the checkout and
    /// callback routes answer 503 without touching the flow
    pub payments_enabled: bool,
}
