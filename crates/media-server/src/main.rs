//! media-platform HTTP Server
//!
//! Axum-based server exposing the catalog listing and the payment and
//! entitlement flow: checkout initiation, the gateway callback, entitlement
//! checks, and watch history.

mod handlers;
mod state;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use chrono::Utc;
use rust_decimal::Decimal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use media_core::{CatalogStore, MediaItem, MediaKind, MemoryCatalogStore};
use media_payments::{
    HostedGatewayClient, MemoryPaymentStore, MockGateway, PaymentGateway, SettlementFlow,
};

use crate::handlers::{
    add_watch, health_check, init_payment, list_media, payment_callback, payment_status,
    watch_history,
};
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load environment
    dotenvy::dotenv().ok();

    // Stores (in-memory; swap for a database-backed pair in production)
    let catalog = Arc::new(MemoryCatalogStore::new());
    seed_catalog(catalog.as_ref()).await?;
    let store = Arc::new(MemoryPaymentStore::new());

    // Gateway: real client when credentials are present, otherwise the
    // checkout routes stay dark behind a 503
    let (gateway, payments_enabled): (Arc<dyn PaymentGateway>, bool) =
        match HostedGatewayClient::from_env() {
            Ok(client) => {
                tracing::info!("✓ Payment gateway configured");
                (Arc::new(client), true)
            }
            Err(e) => {
                tracing::warn!("⚠ Payment gateway not configured - checkout disabled ({e})");
                tracing::warn!("  Set GATEWAY_STORE_ID, GATEWAY_STORE_PASS and the GATEWAY_* URLs in .env");
                (Arc::new(MockGateway::new()), false)
            }
        };

    let flow = Arc::new(SettlementFlow::new(catalog.clone(), store, gateway));

    // Build application state
    let state = AppState {
        catalog,
        flow,
        payments_enabled,
    };

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build router
    let app = Router::new()
        // Health & catalog
        .route("/health", get(health_check))
        .route("/api/media", get(list_media))
        // Payments
        .route("/api/payments/{item_id}/init", post(init_payment))
        .route("/api/payments/callback", get(payment_callback))
        .route("/api/payments/{item_id}/status", get(payment_status))
        // Watch history
        .route("/api/watch-history", post(add_watch).get(watch_history))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("media-platform server running on http://{}", addr);
    tracing::info!("Endpoints:");
    tracing::info!("  GET  /health                          - Health check");
    tracing::info!("  GET  /api/media                       - List catalog");
    tracing::info!("  POST /api/payments/{{item_id}}/init     - Start checkout");
    tracing::info!("  GET  /api/payments/callback           - Gateway IPN");
    tracing::info!("  GET  /api/payments/{{item_id}}/status   - Entitlement check");
    tracing::info!("  POST /api/watch-history               - Record a watch");
    tracing::info!("  GET  /api/watch-history               - List watch history");

    axum::serve(listener, app).await?;

    Ok(())
}

/// Demo catalog rows so the flow is exercisable out of the box
async fn seed_catalog(catalog: &MemoryCatalogStore) -> anyhow::Result<()> {
    let items = [
        MediaItem {
            id: "m1".into(),
            title: "The Long Goodbye".into(),
            description: "A private eye unravels a favor gone wrong.".into(),
            genre: "Noir".into(),
            thumbnail: "https://cdn.example.com/m1.jpg".into(),
            video_urls: vec!["https://cdn.example.com/v/m1".into()],
            kind: MediaKind::Movie,
            amount: Some(Decimal::from(100)),
            release_date: None,
            created_at: Utc::now(),
        },
        MediaItem {
            id: "s1".into(),
            title: "Harbor Lights".into(),
            description: "Three-part drama on a fishing town in decline.".into(),
            genre: "Drama".into(),
            thumbnail: "https://cdn.example.com/s1.jpg".into(),
            video_urls: vec![
                "https://cdn.example.com/v/s1e1".into(),
                "https://cdn.example.com/v/s1e2".into(),
                "https://cdn.example.com/v/s1e3".into(),
            ],
            kind: MediaKind::Series,
            amount: Some(Decimal::from(250)),
            release_date: None,
            created_at: Utc::now(),
        },
    ];

    for item in items {
        let item = catalog.upsert_item(item).await.map_err(anyhow::Error::new)?;
        tracing::info!("  Seeded: {} ({})", item.title, item.kind);
    }

    Ok(())
}
