//! cartsync storefront - JSON storefront over a hosted commerce cart.
//!
//! This binary serves the storefront views on port 3000.
//!
//! # Architecture
//!
//! - Axum web framework serving JSON views
//! - Hosted commerce REST API for products, cart and checkout
//! - One cart controller per process: a single worker applies cart
//!   operations in arrival order and publishes the confirmed cart
//! - Theme preference persisted to a local JSON file
//!
//! # Security
//!
//! This binary only has access to:
//! - The commerce API with a public (`pk_`) key
//! - Its own preference file
//!
//! It refuses to start with a secret (`sk_`) key.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use cartsync_storefront::commerce::{CartGateway, CommerceClient};
use cartsync_storefront::config::StorefrontConfig;
use cartsync_storefront::preferences::{JsonFileStore, ThemePreference};
use cartsync_storefront::state::AppState;
use cartsync_storefront::sync::CartController;
use sentry::integrations::tracing as sentry_tracing;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            sample_rate: config.sentry_sample_rate,
            traces_sample_rate: config.sentry_traces_sample_rate,
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "cartsync_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    // Cart controller
    let gateway: Arc<dyn CartGateway> = Arc::new(CommerceClient::new(
        &config.commerce,
        config.sync.catalog_cache_ttl,
    ));
    let cart = CartController::spawn(gateway, config.sync.queue_capacity);

    // Load the initial cart; the storefront still serves if the store is down
    match cart.retrieve().await {
        Ok(loaded) => tracing::info!(cart_id = %loaded.id, "Cart loaded"),
        Err(e) => tracing::warn!(error = %e, "Initial cart load failed"),
    }

    // Theme preference
    let store = Arc::new(JsonFileStore::new(&config.preferences_path));
    tracing::debug!(path = %store.path().display(), "Loading preferences");
    let theme = ThemePreference::load(store)
        .await
        .expect("Failed to load preferences");
    tracing::info!(mode = ?theme.mode(), "Theme preference loaded");

    let state = AppState::new(config.clone(), cart, theme);

    // Build router
    let app = cartsync_storefront::app(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    let addr = config.socket_addr();
    tracing::info!("storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
