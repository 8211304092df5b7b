//! Application state shared across handlers.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::StorefrontConfig;
use crate::preferences::ThemePreference;
use crate::sync::CartController;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the cart controller, the theme preference and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    cart: CartController,
    theme: Mutex<ThemePreference>,
}

impl AppState {
    /// Create a new application state.
    #[must_use]
    pub fn new(config: StorefrontConfig, cart: CartController, theme: ThemePreference) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                cart,
                theme: Mutex::new(theme),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the cart controller.
    #[must_use]
    pub fn cart(&self) -> &CartController {
        &self.inner.cart
    }

    /// Get the theme preference.
    ///
    /// Toggles hold the lock across the write so two toggles never interleave.
    #[must_use]
    pub fn theme(&self) -> &Mutex<ThemePreference> {
        &self.inner.theme
    }
}
