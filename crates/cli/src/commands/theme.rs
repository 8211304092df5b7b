//! Theme preference commands.

use std::sync::Arc;

use cartsync_storefront::config::preferences_path_from_env;
use cartsync_storefront::preferences::{JsonFileStore, ThemePreference};
use tracing::info;

async fn load() -> Result<ThemePreference, Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let store = Arc::new(JsonFileStore::new(preferences_path_from_env()));
    Ok(ThemePreference::load(store).await?)
}

/// Show the persisted theme.
///
/// # Errors
///
/// Returns an error if the preference file is unreadable.
pub async fn show() -> Result<(), Box<dyn std::error::Error>> {
    let theme = load().await?;
    info!("Theme: {:?}", theme.mode());
    Ok(())
}

/// Toggle and persist the theme.
///
/// # Errors
///
/// Returns an error if the preference file cannot be read or written.
pub async fn toggle() -> Result<(), Box<dyn std::error::Error>> {
    let mut theme = load().await?;
    let mode = theme.toggle().await?;
    info!("Theme: {mode:?}");
    Ok(())
}
