//! Theme preference route handlers.

use axum::{Json, extract::State};
use tracing::instrument;

use super::views::ThemeView;
use crate::error::Result;
use crate::state::AppState;

/// Current theme flag.
#[instrument(skip(state))]
pub async fn show(State(state): State<AppState>) -> Json<ThemeView> {
    Json(state.theme().lock().await.mode().into())
}

/// Flip the theme flag and persist it.
#[instrument(skip(state))]
pub async fn toggle(State(state): State<AppState>) -> Result<Json<ThemeView>> {
    let mode = state.theme().lock().await.toggle().await?;
    tracing::info!(mode = ?mode, "Theme toggled");
    Ok(Json(mode.into()))
}
