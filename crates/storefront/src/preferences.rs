//! Durable user preferences.
//!
//! Values are JSON, stored per key. The only preference in use is the theme
//! flag, kept as a boolean under [`THEME_KEY`].

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use cartsync_core::ThemeMode;
use serde_json::Value as JsonValue;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

/// Key under which the theme flag is stored.
pub const THEME_KEY: &str = "dark";

/// Error type for preference operations.
#[derive(Debug, thiserror::Error)]
pub enum PreferenceError {
    #[error("preference file error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("preference {key} has unexpected value {value}")]
    InvalidValue { key: String, value: JsonValue },
}

/// Key-value storage that survives restarts.
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Read a value. `None` if the key was never written.
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, PreferenceError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: JsonValue) -> Result<(), PreferenceError>;
}

// =============================================================================
// JsonFileStore
// =============================================================================

/// Preferences kept as one JSON object in a file.
///
/// The whole file is rewritten on every `set`. A missing file reads as empty.
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read_all(&self) -> Result<BTreeMap<String, JsonValue>, PreferenceError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => Ok(serde_json::from_str(&text)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[async_trait]
impl PreferenceStore for JsonFileStore {
    async fn get(&self, key: &str) -> Result<Option<JsonValue>, PreferenceError> {
        let _guard = self.lock.lock().await;
        Ok(self.read_all().await?.remove(key))
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    async fn set(&self, key: &str, value: JsonValue) -> Result<(), PreferenceError> {
        let _guard = self.lock.lock().await;

        let mut all = self.read_all().await?;
        all.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&self.path, serde_json::to_vec_pretty(&all)?).await?;

        debug!("Preference saved");
        Ok(())
    }
}

// =============================================================================
// ThemePreference
// =============================================================================

/// The theme flag, loaded once and written through on every toggle.
pub struct ThemePreference {
    store: Arc<dyn PreferenceStore>,
    mode: ThemeMode,
}

impl ThemePreference {
    /// Read the persisted flag. A missing key means light mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read or holds a non-boolean.
    pub async fn load(store: Arc<dyn PreferenceStore>) -> Result<Self, PreferenceError> {
        let mode = match store.get(THEME_KEY).await? {
            None => ThemeMode::Light,
            Some(JsonValue::Bool(dark)) => ThemeMode::from_dark(dark),
            Some(value) => {
                return Err(PreferenceError::InvalidValue {
                    key: THEME_KEY.to_string(),
                    value,
                });
            }
        };
        Ok(Self { store, mode })
    }

    #[must_use]
    pub const fn mode(&self) -> ThemeMode {
        self.mode
    }

    /// Flip the mode and persist it.
    ///
    /// The in-memory mode only changes once the write succeeded.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be written.
    pub async fn toggle(&mut self) -> Result<ThemeMode, PreferenceError> {
        let next = self.mode.toggled();
        self.store
            .set(THEME_KEY, JsonValue::Bool(next.is_dark()))
            .await?;
        self.mode = next;
        Ok(next)
    }
}
