//! Persisted app settings.
//!
//! Currently only the mirror endpoint URL.

use crate::store::kv::{KeyValueStore, StoreError};
use log::{info, warn};
use reqwest::Url;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Key holding the mirror endpoint URL.
pub const MIRROR_URL_KEY: &str = "shopping-list-cloud-url";

#[derive(Debug)]
pub enum SettingsError {
    /// Not an absolute `http`/`https` URL.
    InvalidUrl(String),
    Store(StoreError),
}

impl Display for SettingsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidUrl(value) => write!(f, "invalid mirror url: `{value}`"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SettingsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            Self::InvalidUrl(_) => None,
        }
    }
}

impl From<StoreError> for SettingsError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// Settings persisted next to the collection.
pub struct SettingsStore<S> {
    kv: S,
}

impl<S: KeyValueStore> SettingsStore<S> {
    pub fn new(kv: S) -> Self {
        Self { kv }
    }

    /// Returns the configured mirror URL; read failures count as unset.
    pub fn mirror_url(&self) -> Option<String> {
        match self.kv.get(MIRROR_URL_KEY) {
            Ok(value) => value.filter(|url| !url.trim().is_empty()),
            Err(err) => {
                warn!("event=settings_read module=store status=error key={MIRROR_URL_KEY} error={err}");
                None
            }
        }
    }

    /// Stores the mirror URL. Blank input clears it.
    ///
    /// Returns the stored value, `None` when cleared.
    pub fn set_mirror_url(&self, value: &str) -> Result<Option<String>, SettingsError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.clear_mirror_url()?;
            return Ok(None);
        }

        let parsed =
            Url::parse(trimmed).map_err(|_| SettingsError::InvalidUrl(trimmed.to_string()))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(SettingsError::InvalidUrl(trimmed.to_string()));
        }

        self.kv.put(MIRROR_URL_KEY, trimmed.to_string())?;
        info!("event=settings_write module=store status=ok key={MIRROR_URL_KEY}");
        Ok(Some(trimmed.to_string()))
    }

    pub fn clear_mirror_url(&self) -> Result<(), SettingsError> {
        self.kv.remove(MIRROR_URL_KEY)?;
        info!("event=settings_clear module=store status=ok key={MIRROR_URL_KEY}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{SettingsError, SettingsStore};
    use crate::store::memory::MemoryKeyValueStore;

    #[test]
    fn set_and_read_mirror_url() {
        let settings = SettingsStore::new(MemoryKeyValueStore::new());
        assert_eq!(settings.mirror_url(), None);

        let stored = settings
            .set_mirror_url("  https://script.example.com/exec ")
            .unwrap();
        assert_eq!(stored.as_deref(), Some("https://script.example.com/exec"));
        assert_eq!(
            settings.mirror_url().as_deref(),
            Some("https://script.example.com/exec")
        );
    }

    #[test]
    fn blank_value_clears() {
        let settings = SettingsStore::new(MemoryKeyValueStore::new());
        settings.set_mirror_url("http://localhost:8080/").unwrap();
        assert_eq!(settings.set_mirror_url("   ").unwrap(), None);
        assert_eq!(settings.mirror_url(), None);
    }

    #[test]
    fn rejects_non_http_urls() {
        let settings = SettingsStore::new(MemoryKeyValueStore::new());
        for value in ["not a url", "ftp://example.com/data", "file:///tmp/x"] {
            let err = settings.set_mirror_url(value).unwrap_err();
            assert!(matches!(err, SettingsError::InvalidUrl(_)), "{value}");
        }
        assert_eq!(settings.mirror_url(), None);
    }
}
