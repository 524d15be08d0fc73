// SPDX-FileCopyrightText: 2025 Joost van der Laan <joost@fashionunited.com>
//
// SPDX-License-Identifier: AGPL-3.0-only

use anyhow::{Context, Result};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::currencies::is_supported;

pub const PREFERRED_CURRENCY_KEY: &str = "preferredCurrency";
pub const DEFAULT_CURRENCY: &str = "INR";

/// String key-value storage for user preferences
pub trait PreferenceStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Preferences kept as a flat TOML table on disk
#[derive(Debug)]
pub struct TomlFileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl TomlFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read preferences from {}", self.path.display()))?;
        toml::from_str(&contents).context("Failed to parse preferences file")
    }
}

impl PreferenceStorage for TomlFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut values = self.read_all()?;
        values.insert(key.to_string(), value.to_string());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let contents = toml::to_string_pretty(&values)?;
        fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write preferences to {}", self.path.display()))?;
        Ok(())
    }
}

/// The user's preferred display currency.
///
/// Every value written through [`CurrencyPreference::set_user_currency`] is
/// published to all receivers handed out by [`CurrencyPreference::subscribe`].
pub struct CurrencyPreference {
    storage: Arc<dyn PreferenceStorage>,
    default_currency: String,
    changes: watch::Sender<String>,
}

impl CurrencyPreference {
    pub fn new(storage: Arc<dyn PreferenceStorage>, default_currency: impl Into<String>) -> Self {
        let default_currency = default_currency.into();
        let current = read_preference(storage.as_ref(), &default_currency);
        let (changes, _) = watch::channel(current);
        Self {
            storage,
            default_currency,
            changes,
        }
    }

    /// Stored preference, or the default when nothing is stored or storage is unreadable
    pub fn get_user_currency(&self) -> String {
        read_preference(self.storage.as_ref(), &self.default_currency)
    }

    /// Persist `code` and notify subscribers. Codes are not checked against
    /// the registry; formatting degrades gracefully for unknown ones.
    pub fn set_user_currency(&self, code: &str) -> Result<()> {
        if !is_supported(code) {
            warn!("Storing unsupported currency preference {:?}", code);
        }
        self.storage.set(PREFERRED_CURRENCY_KEY, code)?;
        self.changes.send_replace(code.to_string());
        debug!("Preferred currency set to {}", code);
        Ok(())
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.changes.subscribe()
    }
}

fn read_preference(storage: &dyn PreferenceStorage, default_currency: &str) -> String {
    match storage.get(PREFERRED_CURRENCY_KEY) {
        Ok(Some(code)) if !code.is_empty() => code,
        Ok(_) => default_currency.to_string(),
        Err(e) => {
            warn!("Failed to read currency preference: {:#}", e);
            default_currency.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn memory_preference() -> CurrencyPreference {
        CurrencyPreference::new(Arc::new(MemoryStorage::new()), DEFAULT_CURRENCY)
    }

    #[test]
    fn test_default_when_unset() {
        let preference = memory_preference();
        assert_eq!(preference.get_user_currency(), "INR");
    }

    #[test]
    fn test_returns_last_value_set() -> Result<()> {
        let preference = memory_preference();
        preference.set_user_currency("EUR")?;
        assert_eq!(preference.get_user_currency(), "EUR");
        preference.set_user_currency("JPY")?;
        assert_eq!(preference.get_user_currency(), "JPY");
        Ok(())
    }

    #[test]
    fn test_unsupported_code_is_stored() -> Result<()> {
        let preference = memory_preference();
        preference.set_user_currency("ZZZ")?;
        assert_eq!(preference.get_user_currency(), "ZZZ");
        Ok(())
    }

    #[tokio::test]
    async fn test_subscribers_see_changes() -> Result<()> {
        let preference = memory_preference();
        let mut first = preference.subscribe();
        let mut second = preference.subscribe();
        assert_eq!(*first.borrow(), "INR");

        preference.set_user_currency("GBP")?;

        first.changed().await?;
        second.changed().await?;
        assert_eq!(*first.borrow_and_update(), "GBP");
        assert_eq!(*second.borrow_and_update(), "GBP");
        Ok(())
    }

    #[test]
    fn test_subscriber_starts_with_stored_value() -> Result<()> {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(PREFERRED_CURRENCY_KEY, "CAD")?;
        let preference = CurrencyPreference::new(storage, DEFAULT_CURRENCY);
        assert_eq!(*preference.subscribe().borrow(), "CAD");
        Ok(())
    }

    #[test]
    fn test_toml_storage_persists_across_instances() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("nested").join("preferences.toml");

        let preference = CurrencyPreference::new(Arc::new(TomlFileStorage::new(&path)), DEFAULT_CURRENCY);
        assert_eq!(preference.get_user_currency(), "INR");
        preference.set_user_currency("AUD")?;

        let reopened = CurrencyPreference::new(Arc::new(TomlFileStorage::new(&path)), DEFAULT_CURRENCY);
        assert_eq!(reopened.get_user_currency(), "AUD");

        let contents = fs::read_to_string(&path)?;
        assert!(contents.contains("preferredCurrency = \"AUD\""));
        Ok(())
    }

    #[test]
    fn test_toml_storage_keeps_other_keys() -> Result<()> {
        let dir = tempdir()?;
        let storage = TomlFileStorage::new(dir.path().join("preferences.toml"));
        storage.set("theme", "dark")?;
        storage.set(PREFERRED_CURRENCY_KEY, "USD")?;
        assert_eq!(storage.get("theme")?.as_deref(), Some("dark"));
        assert_eq!(storage.get(PREFERRED_CURRENCY_KEY)?.as_deref(), Some("USD"));
        assert_eq!(storage.get("missing")?, None);
        Ok(())
    }

    #[test]
    fn test_corrupt_file_falls_back_to_default() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("preferences.toml");
        fs::write(&path, "this is not = = toml")?;

        let preference = CurrencyPreference::new(Arc::new(TomlFileStorage::new(&path)), "USD");
        assert_eq!(preference.get_user_currency(), "USD");
        Ok(())
    }
}
