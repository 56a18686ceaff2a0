use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::AppError;

pub const PREFERENCES_KEY: &str = "automation/preferences";
pub const PUNCH_CURRENT_KEY: &str = "punch/current";
pub const PUNCH_SESSIONS_KEY: &str = "punch/sessions";
pub const CUSTOM_CATEGORIES_KEY: &str = "expenses/custom_categories";
pub const SAFETY_SETTINGS_KEY: &str = "safety/settings";

/// String key-value persistence port.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: String) -> Result<(), AppError>;
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

#[derive(Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: String) -> Result<(), AppError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.remove(key);
        Ok(())
    }
}

pub fn load_json<T>(store: &dyn KeyValueStore, key: &str) -> Result<Option<T>, AppError>
where
    T: DeserializeOwned,
{
    match store.get(key)? {
        Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
        None => Ok(None),
    }
}

pub fn save_json<T>(store: &dyn KeyValueStore, key: &str, value: &T) -> Result<(), AppError>
where
    T: Serialize,
{
    store.set(key, serde_json::to_string(value)?)
}
