//! Persisted client state: a small key-value store of JSON strings.
//!
//! Only two keys are ever written: the serialized auth store under
//! [`AUTH_STORAGE_KEY`] and the onboarding flag under [`ONBOARDING_KEY`].
//! Everything else lives in memory and resets with the session.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use bevy_ecs::prelude::Resource;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

pub const AUTH_STORAGE_KEY: &str = "auth-storage";
pub const ONBOARDING_KEY: &str = "hasOnboarded";

pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&mut self, key: &str) -> Result<(), StorageError>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    entries: BTreeMap<String, String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// All keys in one JSON object file, rewritten atomically on every change.
#[derive(Debug, Clone)]
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StorageError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new())
            }
            Err(error) => {
                return Err(StorageError::Io(format!(
                    "failed to read storage file '{}': {error}",
                    self.path.display()
                )))
            }
        };
        serde_json::from_str(&contents).map_err(|error| {
            StorageError::InvalidFormat(format!(
                "invalid storage file '{}': {error}",
                self.path.display()
            ))
        })
    }

    fn save_atomic(&self, entries: &BTreeMap<String, String>) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|error| {
                StorageError::Io(format!(
                    "failed to create storage directory '{}': {error}",
                    parent.display()
                ))
            })?;
        }

        let serialized = serde_json::to_string_pretty(entries).map_err(|error| {
            StorageError::Io(format!("failed to serialize storage to json: {error}"))
        })?;

        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_nanos())
            .unwrap_or(0);
        let temp_path = self.path.with_extension(format!("json.tmp.{nanos}"));
        let mut temp_file = File::create(&temp_path).map_err(|error| {
            StorageError::Io(format!(
                "failed to create temp storage file '{}': {error}",
                temp_path.display()
            ))
        })?;
        temp_file
            .write_all(serialized.as_bytes())
            .and_then(|()| temp_file.sync_all())
            .map_err(|error| {
                let _ = fs::remove_file(&temp_path);
                StorageError::Io(format!(
                    "failed to write temp storage file '{}': {error}",
                    temp_path.display()
                ))
            })?;

        fs::rename(&temp_path, &self.path).map_err(|error| {
            let _ = fs::remove_file(&temp_path);
            StorageError::Io(format!(
                "failed to move temp storage file '{}' to '{}': {error}",
                temp_path.display(),
                self.path.display()
            ))
        })
    }
}

impl KeyValueStorage for JsonFileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        entries.insert(key.to_string(), value.to_string());
        self.save_atomic(&entries)
    }

    fn remove(&mut self, key: &str) -> Result<(), StorageError> {
        let mut entries = self.load()?;
        if entries.remove(key).is_none() {
            return Ok(());
        }
        self.save_atomic(&entries)
    }
}

/// The session's storage backend.
#[derive(Resource)]
pub struct ClientStorage(pub Box<dyn KeyValueStorage>);

impl Default for ClientStorage {
    fn default() -> Self {
        Self(Box::new(MemoryStorage::new()))
    }
}

impl std::fmt::Debug for ClientStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ClientStorage").finish_non_exhaustive()
    }
}

pub fn load_json<T: DeserializeOwned>(
    storage: &dyn KeyValueStorage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(raw) = storage.get(key)? else {
        return Ok(None);
    };
    serde_json::from_str(&raw).map(Some).map_err(|error| {
        StorageError::InvalidFormat(format!("invalid value under '{key}': {error}"))
    })
}

pub fn save_json<T: Serialize>(
    storage: &mut dyn KeyValueStorage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let raw = serde_json::to_string(value).map_err(|error| {
        StorageError::InvalidFormat(format!("failed to serialize '{key}': {error}"))
    })?;
    storage.set(key, &raw)
}

pub fn has_onboarded(storage: &dyn KeyValueStorage) -> Result<bool, StorageError> {
    Ok(load_json::<bool>(storage, ONBOARDING_KEY)?.unwrap_or(false))
}

pub fn mark_onboarded(storage: &mut dyn KeyValueStorage) -> Result<(), StorageError> {
    save_json(storage, ONBOARDING_KEY, &true)
}
