use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Mutex;
use thiserror::Error;
use tracing::{error, info};

use crate::models::credentials::UserCredentials;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store io error: {0}")]
    Io(String),
    #[error("credential store corrupt: {0}")]
    Corrupt(String),
}

/// Key-value credential storage, keyed by an opaque user identifier.
///
/// Writes overwrite wholesale (last writer wins). The write path persists
/// the full credential including the password; reads hand back a
/// [`UserCredentials`], whose public serialization never re-emits the
/// password — that asymmetry is the point of this interface.
pub trait CredentialStore: Send + Sync {
    fn store(&self, user_id: &str, credentials: &UserCredentials) -> Result<(), StoreError>;
    fn load(&self, user_id: &str) -> Result<Option<UserCredentials>, StoreError>;
}

// Full record persisted on the write path. Private to this module so
// nothing outside the store can re-serialize a password.
#[derive(Serialize, Deserialize, Clone)]
struct StoredCredentials {
    email: String,
    password: String,
}

fn store_key(user_id: &str) -> String {
    format!("creds:{}", user_id)
}

/// Credential store backed by a single JSON blob file guarded by a mutex.
pub struct FileCredentialStore {
    path: String,
    file_mutex: Mutex<()>,
}

impl FileCredentialStore {
    /// Open the store, creating an empty one at `path` if none exists.
    pub fn new(path: &str) -> Self {
        if !Path::new(path).exists() {
            info!("Creating new credential store at {}", path);
            if let Err(e) = fs::write(path, "{}") {
                error!("Failed to create credential store: {}", e);
                panic!("Failed to create credential store: {}", e);
            }
        }

        Self {
            path: path.to_string(),
            file_mutex: Mutex::new(()),
        }
    }

    fn read_map(&self) -> Result<HashMap<String, StoredCredentials>, StoreError> {
        let raw = fs::read_to_string(&self.path).map_err(|e| StoreError::Io(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn write_map(&self, map: &HashMap<String, StoredCredentials>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(map).map_err(|e| StoreError::Io(e.to_string()))?;
        fs::write(&self.path, raw).map_err(|e| StoreError::Io(e.to_string()))
    }
}

impl CredentialStore for FileCredentialStore {
    fn store(&self, user_id: &str, credentials: &UserCredentials) -> Result<(), StoreError> {
        let _guard = self.file_mutex.lock().unwrap();
        let mut map = self.read_map()?;
        map.insert(
            store_key(user_id),
            StoredCredentials {
                email: credentials.email.clone(),
                password: credentials.password.clone(),
            },
        );
        self.write_map(&map)?;
        info!("Stored credentials for user {}", user_id);
        Ok(())
    }

    fn load(&self, user_id: &str) -> Result<Option<UserCredentials>, StoreError> {
        let _guard = self.file_mutex.lock().unwrap();
        let map = self.read_map()?;
        Ok(map
            .get(&store_key(user_id))
            .map(|record| UserCredentials::new(record.email.clone(), record.password.clone())))
    }
}

/// In-memory store for tests.
pub struct MemoryCredentialStore {
    map: Mutex<HashMap<String, StoredCredentials>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self {
            map: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryCredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn store(&self, user_id: &str, credentials: &UserCredentials) -> Result<(), StoreError> {
        self.map.lock().unwrap().insert(
            store_key(user_id),
            StoredCredentials {
                email: credentials.email.clone(),
                password: credentials.password.clone(),
            },
        );
        Ok(())
    }

    fn load(&self, user_id: &str) -> Result<Option<UserCredentials>, StoreError> {
        Ok(self
            .map
            .lock()
            .unwrap()
            .get(&store_key(user_id))
            .map(|record| UserCredentials::new(record.email.clone(), record.password.clone())))
    }
}
