//! Per-plugin keyed secret store (§6 external interface: secure storage).
//!
//! Plugins never see the config record for `api-key`-typed options directly;
//! they look the value up here via [`SecureStore::get`]. The default backend
//! encrypts values at rest with AES-256-GCM, keyed from machine-local material
//! so the on-disk blob is useless if copied to another machine.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SecureStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("decryption failed for key {0}")]
    DecryptFailed(String),

    #[error("key not found: {0}")]
    NotFound(String),
}

/// `{get(key), set(key,value), delete(key), list()}` per the external
/// interface contract. `key` is namespaced by the caller (plugins prefix
/// with their own plugin id) so one store instance can serve every plugin.
pub trait SecureStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, SecureStoreError>;
    fn set(&self, key: &str, value: &str) -> Result<(), SecureStoreError>;
    fn delete(&self, key: &str) -> Result<(), SecureStoreError>;
    fn list(&self) -> Result<Vec<String>, SecureStoreError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct EncryptedBlob {
    entries: HashMap<String, String>,
}

/// File-backed [`SecureStore`] encrypting every value with AES-256-GCM.
/// The key is derived from machine-identifying material so the file alone
/// does not decrypt on a different host.
pub struct FileSecureStore {
    path: PathBuf,
    cipher: Aes256Gcm,
    cache: Mutex<EncryptedBlob>,
}

impl FileSecureStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, SecureStoreError> {
        let path = path.into();
        let key = derive_key(&path);
        let cipher = Aes256Gcm::new_from_slice(&key).expect("key is exactly 32 bytes");
        let cache = Mutex::new(load_blob(&path)?);
        Ok(Self {
            path,
            cipher,
            cache,
        })
    }

    fn persist(&self, blob: &EncryptedBlob) -> Result<(), SecureStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_vec(blob)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    fn encrypt(&self, plaintext: &str) -> String {
        let mut nonce_bytes = [0u8; 12];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);
        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .expect("AES-GCM encryption cannot fail for a valid key/nonce");
        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);
        STANDARD.encode(combined)
    }

    fn decrypt(&self, encoded: &str) -> Result<String, SecureStoreError> {
        let raw = STANDARD
            .decode(encoded)
            .map_err(|_| SecureStoreError::DecryptFailed("base64".into()))?;
        if raw.len() < 12 {
            return Err(SecureStoreError::DecryptFailed("truncated".into()));
        }
        let (nonce_bytes, ciphertext) = raw.split_at(12);
        let nonce = Nonce::from_slice(nonce_bytes);
        let plaintext = self
            .cipher
            .decrypt(nonce, ciphertext)
            .map_err(|_| SecureStoreError::DecryptFailed("aead".into()))?;
        String::from_utf8(plaintext).map_err(|_| SecureStoreError::DecryptFailed("utf8".into()))
    }
}

impl SecureStore for FileSecureStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecureStoreError> {
        let guard = self.cache.lock().expect("secure store mutex poisoned");
        match guard.entries.get(key) {
            Some(encoded) => self.decrypt(encoded).map(Some),
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecureStoreError> {
        let mut guard = self.cache.lock().expect("secure store mutex poisoned");
        let encoded = self.encrypt(value);
        guard.entries.insert(key.to_string(), encoded);
        self.persist(&guard)
    }

    fn delete(&self, key: &str) -> Result<(), SecureStoreError> {
        let mut guard = self.cache.lock().expect("secure store mutex poisoned");
        guard.entries.remove(key);
        self.persist(&guard)
    }

    fn list(&self) -> Result<Vec<String>, SecureStoreError> {
        let guard = self.cache.lock().expect("secure store mutex poisoned");
        Ok(guard.entries.keys().cloned().collect())
    }
}

fn load_blob(path: &Path) -> Result<EncryptedBlob, SecureStoreError> {
    match fs::read(path) {
        Ok(bytes) if !bytes.is_empty() => Ok(serde_json::from_slice(&bytes)?),
        _ => Ok(EncryptedBlob::default()),
    }
}

fn derive_key(path: &Path) -> [u8; 32] {
    let username = std::env::var("USER")
        .or_else(|_| std::env::var("USERNAME"))
        .unwrap_or_else(|_| "voxflow".to_string());
    let hostname = std::env::var("HOSTNAME")
        .or_else(|_| std::env::var("COMPUTERNAME"))
        .unwrap_or_else(|_| "localhost".to_string());
    let mut hasher = Sha256::new();
    hasher.update(username.as_bytes());
    hasher.update(b"|");
    hasher.update(hostname.as_bytes());
    hasher.update(b"|");
    hasher.update(path.to_string_lossy().as_bytes());
    hasher.update(b"|voxflow-secure-store-v1");
    hasher.finalize().into()
}

/// An in-memory [`SecureStore`] for tests and for plugins that run in a
/// throwaway process (no secrets ever touch disk).
#[derive(Default)]
pub struct MemorySecureStore {
    entries: Mutex<HashMap<String, String>>,
}

impl SecureStore for MemorySecureStore {
    fn get(&self, key: &str) -> Result<Option<String>, SecureStoreError> {
        Ok(self
            .entries
            .lock()
            .expect("secure store mutex poisoned")
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), SecureStoreError> {
        self.entries
            .lock()
            .expect("secure store mutex poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), SecureStoreError> {
        self.entries
            .lock()
            .expect("secure store mutex poisoned")
            .remove(key);
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, SecureStoreError> {
        Ok(self
            .entries
            .lock()
            .expect("secure store mutex poisoned")
            .keys()
            .cloned()
            .collect())
    }
}
