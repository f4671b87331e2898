// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Client-Scoped Local Storage
//!
//! File-backed store for the auth cookie and sharded-wallet device shares,
//! namespaced per client id (plus ecosystem id when present). This is the
//! only shared mutable resource the coordinator owns.
//!
//! ## Storage Layout
//!
//! ```text
//! {root}/
//!   {namespace}/
//!     auth_cookie.json            # Persisted session cookie
//!     shares/{wallet_address}.json  # Device share per wallet
//! ```
//!
//! ## Concurrency
//!
//! Writes go to a temp file and are renamed into place, so readers never
//! observe torn records. Concurrent writers from multiple processes are
//! last-writer-wins; no cross-process lock is taken.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Error type for local storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Persisted session cookie record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredCookie {
    pub cookie_string: String,
}

/// Persisted device share record for one sharded wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredDeviceShare {
    pub wallet_address: String,
    /// Opaque share material. One fragment of the split key; useless without
    /// the remote fragment.
    pub share: String,
}

/// Client-scoped storage for auth cookies and device shares.
#[derive(Debug, Clone)]
pub struct ClientScopedStorage {
    root: PathBuf,
    namespace: String,
}

impl ClientScopedStorage {
    /// Create a store rooted at `root` for the given client namespace.
    ///
    /// Does not touch the filesystem; directories are created lazily on
    /// first write.
    pub fn new(root: impl AsRef<Path>, namespace: impl Into<String>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            namespace: namespace.into(),
        }
    }

    /// Namespace this store is scoped to.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn namespace_dir(&self) -> PathBuf {
        self.root.join(&self.namespace)
    }

    fn cookie_path(&self) -> PathBuf {
        self.namespace_dir().join("auth_cookie.json")
    }

    fn share_path(&self, wallet_address: &str) -> PathBuf {
        self.namespace_dir()
            .join("shares")
            .join(format!("{}.json", wallet_address.to_lowercase()))
    }

    // ========== Auth Cookie ==========

    /// Persist the session cookie for this client.
    pub fn save_auth_cookie(&self, cookie_string: &str) -> StorageResult<()> {
        self.write_json(
            self.cookie_path(),
            &StoredCookie {
                cookie_string: cookie_string.to_string(),
            },
        )
    }

    /// Load the persisted session cookie, if any.
    pub fn load_auth_cookie(&self) -> StorageResult<Option<String>> {
        match self.read_json::<StoredCookie>(self.cookie_path()) {
            Ok(cookie) => Ok(Some(cookie.cookie_string)),
            Err(StorageError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Remove the persisted session cookie. Idempotent.
    pub fn clear_auth_cookie(&self) -> StorageResult<()> {
        match fs::remove_file(self.cookie_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // ========== Device Shares ==========

    /// Persist the device share for a sharded wallet.
    pub fn save_device_share(&self, share: &StoredDeviceShare) -> StorageResult<()> {
        self.write_json(self.share_path(&share.wallet_address), share)
    }

    /// Load the device share for a wallet, if one is stored on this device.
    pub fn load_device_share(
        &self,
        wallet_address: &str,
    ) -> StorageResult<Option<StoredDeviceShare>> {
        match self.read_json::<StoredDeviceShare>(self.share_path(wallet_address)) {
            Ok(share) => Ok(Some(share)),
            Err(StorageError::Io(e)) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Whether a device share exists locally for the wallet.
    pub fn has_device_share(&self, wallet_address: &str) -> bool {
        File::open(self.share_path(wallet_address)).is_ok()
    }

    /// Remove the device share for a wallet. Idempotent.
    pub fn clear_device_share(&self, wallet_address: &str) -> StorageResult<()> {
        match fs::remove_file(self.share_path(wallet_address)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    // ========== JSON Primitives ==========

    fn read_json<T: DeserializeOwned>(&self, path: impl AsRef<Path>) -> StorageResult<T> {
        let file = File::open(path.as_ref())?;
        let reader = BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Atomic write via temp file + rename.
    fn write_json<T: Serialize>(&self, path: impl AsRef<Path>, value: &T) -> StorageResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let temp_path = path.with_extension("tmp");
        {
            let file = File::create(&temp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, value)?;
            writer.flush()?;
        }
        fs::rename(&temp_path, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_storage(namespace: &str) -> (tempfile::TempDir, ClientScopedStorage) {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = ClientScopedStorage::new(dir.path(), namespace);
        (dir, storage)
    }

    #[test]
    fn cookie_round_trip() {
        let (_dir, storage) = test_storage("client-a");

        assert_eq!(storage.load_auth_cookie().unwrap(), None);
        storage.save_auth_cookie("cookie-123").unwrap();
        assert_eq!(
            storage.load_auth_cookie().unwrap(),
            Some("cookie-123".to_string())
        );

        storage.clear_auth_cookie().unwrap();
        assert_eq!(storage.load_auth_cookie().unwrap(), None);
        // Clearing again is fine
        storage.clear_auth_cookie().unwrap();
    }

    #[test]
    fn device_share_round_trip() {
        let (_dir, storage) = test_storage("client-a");
        let share = StoredDeviceShare {
            wallet_address: "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12".into(),
            share: "fragment".into(),
        };

        assert!(!storage.has_device_share(&share.wallet_address));
        storage.save_device_share(&share).unwrap();
        assert!(storage.has_device_share(&share.wallet_address));

        // Address lookup is case-insensitive
        let loaded = storage
            .load_device_share("0x742D35CC6634C0532925A3B844BC9E7595F4AB12")
            .unwrap()
            .unwrap();
        assert_eq!(loaded, share);

        storage.clear_device_share(&share.wallet_address).unwrap();
        assert!(!storage.has_device_share(&share.wallet_address));
    }

    #[test]
    fn namespaces_are_isolated() {
        let dir = tempfile::tempdir().expect("tempdir");
        let a = ClientScopedStorage::new(dir.path(), "client-a");
        let b = ClientScopedStorage::new(dir.path(), "client-b");

        a.save_auth_cookie("cookie-a").unwrap();
        assert_eq!(b.load_auth_cookie().unwrap(), None);
        assert_eq!(a.load_auth_cookie().unwrap(), Some("cookie-a".to_string()));
    }

    #[test]
    fn last_writer_wins() {
        let (_dir, storage) = test_storage("client-a");
        storage.save_auth_cookie("first").unwrap();
        storage.save_auth_cookie("second").unwrap();
        assert_eq!(
            storage.load_auth_cookie().unwrap(),
            Some("second".to_string())
        );
    }
}
