// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Wallet instances produced by session initialization.

use std::fmt;
use std::sync::Arc;

use crate::account::Account;
use crate::chain::ChainRpc;
use crate::channel::RemoteSigningChannel;
use crate::models::CustodyType;
use crate::storage::ClientScopedStorage;

/// A resolved, custody-typed wallet for the authenticated user.
///
/// Both custody models sign through the remote channel; the difference is
/// whether a local device share must exist (sharded) or the far side holds
/// everything (enclave).
#[derive(Clone)]
pub struct EmbeddedWallet {
    address: String,
    custody: CustodyType,
    channel: Arc<RemoteSigningChannel>,
}

// The channel holds a trait-object transport, so Debug is written by hand.
impl fmt::Debug for EmbeddedWallet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmbeddedWallet")
            .field("address", &self.address)
            .field("custody", &self.custody)
            .finish_non_exhaustive()
    }
}

impl EmbeddedWallet {
    pub(crate) fn new(
        address: String,
        custody: CustodyType,
        channel: Arc<RemoteSigningChannel>,
    ) -> Self {
        Self {
            address,
            custody,
            channel,
        }
    }

    /// Wallet address.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Custody model backing this wallet.
    pub fn custody(&self) -> CustodyType {
        self.custody
    }

    /// Whether signing capability is available on this device.
    ///
    /// Enclave wallets are always ready (network signing only). Sharded
    /// wallets need a device share reachable from this device.
    pub fn is_ready(&self, storage: &ClientScopedStorage, remote_share_stored: bool) -> bool {
        match self.custody {
            CustodyType::Enclave => true,
            CustodyType::Sharded => remote_share_stored || storage.has_device_share(&self.address),
        }
    }

    /// Construct a fresh account over this wallet's signing channel.
    pub fn account(&self, rpc: Arc<dyn ChainRpc>) -> Account {
        Account::new(self.channel.clone(), rpc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::channel::test_support::ScriptedTransport;

    const ADDRESS: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12";

    fn wallet(custody: CustodyType) -> EmbeddedWallet {
        let channel = Arc::new(RemoteSigningChannel::new(Arc::new(
            ScriptedTransport::new(),
        )));
        EmbeddedWallet::new(ADDRESS.to_string(), custody, channel)
    }

    #[test]
    fn debug_output_names_address_and_custody() {
        let rendered = format!("{:?}", wallet(CustodyType::Sharded));
        assert!(rendered.contains(ADDRESS));
        assert!(rendered.contains("Sharded"));
    }

    #[test]
    fn enclave_wallet_is_always_ready() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ClientScopedStorage::new(dir.path(), "client-a");
        assert!(wallet(CustodyType::Enclave).is_ready(&storage, false));
    }

    #[test]
    fn sharded_wallet_needs_a_share_somewhere() {
        let dir = tempfile::tempdir().unwrap();
        let storage = ClientScopedStorage::new(dir.path(), "client-a");
        let sharded = wallet(CustodyType::Sharded);

        assert!(!sharded.is_ready(&storage, false));
        assert!(sharded.is_ready(&storage, true));

        storage
            .save_device_share(&crate::storage::StoredDeviceShare {
                wallet_address: ADDRESS.to_string(),
                share: "fragment".into(),
            })
            .unwrap();
        assert!(sharded.is_ready(&storage, false));
    }
}
