// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Wallet Session Management
//!
//! Resolves the custody backend for a valid auth token and produces a
//! ready-to-use wallet instance. Initialization is lazy and idempotent:
//! `get_user`/`get_account` style callers re-run it whenever no in-memory
//! wallet exists, and it reconstructs the same wallet from the stored
//! cookie.

pub mod discovery;
mod wallet;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::channel::RemoteSigningChannel;
use crate::config::ClientConfig;
use crate::error::{WalletError, WalletStateError};
use crate::models::{AuthToken, CustodyType, UserStatus, WalletDetails};
use crate::storage::{ClientScopedStorage, StoredDeviceShare};

pub use discovery::{InstalledWallet, WalletDiscovery, WalletProbe};
pub use wallet::EmbeddedWallet;

/// Session manager owning the in-memory wallet reference.
///
/// Legacy client ids never reach this type: [`ClientConfig`] rejects them at
/// construction, so every session manager is born with a valid id.
pub struct WalletSessionManager {
    config: ClientConfig,
    channel: Arc<RemoteSigningChannel>,
    storage: ClientScopedStorage,
    wallet: RwLock<Option<EmbeddedWallet>>,
}

impl WalletSessionManager {
    pub fn new(
        config: ClientConfig,
        channel: Arc<RemoteSigningChannel>,
        storage: ClientScopedStorage,
    ) -> Self {
        Self {
            config,
            channel,
            storage,
            wallet: RwLock::new(None),
        }
    }

    /// Client configuration this session is scoped to.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Local storage for this client.
    pub fn storage(&self) -> &ClientScopedStorage {
        &self.storage
    }

    /// Signing channel shared by all wallets of this session.
    pub fn channel(&self) -> &Arc<RemoteSigningChannel> {
        &self.channel
    }

    /// The in-memory wallet, if initialization has completed.
    pub async fn current_wallet(&self) -> Option<EmbeddedWallet> {
        self.wallet.read().await.clone()
    }

    /// The initialized wallet, failing when initialization has not run.
    ///
    /// Unlike [`ensure_initialized`](Self::ensure_initialized) this never
    /// touches the network; signing paths that require a ready wallet use it
    /// as a precondition.
    pub async fn require_wallet(&self) -> Result<EmbeddedWallet, WalletError> {
        self.current_wallet()
            .await
            .ok_or_else(|| WalletStateError::WalletNotInitialized.into())
    }

    /// Resolve the auth cookie: explicit token first, stored cookie second.
    pub fn resolve_cookie(&self, auth_token: Option<&AuthToken>) -> Result<String, WalletError> {
        if let Some(token) = auth_token {
            return Ok(token.cookie_string.clone());
        }
        self.storage
            .load_auth_cookie()?
            .ok_or_else(|| WalletStateError::NoAuthToken.into())
    }

    /// Handshake the signing channel with this client's identity.
    ///
    /// Must complete before signing procedures on a fresh custody context;
    /// idempotent on the remote side.
    pub async fn handshake(&self) -> Result<(), WalletError> {
        let ecosystem_id = self.config.ecosystem().map(|e| e.id.as_str());
        self.channel
            .init(self.config.client_id(), ecosystem_id)
            .await?;
        Ok(())
    }

    /// Generate a wallet for an authenticated user that has none, then run
    /// device-share setup and initialize the session.
    ///
    /// `recovered_share` is the device share produced alongside the new
    /// wallet, when the host's recovery flow delivers one.
    pub async fn create_wallet(
        &self,
        auth_token: Option<&AuthToken>,
        recovered_share: Option<&str>,
    ) -> Result<EmbeddedWallet, WalletError> {
        let cookie = self.resolve_cookie(auth_token)?;
        let details = self.channel.create_wallet(&cookie).await?;
        tracing::info!(address = %details.wallet_address, "wallet created");

        self.post_wallet_setup(&details, recovered_share)?;
        self.initialize_wallet_with_share(auth_token, recovered_share)
            .await
    }

    /// Initialize (or re-initialize) the wallet for an auth token.
    pub async fn initialize_wallet(
        &self,
        auth_token: Option<&AuthToken>,
    ) -> Result<EmbeddedWallet, WalletError> {
        self.initialize_wallet_with_share(auth_token, None).await
    }

    /// Initialize the wallet, persisting a freshly recovered device share
    /// first when the host's recovery flow supplies one.
    ///
    /// Custody is resolved from the remote user status: enclave wallets sign
    /// over the network only; anything else is treated as sharded custody
    /// and must end up with a device share reachable from this device —
    /// locally stored, remotely held, or freshly recovered. A sharded wallet
    /// with no share anywhere fails initialization.
    pub async fn initialize_wallet_with_share(
        &self,
        auth_token: Option<&AuthToken>,
        recovered_share: Option<&str>,
    ) -> Result<EmbeddedWallet, WalletError> {
        let cookie = self.resolve_cookie(auth_token)?;

        let status = self.channel.get_user_status(&cookie).await?;
        let (wallet, remote_share_stored) = self.wallet_from_status(&status).await?;

        if wallet.custody() == CustodyType::Sharded {
            let details = WalletDetails {
                wallet_address: wallet.address().to_string(),
                device_share_stored: remote_share_stored,
            };
            self.post_wallet_setup(&details, recovered_share)?;

            if !wallet.is_ready(&self.storage, remote_share_stored == Some(true)) {
                return Err(WalletStateError::DeviceShareMissing.into());
            }
        }

        tracing::debug!(
            address = wallet.address(),
            custody = ?wallet.custody(),
            "wallet session initialized"
        );

        let mut slot = self.wallet.write().await;
        *slot = Some(wallet.clone());
        Ok(wallet)
    }

    /// Return the current wallet, initializing from the stored cookie when
    /// no in-memory instance exists. Idempotent.
    pub async fn ensure_initialized(&self) -> Result<EmbeddedWallet, WalletError> {
        if let Some(wallet) = self.current_wallet().await {
            return Ok(wallet);
        }
        self.initialize_wallet(None).await
    }

    /// Persist a freshly recovered device share, unless another store is
    /// already authoritative for this wallet on this device.
    ///
    /// `device_share_stored` on the details marks the remote (iframe) store
    /// as holding the share; in that case nothing is written locally.
    pub fn post_wallet_setup(
        &self,
        details: &WalletDetails,
        fresh_device_share: Option<&str>,
    ) -> Result<(), WalletError> {
        if details.device_share_stored == Some(true) {
            return Ok(());
        }

        if let Some(share) = fresh_device_share {
            if !self.storage.has_device_share(&details.wallet_address) {
                self.storage.save_device_share(&StoredDeviceShare {
                    wallet_address: details.wallet_address.clone(),
                    share: share.to_string(),
                })?;
            }
        }
        Ok(())
    }

    /// Drop the in-memory wallet (logout). Also discards the channel's
    /// cached address so the next login resolves it fresh.
    pub async fn clear(&self) {
        self.channel.invalidate_address().await;
        let mut slot = self.wallet.write().await;
        *slot = None;
    }

    /// Build a wallet from the remote status. The second element is the
    /// status record's remote-share flag, untouched.
    async fn wallet_from_status(
        &self,
        status: &UserStatus,
    ) -> Result<(EmbeddedWallet, Option<bool>), WalletError> {
        if status.user_wallet_id.is_none() {
            return Err(WalletStateError::NoUserLoggedIn.into());
        }

        let record = status
            .wallets
            .first()
            .ok_or(WalletStateError::NoWalletGenerated)?;

        let address = match &record.address {
            Some(address) => address.clone(),
            // Older service versions omit the address from the status record.
            None => self.channel.get_address().await?,
        };

        let wallet = EmbeddedWallet::new(address, record.custody, self.channel.clone());
        Ok((wallet, record.device_share_stored))
    }
}
