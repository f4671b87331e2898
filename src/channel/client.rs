// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Channel client: typed procedure calls over an injected transport.

use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use super::procedure::{
    CookieParams, CreateWallet, GetAddress, GetAddressParams, GetUserStatus, InitIframe,
    InitIframeParams, LoginWithStoredTokenDetails, MigrateFromShardToEnclave, Procedure,
    ProcedureEnvelope, SignMessage, SignMessageParams, SignTransaction, SignTransactionParams,
    SignTypedDataV4, SignTypedDataV4Params,
};
use super::{ChannelError, SigningTransport};
use crate::config::MESSAGE_SIGNING_CHAIN_ID;
use crate::models::{AuthResult, UserStatus, WalletDetails};

/// RPC client for the custody boundary.
///
/// The wallet address is immutable per wallet instance, so `get_address`
/// caches after the first resolution. Everything else is a fresh round trip
/// per call.
pub struct RemoteSigningChannel {
    transport: Arc<dyn SigningTransport>,
    cached_address: RwLock<Option<String>>,
}

impl RemoteSigningChannel {
    pub fn new(transport: Arc<dyn SigningTransport>) -> Self {
        Self {
            transport,
            cached_address: RwLock::new(None),
        }
    }

    /// Dispatch one typed procedure call.
    async fn call<P: Procedure>(&self, params: P::Params) -> Result<P::Response, ChannelError> {
        let params = serde_json::to_value(&params).map_err(|source| ChannelError::Encode {
            procedure: P::NAME,
            source,
        })?;

        let envelope = ProcedureEnvelope {
            procedure_name: P::NAME.to_string(),
            request_id: Uuid::new_v4(),
            params,
        };

        let outcome = self.transport.call(envelope).await?;

        if let Some(message) = outcome.error {
            return Err(ChannelError::Remote {
                procedure: P::NAME,
                message,
            });
        }

        let result = outcome.result.unwrap_or(serde_json::Value::Null);
        serde_json::from_value(result).map_err(|source| ChannelError::Decode {
            procedure: P::NAME,
            source,
        })
    }

    /// Resolve the wallet address, cached after the first call.
    pub async fn get_address(&self) -> Result<String, ChannelError> {
        {
            let cached = self.cached_address.read().await;
            if let Some(address) = &*cached {
                return Ok(address.clone());
            }
        }

        let response = self.call::<GetAddress>(GetAddressParams {}).await?;

        let mut cached = self.cached_address.write().await;
        *cached = Some(response.address.clone());
        Ok(response.address)
    }

    /// Drop the cached address. Called when the session's user changes.
    pub async fn invalidate_address(&self) {
        let mut cached = self.cached_address.write().await;
        *cached = None;
    }

    /// Sign a personal message remotely. Returns the 0x-hex signature.
    ///
    /// `is_raw` marks `message` as 0x-hex bytes rather than a UTF-8 string.
    pub async fn sign_message(&self, message: &str, is_raw: bool) -> Result<String, ChannelError> {
        let response = self
            .call::<SignMessage>(SignMessageParams {
                message: message.to_string(),
                is_raw,
                chain_id: MESSAGE_SIGNING_CHAIN_ID,
            })
            .await?;
        Ok(response.signature)
    }

    /// Sign a transaction remotely. Returns the signed raw transaction
    /// (0x-hex) ready for broadcast; broadcasting is the host's job.
    pub async fn sign_transaction(
        &self,
        transaction: serde_json::Value,
        chain_id: u64,
    ) -> Result<String, ChannelError> {
        let response = self
            .call::<SignTransaction>(SignTransactionParams {
                transaction,
                chain_id,
            })
            .await?;
        Ok(response.signed_transaction)
    }

    /// Sign EIP-712 typed data remotely. The payload is forwarded verbatim;
    /// malformed structures surface as remote failures.
    pub async fn sign_typed_data(
        &self,
        typed_data: serde_json::Value,
    ) -> Result<String, ChannelError> {
        let response = self
            .call::<SignTypedDataV4>(SignTypedDataV4Params {
                typed_data,
                chain_id: MESSAGE_SIGNING_CHAIN_ID,
            })
            .await?;
        Ok(response.signature)
    }

    /// Handshake with the custody boundary for this client.
    pub async fn init(
        &self,
        client_id: &str,
        ecosystem_id: Option<&str>,
    ) -> Result<(), ChannelError> {
        self.call::<InitIframe>(InitIframeParams {
            client_id: client_id.to_string(),
            ecosystem_id: ecosystem_id.map(str::to_string),
        })
        .await?;
        Ok(())
    }

    /// Generate a wallet for the authenticated user.
    pub async fn create_wallet(&self, cookie_string: &str) -> Result<WalletDetails, ChannelError> {
        self.call::<CreateWallet>(CookieParams {
            cookie_string: cookie_string.to_string(),
        })
        .await
    }

    /// Query account status for an auth cookie.
    pub async fn get_user_status(&self, cookie_string: &str) -> Result<UserStatus, ChannelError> {
        self.call::<GetUserStatus>(CookieParams {
            cookie_string: cookie_string.to_string(),
        })
        .await
    }

    /// Complete a login with a previously stored token.
    pub async fn login_with_stored_token(
        &self,
        cookie_string: &str,
    ) -> Result<AuthResult, ChannelError> {
        self.call::<LoginWithStoredTokenDetails>(CookieParams {
            cookie_string: cookie_string.to_string(),
        })
        .await
    }

    /// One-time migration of a sharded wallet to enclave custody.
    pub async fn migrate_from_shard_to_enclave(
        &self,
        cookie_string: &str,
    ) -> Result<(), ChannelError> {
        self.call::<MigrateFromShardToEnclave>(CookieParams {
            cookie_string: cookie_string.to_string(),
        })
        .await?;
        Ok(())
    }
}
