// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain RPC registry for raw-transaction broadcast.
//!
//! The signing side never sees RPC endpoint choice; chain routing happens
//! here, keyed by the transaction's chain id. Nonce assignment and
//! deployment races are the submission layer's problem, not this crate's —
//! two transactions from one account may legitimately broadcast
//! concurrently.

use std::collections::HashMap;

use alloy::primitives::B256;
use alloy::providers::{Provider, ProviderBuilder};
use async_trait::async_trait;
use url::Url;

use crate::error::WalletError;

/// Broadcast surface injected into [`Account`](crate::account::Account).
#[async_trait]
pub trait ChainRpc: Send + Sync {
    /// Broadcast a signed raw transaction on the given chain; returns the
    /// transaction hash.
    async fn send_raw_transaction(&self, chain_id: u64, raw: &[u8]) -> Result<B256, WalletError>;
}

/// HTTP registry mapping chain ids to RPC endpoints.
#[derive(Debug, Clone, Default)]
pub struct ChainRegistry {
    endpoints: HashMap<u64, Url>,
}

impl ChainRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) the endpoint for a chain.
    pub fn with_endpoint(mut self, chain_id: u64, endpoint: Url) -> Self {
        self.endpoints.insert(chain_id, endpoint);
        self
    }

    /// Endpoint registered for a chain, if any.
    pub fn endpoint(&self, chain_id: u64) -> Option<&Url> {
        self.endpoints.get(&chain_id)
    }
}

#[async_trait]
impl ChainRpc for ChainRegistry {
    async fn send_raw_transaction(&self, chain_id: u64, raw: &[u8]) -> Result<B256, WalletError> {
        let endpoint = self
            .endpoints
            .get(&chain_id)
            .ok_or_else(|| WalletError::Rpc(format!("no RPC endpoint for chain {chain_id}")))?;

        let provider = ProviderBuilder::new().connect_http(endpoint.clone());

        let pending = provider
            .send_raw_transaction(raw)
            .await
            .map_err(|e| WalletError::Rpc(e.to_string()))?;

        Ok(*pending.tx_hash())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_routes_by_chain_id() {
        let mainnet = Url::parse("https://eth.example.com").unwrap();
        let fuji = Url::parse("https://fuji.example.com").unwrap();
        let registry = ChainRegistry::new()
            .with_endpoint(1, mainnet.clone())
            .with_endpoint(43113, fuji.clone());

        assert_eq!(registry.endpoint(1), Some(&mainnet));
        assert_eq!(registry.endpoint(43113), Some(&fuji));
        assert_eq!(registry.endpoint(42), None);
    }

    #[tokio::test]
    async fn missing_endpoint_is_an_rpc_error() {
        let registry = ChainRegistry::new();
        let err = registry.send_raw_transaction(7, &[0u8]).await.unwrap_err();
        assert!(matches!(err, WalletError::Rpc(_)));
        assert!(err.to_string().contains("chain 7"));
    }
}
