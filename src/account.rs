// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Capability-typed account values.
//!
//! An [`Account`] is constructed fresh per wallet session from the active
//! signing backend — it is not a stored entity. Signing executes on the
//! backend (remote channel or KMS); broadcast routes through the injected
//! [`ChainRpc`] scoped by the transaction's chain id.

use std::sync::Arc;

use alloy::consensus::TxEip1559;
use alloy::primitives::{TxKind, B256};
use async_trait::async_trait;

use crate::chain::ChainRpc;
use crate::channel::RemoteSigningChannel;
use crate::error::WalletError;

/// A signing capability: everything an [`Account`] needs from its custody
/// backend.
#[async_trait]
pub trait SigningBackend: Send + Sync {
    /// Checksummed account address.
    async fn address(&self) -> Result<String, WalletError>;

    /// Sign a personal message; `is_raw` marks `message` as 0x-hex bytes.
    /// Returns the 65-byte signature, 0x-hex.
    async fn sign_message(&self, message: &str, is_raw: bool) -> Result<String, WalletError>;

    /// Sign EIP-712 typed data (`domain`/`types`/`message` JSON). Returns
    /// the signature, 0x-hex.
    async fn sign_typed_data(&self, typed_data: serde_json::Value) -> Result<String, WalletError>;

    /// Sign a transaction. Returns the signed raw transaction, 0x-hex.
    async fn sign_transaction(&self, tx: &TxEip1559) -> Result<String, WalletError>;
}

/// Result of a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentTransaction {
    pub transaction_hash: B256,
}

/// Live account bound to a signing backend and a chain registry.
#[derive(Clone)]
pub struct Account {
    backend: Arc<dyn SigningBackend>,
    rpc: Arc<dyn ChainRpc>,
}

impl Account {
    pub fn new(backend: Arc<dyn SigningBackend>, rpc: Arc<dyn ChainRpc>) -> Self {
        Self { backend, rpc }
    }

    /// Account address. Immutable per wallet instance.
    pub async fn address(&self) -> Result<String, WalletError> {
        self.backend.address().await
    }

    /// Sign a UTF-8 personal message.
    pub async fn sign_message(&self, message: &str) -> Result<String, WalletError> {
        self.backend.sign_message(message, false).await
    }

    /// Sign raw message bytes.
    pub async fn sign_raw_message(&self, message: &[u8]) -> Result<String, WalletError> {
        let hex = alloy::hex::encode_prefixed(message);
        self.backend.sign_message(&hex, true).await
    }

    /// Sign EIP-712 typed data, forwarded verbatim.
    pub async fn sign_typed_data(
        &self,
        typed_data: serde_json::Value,
    ) -> Result<String, WalletError> {
        self.backend.sign_typed_data(typed_data).await
    }

    /// Sign a transaction without broadcasting it.
    pub async fn sign_transaction(&self, tx: &TxEip1559) -> Result<String, WalletError> {
        self.backend.sign_transaction(tx).await
    }

    /// Sign and broadcast a transaction on `tx.chain_id`.
    pub async fn send_transaction(&self, tx: &TxEip1559) -> Result<SentTransaction, WalletError> {
        let raw_hex = self.backend.sign_transaction(tx).await?;
        let raw = alloy::hex::decode(&raw_hex)
            .map_err(|e| WalletError::Rpc(format!("invalid signed transaction hex: {e}")))?;

        let transaction_hash = self.rpc.send_raw_transaction(tx.chain_id, &raw).await?;
        Ok(SentTransaction { transaction_hash })
    }
}

/// RPC-shape JSON for an unsigned EIP-1559 transaction, as the custody
/// boundary expects it.
pub(crate) fn tx_to_rpc_json(tx: &TxEip1559) -> serde_json::Value {
    let to = match tx.to {
        TxKind::Call(address) => serde_json::Value::String(address.to_string()),
        TxKind::Create => serde_json::Value::Null,
    };
    serde_json::json!({
        "chainId": tx.chain_id,
        "nonce": tx.nonce,
        "to": to,
        "value": tx.value.to_string(),
        "gas": tx.gas_limit,
        "maxFeePerGas": tx.max_fee_per_gas.to_string(),
        "maxPriorityFeePerGas": tx.max_priority_fee_per_gas.to_string(),
        "data": alloy::hex::encode_prefixed(&tx.input),
    })
}

#[async_trait]
impl SigningBackend for RemoteSigningChannel {
    async fn address(&self) -> Result<String, WalletError> {
        Ok(self.get_address().await?)
    }

    async fn sign_message(&self, message: &str, is_raw: bool) -> Result<String, WalletError> {
        Ok(RemoteSigningChannel::sign_message(self, message, is_raw).await?)
    }

    async fn sign_typed_data(&self, typed_data: serde_json::Value) -> Result<String, WalletError> {
        Ok(RemoteSigningChannel::sign_typed_data(self, typed_data).await?)
    }

    async fn sign_transaction(&self, tx: &TxEip1559) -> Result<String, WalletError> {
        Ok(
            RemoteSigningChannel::sign_transaction(self, tx_to_rpc_json(tx), tx.chain_id)
                .await?,
        )
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use alloy::primitives::{address, Bytes, U256};

    use super::*;
    use crate::channel::test_support::ScriptedTransport;

    /// Chain RPC that records broadcasts instead of sending them.
    #[derive(Default)]
    struct RecordingRpc {
        sent: Mutex<Vec<(u64, Vec<u8>)>>,
    }

    #[async_trait]
    impl ChainRpc for RecordingRpc {
        async fn send_raw_transaction(
            &self,
            chain_id: u64,
            raw: &[u8],
        ) -> Result<B256, WalletError> {
            self.sent.lock().unwrap().push((chain_id, raw.to_vec()));
            Ok(B256::repeat_byte(0x11))
        }
    }

    fn sample_tx(chain_id: u64) -> TxEip1559 {
        TxEip1559 {
            chain_id,
            nonce: 7,
            gas_limit: 21_000,
            max_fee_per_gas: 30_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
            to: TxKind::Call(address!("742d35Cc6634C0532925a3b844Bc9e7595f4aB12")),
            value: U256::from(1_000u64),
            access_list: Default::default(),
            input: Bytes::new(),
        }
    }

    #[tokio::test]
    async fn send_transaction_broadcasts_on_tx_chain() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "signTransaction",
            serde_json::json!({ "signedTransaction": "0xdeadbeef" }),
        );
        let channel = Arc::new(RemoteSigningChannel::new(transport));
        let rpc = Arc::new(RecordingRpc::default());
        let account = Account::new(channel, rpc.clone());

        let sent = account.send_transaction(&sample_tx(43114)).await.unwrap();
        assert_eq!(sent.transaction_hash, B256::repeat_byte(0x11));

        let broadcasts = rpc.sent.lock().unwrap();
        assert_eq!(broadcasts.len(), 1);
        assert_eq!(broadcasts[0].0, 43114);
        assert_eq!(broadcasts[0].1, vec![0xde, 0xad, 0xbe, 0xef]);
    }

    #[test]
    fn rpc_json_includes_chain_and_recipient() {
        let json = tx_to_rpc_json(&sample_tx(1));
        assert_eq!(json["chainId"], 1);
        assert_eq!(json["nonce"], 7);
        // Addresses render EIP-55 checksummed.
        assert_eq!(
            json["to"],
            address!("742d35Cc6634C0532925a3b844Bc9e7595f4aB12").to_string()
        );
        assert_eq!(json["value"], "1000");
    }

    #[tokio::test]
    async fn contract_creation_serializes_null_recipient() {
        let mut tx = sample_tx(1);
        tx.to = TxKind::Create;
        let json = tx_to_rpc_json(&tx);
        assert!(json["to"].is_null());
    }
}
