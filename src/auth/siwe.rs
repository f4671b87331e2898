// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Sign-In With Ethereum (EIP-4361) payloads.
//!
//! The coordinator generates a payload, the host wallet signs its message
//! rendering, and the auth service verifies the signature server-side.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validity window for a generated SIWE payload.
const PAYLOAD_TTL_MINUTES: i64 = 10;

/// An EIP-4361 message payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SiwePayload {
    pub domain: String,
    pub address: String,
    pub statement: String,
    pub uri: String,
    pub version: String,
    pub chain_id: u64,
    pub nonce: String,
    pub issued_at: DateTime<Utc>,
    pub expiration_time: DateTime<Utc>,
}

impl SiwePayload {
    /// Generate a fresh payload for an address on a chain.
    pub fn generate(domain: &str, address: &str, chain_id: u64) -> Self {
        let issued_at = Utc::now();
        Self {
            domain: domain.to_string(),
            address: address.to_string(),
            statement: "Please ensure that the domain above matches the URL of the current website."
                .to_string(),
            uri: format!("https://{domain}"),
            version: "1".to_string(),
            chain_id,
            nonce: Uuid::new_v4().simple().to_string(),
            issued_at,
            expiration_time: issued_at + Duration::minutes(PAYLOAD_TTL_MINUTES),
        }
    }

    /// Render the EIP-4361 message the wallet signs.
    pub fn message(&self) -> String {
        format!(
            "{domain} wants you to sign in with your Ethereum account:\n\
             {address}\n\
             \n\
             {statement}\n\
             \n\
             URI: {uri}\n\
             Version: {version}\n\
             Chain ID: {chain_id}\n\
             Nonce: {nonce}\n\
             Issued At: {issued_at}\n\
             Expiration Time: {expiration_time}",
            domain = self.domain,
            address = self.address,
            statement = self.statement,
            uri = self.uri,
            version = self.version,
            chain_id = self.chain_id,
            nonce = self.nonce,
            issued_at = self.issued_at.to_rfc3339(),
            expiration_time = self.expiration_time.to_rfc3339(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12";

    #[test]
    fn generate_sets_validity_window() {
        let payload = SiwePayload::generate("app.example.com", ADDRESS, 1);
        assert_eq!(payload.chain_id, 1);
        assert_eq!(
            payload.expiration_time - payload.issued_at,
            Duration::minutes(PAYLOAD_TTL_MINUTES)
        );
        assert_eq!(payload.nonce.len(), 32);
    }

    #[test]
    fn message_follows_eip4361_layout() {
        let payload = SiwePayload::generate("app.example.com", ADDRESS, 137);
        let message = payload.message();

        assert!(message
            .starts_with("app.example.com wants you to sign in with your Ethereum account:"));
        assert!(message.contains(ADDRESS));
        assert!(message.contains("Chain ID: 137"));
        assert!(message.contains(&format!("Nonce: {}", payload.nonce)));
    }

    #[test]
    fn nonces_are_unique() {
        let a = SiwePayload::generate("d", ADDRESS, 1);
        let b = SiwePayload::generate("d", ADDRESS, 1);
        assert_ne!(a.nonce, b.nonce);
    }
}
