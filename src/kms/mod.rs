// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # KMS-Backed Server-Side Signer
//!
//! [`KmsSigner`] signs Ethereum payloads with a secp256k1 key held in GCP
//! KMS. The key never leaves the service: hashing happens locally, the
//! 32-byte digest crosses the wire, and a DER-encoded `(r, s)` pair comes
//! back.
//!
//! ## Recovery id
//!
//! KMS does not return a recovery id. Both parity candidates are tried and
//! checked against the key's known address; if neither recovers, the call
//! fails hard — a wrong default `v` would produce signatures attributable
//! to a different address.

mod client;
mod hashing;

use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::primitives::{keccak256, Address, Signature, B256};
use async_trait::async_trait;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::pkcs8::DecodePublicKey;
use tokio::sync::RwLock;

use crate::account::SigningBackend;
use crate::error::WalletError;
use crate::models::KmsCredentials;

pub use client::{GcpKmsClient, KmsService};
pub use hashing::{eip712_hash, personal_message_hash, typed_signature_hash, TypedField};

/// KMS signing errors.
#[derive(Debug, thiserror::Error)]
pub enum KmsError {
    #[error("KMS service error: {0}")]
    Service(String),

    #[error("Failed to parse KMS public key: {0}")]
    PublicKey(String),

    #[error("Invalid signature from KMS: {0}")]
    Signature(String),

    #[error("Neither recovery id candidate matches the KMS key's address")]
    SignatureRecovery,

    #[error("Missing KMS credential: {0}")]
    MissingCredential(&'static str),

    #[error("Invalid typed data: {0}")]
    TypedData(String),
}

/// Ethereum signer over a single KMS key version.
///
/// One key version maps to exactly one address; the address is derived from
/// the fetched public key once and cached for the signer's lifetime.
pub struct KmsSigner<S> {
    service: S,
    key_path: String,
    cached_address: RwLock<Option<Address>>,
}

impl<S: KmsService> KmsSigner<S> {
    pub fn new(service: S, credentials: &KmsCredentials) -> Self {
        Self {
            service,
            key_path: credentials.key_resource_path(),
            cached_address: RwLock::new(None),
        }
    }

    /// The Ethereum address of the KMS key, cached after the first fetch.
    pub async fn get_address(&self) -> Result<Address, KmsError> {
        {
            let cached = self.cached_address.read().await;
            if let Some(address) = *cached {
                return Ok(address);
            }
        }

        let pem_text = self.service.get_public_key(&self.key_path).await?;
        let document =
            pem::parse(&pem_text).map_err(|e| KmsError::PublicKey(e.to_string()))?;
        let public_key = k256::PublicKey::from_public_key_der(document.contents())
            .map_err(|e| KmsError::PublicKey(e.to_string()))?;

        // keccak256 of the uncompressed point without the 0x04 tag byte.
        let point = public_key.to_encoded_point(false);
        let hash = keccak256(&point.as_bytes()[1..]);
        let address = Address::from_slice(&hash[12..]);

        let mut cached = self.cached_address.write().await;
        *cached = Some(address);
        Ok(address)
    }

    /// Sign a 32-byte digest, returning a recoverable signature.
    ///
    /// The DER `(r, s)` from KMS is low-s canonicalized, then the recovery
    /// id is reconstructed by trying both parities against the key's
    /// address.
    pub async fn sign_digest(&self, digest: B256) -> Result<Signature, KmsError> {
        let der = self.service.asymmetric_sign(&self.key_path, &digest.0).await?;

        let parsed = k256::ecdsa::Signature::from_der(&der)
            .map_err(|e| KmsError::Signature(e.to_string()))?;
        let parsed = parsed.normalize_s().unwrap_or(parsed);

        let bytes = parsed.to_bytes();
        let r = B256::from_slice(&bytes[..32]);
        let s = B256::from_slice(&bytes[32..]);

        let expected = self.get_address().await?;
        for parity in [false, true] {
            let candidate = Signature::from_scalars_and_parity(r, s, parity);
            if candidate.recover_address_from_prehash(&digest).ok() == Some(expected) {
                return Ok(candidate);
            }
        }
        Err(KmsError::SignatureRecovery)
    }

    /// Sign an EIP-191 personal message. Returns the 65-byte signature,
    /// 0x-hex, with `v` in {27, 28}.
    pub async fn sign_message(&self, message: &[u8]) -> Result<String, KmsError> {
        let signature = self.sign_digest(personal_message_hash(message)).await?;
        Ok(alloy::hex::encode_prefixed(signature.as_bytes()))
    }

    /// Sign legacy (V1) typed data.
    pub async fn sign_typed_data_v1(&self, fields: &[TypedField]) -> Result<String, KmsError> {
        let signature = self.sign_digest(typed_signature_hash(fields)?).await?;
        Ok(alloy::hex::encode_prefixed(signature.as_bytes()))
    }

    /// Sign EIP-712 (V3/V4) typed data.
    pub async fn sign_typed_data_v4(
        &self,
        typed_data: serde_json::Value,
    ) -> Result<String, KmsError> {
        let signature = self.sign_digest(eip712_hash(typed_data)?).await?;
        Ok(alloy::hex::encode_prefixed(signature.as_bytes()))
    }

    /// Sign an EIP-1559 transaction. Returns the raw signed transaction,
    /// 0x-hex, ready for broadcast.
    pub async fn sign_transaction(&self, tx: &TxEip1559) -> Result<String, KmsError> {
        let signature = self.sign_digest(tx.signature_hash()).await?;
        let envelope = TxEnvelope::Eip1559(tx.clone().into_signed(signature));

        let mut raw = Vec::with_capacity(envelope.encode_2718_len());
        envelope.encode_2718(&mut raw);
        Ok(alloy::hex::encode_prefixed(raw))
    }
}

#[async_trait]
impl<S: KmsService + 'static> SigningBackend for KmsSigner<S> {
    async fn address(&self) -> Result<String, WalletError> {
        Ok(self.get_address().await?.to_string())
    }

    async fn sign_message(&self, message: &str, is_raw: bool) -> Result<String, WalletError> {
        let bytes = if is_raw {
            alloy::hex::decode(message)
                .map_err(|e| WalletError::Rpc(format!("invalid raw message hex: {e}")))?
        } else {
            message.as_bytes().to_vec()
        };
        Ok(KmsSigner::sign_message(self, &bytes).await?)
    }

    async fn sign_typed_data(&self, typed_data: serde_json::Value) -> Result<String, WalletError> {
        Ok(self.sign_typed_data_v4(typed_data).await?)
    }

    async fn sign_transaction(&self, tx: &TxEip1559) -> Result<String, WalletError> {
        Ok(KmsSigner::sign_transaction(self, tx).await?)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use alloy::primitives::{address, TxKind, U256};
    use k256::ecdsa::signature::hazmat::PrehashSigner;
    use k256::ecdsa::SigningKey;
    use k256::pkcs8::EncodePublicKey;

    use super::*;

    /// In-process KMS double backed by a local secp256k1 key.
    struct StubKms {
        key: SigningKey,
        public_key_fetches: AtomicUsize,
    }

    impl StubKms {
        fn new(seed: u8) -> Self {
            Self {
                key: SigningKey::from_slice(&[seed; 32]).unwrap(),
                public_key_fetches: AtomicUsize::new(0),
            }
        }

        fn expected_address(&self) -> Address {
            let point = self.key.verifying_key().to_encoded_point(false);
            let hash = keccak256(&point.as_bytes()[1..]);
            Address::from_slice(&hash[12..])
        }
    }

    #[async_trait]
    impl KmsService for StubKms {
        async fn get_public_key(&self, _key_path: &str) -> Result<String, KmsError> {
            self.public_key_fetches.fetch_add(1, Ordering::SeqCst);
            let pem = self
                .key
                .verifying_key()
                .to_public_key_pem(k256::pkcs8::LineEnding::LF)
                .unwrap();
            Ok(pem)
        }

        async fn asymmetric_sign(
            &self,
            _key_path: &str,
            digest: &[u8; 32],
        ) -> Result<Vec<u8>, KmsError> {
            let signature: k256::ecdsa::Signature = self.key.sign_prehash(digest).unwrap();
            Ok(signature.to_der().to_bytes().to_vec())
        }
    }

    /// KMS double whose reported public key does not match its signing key.
    struct MismatchedKms {
        report: StubKms,
        sign: StubKms,
    }

    #[async_trait]
    impl KmsService for MismatchedKms {
        async fn get_public_key(&self, key_path: &str) -> Result<String, KmsError> {
            self.report.get_public_key(key_path).await
        }

        async fn asymmetric_sign(
            &self,
            key_path: &str,
            digest: &[u8; 32],
        ) -> Result<Vec<u8>, KmsError> {
            self.sign.asymmetric_sign(key_path, digest).await
        }
    }

    fn credentials() -> KmsCredentials {
        KmsCredentials {
            project_id: "proj".into(),
            location_id: "us-east1".into(),
            key_ring_id: "ring".into(),
            key_id: "key".into(),
            key_version: "1".into(),
            application_credential_email: None,
            application_credential_private_key: None,
        }
    }

    fn signer(seed: u8) -> (Address, KmsSigner<StubKms>) {
        let stub = StubKms::new(seed);
        let expected = stub.expected_address();
        (expected, KmsSigner::new(stub, &credentials()))
    }

    #[tokio::test]
    async fn address_derives_from_public_key_and_is_cached() {
        let (expected, signer) = signer(0x42);

        assert_eq!(signer.get_address().await.unwrap(), expected);
        assert_eq!(signer.get_address().await.unwrap(), expected);
        assert_eq!(signer.service.public_key_fetches.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn digest_signatures_recover_to_the_key_address() {
        let (expected, signer) = signer(0x42);

        for byte in [0x01u8, 0x7f, 0xee] {
            let digest = B256::repeat_byte(byte);
            let signature = signer.sign_digest(digest).await.unwrap();
            assert_eq!(
                signature.recover_address_from_prehash(&digest).unwrap(),
                expected
            );
        }
    }

    #[tokio::test]
    async fn personal_signature_recovers_over_eip191_hash() {
        let (expected, signer) = signer(0x17);

        let hex = signer.sign_message(b"hello world").await.unwrap();
        let bytes = alloy::hex::decode(&hex).unwrap();
        let signature = Signature::from_raw(&bytes).unwrap();

        let recovered = signature
            .recover_address_from_prehash(&personal_message_hash(b"hello world"))
            .unwrap();
        assert_eq!(recovered, expected);
    }

    #[tokio::test]
    async fn v1_signature_fails_v4_verification() {
        let (expected, signer) = signer(0x21);

        let fields = vec![TypedField {
            field_type: "string".into(),
            name: "message".into(),
            value: "Hi, Alice!".into(),
        }];
        let v1_hex = signer.sign_typed_data_v1(&fields).await.unwrap();
        let v1_sig = Signature::from_raw(&alloy::hex::decode(&v1_hex).unwrap()).unwrap();

        // Verifies under the V1 hash.
        let v1_hash = typed_signature_hash(&fields).unwrap();
        assert_eq!(
            v1_sig.recover_address_from_prehash(&v1_hash).unwrap(),
            expected
        );

        // Fails under the EIP-712 hash of equivalent content.
        let v4_hash = eip712_hash(serde_json::json!({
            "domain": { "name": "Example", "version": "1", "chainId": 1 },
            "types": {
                "EIP712Domain": [
                    { "name": "name", "type": "string" },
                    { "name": "version", "type": "string" },
                    { "name": "chainId", "type": "uint256" }
                ],
                "Greeting": [{ "name": "message", "type": "string" }]
            },
            "primaryType": "Greeting",
            "message": { "message": "Hi, Alice!" }
        }))
        .unwrap();
        assert_ne!(
            v1_sig.recover_address_from_prehash(&v4_hash).ok(),
            Some(expected)
        );
    }

    #[tokio::test]
    async fn transaction_signing_produces_a_typed_envelope() {
        let (expected, signer) = signer(0x33);

        let tx = TxEip1559 {
            chain_id: 43114,
            nonce: 1,
            gas_limit: 21_000,
            max_fee_per_gas: 30_000_000_000,
            max_priority_fee_per_gas: 1_000_000_000,
            to: TxKind::Call(address!("742d35Cc6634C0532925a3b844Bc9e7595f4aB12")),
            value: U256::from(1_000u64),
            access_list: Default::default(),
            input: Default::default(),
        };

        let raw = signer.sign_transaction(&tx).await.unwrap();
        // EIP-2718 type byte for EIP-1559.
        assert!(raw.starts_with("0x02"));

        let signature = signer.sign_digest(tx.signature_hash()).await.unwrap();
        assert_eq!(
            signature
                .recover_address_from_prehash(&tx.signature_hash())
                .unwrap(),
            expected
        );
    }

    #[tokio::test]
    async fn mismatched_key_fails_recovery_not_silently() {
        let service = MismatchedKms {
            report: StubKms::new(0x42),
            sign: StubKms::new(0x43),
        };
        let signer = KmsSigner::new(service, &credentials());

        let err = signer.sign_digest(B256::repeat_byte(0x05)).await.unwrap_err();
        assert!(matches!(err, KmsError::SignatureRecovery));
    }
}
