// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Passkey (WebAuthn) ceremony seam.
//!
//! The actual WebAuthn ceremony runs in the host platform's authenticator
//! APIs. This module defines the boundary the coordinator drives: fetch a
//! server challenge, run the ceremony, hand the attestation/assertion back
//! to the auth service for verification.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Ceremony failure reported by the platform authenticator.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Passkey ceremony failed: {0}")]
pub struct PasskeyCeremonyError(pub String);

/// Credential registration result (attestation).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PasskeyAttestation {
    pub credential_id: String,
    /// CBOR attestation object, base64url.
    pub attestation_object: String,
    /// Client data JSON, base64url.
    pub client_data: String,
}

/// Authentication result (assertion) for an existing credential.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PasskeyAssertion {
    pub credential_id: String,
    /// Authenticator data, base64url.
    pub authenticator_data: String,
    /// Signature over authenticator data + client data hash, base64url.
    pub signature: String,
    /// Client data JSON, base64url.
    pub client_data: String,
}

/// Host-provided WebAuthn client.
#[async_trait]
pub trait PasskeyClient: Send + Sync {
    /// Run the registration ceremony against a server challenge.
    async fn register(
        &self,
        challenge: &str,
        credential_name: Option<&str>,
    ) -> Result<PasskeyAttestation, PasskeyCeremonyError>;

    /// Run the authentication ceremony against a server challenge.
    async fn authenticate(&self, challenge: &str)
        -> Result<PasskeyAssertion, PasskeyCeremonyError>;
}
