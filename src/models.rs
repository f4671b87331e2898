// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Core Data Models
//!
//! Wire and stored types shared across the coordinator: the auth token
//! produced by login, wallet details, linked profiles, user status, and the
//! KMS credential block. All types derive `Serialize`/`Deserialize` — they
//! cross the signing-channel boundary and the auth-service wire as JSON.
//!
//! ## Model Categories
//!
//! - **Auth tokens**: [`AuthToken`], [`AuthDetails`], [`AuthResult`]
//! - **Wallets**: [`WalletDetails`], [`WalletRecord`], [`CustodyType`]
//! - **Identity**: [`Profile`], [`ProfileType`], [`UserStatus`]
//! - **KMS**: [`KmsCredentials`]

use serde::{Deserialize, Serialize};

// =============================================================================
// Custody
// =============================================================================

/// Custody model for a user's wallet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CustodyType {
    /// Key split between a sandboxed remote context and a local device share.
    Sharded,
    /// Key operations performed inside a remote trusted-execution service.
    Enclave,
}

// =============================================================================
// Auth Tokens
// =============================================================================

/// Identity details embedded in a stored auth token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthDetails {
    /// Canonical wallet-user id on the auth service.
    pub user_wallet_id: String,
    /// Custody model resolved for this user.
    pub wallet_type: CustodyType,
    /// Email identity, when the login strategy carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    /// Phone identity, when the login strategy carried one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// Whether this login created the user (first authentication).
    #[serde(default)]
    pub is_new_user: bool,
}

/// A signed auth token plus its session cookie.
///
/// Produced by every successful authentication, persisted in client-scoped
/// storage, and invalidated on logout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthToken {
    /// Opaque session cookie honored by the auth service.
    pub cookie_string: String,
    /// Identity details bound to the cookie.
    pub auth_details: AuthDetails,
}

/// Wallet record attached to an authentication result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletDetails {
    /// Checksummed wallet address.
    pub wallet_address: String,
    /// Whether a local device share exists for this wallet (sharded custody
    /// only; absent for enclave wallets).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_share_stored: Option<bool>,
}

/// Wire shape returned across the signing-channel boundary and by the
/// backend session endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub stored_token: AuthToken,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_details: Option<WalletDetails>,
}

// =============================================================================
// Profiles
// =============================================================================

/// Kind of linked identity.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    Email,
    Phone,
    Google,
    Apple,
    Facebook,
    Discord,
    Farcaster,
    Telegram,
    Github,
    Twitch,
    Steam,
    Line,
    X,
    Coinbase,
    Tiktok,
    Passkey,
    Wallet,
    Guest,
    Jwt,
    AuthEndpoint,
}

/// A linked identity associated with one underlying wallet user.
///
/// Linking and unlinking never rotate the wallet address. Unlinking must
/// never leave zero profiles able to authenticate into the wallet.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(rename = "type")]
    pub profile_type: ProfileType,
    /// Provider-specific identifier (email address, phone number, subject id,
    /// wallet address...).
    pub identifier: String,
}

// =============================================================================
// User Status
// =============================================================================

/// One wallet known to the auth service for a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WalletRecord {
    #[serde(rename = "type")]
    pub custody: CustodyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// Whether the remote share store holds this wallet's device share
    /// (sharded custody only; absent for enclave wallets).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_share_stored: Option<bool>,
}

/// Remote account status for an auth token.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UserStatus {
    /// Wallet-user id, absent when the token maps to no logged-in user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_wallet_id: Option<String>,
    /// Wallets generated for this user (may be empty for a fresh user).
    #[serde(default)]
    pub wallets: Vec<WalletRecord>,
    /// Profiles currently able to authenticate into this wallet.
    #[serde(default)]
    pub linked_accounts: Vec<Profile>,
}

// =============================================================================
// KMS Credentials
// =============================================================================

/// GCP KMS key coordinates plus optional service-account credentials.
///
/// Configuration, not runtime state. A single key version maps to exactly
/// one Ethereum address, derived once and cached by the signer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KmsCredentials {
    pub project_id: String,
    pub location_id: String,
    pub key_ring_id: String,
    pub key_id: String,
    pub key_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_credential_email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub application_credential_private_key: Option<String>,
}

impl KmsCredentials {
    /// Fully-qualified, versioned key resource path understood by the KMS
    /// REST surface.
    pub fn key_resource_path(&self) -> String {
        format!(
            "projects/{}/locations/{}/keyRings/{}/cryptoKeys/{}/cryptoKeyVersions/{}",
            self.project_id, self.location_id, self.key_ring_id, self.key_id, self.key_version
        )
    }
}
