// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Crate-level error taxonomy.
//!
//! Errors fall into the classes the coordinator distinguishes operationally:
//!
//! - configuration errors: fail immediately, never retried
//! - remote-auth errors: surfaced verbatim, retry UX belongs to the caller
//! - wallet-state errors: precondition violations, fatal to the call but not
//!   to the session
//! - migration errors: non-fatal, logged at the call site
//! - signature-recovery errors: hard failures, treated as misconfiguration
//!
//! Module-specific errors ([`ChannelError`](crate::channel::ChannelError),
//! [`KmsError`](crate::kms::KmsError),
//! [`StorageError`](crate::storage::StorageError),
//! [`AuthApiError`](crate::auth::AuthApiError)) convert into [`WalletError`]
//! via `#[from]`.

use crate::auth::AuthApiError;
use crate::channel::ChannelError;
use crate::kms::KmsError;
use crate::storage::StorageError;

/// Configuration errors. Always fatal, never retried.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(
        "Legacy client id '{0}' is not supported. Generate a new client id from the dashboard."
    )]
    LegacyClientId(String),

    #[error("Client id must not be empty")]
    EmptyClientId,

    #[error("Invalid service origin: {0}")]
    InvalidServiceOrigin(String),

    #[error("Missing KMS credential: {0}")]
    MissingKmsCredential(&'static str),
}

/// Wallet-state precondition violations.
///
/// Fatal to the current call; the caller may re-authenticate and retry.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum WalletStateError {
    #[error("No auth token provided and no stored auth token found")]
    NoAuthToken,

    #[error("No user logged in")]
    NoUserLoggedIn,

    #[error("No wallet generated for this user")]
    NoWalletGenerated,

    #[error("Wallet not initialized")]
    WalletNotInitialized,

    #[error("No device share found for this wallet on this device")]
    DeviceShareMissing,

    #[error("Cannot unlink the last profile of a wallet")]
    LastProfile,
}

/// Top-level error for all coordinator operations.
#[derive(Debug, thiserror::Error)]
pub enum WalletError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    State(#[from] WalletStateError),

    #[error(transparent)]
    AuthApi(#[from] AuthApiError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error(transparent)]
    Kms(#[from] KmsError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error("RPC error: {0}")]
    Rpc(String),
}
