// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Remote Signing Channel
//!
//! RPC bridge to the custody boundary (sandboxed iframe context or enclave
//! service). Private-key operations execute on the far side; key bits never
//! materialize in this process.
//!
//! Procedures are typed: each request/response pair is declared once in
//! [`procedure`] with a compile-time procedure name, so payloads cannot
//! drift from their wire shape. Transports ([`transport`]) only move
//! envelopes; they know nothing about individual procedures.
//!
//! There is no retry or backoff at this layer. If the transport is
//! unreachable, every signing operation fails outright.

mod client;
pub mod procedure;
pub mod transport;

pub use client::RemoteSigningChannel;
pub use transport::{EnclaveHttpTransport, SigningTransport};

#[cfg(test)]
pub(crate) use client::test_support;

/// Errors crossing the signing-channel boundary.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    /// The transport could not deliver the call at all.
    #[error("Signing channel unreachable: {0}")]
    Transport(String),

    /// The remote side rejected the procedure.
    #[error("Procedure '{procedure}' failed: {message}")]
    Remote {
        procedure: &'static str,
        message: String,
    },

    /// The remote payload did not match the procedure's response shape.
    #[error("Malformed response for '{procedure}': {source}")]
    Decode {
        procedure: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// Request parameters could not be serialized.
    #[error("Failed to encode params for '{procedure}': {source}")]
    Encode {
        procedure: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
