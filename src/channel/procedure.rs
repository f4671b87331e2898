// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Typed procedure declarations for the signing channel.
//!
//! Each procedure is a zero-sized marker implementing [`Procedure`], pairing
//! a wire name with its params and response types. The channel client is
//! generic over these markers, so a call site can only ever decode the
//! response shape its procedure declares.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{AuthResult, UserStatus, WalletDetails};

/// A request/response pair understood by the custody boundary.
pub trait Procedure {
    /// Wire name of the procedure.
    const NAME: &'static str;
    type Params: Serialize + Send + Sync;
    type Response: DeserializeOwned + Send;
}

/// Envelope carried by every procedure call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcedureEnvelope {
    pub procedure_name: String,
    /// Correlates responses on transports that multiplex calls.
    pub request_id: Uuid,
    pub params: serde_json::Value,
}

/// Wire outcome of a procedure call: exactly one of `result`/`error` is set.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcedureOutcome {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<String>,
}

// =============================================================================
// Signing procedures
// =============================================================================

pub struct GetAddress;

#[derive(Debug, Clone, Serialize)]
pub struct GetAddressParams {}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetAddressResponse {
    pub address: String,
}

impl Procedure for GetAddress {
    const NAME: &'static str = "getAddress";
    type Params = GetAddressParams;
    type Response = GetAddressResponse;
}

pub struct SignMessage;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignMessageParams {
    /// Raw string, or 0x-hex when `is_raw` is set.
    pub message: String,
    pub is_raw: bool,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureResponse {
    /// 65-byte signature, 0x-hex.
    pub signature: String,
}

impl Procedure for SignMessage {
    const NAME: &'static str = "signMessage";
    type Params = SignMessageParams;
    type Response = SignatureResponse;
}

pub struct SignTransaction;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignTransactionParams {
    /// Unsigned transaction, JSON-encoded in RPC shape.
    pub transaction: serde_json::Value,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignTransactionResponse {
    /// Signed raw transaction bytes, 0x-hex, ready for broadcast.
    pub signed_transaction: String,
}

impl Procedure for SignTransaction {
    const NAME: &'static str = "signTransaction";
    type Params = SignTransactionParams;
    type Response = SignTransactionResponse;
}

pub struct SignTypedDataV4;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignTypedDataV4Params {
    /// `domain`/`types`/`message` forwarded verbatim; well-formedness is the
    /// remote side's problem.
    pub typed_data: serde_json::Value,
    pub chain_id: u64,
}

impl Procedure for SignTypedDataV4 {
    const NAME: &'static str = "signTypedDataV4";
    type Params = SignTypedDataV4Params;
    type Response = SignatureResponse;
}

// =============================================================================
// Session procedures
// =============================================================================

pub struct InitIframe;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitIframeParams {
    pub client_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ecosystem_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AckResponse {
    pub success: bool,
}

impl Procedure for InitIframe {
    const NAME: &'static str = "initIframe";
    type Params = InitIframeParams;
    type Response = AckResponse;
}

pub struct CreateWallet;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CookieParams {
    pub cookie_string: String,
}

impl Procedure for CreateWallet {
    const NAME: &'static str = "createWallet";
    type Params = CookieParams;
    type Response = WalletDetails;
}

pub struct GetUserStatus;

impl Procedure for GetUserStatus {
    const NAME: &'static str = "getUserStatus";
    type Params = CookieParams;
    type Response = UserStatus;
}

pub struct LoginWithStoredTokenDetails;

impl Procedure for LoginWithStoredTokenDetails {
    const NAME: &'static str = "loginWithStoredTokenDetails";
    type Params = CookieParams;
    type Response = AuthResult;
}

pub struct MigrateFromShardToEnclave;

impl Procedure for MigrateFromShardToEnclave {
    const NAME: &'static str = "migrateFromShardToEnclave";
    type Params = CookieParams;
    type Response = AckResponse;
}
