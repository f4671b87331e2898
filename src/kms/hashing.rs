// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Message hashing for server-side signing.
//!
//! Three distinct schemes, deliberately kept apart:
//!
//! - EIP-191 personal messages
//! - legacy typed data (V1): packed schema/value hashing over a flat field
//!   list
//! - EIP-712 typed data (V3/V4): struct hashing with domain separation
//!
//! V1 and V4 hashes of equivalent content never collide; a signature
//! produced under one scheme fails verification under the other.

use alloy::dyn_abi::TypedData;
use alloy::primitives::{eip191_hash_message, keccak256, Address, B256, U256};
use serde::{Deserialize, Serialize};

use super::KmsError;

/// EIP-191 hash of a personal message.
pub fn personal_message_hash(message: &[u8]) -> B256 {
    eip191_hash_message(message)
}

/// One field of a legacy (V1) typed-data payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TypedField {
    #[serde(rename = "type")]
    pub field_type: String,
    pub name: String,
    pub value: serde_json::Value,
}

/// Legacy typed-data hash (`eth_signTypedData` V1).
///
/// `keccak256(keccak256(packed "type name" schema) || keccak256(packed values))`.
pub fn typed_signature_hash(fields: &[TypedField]) -> Result<B256, KmsError> {
    if fields.is_empty() {
        return Err(KmsError::TypedData("empty typed data".into()));
    }

    let mut schema = Vec::new();
    let mut values = Vec::new();
    for field in fields {
        schema.extend_from_slice(field.field_type.as_bytes());
        schema.push(b' ');
        schema.extend_from_slice(field.name.as_bytes());
        encode_packed(&field.field_type, &field.value, &mut values)?;
    }

    let mut packed = Vec::with_capacity(64);
    packed.extend_from_slice(keccak256(&schema).as_slice());
    packed.extend_from_slice(keccak256(&values).as_slice());
    Ok(keccak256(&packed))
}

/// EIP-712 signing hash (`eth_signTypedData` V3/V4) of a
/// `domain`/`types`/`primaryType`/`message` payload.
pub fn eip712_hash(typed_data: serde_json::Value) -> Result<B256, KmsError> {
    let typed_data: TypedData = serde_json::from_value(typed_data)
        .map_err(|e| KmsError::TypedData(e.to_string()))?;
    typed_data
        .eip712_signing_hash()
        .map_err(|e| KmsError::TypedData(e.to_string()))
}

/// Solidity packed encoding for the V1 value list.
fn encode_packed(
    field_type: &str,
    value: &serde_json::Value,
    out: &mut Vec<u8>,
) -> Result<(), KmsError> {
    let malformed =
        || KmsError::TypedData(format!("malformed value for type '{field_type}': {value}"));

    match field_type {
        "string" => {
            let s = value.as_str().ok_or_else(malformed)?;
            out.extend_from_slice(s.as_bytes());
        }
        "bytes" => {
            let s = value.as_str().ok_or_else(malformed)?;
            let bytes = alloy::hex::decode(s).map_err(|_| malformed())?;
            out.extend_from_slice(&bytes);
        }
        "address" => {
            let s = value.as_str().ok_or_else(malformed)?;
            let address: Address = s.parse().map_err(|_| malformed())?;
            out.extend_from_slice(address.as_slice());
        }
        "bool" => {
            let b = value.as_bool().ok_or_else(malformed)?;
            out.push(b as u8);
        }
        t if t.starts_with("bytes") => {
            let n: usize = t["bytes".len()..].parse().map_err(|_| malformed())?;
            if n == 0 || n > 32 {
                return Err(malformed());
            }
            let s = value.as_str().ok_or_else(malformed)?;
            let bytes = alloy::hex::decode(s).map_err(|_| malformed())?;
            if bytes.len() != n {
                return Err(malformed());
            }
            out.extend_from_slice(&bytes);
        }
        t if t.starts_with("uint") => {
            let bits: usize = t["uint".len()..].parse().map_err(|_| malformed())?;
            if bits == 0 || bits > 256 || bits % 8 != 0 {
                return Err(malformed());
            }
            let v = parse_u256(value).ok_or_else(malformed)?;
            let be = v.to_be_bytes::<32>();
            // Value must fit in the declared width.
            if be[..32 - bits / 8].iter().any(|b| *b != 0) {
                return Err(malformed());
            }
            out.extend_from_slice(&be[32 - bits / 8..]);
        }
        t if t.starts_with("int") => {
            let bits: usize = t["int".len()..].parse().map_err(|_| malformed())?;
            if bits == 0 || bits > 256 || bits % 8 != 0 {
                return Err(malformed());
            }
            let v = value
                .as_i64()
                .map(i128::from)
                .or_else(|| value.as_str().and_then(|s| s.parse::<i128>().ok()))
                .ok_or_else(malformed)?;
            // Value must fit in the declared width.
            if bits < 128 {
                let min = -(1i128 << (bits - 1));
                let max = (1i128 << (bits - 1)) - 1;
                if v < min || v > max {
                    return Err(malformed());
                }
            }
            let fill = if v < 0 { 0xff } else { 0x00 };
            let be = v.to_be_bytes();
            let width = bits / 8;
            if width > be.len() {
                out.extend(std::iter::repeat(fill).take(width - be.len()));
                out.extend_from_slice(&be);
            } else {
                out.extend_from_slice(&be[be.len() - width..]);
            }
        }
        _ => {
            return Err(KmsError::TypedData(format!(
                "unsupported field type '{field_type}'"
            )))
        }
    }
    Ok(())
}

fn parse_u256(value: &serde_json::Value) -> Option<U256> {
    if let Some(n) = value.as_u64() {
        return Some(U256::from(n));
    }
    value.as_str().and_then(|s| {
        if let Some(hex) = s.strip_prefix("0x") {
            U256::from_str_radix(hex, 16).ok()
        } else {
            U256::from_str_radix(s, 10).ok()
        }
    })
}
