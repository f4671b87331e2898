// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Embedded Wallet Core - Authentication & Remote-Signing Coordinator
//!
//! This crate provides the headless core of an in-app embedded wallet:
//! multi-strategy authentication, custody resolution (sharded device-share
//! vs. enclave), a typed remote-signing channel, and a GCP KMS backed
//! server-side signer.
//!
//! ## Modules
//!
//! - `account` - Capability-typed accounts over a signing backend
//! - `auth` - Authentication coordination (OTP, OAuth, passkeys, SIWE, ...)
//! - `chain` - Chain RPC registry for raw-transaction broadcast
//! - `channel` - Typed RPC channel to the custody boundary
//! - `config` - Client id / ecosystem configuration
//! - `kms` - GCP KMS backed Ethereum signer
//! - `session` - Wallet session management and discovery
//! - `storage` - Client-scoped local persistence

pub mod account;
pub mod auth;
pub mod chain;
pub mod channel;
pub mod config;
pub mod error;
pub mod kms;
pub mod models;
pub mod session;
pub mod storage;
