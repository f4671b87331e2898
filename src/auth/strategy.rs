// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication strategies.
//!
//! Every login path is a variant of [`AuthStrategy`]; the coordinator
//! dispatches with an exhaustive `match`, so adding a strategy without
//! handling it is a compile error.

use std::sync::Arc;

use super::oauth::OAuthWindow;
use super::passkey::PasskeyClient;
use super::siwe::SiwePayload;
use crate::models::AuthToken;

/// OAuth identity providers supported by the auth service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthProvider {
    Apple,
    Facebook,
    Google,
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
}

impl OAuthProvider {
    /// Wire identifier used by the auth service.
    pub fn as_str(&self) -> &'static str {
        match self {
            OAuthProvider::Apple => "apple",
            OAuthProvider::Facebook => "facebook",
            OAuthProvider::Google => "google",
            OAuthProvider::Discord => "discord",
            OAuthProvider::Farcaster => "farcaster",
            OAuthProvider::Telegram => "telegram",
            OAuthProvider::Github => "github",
            OAuthProvider::Twitch => "twitch",
            OAuthProvider::Steam => "steam",
            OAuthProvider::Line => "line",
            OAuthProvider::X => "x",
            OAuthProvider::Coinbase => "coinbase",
            OAuthProvider::Tiktok => "tiktok",
        }
    }
}

/// Passkey ceremony to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasskeyAction {
    /// Register a new credential, optionally naming it.
    Register { name: Option<String> },
    /// Authenticate with an existing credential.
    Login,
}

/// One authentication strategy with its inputs.
///
/// Strategies requiring a pre-authentication step (`Email`, `Phone`) expect
/// a prior [`AuthCoordinator::pre_authenticate`](super::AuthCoordinator::pre_authenticate)
/// OTP send; without it the remote service rejects the code. That check is
/// never performed locally.
pub enum AuthStrategy {
    /// Email OTP verification.
    Email { email: String, code: String },
    /// Phone OTP verification.
    Phone { phone: String, code: String },
    /// Developer-operated auth endpoint returning an opaque payload.
    AuthEndpoint { payload: String },
    /// Externally issued JWT.
    Jwt { jwt: String },
    /// WebAuthn passkey ceremony.
    Passkey {
        action: PasskeyAction,
        client: Arc<dyn PasskeyClient>,
    },
    /// OAuth popup/redirect flow; the host owns the window handle.
    OAuth {
        provider: OAuthProvider,
        window: Arc<dyn OAuthWindow>,
    },
    /// Anonymous guest session.
    Guest { session_id: String },
    /// Backend wallet secret (server-to-server).
    Backend { wallet_secret: String },
    /// Sign-In With Ethereum.
    Siwe {
        payload: SiwePayload,
        signature: String,
    },
    /// Resume from a token already held by the custody boundary.
    Iframe { token: AuthToken },
    /// Email verification driven by the custody boundary.
    IframeEmailVerification { email: String },
}

impl AuthStrategy {
    /// Stable name used for logging and error tagging.
    pub fn name(&self) -> &'static str {
        match self {
            AuthStrategy::Email { .. } => "email",
            AuthStrategy::Phone { .. } => "phone",
            AuthStrategy::AuthEndpoint { .. } => "auth_endpoint",
            AuthStrategy::Jwt { .. } => "jwt",
            AuthStrategy::Passkey { .. } => "passkey",
            AuthStrategy::OAuth { provider, .. } => provider.as_str(),
            AuthStrategy::Guest { .. } => "guest",
            AuthStrategy::Backend { .. } => "backend",
            AuthStrategy::Siwe { .. } => "wallet",
            AuthStrategy::Iframe { .. } => "iframe",
            AuthStrategy::IframeEmailVerification { .. } => "iframe_email_verification",
        }
    }
}

/// Target of an OTP pre-authentication send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmailOrPhone {
    Email(String),
    Phone(String),
}
