// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! OAuth window seam.
//!
//! The host application owns the popup/redirect window; the coordinator only
//! waits on it. There is no unified cancellation token — closing the window
//! is detected through the handle itself and surfaces as a stage-tagged
//! error.

use async_trait::async_trait;

/// Payload handed back by the provider redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthRedirectResult {
    /// Opaque auth-result payload the auth service exchanges for a token.
    pub auth_result: String,
}

/// Why an OAuth window produced no result.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum OAuthWindowError {
    /// The user closed the window before the provider redirected.
    #[error("OAuth window was closed before completing login")]
    Closed,

    /// The provider reported a failure.
    #[error("OAuth provider error: {0}")]
    Provider(String),
}

/// Handle to a host-owned OAuth window.
#[async_trait]
pub trait OAuthWindow: Send + Sync {
    /// Suspend until the provider redirects back or the window closes.
    async fn wait_for_redirect(&self) -> Result<OAuthRedirectResult, OAuthWindowError>;

    /// Close the window if it is still open. Idempotent.
    fn close(&self);
}
