// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Transports for procedure envelopes.
//!
//! A transport only moves envelopes and outcomes; typed decoding happens in
//! the channel client. The production transport posts to the enclave signing
//! endpoint over HTTPS. Tests inject in-memory implementations.

use std::time::Duration;

use async_trait::async_trait;
use url::Url;

use super::procedure::{ProcedureEnvelope, ProcedureOutcome};
use super::ChannelError;

/// Request timeout for enclave calls.
const ENCLAVE_TIMEOUT: Duration = Duration::from_secs(30);

/// One-round-trip delivery of a procedure envelope.
#[async_trait]
pub trait SigningTransport: Send + Sync {
    async fn call(&self, envelope: ProcedureEnvelope) -> Result<ProcedureOutcome, ChannelError>;
}

/// HTTPS transport to the enclave signing service.
#[derive(Debug, Clone)]
pub struct EnclaveHttpTransport {
    endpoint: Url,
    client: reqwest::Client,
    /// Session cookie forwarded with every call; the enclave resolves the
    /// wallet user from it.
    auth_cookie: String,
}

impl EnclaveHttpTransport {
    pub fn new(endpoint: Url, auth_cookie: impl Into<String>) -> Result<Self, ChannelError> {
        let client = reqwest::Client::builder()
            .timeout(ENCLAVE_TIMEOUT)
            .build()
            .map_err(|e| ChannelError::Transport(e.to_string()))?;
        Ok(Self {
            endpoint,
            client,
            auth_cookie: auth_cookie.into(),
        })
    }

    /// Endpoint this transport posts to.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl SigningTransport for EnclaveHttpTransport {
    async fn call(&self, envelope: ProcedureEnvelope) -> Result<ProcedureOutcome, ChannelError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .header("x-session-cookie", &self.auth_cookie)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChannelError::Transport(format!(
                "HTTP {} from signing endpoint",
                response.status()
            )));
        }

        response
            .json::<ProcedureOutcome>()
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }
}
