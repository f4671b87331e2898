// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Client Configuration
//!
//! Every coordinator instance is scoped to a publishable client id issued by
//! the platform, optionally inside an ecosystem. Storage namespacing, the
//! auth-service session, and the signing channel all key off this pair.
//!
//! ## Legacy Client IDs
//!
//! Early releases issued 36-character hyphenated (UUID-shaped) client ids.
//! Those are rejected unconditionally at construction time; they are never
//! downgraded to a working configuration.

use url::Url;

use crate::error::ConfigError;

/// Chain id tagged onto `signMessage`/`signTypedData` procedure calls.
///
/// The signing procedures have always sent chain id 1 regardless of the
/// active chain. Kept as a named constant so the behavior is trivially
/// correctable if replay-protected message variants ever need the real
/// chain id.
pub const MESSAGE_SIGNING_CHAIN_ID: u64 = 1;

/// Ecosystem scoping for a client id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ecosystem {
    /// Ecosystem identifier (e.g. `ecosystem.acme`).
    pub id: String,
    /// Partner id within the ecosystem, if issued one.
    pub partner_id: Option<String>,
}

/// Configuration for one coordinator instance.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    client_id: String,
    ecosystem: Option<Ecosystem>,
    service_origin: Url,
}

impl ClientConfig {
    /// Create a validated client configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::LegacyClientId`] for 36-character hyphenated
    /// ids and [`ConfigError::EmptyClientId`] for blank ids.
    pub fn new(
        client_id: impl Into<String>,
        ecosystem: Option<Ecosystem>,
        service_origin: Url,
    ) -> Result<Self, ConfigError> {
        let client_id = client_id.into();
        if client_id.trim().is_empty() {
            return Err(ConfigError::EmptyClientId);
        }
        if is_legacy_client_id(&client_id) {
            return Err(ConfigError::LegacyClientId(client_id));
        }
        Ok(Self {
            client_id,
            ecosystem,
            service_origin,
        })
    }

    /// The publishable client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Ecosystem scoping, if any.
    pub fn ecosystem(&self) -> Option<&Ecosystem> {
        self.ecosystem.as_ref()
    }

    /// Origin of the wallet auth service.
    pub fn service_origin(&self) -> &Url {
        &self.service_origin
    }

    /// Storage namespace for this client (`{client_id}` or
    /// `{ecosystem_id}-{client_id}`).
    pub fn storage_namespace(&self) -> String {
        match &self.ecosystem {
            Some(eco) => format!("{}-{}", eco.id, self.client_id),
            None => self.client_id.clone(),
        }
    }
}

/// Detect a legacy (UUID-shaped) client id: 36 characters with hyphens at
/// the UUID group positions.
pub fn is_legacy_client_id(client_id: &str) -> bool {
    client_id.len() == 36
        && client_id.char_indices().all(|(i, c)| match i {
            8 | 13 | 18 | 23 => c == '-',
            _ => c.is_ascii_alphanumeric(),
        })
}
