// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Installed-wallet discovery.
//!
//! Discovery is an injected service rather than a process-wide cache, so
//! callers (and tests) control when the installed set is probed and when it
//! is invalidated.

use async_trait::async_trait;
use tokio::sync::RwLock;

/// An injected wallet detected in the host environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledWallet {
    /// Stable wallet identifier (e.g. `io.metamask`).
    pub id: String,
    /// Human-readable name.
    pub name: String,
}

/// Probes the host environment for installed wallets.
#[async_trait]
pub trait WalletProbe: Send + Sync {
    async fn probe(&self) -> Vec<InstalledWallet>;
}

/// Caching discovery service over a [`WalletProbe`].
pub struct WalletDiscovery<P> {
    probe: P,
    cache: RwLock<Option<Vec<InstalledWallet>>>,
}

impl<P: WalletProbe> WalletDiscovery<P> {
    pub fn new(probe: P) -> Self {
        Self {
            probe,
            cache: RwLock::new(None),
        }
    }

    /// Installed wallets, probing at most once until invalidated.
    pub async fn installed_wallets(&self) -> Vec<InstalledWallet> {
        {
            let cache = self.cache.read().await;
            if let Some(wallets) = &*cache {
                return wallets.clone();
            }
        }
        self.refresh().await
    }

    /// Re-probe and replace the cached set.
    pub async fn refresh(&self) -> Vec<InstalledWallet> {
        let wallets = self.probe.probe().await;
        let mut cache = self.cache.write().await;
        *cache = Some(wallets.clone());
        wallets
    }

    /// Drop the cached set; the next lookup probes again.
    pub async fn invalidate(&self) {
        let mut cache = self.cache.write().await;
        *cache = None;
    }
}
