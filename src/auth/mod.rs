// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication Coordination
//!
//! [`AuthCoordinator`] drives every login strategy through one pipeline:
//! optional pre-authentication (OTP send), strategy dispatch against the
//! auth service, cookie persistence, and wallet initialization. Strategy
//! dispatch is an exhaustive `match` over [`AuthStrategy`], so an unhandled
//! strategy is a compile error, not a runtime fallthrough.
//!
//! ## Session lifecycle
//!
//! ```text
//! LoggedOut -> Authenticating -> WalletUninitialized -> WalletInitialized
//!      ^                                                       |
//!      +----------------------- logout -----------------------+
//! ```
//!
//! Sharded-to-enclave migration runs opportunistically during `connect` and
//! is never fatal: a migration failure is logged and the session continues
//! under sharded custody.

mod oauth;
mod passkey;
mod service;
mod siwe;
mod strategy;

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::account::Account;
use crate::chain::ChainRpc;
use crate::error::{WalletError, WalletStateError};
use crate::models::{AuthToken, CustodyType, Profile, UserStatus};
use crate::session::{EmbeddedWallet, WalletSessionManager};

pub use oauth::{OAuthRedirectResult, OAuthWindow, OAuthWindowError};
pub use passkey::{PasskeyAssertion, PasskeyAttestation, PasskeyCeremonyError, PasskeyClient};
pub use service::{AuthApi, AuthApiError, HttpAuthApi, PasskeyChallengeKind};
pub use siwe::SiwePayload;
pub use strategy::{AuthStrategy, EmailOrPhone, OAuthProvider, PasskeyAction};

/// Where the session currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No token held; nothing persisted or the stored cookie was cleared.
    LoggedOut,
    /// A strategy is being exchanged for a token.
    Authenticating,
    /// Token held and persisted; wallet not yet resolved.
    WalletUninitialized,
    /// Token held and a wallet instance is live.
    WalletInitialized,
}

/// Coordinates authentication, token persistence, and wallet setup.
pub struct AuthCoordinator {
    api: Arc<dyn AuthApi>,
    session: Arc<WalletSessionManager>,
    state: RwLock<SessionState>,
}

impl AuthCoordinator {
    pub fn new(api: Arc<dyn AuthApi>, session: Arc<WalletSessionManager>) -> Self {
        Self {
            api,
            session,
            state: RwLock::new(SessionState::LoggedOut),
        }
    }

    /// Session manager this coordinator drives.
    pub fn session(&self) -> &Arc<WalletSessionManager> {
        &self.session
    }

    /// Current lifecycle state.
    pub async fn status(&self) -> SessionState {
        *self.state.read().await
    }

    /// Send the OTP for a code-based strategy.
    ///
    /// Required before [`AuthStrategy::Email`]/[`AuthStrategy::Phone`]
    /// verification; the remote service rejects codes that were never sent.
    pub async fn pre_authenticate(&self, target: &EmailOrPhone) -> Result<(), WalletError> {
        match target {
            EmailOrPhone::Email(email) => self.api.send_email_otp(email).await?,
            EmailOrPhone::Phone(phone) => self.api.send_phone_otp(phone).await?,
        }
        Ok(())
    }

    /// Exchange a strategy for an auth token without touching the wallet.
    ///
    /// The token is not persisted; use [`connect`](Self::connect) for the
    /// full login-to-wallet pipeline.
    pub async fn authenticate(&self, strategy: AuthStrategy) -> Result<AuthToken, WalletError> {
        let name = strategy.name();
        tracing::debug!(strategy = name, "authenticating");

        let token = match strategy {
            AuthStrategy::Email { email, code } => {
                self.api.verify_email_otp(&email, &code).await?
            }
            AuthStrategy::Phone { phone, code } => {
                self.api.verify_phone_otp(&phone, &code).await?
            }
            AuthStrategy::AuthEndpoint { payload } => {
                self.api.login_with_auth_endpoint(&payload).await?
            }
            AuthStrategy::Jwt { jwt } => self.api.login_with_jwt(&jwt).await?,
            AuthStrategy::Passkey { action, client } => {
                self.run_passkey_ceremony(action, client.as_ref()).await?
            }
            AuthStrategy::OAuth { provider, window } => {
                self.run_oauth_flow(provider, window.as_ref()).await?
            }
            AuthStrategy::Guest { session_id } => self.api.login_as_guest(&session_id).await?,
            AuthStrategy::Backend { wallet_secret } => {
                self.api.login_with_backend_secret(&wallet_secret).await?
            }
            AuthStrategy::Siwe { payload, signature } => {
                self.api.login_with_siwe(&payload, &signature).await?
            }
            AuthStrategy::Iframe { token } => {
                // The custody boundary already holds the session; confirm it
                // and adopt whatever token it hands back.
                self.session
                    .channel()
                    .login_with_stored_token(&token.cookie_string)
                    .await?
                    .stored_token
            }
            AuthStrategy::IframeEmailVerification { email } => {
                self.api.login_with_iframe_email_verification(&email).await?
            }
        };

        tracing::info!(
            strategy = name,
            user = %token.auth_details.user_wallet_id,
            new_user = token.auth_details.is_new_user,
            "authenticated"
        );
        Ok(token)
    }

    /// Full login pipeline: authenticate, persist the cookie, attempt custody
    /// migration, and initialize the wallet.
    pub async fn connect(&self, strategy: AuthStrategy) -> Result<EmbeddedWallet, WalletError> {
        self.set_state(SessionState::Authenticating).await;

        let token = match self.authenticate(strategy).await {
            Ok(token) => token,
            Err(e) => {
                self.set_state(SessionState::LoggedOut).await;
                return Err(e);
            }
        };

        self.session
            .storage()
            .save_auth_cookie(&token.cookie_string)?;
        self.set_state(SessionState::WalletUninitialized).await;

        if token.auth_details.wallet_type == CustodyType::Sharded {
            // Best effort. A failed migration leaves the wallet sharded and
            // fully functional.
            if let Err(e) = self
                .session
                .channel()
                .migrate_from_shard_to_enclave(&token.cookie_string)
                .await
            {
                tracing::warn!(error = %e, "shard-to-enclave migration failed, continuing");
            }
        }

        let wallet = self.session.initialize_wallet(Some(&token)).await?;
        self.set_state(SessionState::WalletInitialized).await;
        Ok(wallet)
    }

    /// Remote account status for the active session.
    pub async fn get_user(&self) -> Result<UserStatus, WalletError> {
        let cookie = self.session.resolve_cookie(None)?;
        Ok(self.session.channel().get_user_status(&cookie).await?)
    }

    /// The wallet for the active session, initializing lazily from the
    /// stored cookie when needed.
    pub async fn get_wallet(&self) -> Result<EmbeddedWallet, WalletError> {
        let wallet = self.session.ensure_initialized().await?;
        self.set_state(SessionState::WalletInitialized).await;
        Ok(wallet)
    }

    /// A live [`Account`] over the active wallet's signing channel.
    pub async fn get_account(&self, rpc: Arc<dyn ChainRpc>) -> Result<Account, WalletError> {
        let wallet = self.get_wallet().await?;
        Ok(wallet.account(rpc))
    }

    /// Drop the session: stored cookie, in-memory wallet, lifecycle state.
    ///
    /// Device shares stay on disk so a re-login to the same wallet keeps
    /// local signing capability.
    pub async fn logout(&self) -> Result<(), WalletError> {
        self.session.storage().clear_auth_cookie()?;
        self.session.clear().await;
        self.set_state(SessionState::LoggedOut).await;
        tracing::info!("logged out");
        Ok(())
    }

    /// Profiles able to authenticate into the active wallet.
    pub async fn linked_profiles(&self) -> Result<Vec<Profile>, WalletError> {
        let cookie = self.session.resolve_cookie(None)?;
        Ok(self.api.linked_profiles(&cookie).await?)
    }

    /// Authenticate a new identity and link it to the active wallet.
    ///
    /// The new strategy's login runs in full; its resulting token identifies
    /// the identity being absorbed. The wallet address never rotates.
    pub async fn link_profile(
        &self,
        strategy: AuthStrategy,
    ) -> Result<Vec<Profile>, WalletError> {
        let cookie = self.session.resolve_cookie(None)?;
        let new_token = self.authenticate(strategy).await?;
        Ok(self
            .api
            .link_account(&cookie, &new_token.cookie_string)
            .await?)
    }

    /// Unlink a profile from the active wallet.
    ///
    /// Refuses locally when it would leave zero profiles; the service
    /// enforces the same rule authoritatively.
    pub async fn unlink_profile(&self, profile: &Profile) -> Result<Vec<Profile>, WalletError> {
        let cookie = self.session.resolve_cookie(None)?;

        let current = self.api.linked_profiles(&cookie).await?;
        if current.len() <= 1 {
            return Err(WalletStateError::LastProfile.into());
        }

        Ok(self.api.unlink_account(&cookie, profile).await?)
    }

    async fn run_passkey_ceremony(
        &self,
        action: PasskeyAction,
        client: &dyn PasskeyClient,
    ) -> Result<AuthToken, WalletError> {
        match action {
            PasskeyAction::Register { name } => {
                let challenge = self
                    .api
                    .passkey_challenge(PasskeyChallengeKind::Register)
                    .await?;
                let attestation = client
                    .register(&challenge, name.as_deref())
                    .await
                    .map_err(|e| AuthApiError::PasskeyCeremony(e.0))?;
                Ok(self.api.login_with_passkey_attestation(&attestation).await?)
            }
            PasskeyAction::Login => {
                let challenge = self
                    .api
                    .passkey_challenge(PasskeyChallengeKind::Login)
                    .await?;
                let assertion = client
                    .authenticate(&challenge)
                    .await
                    .map_err(|e| AuthApiError::PasskeyCeremony(e.0))?;
                Ok(self.api.login_with_passkey_assertion(&assertion).await?)
            }
        }
    }

    async fn run_oauth_flow(
        &self,
        provider: OAuthProvider,
        window: &dyn OAuthWindow,
    ) -> Result<AuthToken, WalletError> {
        let redirect = window.wait_for_redirect().await;
        window.close();

        let redirect = redirect.map_err(|e| match e {
            OAuthWindowError::Closed => AuthApiError::OAuthWindowClosed,
            OAuthWindowError::Provider(message) => AuthApiError::OAuthLogin(message),
        })?;

        Ok(self
            .api
            .login_with_oauth(provider, &redirect.auth_result)
            .await?)
    }

    async fn set_state(&self, next: SessionState) {
        let mut state = self.state.write().await;
        *state = next;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use url::Url;

    use super::oauth::test_support::ScriptedWindow;
    use super::passkey::test_support::ScriptedPasskeyClient;
    use super::*;
    use crate::channel::test_support::ScriptedTransport;
    use crate::channel::RemoteSigningChannel;
    use crate::config::ClientConfig;
    use crate::models::AuthDetails;
    use crate::storage::ClientScopedStorage;

    const ADDRESS: &str = "0x742d35Cc6634C0532925a3b844Bc9e7595f4aB12";

    fn token_for(custody: CustodyType) -> AuthToken {
        AuthToken {
            cookie_string: "cookie-1".into(),
            auth_details: AuthDetails {
                user_wallet_id: "user-1".into(),
                wallet_type: custody,
                email: None,
                phone_number: None,
                is_new_user: false,
            },
        }
    }

    /// Auth service double: every token-issuing path returns the configured
    /// token; calls are recorded by stage name.
    struct ScriptedAuthApi {
        token: AuthToken,
        profiles: Mutex<Vec<Profile>>,
        calls: Mutex<Vec<&'static str>>,
        reject_codes: bool,
    }

    impl ScriptedAuthApi {
        fn new(token: AuthToken) -> Self {
            Self {
                token,
                profiles: Mutex::new(Vec::new()),
                calls: Mutex::new(Vec::new()),
                reject_codes: false,
            }
        }

        fn with_profiles(self, profiles: Vec<Profile>) -> Self {
            *self.profiles.lock().unwrap() = profiles;
            self
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().unwrap().push(call);
        }

        fn saw(&self, call: &str) -> bool {
            self.calls.lock().unwrap().iter().any(|c| *c == call)
        }
    }

    #[async_trait]
    impl AuthApi for ScriptedAuthApi {
        async fn send_email_otp(&self, _email: &str) -> Result<(), AuthApiError> {
            self.record("send_email_otp");
            Ok(())
        }

        async fn send_phone_otp(&self, _phone: &str) -> Result<(), AuthApiError> {
            self.record("send_phone_otp");
            Ok(())
        }

        async fn verify_email_otp(
            &self,
            _email: &str,
            _code: &str,
        ) -> Result<AuthToken, AuthApiError> {
            self.record("verify_email_otp");
            if self.reject_codes {
                return Err(AuthApiError::VerifyCode("invalid or expired code".into()));
            }
            Ok(self.token.clone())
        }

        async fn verify_phone_otp(
            &self,
            _phone: &str,
            _code: &str,
        ) -> Result<AuthToken, AuthApiError> {
            self.record("verify_phone_otp");
            Ok(self.token.clone())
        }

        async fn login_with_jwt(&self, _jwt: &str) -> Result<AuthToken, AuthApiError> {
            self.record("login_with_jwt");
            Ok(self.token.clone())
        }

        async fn login_with_auth_endpoint(
            &self,
            _payload: &str,
        ) -> Result<AuthToken, AuthApiError> {
            self.record("login_with_auth_endpoint");
            Ok(self.token.clone())
        }

        async fn login_as_guest(&self, _session_id: &str) -> Result<AuthToken, AuthApiError> {
            self.record("login_as_guest");
            Ok(self.token.clone())
        }

        async fn login_with_backend_secret(
            &self,
            _wallet_secret: &str,
        ) -> Result<AuthToken, AuthApiError> {
            self.record("login_with_backend_secret");
            Ok(self.token.clone())
        }

        async fn login_with_oauth(
            &self,
            _provider: OAuthProvider,
            _auth_result: &str,
        ) -> Result<AuthToken, AuthApiError> {
            self.record("login_with_oauth");
            Ok(self.token.clone())
        }

        async fn login_with_siwe(
            &self,
            _payload: &SiwePayload,
            _signature: &str,
        ) -> Result<AuthToken, AuthApiError> {
            self.record("login_with_siwe");
            Ok(self.token.clone())
        }

        async fn login_with_iframe_email_verification(
            &self,
            _email: &str,
        ) -> Result<AuthToken, AuthApiError> {
            self.record("login_with_iframe_email_verification");
            Ok(self.token.clone())
        }

        async fn passkey_challenge(
            &self,
            _kind: PasskeyChallengeKind,
        ) -> Result<String, AuthApiError> {
            self.record("passkey_challenge");
            Ok("challenge-1".into())
        }

        async fn login_with_passkey_attestation(
            &self,
            _attestation: &PasskeyAttestation,
        ) -> Result<AuthToken, AuthApiError> {
            self.record("login_with_passkey_attestation");
            Ok(self.token.clone())
        }

        async fn login_with_passkey_assertion(
            &self,
            _assertion: &PasskeyAssertion,
        ) -> Result<AuthToken, AuthApiError> {
            self.record("login_with_passkey_assertion");
            Ok(self.token.clone())
        }

        async fn linked_profiles(
            &self,
            _cookie_string: &str,
        ) -> Result<Vec<Profile>, AuthApiError> {
            Ok(self.profiles.lock().unwrap().clone())
        }

        async fn link_account(
            &self,
            _cookie_string: &str,
            _new_account_cookie: &str,
        ) -> Result<Vec<Profile>, AuthApiError> {
            self.record("link_account");
            Ok(self.profiles.lock().unwrap().clone())
        }

        async fn unlink_account(
            &self,
            _cookie_string: &str,
            profile: &Profile,
        ) -> Result<Vec<Profile>, AuthApiError> {
            self.record("unlink_account");
            let mut profiles = self.profiles.lock().unwrap();
            profiles.retain(|p| p != profile);
            Ok(profiles.clone())
        }
    }

    fn transport_with_wallet(custody: &str) -> Arc<ScriptedTransport> {
        let transport = Arc::new(ScriptedTransport::new());
        let mut record = serde_json::json!({ "type": custody, "address": ADDRESS });
        if custody == "sharded" {
            // The remote store holds the share; this device needs nothing.
            record["deviceShareStored"] = serde_json::json!(true);
        }
        transport.respond(
            "getUserStatus",
            serde_json::json!({
                "userWalletId": "user-1",
                "wallets": [record]
            }),
        );
        transport
    }

    fn coordinator_with(
        api: ScriptedAuthApi,
        transport: Arc<ScriptedTransport>,
    ) -> (tempfile::TempDir, Arc<ScriptedAuthApi>, AuthCoordinator) {
        let dir = tempfile::tempdir().unwrap();
        let config = ClientConfig::new(
            "abc123",
            None,
            Url::parse("https://embedded-wallet.example.com").unwrap(),
        )
        .unwrap();
        let storage = ClientScopedStorage::new(dir.path(), "abc123");
        let channel = Arc::new(RemoteSigningChannel::new(transport));
        let session = Arc::new(WalletSessionManager::new(config, channel, storage));
        let api = Arc::new(api);
        let coordinator = AuthCoordinator::new(api.clone(), session);
        (dir, api, coordinator)
    }

    #[tokio::test]
    async fn connect_with_email_persists_cookie_and_initializes() {
        let api = ScriptedAuthApi::new(token_for(CustodyType::Enclave));
        let (_dir, api, coordinator) = coordinator_with(api, transport_with_wallet("enclave"));

        coordinator
            .pre_authenticate(&EmailOrPhone::Email("a@b.co".into()))
            .await
            .unwrap();
        assert!(api.saw("send_email_otp"));

        let wallet = coordinator
            .connect(AuthStrategy::Email {
                email: "a@b.co".into(),
                code: "123456".into(),
            })
            .await
            .unwrap();

        assert_eq!(wallet.address(), ADDRESS);
        assert_eq!(coordinator.status().await, SessionState::WalletInitialized);
        assert_eq!(
            coordinator
                .session()
                .storage()
                .load_auth_cookie()
                .unwrap()
                .as_deref(),
            Some("cookie-1")
        );
    }

    #[tokio::test]
    async fn invalid_code_leaves_session_logged_out() {
        let mut api = ScriptedAuthApi::new(token_for(CustodyType::Enclave));
        api.reject_codes = true;
        let (_dir, _api, coordinator) = coordinator_with(api, transport_with_wallet("enclave"));

        let err = coordinator
            .connect(AuthStrategy::Email {
                email: "a@b.co".into(),
                code: "000000".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WalletError::AuthApi(AuthApiError::VerifyCode(_))
        ));
        assert_eq!(coordinator.status().await, SessionState::LoggedOut);
        assert!(coordinator
            .session()
            .storage()
            .load_auth_cookie()
            .unwrap()
            .is_none());
    }

    fn init_test_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    #[tokio::test]
    async fn sharded_connect_attempts_migration_and_survives_failure() {
        init_test_tracing();
        let api = ScriptedAuthApi::new(token_for(CustodyType::Sharded));
        let transport = transport_with_wallet("sharded");
        transport.fail("migrateFromShardToEnclave", "enclave unavailable");
        let (_dir, _api, coordinator) = coordinator_with(api, transport);

        let wallet = coordinator
            .connect(AuthStrategy::Guest {
                session_id: "s-1".into(),
            })
            .await
            .unwrap();

        // Migration failed, but the sharded wallet is live.
        assert_eq!(wallet.custody(), CustodyType::Sharded);
        assert_eq!(coordinator.status().await, SessionState::WalletInitialized);
    }

    #[tokio::test]
    async fn sharded_connect_without_a_share_stops_before_initialization() {
        let api = ScriptedAuthApi::new(token_for(CustodyType::Sharded));
        let transport = Arc::new(ScriptedTransport::new());
        transport.respond(
            "migrateFromShardToEnclave",
            serde_json::json!({ "success": true }),
        );
        transport.respond(
            "getUserStatus",
            serde_json::json!({
                "userWalletId": "user-1",
                "wallets": [{ "type": "sharded", "address": ADDRESS }]
            }),
        );
        let (_dir, _api, coordinator) = coordinator_with(api, transport);

        let err = coordinator
            .connect(AuthStrategy::Guest {
                session_id: "s-1".into(),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WalletError::State(WalletStateError::DeviceShareMissing)
        ));
        // Authentication succeeded, so the session keeps the token and can
        // retry initialization after share recovery.
        assert_eq!(
            coordinator.status().await,
            SessionState::WalletUninitialized
        );
        assert!(coordinator.session().current_wallet().await.is_none());
    }

    #[tokio::test]
    async fn enclave_connect_never_calls_migration() {
        let api = ScriptedAuthApi::new(token_for(CustodyType::Enclave));
        let transport = transport_with_wallet("enclave");
        let (_dir, _api, coordinator) = coordinator_with(api, transport.clone());

        coordinator
            .connect(AuthStrategy::Jwt { jwt: "ey...".into() })
            .await
            .unwrap();

        // getUserStatus only; a migration attempt would have errored the
        // scripted transport.
        assert_eq!(transport.call_count(), 1);
    }

    #[tokio::test]
    async fn oauth_window_closed_maps_to_stage_error() {
        let api = ScriptedAuthApi::new(token_for(CustodyType::Enclave));
        let (_dir, _api, coordinator) = coordinator_with(api, transport_with_wallet("enclave"));

        let err = coordinator
            .authenticate(AuthStrategy::OAuth {
                provider: OAuthProvider::Google,
                window: Arc::new(ScriptedWindow::closed()),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WalletError::AuthApi(AuthApiError::OAuthWindowClosed)
        ));
    }

    #[tokio::test]
    async fn oauth_redirect_exchanges_payload_for_token() {
        let api = ScriptedAuthApi::new(token_for(CustodyType::Enclave));
        let (_dir, api, coordinator) = coordinator_with(api, transport_with_wallet("enclave"));

        let token = coordinator
            .authenticate(AuthStrategy::OAuth {
                provider: OAuthProvider::Google,
                window: Arc::new(ScriptedWindow::succeeding("payload-1")),
            })
            .await
            .unwrap();

        assert_eq!(token.cookie_string, "cookie-1");
        assert!(api.saw("login_with_oauth"));
    }

    #[tokio::test]
    async fn passkey_register_runs_challenge_then_attestation() {
        let api = ScriptedAuthApi::new(token_for(CustodyType::Enclave));
        let (_dir, api, coordinator) = coordinator_with(api, transport_with_wallet("enclave"));

        coordinator
            .authenticate(AuthStrategy::Passkey {
                action: PasskeyAction::Register {
                    name: Some("laptop".into()),
                },
                client: Arc::new(ScriptedPasskeyClient { fail_with: None }),
            })
            .await
            .unwrap();

        assert!(api.saw("passkey_challenge"));
        assert!(api.saw("login_with_passkey_attestation"));
    }

    #[tokio::test]
    async fn passkey_ceremony_failure_is_stage_tagged() {
        let api = ScriptedAuthApi::new(token_for(CustodyType::Enclave));
        let (_dir, _api, coordinator) = coordinator_with(api, transport_with_wallet("enclave"));

        let err = coordinator
            .authenticate(AuthStrategy::Passkey {
                action: PasskeyAction::Login,
                client: Arc::new(ScriptedPasskeyClient {
                    fail_with: Some("user cancelled".into()),
                }),
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            WalletError::AuthApi(AuthApiError::PasskeyCeremony(_))
        ));
    }

    #[tokio::test]
    async fn iframe_strategy_resumes_through_the_channel() {
        let api = ScriptedAuthApi::new(token_for(CustodyType::Enclave));
        let transport = transport_with_wallet("enclave");
        transport.respond(
            "loginWithStoredTokenDetails",
            serde_json::json!({
                "storedToken": {
                    "cookieString": "resumed-cookie",
                    "authDetails": {
                        "userWalletId": "user-1",
                        "walletType": "enclave"
                    }
                }
            }),
        );
        let (_dir, _api, coordinator) = coordinator_with(api, transport);

        let token = coordinator
            .authenticate(AuthStrategy::Iframe {
                token: token_for(CustodyType::Enclave),
            })
            .await
            .unwrap();

        assert_eq!(token.cookie_string, "resumed-cookie");
    }

    #[tokio::test]
    async fn every_service_strategy_dispatches() {
        let strategies: Vec<(AuthStrategy, &str)> = vec![
            (
                AuthStrategy::Phone {
                    phone: "+15550100".into(),
                    code: "123456".into(),
                },
                "verify_phone_otp",
            ),
            (
                AuthStrategy::AuthEndpoint {
                    payload: "opaque".into(),
                },
                "login_with_auth_endpoint",
            ),
            (AuthStrategy::Jwt { jwt: "ey".into() }, "login_with_jwt"),
            (
                AuthStrategy::Backend {
                    wallet_secret: "secret".into(),
                },
                "login_with_backend_secret",
            ),
            (
                AuthStrategy::Siwe {
                    payload: SiwePayload::generate("app.example.com", ADDRESS, 1),
                    signature: "0xsig".into(),
                },
                "login_with_siwe",
            ),
            (
                AuthStrategy::IframeEmailVerification {
                    email: "a@b.co".into(),
                },
                "login_with_iframe_email_verification",
            ),
        ];

        for (strategy, expected_call) in strategies {
            let api = ScriptedAuthApi::new(token_for(CustodyType::Enclave));
            let (_dir, api, coordinator) =
                coordinator_with(api, transport_with_wallet("enclave"));
            coordinator.authenticate(strategy).await.unwrap();
            assert!(api.saw(expected_call), "missing call: {expected_call}");
        }
    }

    #[tokio::test]
    async fn logout_clears_cookie_wallet_and_state() {
        let api = ScriptedAuthApi::new(token_for(CustodyType::Enclave));
        let (_dir, _api, coordinator) = coordinator_with(api, transport_with_wallet("enclave"));

        coordinator
            .connect(AuthStrategy::Guest {
                session_id: "s-1".into(),
            })
            .await
            .unwrap();

        coordinator.logout().await.unwrap();
        assert_eq!(coordinator.status().await, SessionState::LoggedOut);
        assert!(coordinator.session().current_wallet().await.is_none());
        assert!(coordinator
            .session()
            .storage()
            .load_auth_cookie()
            .unwrap()
            .is_none());

        // Operations now fail on the missing token.
        let err = coordinator.get_user().await.unwrap_err();
        assert!(matches!(
            err,
            WalletError::State(WalletStateError::NoAuthToken)
        ));
    }

    #[tokio::test]
    async fn link_profile_authenticates_the_new_identity_first() {
        let api = ScriptedAuthApi::new(token_for(CustodyType::Enclave)).with_profiles(vec![
            Profile {
                profile_type: crate::models::ProfileType::Email,
                identifier: "a@b.co".into(),
            },
            Profile {
                profile_type: crate::models::ProfileType::Google,
                identifier: "sub-1".into(),
            },
        ]);
        let (_dir, api, coordinator) = coordinator_with(api, transport_with_wallet("enclave"));

        coordinator
            .session()
            .storage()
            .save_auth_cookie("cookie-1")
            .unwrap();

        let profiles = coordinator
            .link_profile(AuthStrategy::Guest {
                session_id: "s-2".into(),
            })
            .await
            .unwrap();

        assert_eq!(profiles.len(), 2);
        assert!(api.saw("login_as_guest"));
        assert!(api.saw("link_account"));
    }

    #[tokio::test]
    async fn unlink_refuses_last_profile() {
        let email_profile = Profile {
            profile_type: crate::models::ProfileType::Email,
            identifier: "a@b.co".into(),
        };
        let api = ScriptedAuthApi::new(token_for(CustodyType::Enclave))
            .with_profiles(vec![email_profile.clone()]);
        let (_dir, api, coordinator) = coordinator_with(api, transport_with_wallet("enclave"));

        coordinator
            .session()
            .storage()
            .save_auth_cookie("cookie-1")
            .unwrap();

        let err = coordinator.unlink_profile(&email_profile).await.unwrap_err();
        assert!(matches!(
            err,
            WalletError::State(WalletStateError::LastProfile)
        ));
        assert!(!api.saw("unlink_account"));
    }

    #[tokio::test]
    async fn unlink_removes_one_of_many_profiles() {
        let email_profile = Profile {
            profile_type: crate::models::ProfileType::Email,
            identifier: "a@b.co".into(),
        };
        let google_profile = Profile {
            profile_type: crate::models::ProfileType::Google,
            identifier: "sub-1".into(),
        };
        let api = ScriptedAuthApi::new(token_for(CustodyType::Enclave))
            .with_profiles(vec![email_profile.clone(), google_profile.clone()]);
        let (_dir, _api, coordinator) = coordinator_with(api, transport_with_wallet("enclave"));

        coordinator
            .session()
            .storage()
            .save_auth_cookie("cookie-1")
            .unwrap();

        let remaining = coordinator.unlink_profile(&email_profile).await.unwrap();
        assert_eq!(remaining, vec![google_profile]);
    }
}
