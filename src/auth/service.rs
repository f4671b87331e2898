// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Auth service client.
//!
//! [`AuthApi`] is the seam to the remote authentication service: OTP
//! send/verify, token-issuing logins for every strategy, and profile
//! link/unlink. The production implementation posts JSON to the service
//! origin; tests inject scripted implementations.
//!
//! Failures are tagged by stage (send-code, verify-code, ...) and surfaced
//! verbatim — retry UX belongs to the caller.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use super::passkey::{PasskeyAssertion, PasskeyAttestation};
use super::siwe::SiwePayload;
use super::strategy::OAuthProvider;
use crate::models::{AuthToken, Profile};

/// Request timeout for auth-service calls.
const AUTH_SERVICE_TIMEOUT: Duration = Duration::from_secs(20);

/// Stage-tagged auth service errors.
#[derive(Debug, thiserror::Error)]
pub enum AuthApiError {
    #[error("Failed to send verification code: {0}")]
    SendCode(String),

    #[error("Code verification failed: {0}")]
    VerifyCode(String),

    #[error("OAuth window was closed before completing login")]
    OAuthWindowClosed,

    #[error("OAuth login failed: {0}")]
    OAuthLogin(String),

    #[error("Passkey ceremony failed: {0}")]
    PasskeyCeremony(String),

    #[error("Login failed: {0}")]
    Login(String),

    #[error("Profile link failed: {0}")]
    LinkProfile(String),

    #[error("Profile unlink failed: {0}")]
    UnlinkProfile(String),

    #[error("Auth service unreachable: {0}")]
    Service(String),
}

/// Which passkey ceremony a challenge is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PasskeyChallengeKind {
    Register,
    Login,
}

/// Remote authentication service surface.
#[async_trait]
pub trait AuthApi: Send + Sync {
    // ----- OTP -----
    async fn send_email_otp(&self, email: &str) -> Result<(), AuthApiError>;
    async fn send_phone_otp(&self, phone: &str) -> Result<(), AuthApiError>;
    async fn verify_email_otp(&self, email: &str, code: &str) -> Result<AuthToken, AuthApiError>;
    async fn verify_phone_otp(&self, phone: &str, code: &str) -> Result<AuthToken, AuthApiError>;

    // ----- Token-issuing logins -----
    async fn login_with_jwt(&self, jwt: &str) -> Result<AuthToken, AuthApiError>;
    async fn login_with_auth_endpoint(&self, payload: &str) -> Result<AuthToken, AuthApiError>;
    async fn login_as_guest(&self, session_id: &str) -> Result<AuthToken, AuthApiError>;
    async fn login_with_backend_secret(
        &self,
        wallet_secret: &str,
    ) -> Result<AuthToken, AuthApiError>;
    async fn login_with_oauth(
        &self,
        provider: OAuthProvider,
        auth_result: &str,
    ) -> Result<AuthToken, AuthApiError>;
    async fn login_with_siwe(
        &self,
        payload: &SiwePayload,
        signature: &str,
    ) -> Result<AuthToken, AuthApiError>;
    async fn login_with_iframe_email_verification(
        &self,
        email: &str,
    ) -> Result<AuthToken, AuthApiError>;

    // ----- Passkeys -----
    async fn passkey_challenge(&self, kind: PasskeyChallengeKind)
        -> Result<String, AuthApiError>;
    async fn login_with_passkey_attestation(
        &self,
        attestation: &PasskeyAttestation,
    ) -> Result<AuthToken, AuthApiError>;
    async fn login_with_passkey_assertion(
        &self,
        assertion: &PasskeyAssertion,
    ) -> Result<AuthToken, AuthApiError>;

    // ----- Profiles -----
    async fn linked_profiles(&self, cookie_string: &str) -> Result<Vec<Profile>, AuthApiError>;
    async fn link_account(
        &self,
        cookie_string: &str,
        new_account_cookie: &str,
    ) -> Result<Vec<Profile>, AuthApiError>;
    async fn unlink_account(
        &self,
        cookie_string: &str,
        profile: &Profile,
    ) -> Result<Vec<Profile>, AuthApiError>;
}

/// Error body returned by the auth service.
#[derive(Debug, Deserialize)]
struct ServiceErrorBody {
    error: String,
}

/// HTTP implementation of [`AuthApi`] against the platform auth service.
#[derive(Debug, Clone)]
pub struct HttpAuthApi {
    origin: Url,
    client_id: String,
    client: reqwest::Client,
}

impl HttpAuthApi {
    pub fn new(origin: Url, client_id: impl Into<String>) -> Result<Self, AuthApiError> {
        let client = reqwest::Client::builder()
            .timeout(AUTH_SERVICE_TIMEOUT)
            .build()
            .map_err(|e| AuthApiError::Service(e.to_string()))?;
        Ok(Self {
            origin,
            client_id: client_id.into(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, AuthApiError> {
        self.origin
            .join(path)
            .map_err(|e| AuthApiError::Service(e.to_string()))
    }

    /// POST a JSON body, mapping non-2xx responses through `map_err`.
    async fn post<B, T>(
        &self,
        path: &str,
        body: &B,
        map_err: impl FnOnce(String) -> AuthApiError,
    ) -> Result<T, AuthApiError>
    where
        B: Serialize + Sync,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.endpoint(path)?)
            .header("x-client-id", &self.client_id)
            .json(body)
            .send()
            .await
            .map_err(|e| AuthApiError::Service(e.to_string()))?;

        if !response.status().is_success() {
            let message = match response.json::<ServiceErrorBody>().await {
                Ok(body) => body.error,
                Err(e) => format!("unreadable error body: {e}"),
            };
            return Err(map_err(message));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AuthApiError::Service(e.to_string()))
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn send_email_otp(&self, email: &str) -> Result<(), AuthApiError> {
        let _: serde_json::Value = self
            .post(
                "v1/otp/email/send",
                &serde_json::json!({ "email": email }),
                AuthApiError::SendCode,
            )
            .await?;
        Ok(())
    }

    async fn send_phone_otp(&self, phone: &str) -> Result<(), AuthApiError> {
        let _: serde_json::Value = self
            .post(
                "v1/otp/phone/send",
                &serde_json::json!({ "phone": phone }),
                AuthApiError::SendCode,
            )
            .await?;
        Ok(())
    }

    async fn verify_email_otp(&self, email: &str, code: &str) -> Result<AuthToken, AuthApiError> {
        self.post(
            "v1/otp/email/verify",
            &serde_json::json!({ "email": email, "code": code }),
            AuthApiError::VerifyCode,
        )
        .await
    }

    async fn verify_phone_otp(&self, phone: &str, code: &str) -> Result<AuthToken, AuthApiError> {
        self.post(
            "v1/otp/phone/verify",
            &serde_json::json!({ "phone": phone, "code": code }),
            AuthApiError::VerifyCode,
        )
        .await
    }

    async fn login_with_jwt(&self, jwt: &str) -> Result<AuthToken, AuthApiError> {
        self.post(
            "v1/login/jwt",
            &serde_json::json!({ "jwt": jwt }),
            AuthApiError::Login,
        )
        .await
    }

    async fn login_with_auth_endpoint(&self, payload: &str) -> Result<AuthToken, AuthApiError> {
        self.post(
            "v1/login/auth-endpoint",
            &serde_json::json!({ "payload": payload }),
            AuthApiError::Login,
        )
        .await
    }

    async fn login_as_guest(&self, session_id: &str) -> Result<AuthToken, AuthApiError> {
        self.post(
            "v1/login/guest",
            &serde_json::json!({ "sessionId": session_id }),
            AuthApiError::Login,
        )
        .await
    }

    async fn login_with_backend_secret(
        &self,
        wallet_secret: &str,
    ) -> Result<AuthToken, AuthApiError> {
        self.post(
            "v1/login/backend",
            &serde_json::json!({ "walletSecret": wallet_secret }),
            AuthApiError::Login,
        )
        .await
    }

    async fn login_with_oauth(
        &self,
        provider: OAuthProvider,
        auth_result: &str,
    ) -> Result<AuthToken, AuthApiError> {
        self.post(
            "v1/login/oauth",
            &serde_json::json!({
                "provider": provider.as_str(),
                "authResult": auth_result,
            }),
            AuthApiError::OAuthLogin,
        )
        .await
    }

    async fn login_with_siwe(
        &self,
        payload: &SiwePayload,
        signature: &str,
    ) -> Result<AuthToken, AuthApiError> {
        self.post(
            "v1/login/siwe",
            &serde_json::json!({ "payload": payload, "signature": signature }),
            AuthApiError::Login,
        )
        .await
    }

    async fn login_with_iframe_email_verification(
        &self,
        email: &str,
    ) -> Result<AuthToken, AuthApiError> {
        self.post(
            "v1/login/iframe-email-verification",
            &serde_json::json!({ "email": email }),
            AuthApiError::Login,
        )
        .await
    }

    async fn passkey_challenge(
        &self,
        kind: PasskeyChallengeKind,
    ) -> Result<String, AuthApiError> {
        #[derive(Deserialize)]
        struct ChallengeResponse {
            challenge: String,
        }
        let response: ChallengeResponse = self
            .post(
                "v1/passkey/challenge",
                &serde_json::json!({ "kind": kind }),
                AuthApiError::PasskeyCeremony,
            )
            .await?;
        Ok(response.challenge)
    }

    async fn login_with_passkey_attestation(
        &self,
        attestation: &PasskeyAttestation,
    ) -> Result<AuthToken, AuthApiError> {
        self.post(
            "v1/passkey/register",
            attestation,
            AuthApiError::PasskeyCeremony,
        )
        .await
    }

    async fn login_with_passkey_assertion(
        &self,
        assertion: &PasskeyAssertion,
    ) -> Result<AuthToken, AuthApiError> {
        self.post("v1/passkey/login", assertion, AuthApiError::PasskeyCeremony)
            .await
    }

    async fn linked_profiles(&self, cookie_string: &str) -> Result<Vec<Profile>, AuthApiError> {
        self.post(
            "v1/profiles/list",
            &serde_json::json!({ "cookieString": cookie_string }),
            AuthApiError::Service,
        )
        .await
    }

    async fn link_account(
        &self,
        cookie_string: &str,
        new_account_cookie: &str,
    ) -> Result<Vec<Profile>, AuthApiError> {
        self.post(
            "v1/profiles/link",
            &serde_json::json!({
                "cookieString": cookie_string,
                "newAccountCookie": new_account_cookie,
            }),
            AuthApiError::LinkProfile,
        )
        .await
    }

    async fn unlink_account(
        &self,
        cookie_string: &str,
        profile: &Profile,
    ) -> Result<Vec<Profile>, AuthApiError> {
        self.post(
            "v1/profiles/unlink",
            &serde_json::json!({
                "cookieString": cookie_string,
                "profile": profile,
            }),
            AuthApiError::UnlinkProfile,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_joins_against_origin() {
        let api = HttpAuthApi::new(
            Url::parse("https://embedded-wallet.example.com/").unwrap(),
            "abc123",
        )
        .unwrap();
        assert_eq!(
            api.endpoint("v1/otp/email/send").unwrap().as_str(),
            "https://embedded-wallet.example.com/v1/otp/email/send"
        );
    }

    #[test]
    fn errors_are_stage_tagged() {
        assert_eq!(
            AuthApiError::VerifyCode("invalid code".into()).to_string(),
            "Code verification failed: invalid code"
        );
        assert_eq!(
            AuthApiError::OAuthWindowClosed.to_string(),
            "OAuth window was closed before completing login"
        );
    }
}
