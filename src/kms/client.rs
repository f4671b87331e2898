// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! GCP KMS REST client.
//!
//! Authenticates with a service-account JWT assertion exchanged for an
//! OAuth2 bearer token; the bearer is cached until shortly before expiry.
//! Only the two operations the signer needs are implemented: public-key
//! fetch and asymmetric signing over a 32-byte digest.

use std::time::Duration;

use base64ct::{Base64, Encoding};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::KmsError;
use crate::models::KmsCredentials;

const KMS_ENDPOINT: &str = "https://cloudkms.googleapis.com/v1/";
const OAUTH_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const CLOUDKMS_SCOPE: &str = "https://www.googleapis.com/auth/cloudkms";
const KMS_TIMEOUT: Duration = Duration::from_secs(20);

/// Bearer tokens are refreshed this long before their stated expiry.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// Minimal KMS surface the signer depends on.
#[async_trait::async_trait]
pub trait KmsService: Send + Sync {
    /// Fetch the PEM-encoded public key of a key version.
    async fn get_public_key(&self, key_path: &str) -> Result<String, KmsError>;

    /// Sign a 32-byte digest; returns the DER-encoded ECDSA signature.
    async fn asymmetric_sign(&self, key_path: &str, digest: &[u8; 32])
        -> Result<Vec<u8>, KmsError>;
}

#[derive(Debug, Serialize)]
struct AssertionClaims<'a> {
    iss: &'a str,
    scope: &'a str,
    aud: &'a str,
    iat: i64,
    exp: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Debug, Clone)]
struct CachedBearer {
    token: String,
    expires_at: i64,
}

/// HTTP implementation of [`KmsService`] against the GCP KMS REST surface.
pub struct GcpKmsClient {
    client: reqwest::Client,
    credential_email: String,
    credential_private_key: String,
    bearer: RwLock<Option<CachedBearer>>,
}

// Key material never appears in debug output.
impl std::fmt::Debug for GcpKmsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpKmsClient")
            .field("credential_email", &self.credential_email)
            .finish_non_exhaustive()
    }
}

impl GcpKmsClient {
    /// Build a client from KMS credentials.
    ///
    /// Both service-account fields must be present; key coordinates alone
    /// are not enough to authenticate.
    pub fn new(credentials: &KmsCredentials) -> Result<Self, KmsError> {
        let credential_email = credentials
            .application_credential_email
            .clone()
            .ok_or(KmsError::MissingCredential("applicationCredentialEmail"))?;
        let credential_private_key = credentials
            .application_credential_private_key
            .clone()
            .ok_or(KmsError::MissingCredential(
                "applicationCredentialPrivateKey",
            ))?;

        let client = reqwest::Client::builder()
            .timeout(KMS_TIMEOUT)
            .build()
            .map_err(|e| KmsError::Service(e.to_string()))?;

        Ok(Self {
            client,
            credential_email,
            credential_private_key,
            bearer: RwLock::new(None),
        })
    }

    /// Current bearer token, refreshed through the assertion flow when the
    /// cached one is absent or about to expire.
    async fn bearer_token(&self) -> Result<String, KmsError> {
        let now = Utc::now().timestamp();
        {
            let cached = self.bearer.read().await;
            if let Some(bearer) = &*cached {
                if bearer.expires_at - TOKEN_REFRESH_MARGIN_SECS > now {
                    return Ok(bearer.token.clone());
                }
            }
        }

        let assertion = self.signed_assertion(now)?;
        let response = self
            .client
            .post(OAUTH_TOKEN_URL)
            .form(&[
                ("grant_type", "urn:ietf:params:oauth:grant-type:jwt-bearer"),
                ("assertion", assertion.as_str()),
            ])
            .send()
            .await
            .map_err(|e| KmsError::Service(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(KmsError::Service(format!(
                "token exchange failed ({status}): {body}"
            )));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| KmsError::Service(e.to_string()))?;

        let bearer = CachedBearer {
            token: token.access_token.clone(),
            expires_at: now + token.expires_in,
        };
        let mut cached = self.bearer.write().await;
        *cached = Some(bearer);
        Ok(token.access_token)
    }

    fn signed_assertion(&self, now: i64) -> Result<String, KmsError> {
        let claims = AssertionClaims {
            iss: &self.credential_email,
            scope: CLOUDKMS_SCOPE,
            aud: OAUTH_TOKEN_URL,
            iat: now,
            exp: now + 3600,
        };

        let key = jsonwebtoken::EncodingKey::from_rsa_pem(self.credential_private_key.as_bytes())
            .map_err(|e| KmsError::Service(format!("invalid service-account key: {e}")))?;
        jsonwebtoken::encode(
            &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::RS256),
            &claims,
            &key,
        )
        .map_err(|e| KmsError::Service(e.to_string()))
    }
}

#[async_trait::async_trait]
impl KmsService for GcpKmsClient {
    async fn get_public_key(&self, key_path: &str) -> Result<String, KmsError> {
        #[derive(Deserialize)]
        struct PublicKeyResponse {
            pem: String,
        }

        let bearer = self.bearer_token().await?;
        let response = self
            .client
            .get(format!("{KMS_ENDPOINT}{key_path}/publicKey"))
            .bearer_auth(bearer)
            .send()
            .await
            .map_err(|e| KmsError::Service(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KmsError::Service(format!(
                "publicKey failed: {}",
                response.status()
            )));
        }

        let body: PublicKeyResponse = response
            .json()
            .await
            .map_err(|e| KmsError::Service(e.to_string()))?;
        Ok(body.pem)
    }

    async fn asymmetric_sign(
        &self,
        key_path: &str,
        digest: &[u8; 32],
    ) -> Result<Vec<u8>, KmsError> {
        #[derive(Deserialize)]
        struct SignResponse {
            signature: String,
        }

        let bearer = self.bearer_token().await?;
        let response = self
            .client
            .post(format!("{KMS_ENDPOINT}{key_path}:asymmetricSign"))
            .bearer_auth(bearer)
            .json(&serde_json::json!({
                "digest": { "sha256": Base64::encode_string(digest) }
            }))
            .send()
            .await
            .map_err(|e| KmsError::Service(e.to_string()))?;

        if !response.status().is_success() {
            return Err(KmsError::Service(format!(
                "asymmetricSign failed: {}",
                response.status()
            )));
        }

        let body: SignResponse = response
            .json()
            .await
            .map_err(|e| KmsError::Service(e.to_string()))?;
        Base64::decode_vec(&body.signature)
            .map_err(|e| KmsError::Signature(format!("invalid base64 signature: {e}")))
    }
}
