// Copyright 2025 Basecamp SDK Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! OAuth 2.0 credentials and token refresh.
//!
//! Basecamp uses OAuth 2.0 with refresh tokens. The stored [Credentials] hold
//! the long-lived refresh token; [RefreshTokenProvider] exchanges it for
//! short-lived access tokens at the token endpoint.

use crate::errors::{self, CredentialsError};
use crate::token::{Token, TokenProvider};
use crate::Result;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::Instant;

// Token endpoint responses are small. Anything bigger is not a token.
const MAX_TOKEN_RESPONSE_BYTES: usize = 1024 * 1024;

// Error descriptions from the service are truncated to this length.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Stored OAuth 2.0 credentials for a Basecamp account.
///
/// This is the durable form, typically loaded from the application's
/// credential store. The `access_token` may already be expired; the client
/// refreshes it via the `refresh_token` when needed.
#[derive(Clone, Deserialize, Serialize, PartialEq)]
pub struct Credentials {
    /// The short-lived access token, possibly expired.
    pub access_token: String,
    /// The long-lived refresh token.
    pub refresh_token: String,
    /// When the access token expires, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<chrono::DateTime<chrono::Utc>>,
    /// The Basecamp account id these credentials are scoped to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

impl Credentials {
    /// Returns true if the access token is expired, or expires within `buffer`.
    ///
    /// Credentials without an expiration are treated as never expiring.
    pub fn expires_within(&self, buffer: Duration) -> bool {
        let Some(expires_at) = self.expires_at else {
            return false;
        };
        let buffer = chrono::TimeDelta::from_std(buffer).unwrap_or(chrono::TimeDelta::MAX);
        expires_at <= chrono::Utc::now() + buffer
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"[censored]")
            .field("refresh_token", &"[censored]")
            .field("expires_at", &self.expires_at)
            .field("account_id", &self.account_id)
            .finish()
    }
}

/// Obtains access tokens by exchanging a refresh token.
///
/// Implements [TokenProvider]; the client wraps this in a cache so each token
/// is fetched once and shared across concurrent requests.
pub struct RefreshTokenProvider {
    client: reqwest::Client,
    token_endpoint: String,
    refresh_token: String,
    client_id: String,
    client_secret: Option<String>,
    legacy_format: bool,
}

impl RefreshTokenProvider {
    /// Creates a provider for the given token endpoint and refresh token.
    pub fn new<S: Into<String>>(token_endpoint: S, refresh_token: S, client_id: S) -> Self {
        Self {
            client: reqwest::Client::new(),
            token_endpoint: token_endpoint.into(),
            refresh_token: refresh_token.into(),
            client_id: client_id.into(),
            client_secret: None,
            legacy_format: false,
        }
    }

    /// Sets the client secret sent with each refresh request.
    pub fn with_client_secret<S: Into<String>>(mut self, v: S) -> Self {
        self.client_secret = Some(v.into());
        self
    }

    /// Uses the non-standard `type=refresh` parameter instead of
    /// `grant_type=refresh_token`.
    ///
    /// The 37signals Launchpad token endpoint predates the final OAuth 2.0
    /// specification and expects the legacy parameter.
    pub fn with_legacy_format(mut self, v: bool) -> Self {
        self.legacy_format = v;
        self
    }

    fn validate_endpoint(&self) -> Result<url::Url> {
        let u = url::Url::parse(&self.token_endpoint).map_err(|e| {
            CredentialsError::new(false, e)
        })?;
        let host = u.host_str().unwrap_or_default();
        let is_localhost = matches!(host, "localhost" | "127.0.0.1" | "[::1]");
        if !u.scheme().eq_ignore_ascii_case("https") && !is_localhost {
            return Err(CredentialsError::from_msg(
                false,
                format!("token endpoint must use HTTPS: {}", self.token_endpoint),
            ));
        }
        Ok(u)
    }
}

impl std::fmt::Debug for RefreshTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshTokenProvider")
            .field("token_endpoint", &self.token_endpoint)
            .field("refresh_token", &"[censored]")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[censored]")
            .field("legacy_format", &self.legacy_format)
            .finish()
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    token_type: Option<String>,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

fn truncate(mut s: String) -> String {
    if s.len() > MAX_ERROR_MESSAGE_LEN {
        s.truncate(MAX_ERROR_MESSAGE_LEN - 3);
        s.push_str("...");
    }
    s
}

#[async_trait::async_trait]
impl TokenProvider for RefreshTokenProvider {
    async fn token(&self) -> Result<Token> {
        let endpoint = self.validate_endpoint()?;

        let mut form = Vec::new();
        if self.legacy_format {
            form.push(("type", "refresh"));
        } else {
            form.push(("grant_type", "refresh_token"));
        }
        form.push(("refresh_token", self.refresh_token.as_str()));
        form.push(("client_id", self.client_id.as_str()));
        if let Some(secret) = self.client_secret.as_deref() {
            form.push(("client_secret", secret));
        }

        tracing::debug!(endpoint = %endpoint, "refreshing access token");
        let response = self
            .client
            .post(endpoint)
            .header("accept", "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|e| CredentialsError::new(true, e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| CredentialsError::new(true, e))?;
        if body.len() > MAX_TOKEN_RESPONSE_BYTES {
            return Err(CredentialsError::from_msg(
                false,
                format!(
                    "token response body exceeds {MAX_TOKEN_RESPONSE_BYTES} byte limit"
                ),
            ));
        }

        if !status.is_success() {
            let retryable = errors::is_retryable(status);
            if let Ok(e) = serde_json::from_slice::<TokenErrorResponse>(&body) {
                let message = match e.error_description {
                    Some(desc) if !desc.is_empty() => {
                        format!("token error: {} - {}", e.error, truncate(desc))
                    }
                    _ => format!("token error: {}", e.error),
                };
                return Err(CredentialsError::from_msg(retryable, message));
            }
            let body = truncate(String::from_utf8_lossy(&body).into_owned());
            return Err(CredentialsError::from_msg(
                retryable,
                format!("token refresh failed with status {}: {}", status.as_u16(), body),
            ));
        }

        let parsed: TokenResponse = serde_json::from_slice(&body)
            .map_err(|e| CredentialsError::new(false, e))?;
        Ok(Token {
            token: parsed.access_token,
            token_type: parsed.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expires_at: parsed
                .expires_in
                .map(|s| Instant::now() + Duration::from_secs(s)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httptest::{matchers::*, responders::*, Expectation, Server};
    use serde_json::json;

    #[test]
    fn credentials_debug_is_censored() {
        let creds = Credentials {
            access_token: "access-test-only".into(),
            refresh_token: "refresh-test-only".into(),
            expires_at: None,
            account_id: Some("999".into()),
        };
        let got = format!("{creds:?}");
        assert!(!got.contains("access-test-only"), "{got}");
        assert!(!got.contains("refresh-test-only"), "{got}");
        assert!(got.contains("999"), "{got}");
    }

    #[test]
    fn credentials_expiry() {
        let mut creds = Credentials {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: None,
            account_id: None,
        };
        assert!(!creds.expires_within(Duration::from_secs(300)));

        creds.expires_at = Some(chrono::Utc::now() + chrono::TimeDelta::seconds(60));
        assert!(creds.expires_within(Duration::from_secs(300)));
        assert!(!creds.expires_within(Duration::ZERO));

        creds.expires_at = Some(chrono::Utc::now() - chrono::TimeDelta::seconds(60));
        assert!(creds.expires_within(Duration::ZERO));
    }

    #[test]
    fn credentials_roundtrip() {
        let creds = Credentials {
            access_token: "a".into(),
            refresh_token: "r".into(),
            expires_at: None,
            account_id: Some("999".into()),
        };
        let text = serde_json::to_string(&creds).unwrap();
        let got: Credentials = serde_json::from_str(&text).unwrap();
        assert_eq!(got, creds);
    }

    #[tokio::test]
    async fn refresh_success() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/token"),
                request::body(url_decoded(contains(("grant_type", "refresh_token")))),
                request::body(url_decoded(contains(("refresh_token", "refresh-123")))),
                request::body(url_decoded(contains(("client_id", "client-abc")))),
            ])
            .respond_with(json_encoded(json!({
                "access_token": "access-456",
                "token_type": "Bearer",
                "expires_in": 3600,
            }))),
        );

        let provider = RefreshTokenProvider::new(
            server.url_str("/token"),
            "refresh-123".to_string(),
            "client-abc".to_string(),
        );
        let token = provider.token().await?;
        assert_eq!(token.token, "access-456");
        assert_eq!(token.token_type, "Bearer");
        assert!(token.expires_at.is_some());
        Ok(())
    }

    #[tokio::test]
    async fn refresh_legacy_format() -> anyhow::Result<()> {
        let server = Server::run();
        server.expect(
            Expectation::matching(all_of![
                request::method_path("POST", "/token"),
                request::body(url_decoded(contains(("type", "refresh")))),
                request::body(url_decoded(contains(("client_secret", "hush")))),
            ])
            .respond_with(json_encoded(json!({
                "access_token": "access-456",
            }))),
        );

        let provider = RefreshTokenProvider::new(
            server.url_str("/token"),
            "refresh-123".to_string(),
            "client-abc".to_string(),
        )
        .with_client_secret("hush")
        .with_legacy_format(true);
        let token = provider.token().await?;
        assert_eq!(token.token, "access-456");
        assert_eq!(token.token_type, "Bearer");
        assert!(token.expires_at.is_none());
        Ok(())
    }

    #[tokio::test]
    async fn refresh_error_response() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/token")).respond_with(
                status_code(400).body(
                    json!({
                        "error": "invalid_grant",
                        "error_description": "refresh token revoked",
                    })
                    .to_string(),
                ),
            ),
        );

        let provider = RefreshTokenProvider::new(
            server.url_str("/token"),
            "refresh-123".to_string(),
            "client-abc".to_string(),
        );
        let err = provider.token().await.unwrap_err();
        assert!(!err.is_retryable(), "{err:?}");
        let got = format!("{err}");
        assert!(got.contains("invalid_grant"), "{got}");
        assert!(got.contains("refresh token revoked"), "{got}");
    }

    #[tokio::test]
    async fn refresh_transient_error() {
        let server = Server::run();
        server.expect(
            Expectation::matching(request::method_path("POST", "/token"))
                .respond_with(status_code(503).body("try later")),
        );

        let provider = RefreshTokenProvider::new(
            server.url_str("/token"),
            "refresh-123".to_string(),
            "client-abc".to_string(),
        );
        let err = provider.token().await.unwrap_err();
        assert!(err.is_retryable(), "{err:?}");
        let got = format!("{err}");
        assert!(got.contains("503"), "{got}");
    }

    #[tokio::test]
    async fn refresh_rejects_plaintext_endpoint() {
        let provider = RefreshTokenProvider::new(
            "http://tokens.example.com/token".to_string(),
            "refresh-123".to_string(),
            "client-abc".to_string(),
        );
        let err = provider.token().await.unwrap_err();
        let got = format!("{err}");
        assert!(got.contains("HTTPS"), "{got}");
    }
}
