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

//! Authentication strategies for the request pipeline.
//!
//! A strategy produces the auth headers for each attempt, and decides what to
//! do when the service rejects them. The client fetches fresh headers before
//! every attempt, so a token refreshed mid-retry-loop is picked up
//! automatically.

use crate::Result;
use crate::errors::CredentialsError;
use crate::token::TokenProvider;
use crate::token_cache::TokenCache;
use http::{HeaderMap, HeaderValue};

/// Produces auth headers and handles credential rejection.
#[async_trait::async_trait]
pub trait AuthStrategy: Send + Sync + std::fmt::Debug {
    /// Returns the headers to attach to a request.
    async fn headers(&self) -> Result<HeaderMap>;

    /// Called when the service responds with `401 Unauthorized`.
    ///
    /// Returns true if the strategy recovered, for example by refreshing the
    /// token, and the request should be replayed once. Returning false ends
    /// the request with an auth error.
    async fn on_unauthorized(&self) -> bool;
}

/// Sends a `Bearer` token in the `Authorization` header.
///
/// Tokens come from a [TokenProvider] and are cached: concurrent requests
/// share one refresh, and tokens are renewed shortly before they expire.
#[derive(Debug)]
pub struct BearerAuth<T>
where
    T: TokenProvider,
{
    cache: TokenCache<T>,
}

impl<T: TokenProvider + 'static> BearerAuth<T> {
    /// Wraps `provider` in a token cache.
    pub fn new(provider: T) -> Self {
        Self {
            cache: TokenCache::new(provider),
        }
    }
}

#[async_trait::async_trait]
impl<T: TokenProvider + 'static> AuthStrategy for BearerAuth<T> {
    async fn headers(&self) -> Result<HeaderMap> {
        let token = self.cache.token().await?;
        let value = format!("{} {}", token.token_type, token.token);
        let mut value = HeaderValue::from_str(&value)
            .map_err(|e| CredentialsError::new(false, e))?;
        value.set_sensitive(true);
        let mut headers = HeaderMap::new();
        headers.insert(http::header::AUTHORIZATION, value);
        Ok(headers)
    }

    async fn on_unauthorized(&self) -> bool {
        self.cache.invalidate().await;
        self.cache.token().await.is_ok()
    }
}

/// Sends no auth headers. Used for unauthenticated endpoints and tests.
#[derive(Clone, Debug, Default)]
pub struct NoAuth;

#[async_trait::async_trait]
impl AuthStrategy for NoAuth {
    async fn headers(&self) -> Result<HeaderMap> {
        Ok(HeaderMap::new())
    }

    async fn on_unauthorized(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::Token;
    use crate::token::tests::MockTokenProvider;

    fn bearer(token: &str) -> Token {
        Token {
            token: token.to_string(),
            token_type: "Bearer".to_string(),
            expires_at: None,
        }
    }

    #[tokio::test]
    async fn bearer_auth_headers() -> anyhow::Result<()> {
        let mut mock = MockTokenProvider::new();
        mock.expect_token()
            .times(1)
            .return_once(|| Ok(bearer("token-test-only")));

        let auth = BearerAuth::new(mock);
        let headers = auth.headers().await?;
        let value = headers.get(http::header::AUTHORIZATION).unwrap();
        assert_eq!(value.to_str()?, "Bearer token-test-only");
        assert!(value.is_sensitive());

        // A second call is served from the cache.
        let again = auth.headers().await?;
        assert_eq!(again.get(http::header::AUTHORIZATION), Some(value));
        Ok(())
    }

    #[tokio::test]
    async fn bearer_auth_recovers_from_rejection() {
        let mut mock = MockTokenProvider::new();
        mock.expect_token()
            .times(1)
            .return_once(|| Ok(bearer("stale")));
        mock.expect_token()
            .times(1)
            .return_once(|| Ok(bearer("fresh")));

        let auth = BearerAuth::new(mock);
        let headers = auth.headers().await.unwrap();
        assert_eq!(
            headers.get(http::header::AUTHORIZATION).unwrap().to_str().unwrap(),
            "Bearer stale"
        );

        assert!(auth.on_unauthorized().await);
        let headers = auth.headers().await.unwrap();
        assert_eq!(
            headers.get(http::header::AUTHORIZATION).unwrap().to_str().unwrap(),
            "Bearer fresh"
        );
    }

    #[tokio::test]
    async fn bearer_auth_rejection_without_recovery() {
        let mut mock = MockTokenProvider::new();
        mock.expect_token()
            .times(1)
            .return_once(|| Ok(bearer("stale")));
        mock.expect_token()
            .times(1)
            .return_once(|| Err(CredentialsError::from_msg(false, "revoked")));

        let auth = BearerAuth::new(mock);
        auth.headers().await.unwrap();
        assert!(!auth.on_unauthorized().await);
    }

    #[tokio::test]
    async fn no_auth() {
        let auth = NoAuth;
        let headers = auth.headers().await.unwrap();
        assert!(headers.is_empty());
        assert!(!auth.on_unauthorized().await);
    }
}
