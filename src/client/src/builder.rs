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

use crate::client::Client;
use crate::etag_cache::EtagCache;
use crate::origin::is_localhost;
use auth::strategy::{AuthStrategy, NoAuth};
use gax::backoff_policy::{BackoffPolicy, BackoffPolicyArg};
use gax::hooks::{Hooks, NoHooks};
use gax::retry_policy::{RetryPolicy, RetryPolicyArg};
use std::sync::Arc;
use url::Url;

/// The default service endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://3.basecampapi.com";

pub(crate) const DEFAULT_USER_AGENT: &str =
    concat!("basecamp-sdk-rust/", env!("CARGO_PKG_VERSION"));

/// The error type for client construction.
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("the endpoint is not a valid URL: {0}")]
    InvalidEndpoint(String),
    #[error("the endpoint must use HTTPS: {0}")]
    EndpointNotHttps(String),
}

/// Configures and builds a [Client].
///
/// # Example
/// ```
/// use basecamp_client::Client;
/// use gax::retry_policy::LimitedAttemptCount;
///
/// let client = Client::builder()
///     .with_retry_policy(LimitedAttemptCount::new(3))
///     .with_cache_capacity(128)
///     .build()?;
/// # Ok::<(), basecamp_client::builder::Error>(())
/// ```
#[derive(Debug)]
pub struct ClientBuilder {
    endpoint: String,
    auth: Option<Arc<dyn AuthStrategy>>,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
    backoff_policy: Option<Arc<dyn BackoffPolicy>>,
    hooks: Option<Arc<dyn Hooks>>,
    cache_capacity: Option<usize>,
    user_agent: Option<String>,
}

impl ClientBuilder {
    pub(crate) fn new() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            auth: None,
            retry_policy: None,
            backoff_policy: None,
            hooks: None,
            cache_capacity: None,
            user_agent: None,
        }
    }

    /// Changes the service endpoint.
    ///
    /// The endpoint must use HTTPS. Loopback hosts are exempt, so tests can
    /// point the client at a local server.
    pub fn with_endpoint<T: Into<String>>(mut self, endpoint: T) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    /// Changes the authentication strategy.
    ///
    /// The default sends no credentials. Most applications want
    /// [BearerAuth][auth::strategy::BearerAuth] wrapping a token provider.
    pub fn with_auth<A: AuthStrategy + 'static>(mut self, strategy: A) -> Self {
        self.auth = Some(Arc::new(strategy));
        self
    }

    /// Sets the default retry policy for requests made through this client.
    ///
    /// Without a retry policy here or in the request options, every request
    /// makes exactly one attempt.
    pub fn with_retry_policy<V: Into<RetryPolicyArg>>(mut self, v: V) -> Self {
        self.retry_policy = Some(v.into().into());
        self
    }

    /// Sets the default backoff policy for requests made through this client.
    pub fn with_backoff_policy<V: Into<BackoffPolicyArg>>(mut self, v: V) -> Self {
        self.backoff_policy = Some(v.into().into());
        self
    }

    /// Registers observability hooks.
    ///
    /// Use [ChainHooks][gax::hooks::ChainHooks] to register more than one.
    pub fn with_hooks<H: Hooks + 'static>(mut self, hooks: H) -> Self {
        self.hooks = Some(Arc::new(hooks));
        self
    }

    /// Enables the conditional request cache, bounded to `capacity` entries.
    ///
    /// The cache is off by default. A capacity of zero is treated as one.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Overrides the `User-Agent` header sent with every request.
    pub fn with_user_agent<T: Into<String>>(mut self, v: T) -> Self {
        self.user_agent = Some(v.into());
        self
    }

    /// Creates the client.
    pub fn build(self) -> Result<Client, Error> {
        let url = Url::parse(&self.endpoint)
            .map_err(|_| Error::InvalidEndpoint(self.endpoint.clone()))?;
        let exempt = url.host_str().is_some_and(is_localhost);
        if url.scheme() != "https" && !exempt {
            return Err(Error::EndpointNotHttps(self.endpoint));
        }
        Ok(Client::new(
            self.endpoint.trim_end_matches('/').to_string(),
            self.auth.unwrap_or_else(|| Arc::new(NoAuth)),
            self.retry_policy,
            self.backoff_policy,
            self.hooks.unwrap_or_else(|| Arc::new(NoHooks)),
            self.cache_capacity.map(|c| Arc::new(EtagCache::new(c))),
            self.user_agent
                .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string()),
        ))
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint() {
        let client = Client::builder().build().expect("defaults build");
        assert_eq!(client.endpoint(), DEFAULT_ENDPOINT);
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = Client::builder()
            .with_endpoint("https://3.basecampapi.com/")
            .build()
            .unwrap();
        assert_eq!(client.endpoint(), "https://3.basecampapi.com");
    }

    #[test]
    fn plaintext_endpoint_is_rejected() {
        let result = Client::builder()
            .with_endpoint("http://api.example.com")
            .build();
        assert!(
            matches!(result, Err(Error::EndpointNotHttps(_))),
            "{result:?}"
        );
    }

    #[test]
    fn loopback_endpoints_are_exempt() {
        for endpoint in [
            "http://localhost:8080",
            "http://127.0.0.1:8080",
            "http://api.localhost",
        ] {
            let result = Client::builder().with_endpoint(endpoint).build();
            assert!(result.is_ok(), "{endpoint}");
        }
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let result = Client::builder().with_endpoint("not a url").build();
        assert!(
            matches!(result, Err(Error::InvalidEndpoint(_))),
            "{result:?}"
        );
    }
}
