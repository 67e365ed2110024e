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

//! Per request options.
//!
//! While the client defaults are intended to work for most applications, it is
//! sometimes necessary to customize the behavior of a single call. Applications
//! sometimes change the timeout for a specific request, change the retry
//! configuration, or disable the response cache.

use crate::backoff_policy::{BackoffPolicy, BackoffPolicyArg};
use crate::retry_policy::{RetryPolicy, RetryPolicyArg};
use std::sync::Arc;

/// A set of options configuring a single request.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
    idempotent: Option<bool>,
    user_agent: Option<String>,
    attempt_timeout: Option<std::time::Duration>,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
    backoff_policy: Option<Arc<dyn BackoffPolicy>>,
    use_cache: Option<bool>,
    max_pages: Option<u32>,
    max_items: Option<usize>,
}

impl RequestOptions {
    /// Gets the idempotency.
    pub fn idempotent(&self) -> Option<bool> {
        self.idempotent
    }

    /// Treat the request in this method as idempotent.
    ///
    /// If a retry policy is configured, the policy may examine the idempotency
    /// and the error details to decide if the error is retryable. Typically
    /// [idempotent] requests are safe to retry under more error conditions
    /// than non-idempotent requests.
    ///
    /// The client provides a default idempotency based on the HTTP method
    /// (`GET`, `POST`, `DELETE`, etc.).
    ///
    /// [idempotent]: https://en.wikipedia.org/wiki/Idempotence
    pub fn set_idempotency(&mut self, value: bool) {
        self.idempotent = Some(value);
    }

    /// Set the idempotency for the request unless it is already set.
    ///
    /// If [set_idempotency][Self::set_idempotency] was already called this
    /// method has no effect. Otherwise it sets the idempotency. The client
    /// uses this to provide a default idempotency value.
    pub(crate) fn set_default_idempotency(&mut self, default: bool) {
        self.idempotent.get_or_insert(default);
    }

    /// Prepends this prefix to the user agent header value.
    pub fn set_user_agent<T: Into<String>>(&mut self, v: T) {
        self.user_agent = Some(v.into());
    }

    /// Gets the current user-agent prefix.
    pub fn user_agent(&self) -> &Option<String> {
        &self.user_agent
    }

    /// Sets the per-attempt timeout.
    ///
    /// When using a retry loop, this affects the timeout for each attempt. The
    /// overall timeout for a request is set by the retry policy.
    pub fn set_attempt_timeout<T: Into<std::time::Duration>>(&mut self, v: T) {
        self.attempt_timeout = Some(v.into());
    }

    /// Gets the current per-attempt timeout.
    pub fn attempt_timeout(&self) -> &Option<std::time::Duration> {
        &self.attempt_timeout
    }

    /// Get the current retry policy override, if any.
    pub fn retry_policy(&self) -> &Option<Arc<dyn RetryPolicy>> {
        &self.retry_policy
    }

    /// Sets the retry policy configuration.
    pub fn set_retry_policy<V: Into<RetryPolicyArg>>(&mut self, v: V) {
        self.retry_policy = Some(v.into().into());
    }

    /// Get the current backoff policy override, if any.
    pub fn backoff_policy(&self) -> &Option<Arc<dyn BackoffPolicy>> {
        &self.backoff_policy
    }

    /// Sets the backoff policy configuration.
    pub fn set_backoff_policy<V: Into<BackoffPolicyArg>>(&mut self, v: V) {
        self.backoff_policy = Some(v.into().into());
    }

    /// Gets the cache preference, if any.
    pub fn use_cache(&self) -> Option<bool> {
        self.use_cache
    }

    /// Enables or disables the conditional request cache for this request.
    ///
    /// When enabled, `GET` requests send `If-None-Match` with the cached
    /// validator, and a `304 Not Modified` response is served from the cache.
    pub fn set_use_cache(&mut self, value: bool) {
        self.use_cache = Some(value);
    }

    /// Gets the page limit for paginated requests, if any.
    pub fn max_pages(&self) -> Option<u32> {
        self.max_pages
    }

    /// Limits how many pages a paginated request fetches.
    pub fn set_max_pages(&mut self, v: u32) {
        self.max_pages = Some(v);
    }

    /// Gets the item limit for paginated requests, if any.
    pub fn max_items(&self) -> Option<usize> {
        self.max_items
    }

    /// Limits how many items a paginated request collects.
    ///
    /// Pagination stops as soon as the limit is reached, even if the service
    /// reports more pages.
    pub fn set_max_items(&mut self, v: usize) {
        self.max_items = Some(v);
    }
}

#[doc(hidden)]
pub mod internal {
    //! This module contains implementation details. It is not part of the
    //! public API. Types and functions in this module may be changed or removed
    //! without warnings. Applications should not use any types contained
    //! within.
    use super::RequestOptions;

    pub fn set_default_idempotency(mut options: RequestOptions, default: bool) -> RequestOptions {
        options.set_default_idempotency(default);
        options
    }
}
