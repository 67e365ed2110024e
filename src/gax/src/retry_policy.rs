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

//! Defines the trait and common implementations for retry policies.
//!
//! A retry policy decides, after each failed attempt, whether the request
//! should be tried again. The default policy, [TransientErrors] wrapped in
//! [LimitedAttemptCount], retries throttling and transient server errors on
//! idempotent operations only, with a bounded number of attempts.
//!
//! # Example
//! ```
//! use basecamp_gax::retry_policy::LimitedAttemptCount;
//! let policy = LimitedAttemptCount::new(3);
//! ```

use crate::error::{Error, ErrorKind};
use crate::retry_result::RetryResult;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Decides whether a failed attempt should be retried.
///
/// Implementations must be `Send + Sync` so a single policy can be shared by
/// concurrent requests.
pub trait RetryPolicy: Send + Sync + std::fmt::Debug {
    /// Queries the policy after a failed attempt.
    ///
    /// # Parameters
    /// * `loop_start` - when the retry loop started.
    /// * `attempt_count` - the number of attempts made so far, including the
    ///   one that just failed.
    /// * `idempotent` - whether the operation is safe to send twice.
    /// * `error` - the error from the last attempt. The policy consumes it
    ///   and returns it inside the [RetryResult].
    fn on_error(
        &self,
        loop_start: Instant,
        attempt_count: u32,
        idempotent: bool,
        error: Error,
    ) -> RetryResult;

    /// The time remaining before the policy expires, if the policy has a
    /// deadline. Policies without a deadline return `None`.
    fn remaining_time(&self, _loop_start: Instant, _attempt_count: u32) -> Option<Duration> {
        None
    }
}

/// A helper type to use [RetryPolicy] in client and request options.
#[derive(Clone, Debug)]
pub struct RetryPolicyArg(pub(crate) Arc<dyn RetryPolicy>);

impl<T: RetryPolicy + 'static> From<T> for RetryPolicyArg {
    fn from(value: T) -> Self {
        Self(Arc::new(value))
    }
}

impl From<Arc<dyn RetryPolicy>> for RetryPolicyArg {
    fn from(value: Arc<dyn RetryPolicy>) -> Self {
        Self(value)
    }
}

impl From<RetryPolicyArg> for Arc<dyn RetryPolicy> {
    fn from(value: RetryPolicyArg) -> Self {
        value.0
    }
}

/// Retries errors the service marked as transient, on idempotent operations.
///
/// By default the transient statuses are `429`, `502`, `503`, and `504`.
/// Network errors, where the request may never have reached the service, are
/// always treated as transient. Non-idempotent operations are never retried:
/// the attempt may have been applied even though the response was lost.
///
/// # Example
/// ```
/// use basecamp_gax::retry_policy::TransientErrors;
/// // Treat server errors as transient too:
/// let policy = TransientErrors::new().with_status(500);
/// ```
#[derive(Clone, Debug)]
pub struct TransientErrors {
    retry_on: BTreeSet<u16>,
}

impl TransientErrors {
    /// Creates a policy with the default transient status set.
    pub fn new() -> Self {
        Self {
            retry_on: BTreeSet::from([429, 502, 503, 504]),
        }
    }

    /// Replaces the transient status set.
    pub fn with_retry_on<I: IntoIterator<Item = u16>>(mut self, statuses: I) -> Self {
        self.retry_on = statuses.into_iter().collect();
        self
    }

    /// Adds a status to the transient set.
    pub fn with_status(mut self, status: u16) -> Self {
        self.retry_on.insert(status);
        self
    }

    fn is_transient(&self, error: &Error) -> bool {
        if error.kind() == ErrorKind::Network {
            return true;
        }
        error
            .http_status_code()
            .is_some_and(|status| self.retry_on.contains(&status))
    }
}

impl Default for TransientErrors {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryPolicy for TransientErrors {
    fn on_error(
        &self,
        _loop_start: Instant,
        _attempt_count: u32,
        idempotent: bool,
        error: Error,
    ) -> RetryResult {
        if !self.is_transient(&error) {
            return RetryResult::Permanent(error);
        }
        if !idempotent {
            return RetryResult::Permanent(error);
        }
        RetryResult::Continue(error)
    }
}

/// A retry policy decorator that limits the number of attempts.
///
/// The inner policy classifies the error; this wrapper stops the loop once the
/// attempt budget is spent. An attempt limit of zero is treated as one: the
/// initial attempt always runs.
///
/// # Example
/// ```
/// use basecamp_gax::retry_policy::{LimitedAttemptCount, TransientErrors};
/// let policy = LimitedAttemptCount::custom(
///     TransientErrors::new().with_status(500), 5);
/// ```
#[derive(Clone, Debug)]
pub struct LimitedAttemptCount<P = TransientErrors> {
    inner: P,
    maximum_attempts: u32,
}

impl LimitedAttemptCount {
    /// Creates a policy that retries transient errors up to `maximum_attempts`
    /// total attempts.
    pub fn new(maximum_attempts: u32) -> Self {
        Self::custom(TransientErrors::new(), maximum_attempts)
    }
}

impl<P> LimitedAttemptCount<P> {
    /// Wraps `inner` with an attempt limit.
    pub fn custom(inner: P, maximum_attempts: u32) -> Self {
        Self {
            inner,
            maximum_attempts: maximum_attempts.max(1),
        }
    }
}

impl<P: RetryPolicy> RetryPolicy for LimitedAttemptCount<P> {
    fn on_error(
        &self,
        loop_start: Instant,
        attempt_count: u32,
        idempotent: bool,
        error: Error,
    ) -> RetryResult {
        match self.inner.on_error(loop_start, attempt_count, idempotent, error) {
            RetryResult::Continue(e) if attempt_count >= self.maximum_attempts => {
                RetryResult::Exhausted(e)
            }
            result => result,
        }
    }

    fn remaining_time(&self, loop_start: Instant, attempt_count: u32) -> Option<Duration> {
        self.inner.remaining_time(loop_start, attempt_count)
    }
}
