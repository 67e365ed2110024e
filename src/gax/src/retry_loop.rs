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

use super::Result;
use super::backoff_policy::BackoffPolicy;
use super::error::Error;
use super::retry_policy::RetryPolicy;
use super::retry_result::RetryResult;
use std::sync::Arc;
use std::time::Duration;

enum RetryLoopAttempt {
    // The first attempt
    Initial,
    // (Attempt count, wait delay, previous error)
    Retry(u32, Duration, Error),
}

impl RetryLoopAttempt {
    fn count(&self) -> u32 {
        match self {
            RetryLoopAttempt::Initial => 0,
            RetryLoopAttempt::Retry(count, _, _) => *count,
        }
    }
}

/// Runs the retry loop for a given function.
///
/// This function calls an inner function as long as (1) the retry policy has
/// not expired, and (2) the inner function has not returned a successful
/// response.
///
/// In between calls the function waits. When the last error carries a
/// `Retry-After` delay from the service, that delay is used; otherwise the
/// backoff policy computes one. The wait itself goes through `sleep`, so
/// tests can substitute a mock.
pub async fn retry_loop<F, S, Response>(
    inner: F,
    sleep: S,
    idempotent: bool,
    retry_policy: Arc<dyn RetryPolicy>,
    backoff_policy: Arc<dyn BackoffPolicy>,
) -> Result<Response>
where
    F: AsyncFnMut(Option<Duration>) -> Result<Response> + Send,
    S: AsyncFn(Duration) -> () + Send,
{
    retry_loop_with_callback(
        inner,
        sleep,
        idempotent,
        retry_policy,
        backoff_policy,
        |_, _, _| {},
    )
    .await
}

/// Runs the retry loop for a given function with a callback for retries.
///
/// Identical to [retry_loop], except that `on_retry` is called before each
/// sleep, with the attempt count, the error, and the delay. Clients use the
/// callback to drive observability hooks.
pub async fn retry_loop_with_callback<F, S, OnRetry, Response>(
    mut inner: F,
    sleep: S,
    idempotent: bool,
    retry_policy: Arc<dyn RetryPolicy>,
    backoff_policy: Arc<dyn BackoffPolicy>,
    mut on_retry: OnRetry,
) -> Result<Response>
where
    F: AsyncFnMut(Option<Duration>) -> Result<Response> + Send,
    S: AsyncFn(Duration) -> () + Send,
    OnRetry: FnMut(u32, &Error, Duration) + Send,
{
    let loop_start = tokio::time::Instant::now().into_std();
    let mut attempt_state = RetryLoopAttempt::Initial;
    loop {
        let mut attempt_count = attempt_state.count();
        let remaining_time = retry_policy.remaining_time(loop_start, attempt_count);

        if let RetryLoopAttempt::Retry(attempt_count, delay, prev_error) = attempt_state {
            if remaining_time.is_some_and(|remaining| remaining < delay) {
                return Err(prev_error);
            }
            tracing::debug!(attempt_count, delay = ?delay, error = %prev_error, "retry scheduled");
            on_retry(attempt_count, &prev_error, delay);
            sleep(delay).await;
        }
        attempt_count += 1;
        match inner(remaining_time).await {
            Ok(r) => {
                return Ok(r);
            }
            Err(e) => {
                // The service may request a specific wait via `Retry-After`.
                // It knows its own load better than our backoff does.
                let requested = e.retry_after();
                match retry_policy.on_error(loop_start, attempt_count, idempotent, e) {
                    RetryResult::Permanent(e) | RetryResult::Exhausted(e) => return Err(e),
                    RetryResult::Continue(e) => {
                        let delay = requested
                            .unwrap_or_else(|| backoff_policy.on_failure(loop_start, attempt_count));
                        attempt_state = RetryLoopAttempt::Retry(attempt_count, delay, e);
                        continue;
                    }
                }
            }
        };
    }
}

/// A helper to compute the time remaining in a retry loop, given the attempt
/// timeout and the overall timeout.
pub fn effective_timeout(
    options: &crate::options::RequestOptions,
    remaining_time: Option<Duration>,
) -> Option<Duration> {
    match (options.attempt_timeout(), remaining_time) {
        (None, None) => None,
        (None, Some(t)) => Some(t),
        (Some(t), None) => Some(*t),
        (Some(a), Some(r)) => Some(*std::cmp::min(a, &r)),
    }
}
