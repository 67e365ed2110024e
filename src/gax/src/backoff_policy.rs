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

//! Defines the trait for backoff policies and some common implementations.
//!
//! The retry loop waits between attempts. A backoff policy computes how long,
//! typically growing the delay exponentially with some jitter. See
//! [ExponentialBackoff][crate::exponential_backoff::ExponentialBackoff] for
//! the default implementation.

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Computes the delay before the next attempt.
pub trait BackoffPolicy: Send + Sync + std::fmt::Debug {
    /// Returns the backoff delay after a failed attempt.
    ///
    /// # Parameters
    /// * `loop_start` - when the retry loop started.
    /// * `attempt_count` - the number of attempts made so far, starting at one
    ///   for the initial attempt.
    fn on_failure(&self, loop_start: Instant, attempt_count: u32) -> Duration;
}

/// A helper type to use [BackoffPolicy] in client and request options.
#[derive(Clone, Debug)]
pub struct BackoffPolicyArg(pub(crate) Arc<dyn BackoffPolicy>);

impl<T: BackoffPolicy + 'static> From<T> for BackoffPolicyArg {
    fn from(value: T) -> Self {
        Self(Arc::new(value))
    }
}

impl From<Arc<dyn BackoffPolicy>> for BackoffPolicyArg {
    fn from(value: Arc<dyn BackoffPolicy>) -> Self {
        Self(value)
    }
}

impl From<BackoffPolicyArg> for Arc<dyn BackoffPolicy> {
    fn from(value: BackoffPolicyArg) -> Self {
        value.0
    }
}

/// Waits the same delay after every failed attempt.
///
/// Some operations prefer a flat wait over exponential growth, for example
/// when the service's own `Retry-After` values are expected to do the
/// pacing. A zero delay is clamped to one millisecond.
///
/// # Example
/// ```
/// use basecamp_gax::backoff_policy::ConstantDelay;
/// use std::time::Duration;
/// let policy = ConstantDelay::new(Duration::from_millis(250));
/// ```
#[derive(Clone, Debug)]
pub struct ConstantDelay {
    delay: Duration,
}

impl ConstantDelay {
    /// Creates a policy waiting `delay` between attempts.
    pub fn new(delay: Duration) -> Self {
        Self {
            delay: delay.max(Duration::from_millis(1)),
        }
    }
}

impl BackoffPolicy for ConstantDelay {
    fn on_failure(&self, _loop_start: Instant, _attempt_count: u32) -> Duration {
        self.delay
    }
}
