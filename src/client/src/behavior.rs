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

//! Per-operation behavior metadata.
//!
//! Most operations follow the method defaults: `GET` requests are
//! idempotent and retried, mutations are not. A few mutations are safe to
//! repeat, for example completing a to-do twice leaves it completed. The
//! table here records those exceptions, derived from the `x-basecamp-retry`
//! extensions in the API description, and the generated service layers
//! consult it via [options_for] when they build a request.

use gax::backoff_policy::ConstantDelay;
use gax::exponential_backoff::ExponentialBackoffBuilder;
use gax::options::RequestOptions;
use gax::retry_policy::{LimitedAttemptCount, TransientErrors};
use std::time::Duration;

/// How the delay between attempts grows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackoffKind {
    /// The same delay after every attempt.
    Constant,
    /// Exponential growth with bounded jitter.
    Exponential,
}

/// The retry and idempotency profile of one operation.
#[derive(Clone, Debug, PartialEq)]
pub struct Behavior {
    /// True if the operation is safe to send more than once.
    pub idempotent: bool,
    /// The HTTP statuses this operation treats as transient.
    pub retry_on: &'static [u16],
    /// The total attempt budget, including the first attempt.
    pub max_attempts: u32,
    /// The starting delay between attempts.
    pub base_delay: Duration,
    /// The delay growth curve.
    pub backoff: BackoffKind,
}

impl Behavior {
    /// Builds the request options implementing this profile.
    pub fn request_options(&self) -> RequestOptions {
        let mut options = RequestOptions::default();
        options.set_idempotency(self.idempotent);
        options.set_retry_policy(LimitedAttemptCount::custom(
            TransientErrors::new().with_retry_on(self.retry_on.iter().copied()),
            self.max_attempts,
        ));
        match self.backoff {
            BackoffKind::Constant => {
                options.set_backoff_policy(ConstantDelay::new(self.base_delay));
            }
            BackoffKind::Exponential => {
                options.set_backoff_policy(
                    ExponentialBackoffBuilder::new()
                        .with_initial_delay(self.base_delay)
                        .clamp(),
                );
            }
        }
        options
    }
}

const DEFAULT_RETRY_ON: &[u16] = &[429, 503];

const DEFAULT_GET: Behavior = Behavior {
    idempotent: true,
    retry_on: DEFAULT_RETRY_ON,
    max_attempts: 5,
    base_delay: Duration::from_millis(500),
    backoff: BackoffKind::Exponential,
};

// Operations that deviate from the method defaults. Mutations listed here
// are idempotent by construction: repeating them converges to the same
// state.
const OPERATIONS: &[(&str, Behavior)] = &[
    (
        "todos.complete",
        Behavior {
            idempotent: true,
            retry_on: DEFAULT_RETRY_ON,
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            backoff: BackoffKind::Exponential,
        },
    ),
    (
        "todos.uncomplete",
        Behavior {
            idempotent: true,
            retry_on: DEFAULT_RETRY_ON,
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            backoff: BackoffKind::Exponential,
        },
    ),
    (
        "recordings.trash",
        Behavior {
            idempotent: true,
            retry_on: DEFAULT_RETRY_ON,
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            backoff: BackoffKind::Exponential,
        },
    ),
    (
        "subscriptions.subscribe",
        Behavior {
            idempotent: true,
            retry_on: DEFAULT_RETRY_ON,
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
            backoff: BackoffKind::Exponential,
        },
    ),
    // Search hits a replicated backend where transient 500s are common.
    (
        "search.all",
        Behavior {
            idempotent: true,
            retry_on: &[429, 500, 503],
            max_attempts: 5,
            base_delay: Duration::from_millis(500),
            backoff: BackoffKind::Constant,
        },
    ),
];

/// Looks up the profile of a named operation, if it deviates from the
/// method defaults.
pub fn lookup(operation: &str) -> Option<&'static Behavior> {
    OPERATIONS
        .iter()
        .find(|(name, _)| *name == operation)
        .map(|(_, behavior)| behavior)
}

/// The request options for a named operation.
///
/// Operations absent from the table get the default `GET` profile when
/// `method` is idempotent, and a single-attempt profile otherwise.
pub fn options_for(operation: &str, method: &http::Method) -> RequestOptions {
    if let Some(behavior) = lookup(operation) {
        return behavior.request_options();
    }
    if method_idempotent(method) {
        return DEFAULT_GET.request_options();
    }
    RequestOptions::default()
}

/// The default idempotency of an HTTP method.
pub(crate) fn method_idempotent(method: &http::Method) -> bool {
    *method == http::Method::GET || *method == http::Method::HEAD
}
