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

//! Observability hooks for the request pipeline.
//!
//! Applications register a [Hooks] implementation to observe calls as they
//! run. Callbacks come at two levels: operation callbacks bracket one
//! logical call, request callbacks bracket each HTTP request inside it. A
//! paginated walk is one operation spanning several requests, and a retried
//! request reports each scheduled retry in between. The client calls the
//! hooks inline, so implementations should be fast and must not block.

use crate::error::Error;
use std::time::Duration;

/// The outcome of a completed request or operation, passed to
/// [Hooks::on_request_end] and [Hooks::on_operation_end].
#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct RequestOutcome {
    /// The HTTP status code, when a response was received.
    pub status: Option<u16>,
    /// Wall clock time from the first attempt to the final outcome.
    pub elapsed: Duration,
    /// True if the body was served from the conditional request cache.
    pub from_cache: bool,
    /// True if the request failed with a retryable error.
    pub retryable: bool,
}

/// Observes the lifecycle of requests.
///
/// All methods have default no-op implementations, implement only the ones
/// you need.
///
/// # Example
/// ```
/// use basecamp_gax::hooks::{Hooks, RequestOutcome};
///
/// #[derive(Debug)]
/// struct LogHooks;
/// impl Hooks for LogHooks {
///     fn on_request_end(&self, method: &str, url: &str, outcome: &RequestOutcome) {
///         tracing::debug!(method, url, status = ?outcome.status, "request finished");
///     }
/// }
/// ```
pub trait Hooks: Send + Sync + std::fmt::Debug {
    /// Called when a logical call begins, before its first request.
    ///
    /// `target` is the path the caller asked for, before URL resolution.
    fn on_operation_start(&self, _method: &str, _target: &str) {}

    /// Called when a logical call completes, after its last request.
    ///
    /// A paginated walk reports one operation end after the whole walk, no
    /// matter how many pages it fetched.
    fn on_operation_end(&self, _method: &str, _target: &str, _outcome: &RequestOutcome) {}

    /// Called before the first attempt of a request.
    fn on_request_start(&self, _method: &str, _url: &str) {}

    /// Called after the final outcome of a request is known, whether success
    /// or failure.
    fn on_request_end(&self, _method: &str, _url: &str, _outcome: &RequestOutcome) {}

    /// Called when a retry is scheduled, before the wait.
    fn on_retry(&self, _attempt_count: u32, _error: &Error, _delay: Duration) {}
}

/// A [Hooks] implementation that does nothing. The client default.
#[derive(Clone, Debug, Default)]
pub struct NoHooks;

impl Hooks for NoHooks {}

/// A [Hooks] implementation that logs every callback through [tracing].
///
/// Successful calls log at `debug`, failures and retries at `warn`. Register
/// it when an application wants structured request logs without writing its
/// own sink.
#[derive(Clone, Debug, Default)]
pub struct TracingHooks;

impl Hooks for TracingHooks {
    fn on_operation_start(&self, method: &str, target: &str) {
        tracing::debug!(method, target, "operation start");
    }

    fn on_operation_end(&self, method: &str, target: &str, outcome: &RequestOutcome) {
        match outcome.status {
            Some(status) if status < 400 => {
                tracing::debug!(
                    method,
                    target,
                    status,
                    elapsed = ?outcome.elapsed,
                    "operation complete"
                );
            }
            _ => {
                tracing::warn!(
                    method,
                    target,
                    status = ?outcome.status,
                    elapsed = ?outcome.elapsed,
                    "operation failed"
                );
            }
        }
    }

    fn on_request_start(&self, method: &str, url: &str) {
        tracing::debug!(method, url, "request start");
    }

    fn on_request_end(&self, method: &str, url: &str, outcome: &RequestOutcome) {
        match outcome.status {
            Some(status) if status < 400 => {
                tracing::debug!(
                    method,
                    url,
                    status,
                    from_cache = outcome.from_cache,
                    elapsed = ?outcome.elapsed,
                    "request complete"
                );
            }
            _ => {
                tracing::warn!(
                    method,
                    url,
                    status = ?outcome.status,
                    retryable = outcome.retryable,
                    "request failed"
                );
            }
        }
    }

    fn on_retry(&self, attempt_count: u32, error: &Error, delay: Duration) {
        tracing::warn!(attempt_count, %error, delay = ?delay, "retrying");
    }
}

/// Combines multiple hooks into one.
///
/// Starts are delivered in registration order, ends in reverse order, so the
/// first registered hook brackets the others.
#[derive(Debug, Default)]
pub struct ChainHooks {
    chain: Vec<Box<dyn Hooks>>,
}

impl ChainHooks {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a hook to the chain.
    pub fn push<H: Hooks + 'static>(mut self, hooks: H) -> Self {
        self.chain.push(Box::new(hooks));
        self
    }
}

impl Hooks for ChainHooks {
    fn on_operation_start(&self, method: &str, target: &str) {
        for h in self.chain.iter() {
            h.on_operation_start(method, target);
        }
    }

    fn on_operation_end(&self, method: &str, target: &str, outcome: &RequestOutcome) {
        for h in self.chain.iter().rev() {
            h.on_operation_end(method, target, outcome);
        }
    }

    fn on_request_start(&self, method: &str, url: &str) {
        for h in self.chain.iter() {
            h.on_request_start(method, url);
        }
    }

    fn on_request_end(&self, method: &str, url: &str, outcome: &RequestOutcome) {
        for h in self.chain.iter().rev() {
            h.on_request_end(method, url, outcome);
        }
    }

    fn on_retry(&self, attempt_count: u32, error: &Error, delay: Duration) {
        for h in self.chain.iter() {
            h.on_retry(attempt_count, error, delay);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Debug)]
    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
    }

    impl Hooks for Recorder {
        fn on_operation_start(&self, _method: &str, _target: &str) {
            self.log.lock().unwrap().push(format!("{}:op-start", self.name));
        }
        fn on_operation_end(&self, _method: &str, _target: &str, _outcome: &RequestOutcome) {
            self.log.lock().unwrap().push(format!("{}:op-end", self.name));
        }
        fn on_request_start(&self, _method: &str, _url: &str) {
            self.log.lock().unwrap().push(format!("{}:start", self.name));
        }
        fn on_request_end(&self, _method: &str, _url: &str, _outcome: &RequestOutcome) {
            self.log.lock().unwrap().push(format!("{}:end", self.name));
        }
        fn on_retry(&self, _attempt_count: u32, _error: &Error, _delay: Duration) {
            self.log.lock().unwrap().push(format!("{}:retry", self.name));
        }
    }

    #[test]
    fn chain_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = ChainHooks::new()
            .push(Recorder {
                name: "a",
                log: log.clone(),
            })
            .push(Recorder {
                name: "b",
                log: log.clone(),
            });

        chain.on_request_start("GET", "https://example.com/");
        chain.on_retry(1, &Error::rate_limit("slow down"), Duration::from_secs(1));
        chain.on_request_end("GET", "https://example.com/", &RequestOutcome::default());

        let got = log.lock().unwrap().clone();
        assert_eq!(
            got,
            vec!["a:start", "b:start", "a:retry", "b:retry", "b:end", "a:end"]
        );
    }

    #[test]
    fn chain_nests_operations_around_requests() {
        // The first registered hook opens first and closes last, at both
        // levels, so its span contains everything.
        let log = Arc::new(Mutex::new(Vec::new()));
        let chain = ChainHooks::new()
            .push(Recorder {
                name: "a",
                log: log.clone(),
            })
            .push(Recorder {
                name: "b",
                log: log.clone(),
            });

        chain.on_operation_start("GET", "/12345/todos.json");
        for _page in 0..2 {
            chain.on_request_start("GET", "https://example.com/12345/todos.json");
            chain.on_request_end(
                "GET",
                "https://example.com/12345/todos.json",
                &RequestOutcome::default(),
            );
        }
        chain.on_operation_end("GET", "/12345/todos.json", &RequestOutcome::default());

        let got = log.lock().unwrap().clone();
        assert_eq!(
            got,
            vec![
                "a:op-start",
                "b:op-start",
                "a:start",
                "b:start",
                "b:end",
                "a:end",
                "a:start",
                "b:start",
                "b:end",
                "a:end",
                "b:op-end",
                "a:op-end",
            ]
        );
    }

    #[test]
    fn no_hooks_is_silent() {
        let hooks = NoHooks;
        hooks.on_operation_start("GET", "/x.json");
        hooks.on_request_start("GET", "https://example.com/");
        hooks.on_request_end("GET", "https://example.com/", &RequestOutcome::default());
        hooks.on_retry(1, &Error::api("x"), Duration::ZERO);
        hooks.on_operation_end("GET", "/x.json", &RequestOutcome::default());
    }

    #[test]
    fn tracing_hooks_accept_every_callback() {
        let hooks = TracingHooks;
        hooks.on_operation_start("GET", "/x.json");
        hooks.on_request_start("GET", "https://example.com/");
        hooks.on_retry(1, &Error::rate_limit("slow down"), Duration::from_secs(1));

        let mut ok = RequestOutcome::default();
        ok.status = Some(200);
        hooks.on_request_end("GET", "https://example.com/", &ok);

        let mut failed = RequestOutcome::default();
        failed.status = Some(503);
        failed.retryable = true;
        hooks.on_request_end("GET", "https://example.com/", &failed);
        hooks.on_operation_end("GET", "/x.json", &failed);
    }
}
