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

//! Basecamp API helpers.
//!
//! This crate contains the types and functions shared by the Basecamp client
//! libraries for Rust: the error taxonomy, the retry and backoff policies, the
//! generic retry loop, request options, the response envelope, and the
//! observability hooks.
//!
//! Applications rarely depend on this crate directly. It is re-exported where
//! needed by the `basecamp-client` crate.

/// An alias of [std::result::Result] where the error is always [crate::error::Error].
///
/// This is the result type used by all functions wrapping API requests.
pub type Result<T> = std::result::Result<T, crate::error::Error>;

/// The error type used by all Basecamp client libraries.
pub mod error;

/// Traits and implementations to control retry loops.
pub mod retry_policy;

/// Retry loop control types.
pub mod retry_result;

/// Traits for backoff policies.
pub mod backoff_policy;

/// Truncated exponential backoff with jitter.
pub mod exponential_backoff;

/// The generic retry loop used by the request pipeline.
pub mod retry_loop;

/// Per-request options.
pub mod options;

/// Response types.
pub mod response;

/// Observability hooks for the request pipeline.
pub mod hooks;

#[cfg(test)]
pub(crate) mod mock_rng;
