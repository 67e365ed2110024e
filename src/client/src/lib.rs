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

//! The Basecamp API request pipeline.
//!
//! This crate owns the full lifecycle of one logical Basecamp API call:
//! it builds the HTTP request, attaches credentials, dispatches it (possibly
//! several times under retry), interprets the response, raises typed errors,
//! and optionally continues across pages.
//!
//! The generated service layers depend on this crate and call the
//! [Client::request], [Client::request_void], and [Client::request_paginated]
//! entry points. Applications typically construct one [Client] and share it.
//!
//! # Example
//! ```no_run
//! use basecamp_client::{Client, RequestSpec};
//! # async fn sample(
//! #     token_provider: impl auth::token::TokenProvider + 'static,
//! # ) -> anyhow::Result<()> {
//! let client = Client::builder()
//!     .with_auth(auth::strategy::BearerAuth::new(token_provider))
//!     .build()?;
//! let spec = RequestSpec::new(http::Method::GET, "/12345/projects.json");
//! let projects: gax::response::Response<Vec<serde_json::Value>> =
//!     client.request(spec, gax::options::RequestOptions::default()).await?;
//! # Ok(()) }
//! ```

/// Per-operation behavior metadata.
pub mod behavior;

/// The client builder and its configuration.
pub mod builder;

/// The client and the request entry points.
pub mod client;

/// The bounded cache backing conditional requests.
pub mod etag_cache;

pub(crate) mod classify;
pub(crate) mod link;
pub(crate) mod origin;
pub(crate) mod redact;
pub(crate) mod retry_after;

pub use builder::ClientBuilder;
pub use client::{Client, RequestSpec};

// The policy and auth vocabulary crates, re-exported for convenience.
pub use auth;
pub use gax;
