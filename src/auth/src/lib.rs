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

//! Authentication for the Basecamp client libraries.
//!
//! This crate obtains, caches, and refreshes the OAuth 2.0 tokens used to
//! authenticate requests to the Basecamp API. Most applications do not use
//! this crate directly: the client crate wires it in and refreshes tokens as
//! needed.

pub mod credentials;
pub mod errors;
pub mod strategy;
pub mod token;
pub(crate) mod token_cache;

pub use errors::CredentialsError;

/// The result type used by this crate.
pub type Result<T> = std::result::Result<T, CredentialsError>;
