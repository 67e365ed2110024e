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

//! Response types.
//!
//! This module contains types related to Basecamp service responses. Notably
//! it contains the `Response` type itself, combining a deserialized body with
//! the response metadata: headers, cache provenance, and pagination totals.
//!
//! # Examples
//!
//! Inspecting the result of a request
//!
//! ```no_run
//! # use basecamp_gax::Result;
//! # use basecamp_gax::response::Response;
//! // A type representing a Basecamp resource, for example a to-do list.
//! struct Resource {
//!   // ...
//! }
//!
//! async fn fetch_resource(id: u64) -> Result<Response<Resource>> {
//!   // ...
//! # panic!()
//! }
//!
//! # tokio_test::block_on(async {
//! let response = fetch_resource(123).await?;
//! if response.from_cache() {
//!     // served from the conditional request cache
//! }
//! let resource = response.body();
//! // do something with it
//! # Result::<()>::Ok(()) });
//! ```

/// Represents a Basecamp service response.
///
/// A response consists of a body (potentially the unit type) and some
/// metadata: the headers, whether the body was served from the conditional
/// request cache, and pagination totals when the service reports them.
///
/// Typically you get a response as the result of making a request via the
/// client. You may also create responses directly when mocking the client in
/// your own tests.
///
/// # Example
/// ```
/// # use basecamp_gax::Result;
/// # use basecamp_gax::response::Response;
/// struct Resource {
///   // ...
/// }
///
/// fn make_mock_response(body: Resource) -> Result<Response<Resource>> {
///     Ok(Response::from(body))
/// }
/// ```
#[derive(Clone, Debug)]
pub struct Response<T> {
    parts: Parts,
    body: T,
}

impl<T> Response<T> {
    /// Creates a response from the body.
    ///
    /// # Example
    /// ```
    /// # use basecamp_gax::response::Response;
    /// #[derive(Clone, Default)]
    /// pub struct Resource {
    ///   // ...
    /// }
    ///
    /// let body = Resource::default();
    /// let response = Response::from(body);
    /// ```
    pub fn from(body: T) -> Self {
        Self {
            body,
            parts: Parts::default(),
        }
    }

    /// Creates a response from the given parts.
    ///
    /// # Example
    /// ```
    /// # use basecamp_gax::response::Response;
    /// # use basecamp_gax::response::Parts;
    /// #[derive(Clone, Default)]
    /// pub struct Resource {
    ///   // ...
    /// }
    ///
    /// let mut headers = http::HeaderMap::new();
    /// headers.insert(http::header::CONTENT_TYPE, http::HeaderValue::from_static("application/json"));
    /// let body = Resource::default();
    /// let response : Response<Resource> = Response::from_parts(
    ///     Parts::new().set_headers(headers), body);
    /// assert!(response.headers().get(http::header::CONTENT_TYPE).is_some());
    /// ```
    pub fn from_parts(parts: Parts, body: T) -> Self {
        Self { parts, body }
    }

    /// Returns the headers associated with this response.
    ///
    /// # Example
    /// ```
    /// # use basecamp_gax::response::Response;
    /// let response = Response::from(());
    /// assert!(response.headers().is_empty());
    /// ```
    pub fn headers(&self) -> &http::HeaderMap<http::HeaderValue> {
        &self.parts.headers
    }

    /// Returns true if the body was served from the conditional request cache.
    ///
    /// When the client holds a cached copy and the service responds with
    /// `304 Not Modified`, the cached body is returned and this flag is set.
    pub fn from_cache(&self) -> bool {
        self.parts.from_cache
    }

    /// Returns the pagination totals, if the service reported any.
    pub fn list_meta(&self) -> Option<&ListMeta> {
        self.parts.list.as_ref()
    }

    /// Returns the body associated with this response.
    ///
    /// # Example
    /// ```
    /// # use basecamp_gax::response::Response;
    /// let response = Response::from("test".to_string());
    /// assert_eq!(response.body().as_str(), "test");
    /// ```
    pub fn body(&self) -> &T {
        &self.body
    }

    /// Consumes the response returning the metadata, and body.
    ///
    /// # Example
    /// ```
    /// # use basecamp_gax::response::Response;
    /// let response = Response::from("test".to_string());
    /// let (parts, body) = response.into_parts();
    /// assert_eq!(body.as_str(), "test");
    /// assert!(parts.headers.is_empty());
    /// ```
    pub fn into_parts(self) -> (Parts, T) {
        (self.parts, self.body)
    }

    /// Consumes the response returning only its body.
    ///
    /// # Example
    /// ```
    /// # use basecamp_gax::response::Response;
    /// let response = Response::from("test".to_string());
    /// let body = response.into_body();
    /// assert_eq!(body.as_str(), "test");
    /// ```
    pub fn into_body(self) -> T {
        self.body
    }
}

/// Component parts of a response.
///
/// The response parts, other than the body, consist of the headers, the cache
/// provenance, and the pagination totals. We anticipate the addition of new
/// fields over time.
///
/// # Example
/// ```
/// # use basecamp_gax::response::Parts;
/// let mut headers = http::HeaderMap::new();
/// headers.insert(http::header::CONTENT_TYPE, http::HeaderValue::from_static("application/json"));
/// let parts = Parts::new().set_headers(headers);
///
/// assert_eq!(
///     parts.headers.get(http::header::CONTENT_TYPE),
///     Some(&http::HeaderValue::from_static("application/json"))
/// );
/// ```
#[derive(Clone, Debug, Default)]
#[non_exhaustive]
pub struct Parts {
    /// The HTTP headers.
    pub headers: http::HeaderMap<http::HeaderValue>,
    /// True if the body came from the conditional request cache.
    pub from_cache: bool,
    /// Pagination totals, when the service reports them.
    pub list: Option<ListMeta>,
}

impl Parts {
    /// Create a new instance.
    ///
    /// # Example
    /// ```
    /// # use basecamp_gax::response::Parts;
    /// let parts = Parts::new();
    /// assert!(parts.headers.is_empty());
    /// ```
    pub fn new() -> Self {
        Parts::default()
    }

    /// Set the headers.
    ///
    /// # Example
    /// ```
    /// # use basecamp_gax::response::Parts;
    /// let mut headers = http::HeaderMap::new();
    /// headers.insert(
    ///     http::header::CONTENT_TYPE,
    ///     http::HeaderValue::from_static("application/json"),
    /// );
    /// let parts = Parts::new().set_headers(headers.clone());
    /// assert_eq!(parts.headers, headers);
    /// ```
    pub fn set_headers<V>(mut self, v: V) -> Self
    where
        V: Into<http::HeaderMap>,
    {
        self.headers = v.into();
        self
    }

    /// Mark the body as served from the conditional request cache.
    pub fn set_from_cache(mut self, v: bool) -> Self {
        self.from_cache = v;
        self
    }

    /// Set the pagination totals.
    pub fn set_list_meta<V>(mut self, v: V) -> Self
    where
        V: Into<Option<ListMeta>>,
    {
        self.list = v.into();
        self
    }
}

/// Pagination totals for a list response.
///
/// Populated from the `X-Total-Count` header when the service sends it. The
/// `truncated` flag is set when the client stopped fetching pages before the
/// service ran out of them, because of a page or item limit.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListMeta {
    /// The total number of items the service reports across all pages.
    pub total_count: u64,
    /// True if the client stopped before fetching all pages.
    pub truncated: bool,
}
