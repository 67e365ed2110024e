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

use crate::behavior;
use crate::builder::ClientBuilder;
use crate::classify;
use crate::etag_cache::EtagCache;
use crate::link;
use crate::origin::{is_localhost, same_origin};
use auth::strategy::AuthStrategy;
use bytes::Bytes;
use gax::Result;
use gax::backoff_policy::BackoffPolicy;
use gax::error::{Error, ErrorKind};
use gax::exponential_backoff::ExponentialBackoff;
use gax::hooks::{Hooks, RequestOutcome};
use gax::options::RequestOptions;
use gax::response::{ListMeta, Parts, Response};
use gax::retry_loop::{effective_timeout, retry_loop_with_callback};
use gax::retry_policy::RetryPolicy;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use url::Url;

// Success bodies are large for attachment metadata and long lists; error
// bodies never need more than a message.
const MAX_RESPONSE_BODY_BYTES: usize = 50 * 1024 * 1024;
const MAX_ERROR_BODY_BYTES: usize = 1024 * 1024;

const DEFAULT_MAX_PAGES: u32 = 100;

/// Describes one logical API call.
///
/// A spec is immutable once built: retries reuse it unchanged, only the
/// auth headers and the attempt counter vary per attempt.
///
/// # Example
/// ```
/// use basecamp_client::RequestSpec;
/// let spec = RequestSpec::new(http::Method::GET, "/12345/projects.json")
///     .with_query("status", "archived");
/// assert_eq!(spec.method(), &http::Method::GET);
/// ```
#[derive(Clone, Debug)]
pub struct RequestSpec {
    method: http::Method,
    path: String,
    query: Vec<(String, String)>,
    body: Option<Body>,
}

#[derive(Clone, Debug)]
pub(crate) enum Body {
    Json(Bytes),
    Binary { content_type: String, data: Bytes },
}

impl RequestSpec {
    /// Creates a spec for `method` on `path`.
    ///
    /// The path is resolved against the client endpoint. An absolute
    /// `https://` URL is used as-is.
    pub fn new<T: Into<String>>(method: http::Method, path: T) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Appends a query parameter.
    pub fn with_query<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attaches a JSON body, serialized once up front.
    pub fn with_json<T: serde::Serialize>(mut self, body: &T) -> Result<Self> {
        let data = serde_json::to_vec(body)
            .map_err(|e| Error::usage("failed to serialize request body").set_source(e))?;
        self.body = Some(Body::Json(Bytes::from(data)));
        Ok(self)
    }

    /// Attaches a binary body with the given content type.
    ///
    /// Attachment uploads use this with `application/octet-stream`.
    pub fn with_binary<T: Into<String>>(mut self, content_type: T, data: Bytes) -> Self {
        self.body = Some(Body::Binary {
            content_type: content_type.into(),
            data,
        });
        self
    }

    /// The HTTP method.
    pub fn method(&self) -> &http::Method {
        &self.method
    }

    /// The path or absolute URL.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub(crate) fn query(&self) -> &[(String, String)] {
        &self.query
    }

    pub(crate) fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }
}

// One HTTP exchange, after cache resolution. A `304 Not Modified` answer
// is already folded into the cached body here.
#[derive(Debug)]
struct RawResponse {
    status: u16,
    headers: http::HeaderMap,
    body: Bytes,
    from_cache: bool,
}

/// A client for the Basecamp API.
///
/// The client owns the request pipeline: dispatch, authentication,
/// response interpretation, error classification, retries, pagination,
/// and the conditional request cache. It is cheap to clone and safe to
/// share across tasks.
#[derive(Clone, Debug)]
pub struct Client {
    inner: reqwest::Client,
    endpoint: String,
    auth: Arc<dyn AuthStrategy>,
    retry_policy: Option<Arc<dyn RetryPolicy>>,
    backoff_policy: Option<Arc<dyn BackoffPolicy>>,
    hooks: Arc<dyn Hooks>,
    cache: Option<Arc<EtagCache>>,
    user_agent: String,
}

impl Client {
    /// Returns a builder with the default configuration.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        endpoint: String,
        auth: Arc<dyn AuthStrategy>,
        retry_policy: Option<Arc<dyn RetryPolicy>>,
        backoff_policy: Option<Arc<dyn BackoffPolicy>>,
        hooks: Arc<dyn Hooks>,
        cache: Option<Arc<EtagCache>>,
        user_agent: String,
    ) -> Self {
        Self {
            inner: reqwest::Client::new(),
            endpoint,
            auth,
            retry_policy,
            backoff_policy,
            hooks,
            cache,
            user_agent,
        }
    }

    /// The configured endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// The conditional request cache, if one was enabled.
    pub fn cache(&self) -> Option<&EtagCache> {
        self.cache.as_deref()
    }

    /// Performs a request and deserializes the response body.
    ///
    /// A `204 No Content` response yields `O::default()`.
    pub async fn request<O>(&self, spec: RequestSpec, options: RequestOptions) -> Result<Response<O>>
    where
        O: serde::de::DeserializeOwned + Default,
    {
        let method = spec.method().clone();
        let target = spec.path().to_string();
        self.hooks.on_operation_start(method.as_str(), &target);
        let start = std::time::Instant::now();
        let result = self.request_inner(spec, options).await;
        self.hooks
            .on_operation_end(method.as_str(), &target, &operation_outcome(start, &result));
        result.map(|(_, response)| response)
    }

    async fn request_inner<O>(
        &self,
        spec: RequestSpec,
        options: RequestOptions,
    ) -> Result<(u16, Response<O>)>
    where
        O: serde::de::DeserializeOwned + Default,
    {
        let url = self.resolve_url(&spec)?;
        let raw = self
            .call(spec.method(), spec.body(), &url, &options)
            .await?;
        let body = if raw.body.is_empty() && raw.status == 204 {
            O::default()
        } else {
            serde_json::from_slice::<O>(&raw.body)
                .map_err(|e| Error::api("failed to parse response body").set_source(e))?
        };
        Ok((
            raw.status,
            Response::from_parts(
                Parts::new()
                    .set_headers(raw.headers)
                    .set_from_cache(raw.from_cache),
                body,
            ),
        ))
    }

    /// Performs a request, discarding any response body.
    pub async fn request_void(
        &self,
        spec: RequestSpec,
        options: RequestOptions,
    ) -> Result<Response<()>> {
        let method = spec.method().clone();
        let target = spec.path().to_string();
        self.hooks.on_operation_start(method.as_str(), &target);
        let start = std::time::Instant::now();
        let result = self.request_void_inner(spec, options).await;
        self.hooks
            .on_operation_end(method.as_str(), &target, &operation_outcome(start, &result));
        result.map(|(_, response)| response)
    }

    async fn request_void_inner(
        &self,
        spec: RequestSpec,
        options: RequestOptions,
    ) -> Result<(u16, Response<()>)> {
        let url = self.resolve_url(&spec)?;
        let raw = self
            .call(spec.method(), spec.body(), &url, &options)
            .await?;
        Ok((
            raw.status,
            Response::from_parts(
                Parts::new()
                    .set_headers(raw.headers)
                    .set_from_cache(raw.from_cache),
                (),
            ),
        ))
    }

    /// Performs a `GET` request and follows `Link` pagination.
    ///
    /// List endpoints return bare JSON arrays; the items accumulate across
    /// pages. The result carries [ListMeta] describing the total count the
    /// service reported, and whether a page or item limit stopped the walk
    /// early.
    ///
    /// Every next-page link must share the origin of the first request,
    /// otherwise pagination stops with an error before contacting the
    /// foreign host.
    pub async fn request_paginated(
        &self,
        spec: RequestSpec,
        options: RequestOptions,
    ) -> Result<Response<Vec<serde_json::Value>>> {
        let method = spec.method().clone();
        let target = spec.path().to_string();
        self.hooks.on_operation_start(method.as_str(), &target);
        let start = std::time::Instant::now();
        let result = self.request_paginated_inner(spec, options).await;
        self.hooks
            .on_operation_end(method.as_str(), &target, &operation_outcome(start, &result));
        result.map(|(_, response)| response)
    }

    async fn request_paginated_inner(
        &self,
        spec: RequestSpec,
        options: RequestOptions,
    ) -> Result<(u16, Response<Vec<serde_json::Value>>)> {
        if *spec.method() != http::Method::GET {
            return Err(Error::usage(format!(
                "paginated requests must use GET, got {}",
                spec.method()
            )));
        }
        let first = self.resolve_url(&spec)?;
        let max_pages = options.max_pages().unwrap_or(DEFAULT_MAX_PAGES).max(1);
        let max_items = options.max_items();

        let mut items = Vec::new();
        let mut total_count = 0_u64;
        let mut truncated = false;
        let mut page_url = first.clone();
        let mut pages = 0_u32;
        let (status, headers) = loop {
            let raw = self
                .call(&http::Method::GET, None, &page_url, &options)
                .await?;
            pages += 1;
            if total_count == 0 {
                total_count = link::total_count(&raw.headers);
            }
            let page: Vec<serde_json::Value> = serde_json::from_slice(&raw.body)
                .map_err(|e| Error::api("failed to parse list response").set_source(e))?;
            items.extend(page);

            let next = link::next_link(&raw.headers);
            if let Some(cap) = max_items {
                if items.len() >= cap {
                    truncated = items.len() > cap || next.is_some();
                    items.truncate(cap);
                    break (raw.status, raw.headers);
                }
            }
            let Some(next) = next else {
                break (raw.status, raw.headers);
            };
            if pages >= max_pages {
                truncated = true;
                tracing::warn!(max_pages, "pagination capped before the last page");
                break (raw.status, raw.headers);
            }
            // Relative links resolve against the page that sent them.
            let next_url = page_url.join(&next).map_err(|e| {
                Error::api(format!("invalid pagination link: {next}")).set_source(e)
            })?;
            if !same_origin(&first, &next_url) {
                return Err(Error::api(format!(
                    "pagination link points to a different origin: {next_url}"
                )));
            }
            page_url = next_url;
        };

        Ok((
            status,
            Response::from_parts(
                Parts::new().set_headers(headers).set_list_meta(ListMeta {
                    total_count,
                    truncated,
                }),
                items,
            ),
        ))
    }

    fn resolve_url(&self, spec: &RequestSpec) -> Result<Url> {
        let target = spec.path();
        let mut url = if target.starts_with("https://") || target.starts_with("http://") {
            let url = Url::parse(target).map_err(|e| {
                Error::usage(format!("invalid request URL: {target}")).set_source(e)
            })?;
            let exempt = url.host_str().is_some_and(is_localhost);
            if url.scheme() != "https" && !exempt {
                return Err(Error::usage(format!(
                    "request URLs must use HTTPS: {target}"
                )));
            }
            url
        } else {
            let path = if target.starts_with('/') {
                target.to_string()
            } else {
                format!("/{target}")
            };
            Url::parse(&format!("{}{}", self.endpoint, path)).map_err(|e| {
                Error::usage(format!("invalid request path: {target}")).set_source(e)
            })?
        };
        if !spec.query().is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in spec.query() {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    // Runs one logical call: hooks, the optional retry loop, and the
    // once-per-call credential refresh on 401.
    async fn call(
        &self,
        method: &http::Method,
        body: Option<&Body>,
        url: &Url,
        options: &RequestOptions,
    ) -> Result<RawResponse> {
        let options = gax::options::internal::set_default_idempotency(
            options.clone(),
            behavior::method_idempotent(method),
        );
        self.hooks.on_request_start(method.as_str(), url.as_str());
        let start = std::time::Instant::now();
        let result = self.call_inner(method, body, url, &options).await;

        let mut outcome = RequestOutcome::default();
        outcome.elapsed = start.elapsed();
        match &result {
            Ok(raw) => {
                outcome.status = Some(raw.status);
                outcome.from_cache = raw.from_cache;
            }
            Err(e) => {
                outcome.status = e.http_status_code();
                outcome.retryable = e.is_retryable();
            }
        }
        self.hooks.on_request_end(method.as_str(), url.as_str(), &outcome);
        result
    }

    async fn call_inner(
        &self,
        method: &http::Method,
        body: Option<&Body>,
        url: &Url,
        options: &RequestOptions,
    ) -> Result<RawResponse> {
        // A rejected token triggers at most one refresh and replay per
        // logical call, even across retries.
        let refreshed = AtomicBool::new(false);
        let inner = async |remaining: Option<std::time::Duration>| {
            let result = self.attempt(method, body, url, options, remaining).await;
            let Err(e) = result else {
                return result;
            };
            let rejected =
                e.kind() == ErrorKind::Auth && e.http_status_code() == Some(401);
            if rejected
                && !refreshed.swap(true, Ordering::SeqCst)
                && self.auth.on_unauthorized().await
            {
                tracing::debug!("credentials refreshed, replaying request");
                return self.attempt(method, body, url, options, remaining).await;
            }
            Err(e)
        };
        match self.get_retry_policy(options) {
            None => inner(None).await,
            Some(retry_policy) => {
                let idempotent = options.idempotent().unwrap_or(false);
                let backoff = self.get_backoff_policy(options);
                let sleep = async |d| tokio::time::sleep(d).await;
                retry_loop_with_callback(
                    inner,
                    sleep,
                    idempotent,
                    retry_policy,
                    backoff,
                    |count, error, delay| self.hooks.on_retry(count, error, delay),
                )
                .await
            }
        }
    }

    // One HTTP exchange: fresh auth headers, the conditional request
    // lookup, dispatch, and outcome classification.
    async fn attempt(
        &self,
        method: &http::Method,
        body: Option<&Body>,
        url: &Url,
        options: &RequestOptions,
        remaining_time: Option<std::time::Duration>,
    ) -> Result<RawResponse> {
        let mut builder = self.inner.request(method.clone(), url.clone());
        builder = effective_timeout(options, remaining_time)
            .into_iter()
            .fold(builder, |b, t| b.timeout(t));

        let user_agent = options.user_agent().as_deref().map_or_else(
            || self.user_agent.clone(),
            |prefix| format!("{prefix} {}", self.user_agent),
        );
        builder = builder.header(
            http::header::USER_AGENT,
            http::HeaderValue::from_str(&user_agent)
                .map_err(|e| Error::usage("invalid user agent").set_source(e))?,
        );
        builder = builder.header(
            http::header::ACCEPT,
            http::HeaderValue::from_static("application/json"),
        );

        let auth_headers = self
            .auth
            .headers()
            .await
            .map_err(|e| Error::auth("failed to obtain credentials").set_source(e))?;
        for (key, value) in auth_headers.iter() {
            builder = builder.header(key, value);
        }

        match body {
            Some(Body::Json(data)) => {
                builder = builder
                    .header(
                        http::header::CONTENT_TYPE,
                        http::HeaderValue::from_static("application/json"),
                    )
                    .body(data.clone());
            }
            Some(Body::Binary { content_type, data }) => {
                builder = builder
                    .header(
                        http::header::CONTENT_TYPE,
                        http::HeaderValue::from_str(content_type)
                            .map_err(|e| Error::usage("invalid content type").set_source(e))?,
                    )
                    .body(data.clone());
            }
            None => {}
        }

        let cache = self.conditional_cache(method, options);
        if let Some(cache) = cache {
            if let Some((etag, _)) = cache.load(url.as_str()) {
                if let Ok(value) = http::HeaderValue::from_str(&etag) {
                    tracing::debug!(etag, "conditional request");
                    builder = builder.header(http::header::IF_NONE_MATCH, value);
                }
            }
        }

        let mut response = builder.send().await.map_err(Self::map_send_error)?;
        let status = response.status();
        let headers = response.headers().clone();

        if status == http::StatusCode::NOT_MODIFIED {
            if let Some((_, cached)) = cache.and_then(|c| c.load(url.as_str())) {
                tracing::debug!(url = %url, "serving cached body for 304");
                return Ok(RawResponse {
                    status: 200,
                    headers,
                    body: cached,
                    from_cache: true,
                });
            }
            return Err(Error::api("received 304 with no cached response")
                .set_http_metadata(304, headers));
        }

        if status.is_success() {
            let body = Self::read_bounded(&mut response, MAX_RESPONSE_BODY_BYTES).await?;
            if let Some(cache) = cache {
                if let Some(etag) = headers
                    .get(http::header::ETAG)
                    .and_then(|v| v.to_str().ok())
                {
                    tracing::debug!(etag, "caching response");
                    cache.store(url.as_str(), etag, body.clone());
                }
            }
            return Ok(RawResponse {
                status: status.as_u16(),
                headers,
                body,
                from_cache: false,
            });
        }

        let body = Self::read_bounded(&mut response, MAX_ERROR_BODY_BYTES)
            .await
            .unwrap_or_default();
        tracing::debug!(
            status = status.as_u16(),
            headers = %crate::redact::headers(&headers),
            "request failed"
        );
        Err(classify::classify(status.as_u16(), headers, &body))
    }

    fn conditional_cache(
        &self,
        method: &http::Method,
        options: &RequestOptions,
    ) -> Option<&EtagCache> {
        if *method != http::Method::GET || !options.use_cache().unwrap_or(true) {
            return None;
        }
        self.cache.as_deref()
    }

    async fn read_bounded(response: &mut reqwest::Response, limit: usize) -> Result<Bytes> {
        let mut buf = bytes::BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(Self::map_send_error)? {
            if buf.len() + chunk.len() > limit {
                return Err(Error::api(format!(
                    "response body exceeds the {limit} byte limit"
                )));
            }
            buf.extend_from_slice(&chunk);
        }
        Ok(buf.freeze())
    }

    fn map_send_error(err: reqwest::Error) -> Error {
        if err.is_timeout() {
            return Error::network(err).set_hint("the request timed out");
        }
        Error::network(err)
    }

    fn get_retry_policy(&self, options: &RequestOptions) -> Option<Arc<dyn RetryPolicy>> {
        options
            .retry_policy()
            .clone()
            .or_else(|| self.retry_policy.clone())
    }

    fn get_backoff_policy(&self, options: &RequestOptions) -> Arc<dyn BackoffPolicy> {
        options
            .backoff_policy()
            .clone()
            .or_else(|| self.backoff_policy.clone())
            .unwrap_or_else(|| Arc::new(ExponentialBackoff::default()))
    }
}

// The operation-level outcome: the status of the final exchange, wall time
// for the whole logical call, and whether its body came from the
// conditional request cache.
fn operation_outcome<T>(
    start: std::time::Instant,
    result: &Result<(u16, Response<T>)>,
) -> RequestOutcome {
    let mut outcome = RequestOutcome::default();
    outcome.elapsed = start.elapsed();
    match result {
        Ok((status, response)) => {
            outcome.status = Some(*status);
            outcome.from_cache = response.from_cache();
        }
        Err(e) => {
            outcome.status = e.http_status_code();
            outcome.retryable = e.is_retryable();
        }
    }
    outcome
}
