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

use std::error::Error as StdError;
use std::time::Duration;

type BoxError = Box<dyn StdError + Send + Sync>;

/// The error category, used to drive retry decisions and CLI exit codes.
///
/// Every error produced by the request pipeline falls in exactly one of these
/// categories. The categories are stable: applications may match on them to
/// decide how to present or recover from a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// The request was malformed before it was sent, for example a bad flag
    /// combination or an invalid identifier.
    Usage,
    /// The service rejected the request body or parameters (HTTP 400 or 422).
    Validation,
    /// The resource does not exist (HTTP 404).
    NotFound,
    /// Authentication is required or the credentials were rejected (HTTP 401).
    Auth,
    /// The credentials are valid but do not grant access (HTTP 403).
    Forbidden,
    /// The service is throttling requests (HTTP 429).
    RateLimit,
    /// The request never completed: connection failures, DNS errors, and
    /// timeouts.
    Network,
    /// The service failed or returned an unexpected response.
    Api,
    /// The request matched more than one resource and the client cannot pick
    /// one.
    Ambiguous,
}

impl ErrorKind {
    /// The process exit code conventionally associated with this category.
    ///
    /// Success is `0`; every category here maps to a non-zero code so shell
    /// scripts can distinguish failure modes.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::Usage | ErrorKind::Validation => 1,
            ErrorKind::NotFound => 2,
            ErrorKind::Auth => 3,
            ErrorKind::Forbidden => 4,
            ErrorKind::RateLimit => 5,
            ErrorKind::Network => 6,
            ErrorKind::Api => 7,
            ErrorKind::Ambiguous => 8,
        }
    }
}

/// The core error returned by all client libraries.
///
/// Errors come from multiple sources: the service may reject a request, the
/// transport may fail to establish a connection, the retry policy may be
/// exhausted, or the request may be invalid before it is sent. This type
/// normalizes all of them to a category ([ErrorKind]), a human-readable
/// message, and optional troubleshooting details.
///
/// Most applications just return or log the error. CLI frontends use
/// [exit_code][Error::exit_code] and the `Display` implementation, which
/// renders as `message: hint` when a hint is present.
///
/// # Example
/// ```
/// use basecamp_gax::error::{Error, ErrorKind};
/// match example_function() {
///     Err(e) if e.kind() == ErrorKind::NotFound => { println!("no such thing: {e}"); },
///     Err(e) if e.is_retryable() => { println!("try again later: {e}"); },
///     Err(e) => { println!("some other error: {e}"); },
///     Ok(_) => { println!("success"); },
/// }
///
/// fn example_function() -> Result<String, Error> {
///     // ... details omitted ...
///     # Err(Error::not_found("project 123 not found"))
/// }
/// ```
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    hint: Option<String>,
    retryable: bool,
    retry_after: Option<Duration>,
    http: Option<Box<HttpDetails>>,
    source: Option<BoxError>,
}

#[derive(Debug)]
struct HttpDetails {
    status_code: u16,
    headers: http::HeaderMap,
    request_id: Option<String>,
}

impl Error {
    fn new<T: Into<String>>(kind: ErrorKind, retryable: bool, message: T) -> Self {
        Self {
            kind,
            message: message.into(),
            hint: None,
            retryable,
            retry_after: None,
            http: None,
            source: None,
        }
    }

    /// Creates an error for a request that is invalid before it is sent.
    pub fn usage<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::Usage, false, message)
    }

    /// Creates an error for a request the service rejected as invalid.
    pub fn validation<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::Validation, false, message)
    }

    /// Creates an error for a resource that does not exist.
    ///
    /// # Example
    /// ```
    /// use basecamp_gax::error::{Error, ErrorKind};
    /// let error = Error::not_found("project 123 not found");
    /// assert_eq!(error.kind(), ErrorKind::NotFound);
    /// assert!(!error.is_retryable());
    /// ```
    pub fn not_found<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::NotFound, false, message)
    }

    /// Creates an error for missing or rejected credentials.
    pub fn auth<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::Auth, false, message)
    }

    /// Creates an error for credentials that do not grant access.
    pub fn forbidden<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::Forbidden, false, message)
    }

    /// Creates an error for a throttled request.
    ///
    /// Rate limit errors are always retryable. Use
    /// [set_retry_after][Error::set_retry_after] to carry the delay requested
    /// by the service.
    pub fn rate_limit<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::RateLimit, true, message)
    }

    /// Creates an error for a request that never completed.
    ///
    /// This covers connection failures, DNS errors, and timeouts. Network
    /// errors are always retryable: the request may or may not have reached
    /// the service, so only idempotent operations are actually retried.
    ///
    /// # Example
    /// ```
    /// use std::error::Error as _;
    /// use basecamp_gax::error::Error;
    /// let error = Error::network("simulated connection reset");
    /// assert!(error.is_retryable());
    /// assert!(error.source().is_some());
    /// ```
    pub fn network<T: Into<BoxError>>(source: T) -> Self {
        let mut e = Self::new(ErrorKind::Network, true, "network error");
        e.source = Some(source.into());
        e
    }

    /// Creates an error for a service failure or an unexpected response.
    pub fn api<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::Api, false, message)
    }

    /// Creates an error for a request that matched more than one resource.
    pub fn ambiguous<T: Into<String>>(message: T) -> Self {
        Self::new(ErrorKind::Ambiguous, false, message)
    }

    /// Sets a troubleshooting hint, rendered as `message: hint`.
    pub fn set_hint<T: Into<String>>(mut self, hint: T) -> Self {
        self.hint = Some(hint.into());
        self
    }

    /// Overrides the retryable flag for this error.
    ///
    /// Whether a given status is transient can depend on the operation: some
    /// deployments treat `500` as transient, most do not. The classification
    /// layer uses this to apply per-operation overrides.
    pub fn set_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    /// Sets the delay requested by the service via `Retry-After`.
    pub fn set_retry_after(mut self, delay: Duration) -> Self {
        self.retry_after = Some(delay);
        self
    }

    /// Attaches the HTTP response metadata to this error.
    pub fn set_http_metadata(mut self, status_code: u16, headers: http::HeaderMap) -> Self {
        let request_id = headers
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        self.http = Some(Box::new(HttpDetails {
            status_code,
            headers,
            request_id,
        }));
        self
    }

    /// Attaches the underlying cause of this error.
    pub fn set_source<T: Into<BoxError>>(mut self, source: T) -> Self {
        self.source = Some(source.into());
        self
    }

    /// The category of this error.
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human-readable message, without the hint.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// The troubleshooting hint, if any.
    pub fn hint(&self) -> Option<&str> {
        self.hint.as_deref()
    }

    /// If true, a later attempt of the same request may succeed.
    ///
    /// The retry loop consults this flag, the operation's idempotency, and the
    /// retry policy before scheduling another attempt.
    pub fn is_retryable(&self) -> bool {
        self.retryable
    }

    /// The delay requested by the service, if any.
    ///
    /// When present, this takes precedence over the computed backoff delay.
    pub fn retry_after(&self) -> Option<Duration> {
        self.retry_after
    }

    /// The HTTP status code, if any, associated with this error.
    ///
    /// Errors generated before a response is received, for example connection
    /// failures, have no status code.
    pub fn http_status_code(&self) -> Option<u16> {
        self.http.as_ref().map(|d| d.status_code)
    }

    /// The response headers, if any, associated with this error.
    pub fn http_headers(&self) -> Option<&http::HeaderMap> {
        self.http.as_ref().map(|d| &d.headers)
    }

    /// The request id reported by the service, if any.
    ///
    /// Include this value when contacting Basecamp support, it speeds up
    /// troubleshooting on their side.
    pub fn request_id(&self) -> Option<&str> {
        self.http.as_ref().and_then(|d| d.request_id.as_deref())
    }

    /// The process exit code for this error. See [ErrorKind::exit_code].
    pub fn exit_code(&self) -> i32 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.hint {
            Some(hint) => write!(f, "{}: {}", self.message, hint),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error))
    }
}
