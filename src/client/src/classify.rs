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

//! Classification of non-success responses into typed errors.

use crate::retry_after::parse_retry_after;
use gax::error::Error;

/// The longest error message derived from a response body, including the
/// trailing ellipsis.
pub(crate) const MAX_ERROR_MESSAGE_LEN: usize = 500;

#[derive(serde::Deserialize)]
struct ErrorBody {
    error: Option<String>,
    message: Option<String>,
}

/// Converts a non-2xx, non-304 response into a typed [Error].
///
/// Whether `500` is transient is decided by the retry policy, so its
/// retryable flag stays false here; `502`, `503`, `504`, and the other
/// `5xx` statuses are flagged retryable.
pub(crate) fn classify(status: u16, headers: http::HeaderMap, body: &[u8]) -> Error {
    let error = match status {
        400 | 422 => Error::validation(
            body_message(body).unwrap_or_else(|| format!("request rejected (HTTP {status})")),
        ),
        401 => Error::auth("authentication failed")
            .set_hint("your access token may have expired, authenticate again"),
        403 => Error::forbidden("access denied")
            .set_hint("your account may lack permission for this resource"),
        404 => Error::not_found("resource not found"),
        429 => {
            let error = Error::rate_limit("too many requests");
            match parse_retry_after(&headers) {
                Some(delay) => error
                    .set_hint(format!("try again in {} seconds", delay.as_secs()))
                    .set_retry_after(delay),
                None => error,
            }
        }
        500 => Error::api("server error (500)"),
        502..=504 => Error::api(format!("gateway error ({status})")).set_retryable(true),
        _ => {
            let message = body_message(body)
                .unwrap_or_else(|| format!("request failed (HTTP {status})"));
            Error::api(message).set_retryable((500..=599).contains(&status))
        }
    };
    error.set_http_metadata(status, headers)
}

/// Extracts a human-readable message from an error response body.
///
/// Basecamp reports errors as `{"error": "..."}` or `{"message": "..."}`.
fn body_message(body: &[u8]) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_slice(body).ok()?;
    parsed
        .error
        .or(parsed.message)
        .filter(|m| !m.is_empty())
        .map(truncate)
}

/// Bounds a body-derived message to [MAX_ERROR_MESSAGE_LEN] bytes, ending
/// in `...` when shortened.
pub(crate) fn truncate(message: String) -> String {
    if message.len() <= MAX_ERROR_MESSAGE_LEN {
        return message;
    }
    let mut end = MAX_ERROR_MESSAGE_LEN - 3;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &message[..end])
}
