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

//! Parsing of the pagination response headers.
//!
//! Basecamp list endpoints report the next page via an RFC 5988 `Link`
//! header and the total item count via `X-Total-Count`.

use http::HeaderMap;

/// Extracts the URL with `rel="next"` from the `Link` header, if any.
///
/// The header may carry several comma-separated link relations; only
/// `next` matters here. The `rel` token matches case-insensitively, with
/// or without quotes.
pub(crate) fn next_link(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(http::header::LINK)?.to_str().ok()?;
    for part in value.split(',') {
        let mut segments = part.split(';');
        let target = segments.next()?.trim();
        let url = target.strip_prefix('<')?.strip_suffix('>')?;
        let is_next = segments.any(|param| {
            let param = param.trim();
            param
                .strip_prefix("rel=")
                .map(|rel| rel.trim_matches('"').eq_ignore_ascii_case("next"))
                .unwrap_or(false)
        });
        if is_next {
            return Some(url.to_string());
        }
    }
    None
}

/// Reads the `X-Total-Count` header. Absent or unparseable values yield 0.
pub(crate) fn total_count(headers: &HeaderMap) -> u64 {
    headers
        .get("x-total-count")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(0)
}
