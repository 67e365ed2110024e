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

use http::HeaderMap;

// Header names whose values must never reach a log sink.
const SENSITIVE: &[&str] = &["authorization", "cookie", "set-cookie", "proxy-authorization"];

/// Renders headers for logging, masking credential-bearing values.
pub(crate) fn headers(headers: &HeaderMap) -> String {
    headers
        .iter()
        .map(|(name, value)| {
            if SENSITIVE.contains(&name.as_str()) {
                format!("{name}: [REDACTED]")
            } else {
                format!("{name}: {}", value.to_str().unwrap_or("[binary]"))
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    #[test]
    fn masks_credentials() {
        let mut h = HeaderMap::new();
        h.insert("content-type", HeaderValue::from_static("application/json"));
        h.insert("authorization", HeaderValue::from_static("Bearer secret"));
        h.insert("set-cookie", HeaderValue::from_static("session=abc"));
        let got = headers(&h);
        assert!(got.contains("content-type: application/json"), "{got}");
        assert!(got.contains("authorization: [REDACTED]"), "{got}");
        assert!(got.contains("set-cookie: [REDACTED]"), "{got}");
        assert!(!got.contains("secret"), "{got}");
        assert!(!got.contains("session=abc"), "{got}");
    }

    #[test]
    fn tolerates_binary_values() {
        let mut h = HeaderMap::new();
        h.insert("x-blob", HeaderValue::from_bytes(&[0xfe, 0xff]).unwrap());
        assert_eq!(headers(&h), "x-blob: [binary]");
    }
}
