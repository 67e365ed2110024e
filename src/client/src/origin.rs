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

use url::Url;

/// Returns true if both URLs share a scheme, host, and port.
///
/// A missing port counts as the scheme's default port, so
/// `https://example.com/` and `https://example.com:443/` are the same
/// origin. Pagination refuses to follow a `Link` header that fails this
/// check: a malicious or misconfigured server must not be able to steer
/// the bearer token to another host.
pub(crate) fn same_origin(a: &Url, b: &Url) -> bool {
    a.scheme() == b.scheme()
        && a.host_str() == b.host_str()
        && a.port_or_known_default() == b.port_or_known_default()
}

/// Returns true if the host is a loopback name, exempt from the HTTPS
/// requirement.
///
/// Covers `localhost`, the `*.localhost` names reserved by RFC 6761, and
/// the literal loopback addresses.
pub(crate) fn is_localhost(host: &str) -> bool {
    host == "localhost"
        || host.ends_with(".localhost")
        || host == "127.0.0.1"
        || host == "[::1]"
}
