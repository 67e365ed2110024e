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

//! Credential handling tests against a local server.

use auth::strategy::AuthStrategy;
use basecamp_client::{Client, RequestSpec};
use gax::error::ErrorKind;
use gax::options::RequestOptions;
use http::HeaderMap;
use httptest::{Expectation, Server, matchers::*, responders::*};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Hands out `token-1`, then `token-2` after a refresh. A second refresh
/// fails.
#[derive(Debug, Default)]
struct RotatingAuth {
    generation: AtomicUsize,
}

#[async_trait::async_trait]
impl AuthStrategy for RotatingAuth {
    async fn headers(&self) -> auth::Result<HeaderMap> {
        let generation = self.generation.load(Ordering::SeqCst) + 1;
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            http::HeaderValue::from_str(&format!("Bearer token-{generation}")).unwrap(),
        );
        Ok(headers)
    }

    async fn on_unauthorized(&self) -> bool {
        self.generation.fetch_add(1, Ordering::SeqCst) == 0
    }
}

fn client(server: &Server) -> Client {
    Client::builder()
        .with_endpoint(server.url_str("/"))
        .with_auth(RotatingAuth::default())
        .build()
        .expect("loopback endpoints build")
}

#[tokio::test]
async fn rejected_token_is_refreshed_and_replayed_once() -> anyhow::Result<()> {
    let server = Server::run();
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/12345/projects.json"),
            request::headers(contains(("authorization", "Bearer token-1"))),
        ])
        .times(1)
        .respond_with(status_code(401)),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/12345/projects.json"),
            request::headers(contains(("authorization", "Bearer token-2"))),
        ])
        .times(1)
        .respond_with(status_code(200).body("[]")),
    );

    let spec = RequestSpec::new(http::Method::GET, "/12345/projects.json");
    let response = client(&server)
        .request::<Vec<serde_json::Value>>(spec, RequestOptions::default())
        .await?;
    assert!(response.body().is_empty());
    Ok(())
}

#[tokio::test]
async fn replay_happens_at_most_once() -> anyhow::Result<()> {
    let server = Server::run();
    // Both the original attempt and the replay are rejected; the error
    // surfaces without a third request.
    server.expect(
        Expectation::matching(request::method_path("GET", "/12345/projects.json"))
            .times(2)
            .respond_with(status_code(401)),
    );

    let spec = RequestSpec::new(http::Method::GET, "/12345/projects.json");
    let err = client(&server)
        .request::<Vec<serde_json::Value>>(spec, RequestOptions::default())
        .await
        .expect_err("the replacement token is rejected too");
    assert_eq!(err.kind(), ErrorKind::Auth, "{err:?}");
    assert_eq!(err.exit_code(), 3, "{err:?}");
    Ok(())
}

#[tokio::test]
async fn failed_refresh_surfaces_auth() -> anyhow::Result<()> {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/12345/projects.json"))
            .times(1)
            .respond_with(status_code(401)),
    );

    // The strategy reports the refresh failed, so there is no replay.
    let strategy = RotatingAuth {
        generation: AtomicUsize::new(1),
    };
    let client = Client::builder()
        .with_endpoint(server.url_str("/"))
        .with_auth(strategy)
        .build()?;
    let spec = RequestSpec::new(http::Method::GET, "/12345/projects.json");
    let err = client
        .request::<Vec<serde_json::Value>>(spec, RequestOptions::default())
        .await
        .expect_err("refresh failed");
    assert_eq!(err.kind(), ErrorKind::Auth, "{err:?}");
    Ok(())
}
