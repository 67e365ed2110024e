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

//! Observability hook tests against a local server.

use basecamp_client::{Client, RequestSpec};
use gax::error::Error;
use gax::exponential_backoff::ExponentialBackoffBuilder;
use gax::hooks::{Hooks, RequestOutcome};
use gax::options::RequestOptions;
use gax::retry_policy::LimitedAttemptCount;
use httptest::{Expectation, Server, matchers::*, responders::*};
use std::time::Duration;

mockall::mock! {
    #[derive(Debug)]
    Hooks {}
    impl Hooks for Hooks {
        fn on_operation_start(&self, method: &str, target: &str);
        fn on_operation_end(&self, method: &str, target: &str, outcome: &RequestOutcome);
        fn on_request_start(&self, method: &str, url: &str);
        fn on_request_end(&self, method: &str, url: &str, outcome: &RequestOutcome);
        fn on_retry(&self, attempt_count: u32, error: &Error, delay: Duration);
    }
}

#[tokio::test]
async fn hooks_bracket_a_successful_request() -> anyhow::Result<()> {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/12345/projects.json"))
            .times(1)
            .respond_with(status_code(200).body("[]")),
    );

    let mut hooks = MockHooks::new();
    hooks
        .expect_on_operation_start()
        .once()
        .withf(|method, target| method == "GET" && target == "/12345/projects.json")
        .return_const(());
    hooks
        .expect_on_request_start()
        .once()
        .withf(|method, url| method == "GET" && url.ends_with("/12345/projects.json"))
        .return_const(());
    hooks
        .expect_on_request_end()
        .once()
        .withf(|method, _, outcome| {
            method == "GET" && outcome.status == Some(200) && !outcome.from_cache
        })
        .return_const(());
    hooks
        .expect_on_operation_end()
        .once()
        .withf(|_, target, outcome| {
            target == "/12345/projects.json" && outcome.status == Some(200)
        })
        .return_const(());
    hooks.expect_on_retry().never();

    let client = Client::builder()
        .with_endpoint(server.url_str("/"))
        .with_hooks(hooks)
        .build()?;
    let spec = RequestSpec::new(http::Method::GET, "/12345/projects.json");
    client
        .request::<Vec<serde_json::Value>>(spec, RequestOptions::default())
        .await?;
    Ok(())
}

#[tokio::test]
async fn hooks_observe_scheduled_retries() -> anyhow::Result<()> {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/12345/projects.json"))
            .times(2)
            .respond_with(httptest::cycle![
                status_code(503),
                status_code(200).body("[]"),
            ]),
    );

    let mut hooks = MockHooks::new();
    hooks.expect_on_operation_start().once().return_const(());
    hooks.expect_on_request_start().once().return_const(());
    hooks
        .expect_on_retry()
        .once()
        .withf(|attempt_count, error, _| {
            *attempt_count == 1 && error.http_status_code() == Some(503)
        })
        .return_const(());
    hooks
        .expect_on_request_end()
        .once()
        .withf(|_, _, outcome| outcome.status == Some(200))
        .return_const(());
    hooks
        .expect_on_operation_end()
        .once()
        .withf(|_, _, outcome| outcome.status == Some(200))
        .return_const(());

    let mut options = RequestOptions::default();
    options.set_retry_policy(LimitedAttemptCount::new(3));
    options.set_backoff_policy(
        ExponentialBackoffBuilder::new()
            .with_initial_delay(Duration::from_millis(1))
            .with_maximum_jitter(Duration::ZERO)
            .clamp(),
    );

    let client = Client::builder()
        .with_endpoint(server.url_str("/"))
        .with_hooks(hooks)
        .build()?;
    let spec = RequestSpec::new(http::Method::GET, "/12345/projects.json");
    client
        .request::<Vec<serde_json::Value>>(spec, options)
        .await?;
    Ok(())
}

#[tokio::test]
async fn failed_requests_report_a_retryable_outcome() -> anyhow::Result<()> {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/12345/projects.json"))
            .times(1)
            .respond_with(status_code(503)),
    );

    let mut hooks = MockHooks::new();
    hooks.expect_on_operation_start().once().return_const(());
    hooks.expect_on_request_start().once().return_const(());
    hooks
        .expect_on_request_end()
        .once()
        .withf(|_, _, outcome| outcome.status == Some(503) && outcome.retryable)
        .return_const(());
    hooks
        .expect_on_operation_end()
        .once()
        .withf(|_, _, outcome| outcome.status == Some(503) && outcome.retryable)
        .return_const(());
    hooks.expect_on_retry().never();

    let client = Client::builder()
        .with_endpoint(server.url_str("/"))
        .with_hooks(hooks)
        .build()?;
    let spec = RequestSpec::new(http::Method::GET, "/12345/projects.json");
    let result = client
        .request::<Vec<serde_json::Value>>(spec, RequestOptions::default())
        .await;
    assert!(result.is_err());
    Ok(())
}

#[tokio::test]
async fn one_operation_spans_every_page() -> anyhow::Result<()> {
    let server = Server::run();
    server.expect(
        Expectation::matching(request::method_path("GET", "/12345/todos.json"))
            .times(1)
            .respond_with(
                status_code(200)
                    .append_header("Link", "</12345/todos.json?page=2>; rel=\"next\"")
                    .body(r#"[{"id": 1}]"#),
            ),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("GET", "/12345/todos.json"),
            request::query(url_decoded(contains(("page", "2")))),
        ])
        .times(1)
        .respond_with(status_code(200).body(r#"[{"id": 2}]"#)),
    );

    // The operation callbacks bracket the whole walk, the request callbacks
    // fire once per page, strictly nested.
    let mut seq = mockall::Sequence::new();
    let mut hooks = MockHooks::new();
    hooks
        .expect_on_operation_start()
        .once()
        .in_sequence(&mut seq)
        .withf(|method, target| method == "GET" && target == "/12345/todos.json")
        .return_const(());
    for _page in 0..2 {
        hooks
            .expect_on_request_start()
            .once()
            .in_sequence(&mut seq)
            .return_const(());
        hooks
            .expect_on_request_end()
            .once()
            .in_sequence(&mut seq)
            .withf(|_, _, outcome| outcome.status == Some(200))
            .return_const(());
    }
    hooks
        .expect_on_operation_end()
        .once()
        .in_sequence(&mut seq)
        .withf(|_, target, outcome| {
            target == "/12345/todos.json" && outcome.status == Some(200)
        })
        .return_const(());

    let client = Client::builder()
        .with_endpoint(server.url_str("/"))
        .with_hooks(hooks)
        .build()?;
    let spec = RequestSpec::new(http::Method::GET, "/12345/todos.json");
    let response = client
        .request_paginated(spec, RequestOptions::default())
        .await?;
    assert_eq!(response.body().len(), 2);
    Ok(())
}
