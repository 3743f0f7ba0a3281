//! Remote call layer against a real HTTP server.

mod common;

use std::sync::Arc;

use common::token;
use meridian_control::config::ApiConfig;
use meridian_control::{AuthStyle, ControlError, ReqwestTransport, RemoteCaller};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn caller(server: &MockServer, auth: AuthStyle, timeout_secs: u64) -> RemoteCaller {
    let config = ApiConfig {
        base_url: format!("{}/api/v1", server.uri()),
        timeout_secs,
        max_attempts: 2,
        secret_name: "PLATFORM_API_TOKEN".to_owned(),
    };
    RemoteCaller::new(
        Arc::new(ReqwestTransport::new().unwrap()),
        token("PLATFORM_API_TOKEN"),
        auth,
        &config,
    )
}

#[tokio::test]
async fn get_sends_access_token_and_query() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/containerdeploy/application-owner"))
        .and(header("access_token", "test-token"))
        .and(query_param("platform", "eds"))
        .and(query_param("application_name", "demo-1-3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"owner": "team-a"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = caller(&server, AuthStyle::AccessToken, 5)
        .get(
            "containerdeploy/application-owner",
            &[("platform", "eds"), ("application_name", "demo-1-3")],
        )
        .await
        .unwrap();

    assert!(response.is_ok());
    assert_eq!(response.json_value().unwrap()["owner"], "team-a");
}

#[tokio::test]
async fn post_sends_bearer_and_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/argocd/app-sync"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_json(json!({"application_name": "demo-1-3"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let response = caller(&server, AuthStyle::Bearer, 5)
        .post("argocd/app-sync", &json!({"application_name": "demo-1-3"}))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn non_200_is_returned_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/argocd/projects"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&server)
        .await;

    let response = caller(&server, AuthStyle::AccessToken, 5)
        .get("argocd/projects", &[])
        .await
        .unwrap();

    assert_eq!(response.status, 500);
    assert_eq!(response.text, "boom");
}

#[tokio::test]
async fn slow_responses_are_retried_then_reported() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/argocd/projects"))
        .respond_with(ResponseTemplate::new(200).set_delay(std::time::Duration::from_secs(3)))
        .expect(2)
        .mount(&server)
        .await;

    let result = caller(&server, AuthStyle::AccessToken, 1)
        .get("argocd/projects", &[])
        .await;

    match result {
        Err(ControlError::TransientNetwork { attempts, .. }) => assert_eq!(attempts, 2),
        other => panic!("expected TransientNetwork, got {other:?}"),
    }
}
