//! Integration tests for unit rollouts and run-level behaviour.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::fixtures::{
    fresh_platform, provisioned_platform, request, units, DefinitionBuilder, SYNC_NOT_VISIBLE,
};
use common::TestOrchestrator;
use meridian_control::config::AuthzConfig;
use meridian_control::platform::endpoints;
use meridian_control::transport::{ApiResponse, HttpMethod};
use meridian_control::unit::chart;
use meridian_control::{
    AllowListChecker, ControlError, DeployScope, EnsureOutcome, UnitKind, UnitState,
};
use tokio_util::sync::CancellationToken;

#[tokio::test]
async fn fresh_pipeline_runs_every_step_in_order() {
    let harness = TestOrchestrator::new();
    fresh_platform(&harness.transport);
    let units = units(&DefinitionBuilder::new("demo-1", "3").build());

    let report = harness
        .orchestrator
        .deploy_pipeline(&units, &CancellationToken::new())
        .await;

    assert_eq!(
        harness.transport.labels(),
        vec![
            "POST argocd/namespace",
            "GET argocd/projects",
            "POST argocd/projects",
            "GET containerdeploy/application-owner",
            "POST argocd/app-owners",
            "POST containerdeploy/helm/chart_and_values_yaml",
            "POST argocd/app-sync",
        ]
    );
    assert_eq!(report.state, UnitState::Synced);
    assert_eq!(
        report.states,
        vec![
            UnitState::NotStarted,
            UnitState::NamespaceEnsured,
            UnitState::ProjectEnsured,
            UnitState::AppRegistered,
            UnitState::ManifestDeployed,
            UnitState::Synced,
        ]
    );
    assert_eq!(report.project, Some(EnsureOutcome::Created));
    assert_eq!(report.application_owner, Some(EnsureOutcome::Created));
    assert_eq!(report.sync_attempts, Some(1));
    assert!(harness.clock.sleeps().is_empty());
}

#[tokio::test]
async fn payloads_carry_unit_identifiers() {
    let harness = TestOrchestrator::new();
    fresh_platform(&harness.transport);
    let units = units(&DefinitionBuilder::new("demo-1", "3").build());

    harness
        .orchestrator
        .deploy_pipeline(&units, &CancellationToken::new())
        .await;

    let project = harness
        .transport
        .calls_to(HttpMethod::Post, endpoints::PROJECTS)
        .remove(0)
        .body
        .unwrap();
    assert_eq!(project["rendered_project_name"], "eds-team-a-nonprod");
    assert_eq!(project["project_identifier"], "team-a");

    let lookup = harness
        .transport
        .calls_to(HttpMethod::Get, endpoints::APPLICATION_OWNER)
        .remove(0);
    assert!(lookup
        .query
        .contains(&("application_name".to_owned(), "demo-1-3".to_owned())));

    let deploy = harness
        .transport
        .calls_to(HttpMethod::Post, endpoints::CHART_AND_VALUES)
        .remove(0)
        .body
        .unwrap();
    assert_eq!(deploy["namespace_identifier"], "team-a");
    assert_eq!(deploy["cluster_type"], "blacklodge");
    let values =
        chart::decode(deploy["base64_values_yaml_contents"].as_str().unwrap()).unwrap();
    assert!(values.contains("fullnameOverride: demo-1-3"));

    let chart_yaml =
        chart::decode(deploy["base64_chart_yaml_contents"].as_str().unwrap()).unwrap();
    let chart_yaml: serde_yaml::Value = serde_yaml::from_str(&chart_yaml).unwrap();
    assert_eq!(chart_yaml["name"], "pipeline");
    assert_eq!(chart_yaml["appVersion"], "1.0.0");
}

#[tokio::test]
async fn existing_project_and_owner_are_not_recreated() {
    let harness = TestOrchestrator::new();
    provisioned_platform(&harness.transport);
    let units = units(&DefinitionBuilder::new("demo-1", "3").build());

    let report = harness
        .orchestrator
        .deploy_pipeline(&units, &CancellationToken::new())
        .await;

    assert_eq!(report.state, UnitState::Synced);
    assert_eq!(report.project, Some(EnsureOutcome::AlreadyExists));
    assert_eq!(report.application_owner, Some(EnsureOutcome::AlreadyExists));
    assert!(harness
        .transport
        .calls_to(HttpMethod::Post, endpoints::PROJECTS)
        .is_empty());
    assert!(harness
        .transport
        .calls_to(HttpMethod::Post, endpoints::APP_OWNERS)
        .is_empty());
}

#[tokio::test]
async fn namespace_failure_does_not_stop_the_unit() {
    let harness = TestOrchestrator::new();
    fresh_platform(&harness.transport);
    harness.transport.script(
        HttpMethod::Post,
        endpoints::NAMESPACE,
        vec![Ok(ApiResponse::new(502, "bad gateway"))],
    );
    let units = units(&DefinitionBuilder::new("demo-1", "3").build());

    let report = harness
        .orchestrator
        .deploy_pipeline(&units, &CancellationToken::new())
        .await;

    assert_eq!(report.state, UnitState::Synced);
    assert!(report.namespace_error.unwrap().contains("502"));
    assert!(report.error.is_none());
}

#[tokio::test]
async fn failed_project_listing_stops_the_unit() {
    let harness = TestOrchestrator::new();
    fresh_platform(&harness.transport);
    harness.transport.script(
        HttpMethod::Get,
        endpoints::PROJECTS,
        vec![Ok(ApiResponse::new(403, "forbidden"))],
    );
    let units = units(&DefinitionBuilder::new("demo-1", "3").build());

    let report = harness
        .orchestrator
        .deploy_pipeline(&units, &CancellationToken::new())
        .await;

    assert_eq!(report.state, UnitState::Failed);
    assert_eq!(
        report.states,
        vec![UnitState::NotStarted, UnitState::NamespaceEnsured, UnitState::Failed]
    );
    assert!(report.error.unwrap().contains("403"));
    assert_eq!(
        harness.transport.labels(),
        vec!["POST argocd/namespace", "GET argocd/projects"]
    );
}

#[tokio::test]
async fn sync_retries_while_application_is_not_visible() {
    let harness = TestOrchestrator::new();
    fresh_platform(&harness.transport);
    harness.transport.script(
        HttpMethod::Post,
        endpoints::APP_SYNC,
        vec![
            Ok(ApiResponse::new(500, SYNC_NOT_VISIBLE)),
            Ok(ApiResponse::new(500, SYNC_NOT_VISIBLE)),
            Ok(ApiResponse::new(200, "{}")),
        ],
    );
    let units = units(&DefinitionBuilder::new("demo-1", "3").build());

    let report = harness
        .orchestrator
        .deploy_pipeline(&units, &CancellationToken::new())
        .await;

    assert_eq!(report.state, UnitState::Synced);
    assert_eq!(report.sync_attempts, Some(3));
    assert_eq!(harness.clock.sleeps(), vec![Duration::from_secs(60); 2]);
}

#[tokio::test]
async fn sync_gives_up_after_the_retry_budget() {
    let harness = TestOrchestrator::new();
    fresh_platform(&harness.transport);
    harness.transport.script(
        HttpMethod::Post,
        endpoints::APP_SYNC,
        vec![Ok(ApiResponse::new(500, SYNC_NOT_VISIBLE))],
    );
    let units = units(&DefinitionBuilder::new("demo-1", "3").build());

    let report = harness
        .orchestrator
        .deploy_pipeline(&units, &CancellationToken::new())
        .await;

    assert_eq!(report.state, UnitState::Failed);
    assert_eq!(report.states[report.states.len() - 2], UnitState::ManifestDeployed);
    // Attempts 1..=12 are retried; attempt 13 is final.
    assert_eq!(
        harness
            .transport
            .calls_to(HttpMethod::Post, endpoints::APP_SYNC)
            .len(),
        13
    );
    assert_eq!(harness.clock.sleeps().len(), 12);
    assert!(report.error.unwrap().contains("not visible"));
}

#[tokio::test]
async fn other_sync_500_fails_without_retry() {
    let harness = TestOrchestrator::new();
    fresh_platform(&harness.transport);
    harness.transport.script(
        HttpMethod::Post,
        endpoints::APP_SYNC,
        vec![Ok(ApiResponse::new(500, "database unavailable"))],
    );
    let units = units(&DefinitionBuilder::new("demo-1", "3").build());

    let report = harness
        .orchestrator
        .deploy_pipeline(&units, &CancellationToken::new())
        .await;

    assert_eq!(report.state, UnitState::Failed);
    assert_eq!(
        harness
            .transport
            .calls_to(HttpMethod::Post, endpoints::APP_SYNC)
            .len(),
        1
    );
    assert!(harness.clock.sleeps().is_empty());
}

#[tokio::test]
async fn every_resolved_unit_rolls_out_on_its_own() {
    let harness = TestOrchestrator::new();
    fresh_platform(&harness.transport);
    let units = units(&DefinitionBuilder::new("demo-1", "3").with_alias("latest", "2").build());
    let cancel = CancellationToken::new();

    for unit in units.iter() {
        let report = harness.orchestrator.deploy_application(unit, &cancel).await;
        assert_eq!(report.application_name, unit.application_name());
        assert_eq!(report.state, UnitState::Synced, "{}", unit.application_name());
        assert!(report.namespace_error.is_none());
    }

    assert_eq!(
        harness
            .transport
            .calls_to(HttpMethod::Post, endpoints::NAMESPACE)
            .len(),
        units.len()
    );
    assert_eq!(
        harness
            .transport
            .calls_to(HttpMethod::Post, endpoints::APP_SYNC)
            .len(),
        units.len()
    );
}

#[tokio::test]
async fn namespace_unit_deploys_chart_only() {
    let harness = TestOrchestrator::new();
    fresh_platform(&harness.transport);
    let units = units(&DefinitionBuilder::new("demo-1", "3").build());

    let report = harness
        .orchestrator
        .deploy_namespace(&units, &CancellationToken::new())
        .await;

    assert_eq!(report.kind, UnitKind::Namespace);
    assert_eq!(report.application_name, "team-a-ns");
    assert_eq!(report.state, UnitState::Synced);
    assert!(harness
        .transport
        .calls_to(HttpMethod::Post, endpoints::CHART_AND_VALUES)
        .is_empty());

    let body = harness
        .transport
        .calls_to(HttpMethod::Post, endpoints::CHART_ONLY)
        .remove(0)
        .body
        .unwrap();
    let chart_yaml = chart::decode(body["base64_yaml_contents"].as_str().unwrap()).unwrap();
    assert!(chart_yaml.contains("name: namespace"));
    assert!(body.get("base64_values_yaml_contents").is_none());
}

#[tokio::test]
async fn failed_alias_does_not_stop_its_siblings() {
    let harness = TestOrchestrator::new();
    fresh_platform(&harness.transport);
    // Pipeline, first alias, second alias.
    harness.transport.script(
        HttpMethod::Post,
        endpoints::CHART_AND_VALUES,
        vec![
            Ok(ApiResponse::new(200, "{}")),
            Ok(ApiResponse::new(422, "invalid values")),
            Ok(ApiResponse::new(200, "{}")),
        ],
    );
    let definition = DefinitionBuilder::new("demo-1", "3")
        .with_alias("champion", "3")
        .with_alias("challenger", "2")
        .build();

    let summary = harness
        .orchestrator
        .deploy_all(request(definition), &CancellationToken::new())
        .await
        .unwrap();

    let outcomes: Vec<_> = summary
        .units
        .iter()
        .map(|u| (u.application_name.as_str(), u.state))
        .collect();
    assert_eq!(
        outcomes,
        vec![
            ("demo-1-3", UnitState::Synced),
            ("demo-1-champion", UnitState::Failed),
            ("demo-1-challenger", UnitState::Synced),
            ("team-a-ns", UnitState::Synced),
        ]
    );
    assert!(!summary.succeeded());
    assert_eq!(summary.failures().count(), 1);
}

#[tokio::test]
async fn scope_limits_the_units_deployed() {
    let harness = TestOrchestrator::new();
    fresh_platform(&harness.transport);
    let definition = DefinitionBuilder::new("demo-1", "3")
        .with_alias("champion", "3")
        .build();
    let mut request = request(definition);
    request.scope = DeployScope::Aliases;

    let summary = harness
        .orchestrator
        .deploy_all(request, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.units.len(), 1);
    assert_eq!(summary.units[0].application_name, "demo-1-champion");
    assert!(summary.succeeded());
}

#[tokio::test]
async fn denied_run_makes_no_remote_calls() {
    let checker = AllowListChecker::from_config(&AuthzConfig {
        allowed_teams: vec!["team-b".to_owned()],
        allowed_users: vec![],
    });
    let harness = TestOrchestrator::with_permissions(Arc::new(checker));
    fresh_platform(&harness.transport);

    let result = harness
        .orchestrator
        .deploy_all(
            request(DefinitionBuilder::new("demo-1", "3").build()),
            &CancellationToken::new(),
        )
        .await;

    assert!(matches!(result, Err(ControlError::Permission(_))));
    assert!(harness.transport.calls().is_empty());
}

#[tokio::test]
async fn cancelled_run_fails_every_unit_without_calls() {
    let harness = TestOrchestrator::new();
    fresh_platform(&harness.transport);
    let cancel = CancellationToken::new();
    cancel.cancel();

    let summary = harness
        .orchestrator
        .deploy_all(
            request(
                DefinitionBuilder::new("demo-1", "3")
                    .with_alias("champion", "3")
                    .build(),
            ),
            &cancel,
        )
        .await
        .unwrap();

    assert_eq!(summary.units.len(), 3);
    assert!(summary.units.iter().all(|u| u.state == UnitState::Failed));
    assert!(harness.transport.calls().is_empty());
}

#[tokio::test]
async fn await_healthy_polls_until_healthy() {
    let harness = TestOrchestrator::new();
    harness.transport.script(
        HttpMethod::Get,
        "applications/demo-1-3",
        vec![
            Ok(ApiResponse::new(
                200,
                r#"{"status":{"health":{"status":"Progressing"}}}"#,
            )),
            Ok(ApiResponse::new(503, "unavailable")),
            Ok(ApiResponse::new(
                200,
                r#"{"status":{"health":{"status":"Healthy"}}}"#,
            )),
        ],
    );

    let response = harness
        .orchestrator
        .await_healthy(
            "https://gitops.test/api/applications/demo-1-3",
            &CancellationToken::new(),
        )
        .await
        .unwrap();

    assert!(response.text.contains("Healthy"));
    assert_eq!(harness.clock.sleeps(), vec![Duration::from_secs(60); 2]);
}

#[tokio::test]
async fn await_healthy_times_out() {
    let harness = TestOrchestrator::new();
    harness.transport.script(
        HttpMethod::Get,
        "applications/demo-1-3",
        vec![Ok(ApiResponse::new(
            200,
            r#"{"status":{"health":{"status":"Degraded"}}}"#,
        ))],
    );

    let result = harness
        .orchestrator
        .await_healthy("applications/demo-1-3", &CancellationToken::new())
        .await;

    match result {
        Err(ControlError::TimeoutExceeded { attempts, .. }) => assert_eq!(attempts, 30),
        other => panic!("expected TimeoutExceeded, got {other:?}"),
    }
}
