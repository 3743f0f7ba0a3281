//! Typed access to the platform and GitOps APIs.
//!
//! This module defines the request payloads and the handful of response
//! shapes meridian reads. [`PlatformClient`] maps each endpoint to one
//! method and returns the raw [`ApiResponse`](crate::transport::ApiResponse)
//! so callers decide what each status code means.

mod client;

pub use client::{endpoints, PlatformClient};

use serde::{Deserialize, Serialize};

use crate::transport::ApiResponse;

/// Namespace create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespaceMetadata {
    /// Environment name.
    pub environment_name: String,
    /// Application name.
    pub application_name: String,
    /// Kubernetes namespace identifier.
    pub namespace_identifier: String,
    /// GitOps project identifier.
    pub project_identifier: String,
    /// Platform name.
    pub platform: String,
    /// Always false; dynamic environments are not used.
    pub is_dynamic_environment: bool,
    /// Always empty.
    pub dynamic_environment_name: String,
    /// Owning cloud account.
    pub account_id: String,
    /// Target cluster type.
    pub cluster_type: String,
}

/// GitOps project create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectMetadata {
    /// Environment name.
    pub environment_name: String,
    /// Application name.
    pub application_name: String,
    /// GitOps project identifier.
    pub project_identifier: String,
    /// Platform name.
    pub platform: String,
    /// `{platform}-{project_identifier}-{environment}`.
    pub rendered_project_name: String,
}

/// Application-owner record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationOwner {
    /// Source repository name.
    pub repository: String,
    /// Source repository URL.
    pub repository_url: String,
    /// Contact for the application.
    pub application_contact: String,
    /// Application name.
    pub application_name: String,
    /// Platform name.
    pub platform: String,
    /// Cluster types the application may deploy to.
    pub allowed_cluster_types: Vec<String>,
}

/// Chart and values deploy request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelmDeployRequest {
    /// Base64 Chart.yaml.
    pub base64_chart_yaml_contents: String,
    /// Base64 values.yaml.
    pub base64_values_yaml_contents: String,
    /// Environment name.
    pub environment_name: String,
    /// Application name.
    pub application_name: String,
    /// Kubernetes namespace identifier.
    pub namespace_identifier: String,
    /// GitOps project identifier.
    pub project_identifier: String,
    /// Platform name.
    pub platform: String,
    /// Always false.
    pub is_dynamic_environment: bool,
    /// Always empty.
    pub dynamic_environment_name: String,
    /// Target cluster type.
    pub cluster_type: String,
}

/// Chart-only deploy request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HelmChartRequest {
    /// Base64 Chart.yaml.
    pub base64_yaml_contents: String,
    /// Environment name.
    pub environment_name: String,
    /// Application name.
    pub application_name: String,
    /// Kubernetes namespace identifier.
    pub namespace_identifier: String,
    /// GitOps project identifier.
    pub project_identifier: String,
    /// Platform name.
    pub platform: String,
    /// Always false.
    pub is_dynamic_environment: bool,
    /// Always empty.
    pub dynamic_environment_name: String,
    /// Target cluster type.
    pub cluster_type: String,
}

/// Sync request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppSyncRequest {
    /// Environment name.
    pub environment_name: String,
    /// Application name.
    pub application_name: String,
    /// GitOps project identifier.
    pub project_identifier: String,
    /// Platform name.
    pub platform: String,
    /// Always false.
    pub is_dynamic_environment: bool,
    /// Always empty.
    pub dynamic_environment_name: String,
}

/// Container image build request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainerBuildRequest {
    /// Repository name.
    pub repository: String,
    /// Branch to build.
    pub git_branch: String,
    /// Commit to build.
    pub git_commit_sha: String,
    /// Image name.
    pub image_name: String,
    /// Dockerfile path within the repository.
    pub dockerfile_path: String,
    /// Build context within the repository.
    pub docker_context: String,
    /// Namespace the image is published under.
    pub namespace: String,
    /// Role injected into the build, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected_aws_role_arn: Option<String>,
    /// Account alias injected into the build, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub injected_aws_account_short_alias: Option<String>,
    /// Tags applied to the image.
    pub image_tags: Vec<String>,
    /// Registries the image is pushed to.
    pub registries: Vec<String>,
    /// Docker build arguments.
    pub build_args: std::collections::BTreeMap<String, String>,
    /// Clone depth.
    pub git_fetch_depth: u32,
}

/// Response to a build submission.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerBuildAccepted {
    /// Commit the build is keyed by.
    pub commit_sha: String,
}

/// Build run status.
#[derive(Debug, Clone, Deserialize)]
pub struct ContainerBuildStatus {
    /// `queued`, `in_progress`, `completed`, ...
    pub build_status: String,
    /// `success` or a failure reason, once completed.
    #[serde(default)]
    pub conclusion: Option<String>,
    /// Link to the build log.
    #[serde(default)]
    pub html_url: Option<String>,
}

/// Build status value meaning the run finished.
pub const BUILD_COMPLETED: &str = "completed";

/// Health status meaning the application is ready.
pub const HEALTHY: &str = "healthy";

/// Whether a build status response reports completion.
#[must_use]
pub fn build_completed(response: &ApiResponse) -> bool {
    response
        .json::<ContainerBuildStatus>()
        .is_ok_and(|status| status.build_status == BUILD_COMPLETED)
}

/// Whether an application status response reports `status.health.status`
/// as healthy (case-insensitive).
#[must_use]
pub fn application_healthy(response: &ApiResponse) -> bool {
    response
        .json_value()
        .as_ref()
        .and_then(|v| v.pointer("/status/health/status"))
        .and_then(serde_json::Value::as_str)
        .is_some_and(|status| status.eq_ignore_ascii_case(HEALTHY))
}
