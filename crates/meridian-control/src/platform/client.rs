//! Endpoint-per-method client over the two remote APIs.

use std::sync::Arc;

use meridian_secrets::SecretGetter;

use crate::config::ControlConfig;
use crate::error::ControlResult;
use crate::remote::{AuthStyle, RemoteCaller};
use crate::transport::{ApiResponse, HttpTransport};

use super::{
    AppSyncRequest, ApplicationOwner, ContainerBuildRequest, HelmChartRequest, HelmDeployRequest,
    NamespaceMetadata, ProjectMetadata,
};

/// Endpoint paths, relative to the platform API base URL.
pub mod endpoints {
    /// Chart and values deploy.
    pub const CHART_AND_VALUES: &str = "containerdeploy/helm/chart_and_values_yaml";
    /// Chart-only deploy.
    pub const CHART_ONLY: &str = "containerdeploy/helm/chart_yaml";
    /// Application-owner lookup.
    pub const APPLICATION_OWNER: &str = "containerdeploy/application-owner";
    /// Application-owner create.
    pub const APP_OWNERS: &str = "argocd/app-owners";
    /// Project list and create.
    pub const PROJECTS: &str = "argocd/projects";
    /// Namespace create.
    pub const NAMESPACE: &str = "argocd/namespace";
    /// Sync trigger.
    pub const APP_SYNC: &str = "argocd/app-sync";
    /// Container build submission.
    pub const CONTAINER_BUILD: &str = "containerbuild";

    /// Status of one container build.
    #[must_use]
    pub fn container_build_status(commit_sha: &str) -> String {
        format!("{CONTAINER_BUILD}/{commit_sha}/run-status")
    }
}

/// Client for the platform API and the GitOps controller API.
#[derive(Debug, Clone)]
pub struct PlatformClient {
    platform: RemoteCaller,
    gitops: RemoteCaller,
}

impl PlatformClient {
    /// Create a client from two callers.
    #[must_use]
    pub const fn new(platform: RemoteCaller, gitops: RemoteCaller) -> Self {
        Self { platform, gitops }
    }

    /// Create a client from configuration, sharing one transport.
    pub fn from_config(
        config: &ControlConfig,
        transport: Arc<dyn HttpTransport>,
        platform_secret: Arc<dyn SecretGetter>,
        gitops_secret: Arc<dyn SecretGetter>,
    ) -> Self {
        Self {
            platform: RemoteCaller::new(
                transport.clone(),
                platform_secret,
                AuthStyle::AccessToken,
                &config.platform_api,
            ),
            gitops: RemoteCaller::new(
                transport,
                gitops_secret,
                AuthStyle::Bearer,
                &config.gitops_api,
            ),
        }
    }

    /// Create a namespace. The platform treats repeats as no-ops.
    pub async fn create_namespace(&self, meta: &NamespaceMetadata) -> ControlResult<ApiResponse> {
        self.platform.post(endpoints::NAMESPACE, meta).await
    }

    /// List rendered project names.
    pub async fn list_projects(&self) -> ControlResult<ApiResponse> {
        self.platform.get(endpoints::PROJECTS, &[]).await
    }

    /// Create a GitOps project.
    pub async fn create_project(&self, meta: &ProjectMetadata) -> ControlResult<ApiResponse> {
        self.platform.post(endpoints::PROJECTS, meta).await
    }

    /// Look up the application-owner record. The platform answers 500 when
    /// no record exists.
    pub async fn get_application_owner(
        &self,
        platform: &str,
        application_name: &str,
    ) -> ControlResult<ApiResponse> {
        self.platform
            .get(
                endpoints::APPLICATION_OWNER,
                &[
                    ("platform", platform),
                    ("application_name", application_name),
                ],
            )
            .await
    }

    /// Create the application-owner record.
    pub async fn create_application_owner(
        &self,
        owner: &ApplicationOwner,
    ) -> ControlResult<ApiResponse> {
        self.platform.post(endpoints::APP_OWNERS, owner).await
    }

    /// Deploy a chart with values.
    pub async fn deploy_chart_and_values(
        &self,
        request: &HelmDeployRequest,
    ) -> ControlResult<ApiResponse> {
        self.platform.post(endpoints::CHART_AND_VALUES, request).await
    }

    /// Deploy a chart without values.
    pub async fn deploy_chart(&self, request: &HelmChartRequest) -> ControlResult<ApiResponse> {
        self.platform.post(endpoints::CHART_ONLY, request).await
    }

    /// Ask the GitOps controller to reconcile an application.
    pub async fn sync_application(&self, request: &AppSyncRequest) -> ControlResult<ApiResponse> {
        self.platform.post(endpoints::APP_SYNC, request).await
    }

    /// Submit a container image build.
    pub async fn start_container_build(
        &self,
        request: &ContainerBuildRequest,
    ) -> ControlResult<ApiResponse> {
        self.platform.post(endpoints::CONTAINER_BUILD, request).await
    }

    /// Fetch the status of a container build.
    pub async fn container_build_status(&self, commit_sha: &str) -> ControlResult<ApiResponse> {
        self.platform
            .get(&endpoints::container_build_status(commit_sha), &[])
            .await
    }

    /// Fetch an application's status from the GitOps controller. `url` may
    /// be absolute or relative to the GitOps base URL.
    pub async fn application_status(&self, url: &str) -> ControlResult<ApiResponse> {
        self.gitops.get(url, &[]).await
    }
}
