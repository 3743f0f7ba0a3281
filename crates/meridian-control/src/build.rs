//! Container image builds.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{info, info_span, Instrument};

use crate::authz::{authorize, Action, PermissionChecker};
use crate::clock::Clock;
use crate::error::{ControlError, ControlResult};
use crate::platform::{
    build_completed, ContainerBuildAccepted, ContainerBuildRequest, ContainerBuildStatus,
    PlatformClient,
};
use crate::remote::{poll_until, PollPolicy};

/// Conclusion of a successful build.
const BUILD_SUCCESS: &str = "success";

/// A build, and who is asking for it.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// User requesting the build.
    pub user: String,
    /// Team the image is built for.
    pub team: String,
    /// What to build.
    pub image: ContainerBuildRequest,
}

/// A finished, successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutcome {
    /// Commit the build ran for.
    pub commit_sha: String,
    /// Build log link, when the platform gave one.
    pub html_url: Option<String>,
}

/// Submits a build and waits for it to finish.
pub struct ContainerBuilder {
    client: Arc<PlatformClient>,
    clock: Arc<dyn Clock>,
    policy: PollPolicy,
    permissions: Arc<dyn PermissionChecker>,
}

impl ContainerBuilder {
    /// Create a builder polling under `policy`.
    #[must_use]
    pub fn new(
        client: Arc<PlatformClient>,
        clock: Arc<dyn Clock>,
        policy: PollPolicy,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        Self {
            client,
            clock,
            policy,
            permissions,
        }
    }

    /// Run a build to completion.
    ///
    /// The permission gate runs first; a denial sends nothing. A completed
    /// build that did not succeed is a [`ControlError::RemoteValidation`].
    pub async fn build(
        &self,
        request: &BuildRequest,
        cancel: &CancellationToken,
    ) -> ControlResult<BuildOutcome> {
        let span = info_span!(
            "container_build",
            team = %request.team,
            image = %request.image.image_name,
        );
        self.run(request, cancel).instrument(span).await
    }

    async fn run(
        &self,
        request: &BuildRequest,
        cancel: &CancellationToken,
    ) -> ControlResult<BuildOutcome> {
        authorize(
            self.permissions.as_ref(),
            &request.user,
            &request.team,
            Action::Build,
        )
        .await?;

        let image = &request.image;
        let response = self.client.start_container_build(image).await?;
        if !response.is_ok() {
            return Err(ControlError::remote("start container build", &response));
        }
        let accepted: ContainerBuildAccepted = response.json()?;
        info!(image = %image.image_name, commit = %accepted.commit_sha, "container build started");

        let response = poll_until(
            "container build",
            || self.client.container_build_status(&accepted.commit_sha),
            build_completed,
            self.policy,
            self.clock.as_ref(),
            cancel,
        )
        .await?;

        let status: ContainerBuildStatus = response.json()?;
        match status.conclusion.as_deref() {
            Some(BUILD_SUCCESS) => {
                info!(commit = %accepted.commit_sha, "container build succeeded");
                Ok(BuildOutcome {
                    commit_sha: accepted.commit_sha,
                    html_url: status.html_url,
                })
            }
            _ => Err(ControlError::remote("container build", &response)),
        }
    }
}

impl std::fmt::Debug for ContainerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContainerBuilder")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}
