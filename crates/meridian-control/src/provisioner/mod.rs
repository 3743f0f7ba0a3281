//! Create-if-absent provisioning of the remote resources a unit needs.
//!
//! Projects and application-owner records are checked before they are
//! created. Namespaces are always created: the platform treats a repeated
//! namespace create as a no-op, so there is nothing to check.

mod existence;

pub use crate::types::EnsureOutcome;
pub use existence::ExistenceChecker;

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{ControlError, ControlResult};
use crate::platform::{ApplicationOwner, NamespaceMetadata, PlatformClient, ProjectMetadata};

/// Ensures namespaces, projects and application owners exist.
#[derive(Debug, Clone)]
pub struct ResourceProvisioner {
    client: Arc<PlatformClient>,
    checker: ExistenceChecker,
}

impl ResourceProvisioner {
    /// Create a provisioner.
    #[must_use]
    pub fn new(client: Arc<PlatformClient>) -> Self {
        Self {
            checker: ExistenceChecker::new(Arc::clone(&client)),
            client,
        }
    }

    /// The existence checker used by the check-then-create steps.
    #[must_use]
    pub const fn checker(&self) -> &ExistenceChecker {
        &self.checker
    }

    /// Create the namespace. No existence check is made.
    pub async fn ensure_namespace(&self, meta: &NamespaceMetadata) -> ControlResult<()> {
        let response = self.client.create_namespace(meta).await?;
        if !response.is_ok() {
            return Err(ControlError::remote("create namespace", &response));
        }
        info!(namespace = %meta.namespace_identifier, "namespace ensured");
        Ok(())
    }

    /// Create the project unless it is already listed.
    pub async fn ensure_project(&self, meta: &ProjectMetadata) -> ControlResult<EnsureOutcome> {
        if self.checker.project_exists(&meta.rendered_project_name).await? {
            debug!(project = %meta.rendered_project_name, "project already exists");
            return Ok(EnsureOutcome::AlreadyExists);
        }

        let response = self.client.create_project(meta).await?;
        if !response.is_ok() {
            return Err(ControlError::remote("create project", &response));
        }
        info!(project = %meta.rendered_project_name, "project created");
        Ok(EnsureOutcome::Created)
    }

    /// Create the application-owner record unless one exists.
    pub async fn ensure_application_owner(
        &self,
        owner: &ApplicationOwner,
    ) -> ControlResult<EnsureOutcome> {
        if self
            .checker
            .application_exists(&owner.platform, &owner.application_name)
            .await?
        {
            debug!(application = %owner.application_name, "application owner already exists");
            return Ok(EnsureOutcome::AlreadyExists);
        }

        let response = self.client.create_application_owner(owner).await?;
        if !response.is_ok() {
            return Err(ControlError::remote("create application owner", &response));
        }
        info!(application = %owner.application_name, "application owner created");
        Ok(EnsureOutcome::Created)
    }
}
