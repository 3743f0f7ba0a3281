//! Existence checks for projects and application owners.

use std::sync::Arc;

use crate::error::{ControlError, ControlResult};
use crate::platform::PlatformClient;

/// Status the platform uses to say an application owner does not exist.
const APPLICATION_ABSENT: u16 = 500;

/// Answers whether a project or application owner is already registered.
#[derive(Debug, Clone)]
pub struct ExistenceChecker {
    client: Arc<PlatformClient>,
}

impl ExistenceChecker {
    /// Create a checker.
    #[must_use]
    pub const fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }

    /// Whether `rendered_name` is in the project list. A failed listing is
    /// an error, never "absent".
    pub async fn project_exists(&self, rendered_name: &str) -> ControlResult<bool> {
        let response = self.client.list_projects().await?;
        if !response.is_ok() {
            return Err(ControlError::remote("list projects", &response));
        }
        let projects: Vec<String> = response.json()?;
        Ok(projects.iter().any(|p| p == rendered_name))
    }

    /// Whether an application-owner record exists: 200 means yes, 500
    /// means no, anything else is an error.
    pub async fn application_exists(
        &self,
        platform: &str,
        application_name: &str,
    ) -> ControlResult<bool> {
        let response = self
            .client
            .get_application_owner(platform, application_name)
            .await?;
        match response.status {
            200 => Ok(true),
            APPLICATION_ABSENT => Ok(false),
            _ => Err(ControlError::remote("get application owner", &response)),
        }
    }
}
