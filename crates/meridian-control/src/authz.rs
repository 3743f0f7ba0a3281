//! Permission gate consulted before a run touches anything remote.

use std::collections::HashSet;
use std::fmt;

use async_trait::async_trait;
use tracing::warn;

use crate::config::AuthzConfig;
use crate::error::{ControlError, ControlResult};

/// What the caller wants to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// Deploy units.
    Deploy,
    /// Build a container image.
    Build,
}

impl Action {
    /// Get the action name as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Deploy => "deploy",
            Self::Build => "build",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a permission check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Go ahead.
    Allow,
    /// Refused, with a reason.
    Deny(String),
}

/// Decides whether a user may act for a team.
#[async_trait]
pub trait PermissionChecker: Send + Sync {
    /// Check one request.
    async fn check(&self, user: &str, team: &str, action: Action) -> ControlResult<Decision>;
}

/// Run the gate for one request. A denial becomes
/// [`ControlError::Permission`].
pub async fn authorize(
    checker: &dyn PermissionChecker,
    user: &str,
    team: &str,
    action: Action,
) -> ControlResult<()> {
    match checker.check(user, team, action).await? {
        Decision::Allow => Ok(()),
        Decision::Deny(reason) => {
            warn!(user = %user, team = %team, action = %action, reason = %reason, "request denied");
            Err(ControlError::Permission(reason))
        }
    }
}

/// Static allow-lists. An empty list allows everyone.
#[derive(Debug, Clone, Default)]
pub struct AllowListChecker {
    teams: HashSet<String>,
    users: HashSet<String>,
}

impl AllowListChecker {
    /// Build from configuration.
    #[must_use]
    pub fn from_config(config: &AuthzConfig) -> Self {
        Self {
            teams: config.allowed_teams.iter().cloned().collect(),
            users: config.allowed_users.iter().cloned().collect(),
        }
    }

    /// A checker that allows everything.
    #[must_use]
    pub fn allow_all() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionChecker for AllowListChecker {
    async fn check(&self, user: &str, team: &str, action: Action) -> ControlResult<Decision> {
        if !self.teams.is_empty() && !self.teams.contains(team) {
            return Ok(Decision::Deny(format!("team {team} may not {action}")));
        }
        if !self.users.is_empty() && !self.users.contains(user) {
            return Ok(Decision::Deny(format!("user {user} may not {action}")));
        }
        Ok(Decision::Allow)
    }
}
