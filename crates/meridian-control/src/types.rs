//! Core types for meridian-control.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier for one orchestration run, attached to every log line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(String);

impl RunId {
    /// Create a run ID from an existing string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new unique run ID using ULID.
    #[must_use]
    pub fn generate() -> Self {
        Self(ulid::Ulid::new().to_string().to_lowercase())
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Target environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production.
    Prod,
    /// Everything that is not production.
    Nonprod,
}

impl Environment {
    /// Get the environment name as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Prod => "prod",
            Self::Nonprod => "nonprod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prod" => Ok(Self::Prod),
            "nonprod" => Ok(Self::Nonprod),
            _ => Err(format!("unknown environment: {s} (expected prod or nonprod)")),
        }
    }
}

/// Which variant a deployable unit is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitKind {
    /// One pipeline version.
    Pipeline,
    /// One named alias of a pipeline.
    Alias,
    /// A team namespace with no values payload.
    Namespace,
}

impl UnitKind {
    /// Get the kind name as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pipeline => "pipeline",
            Self::Alias => "alias",
            Self::Namespace => "namespace",
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Rollout state of a single unit, as reported after a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitState {
    /// Nothing has been attempted yet.
    NotStarted,
    /// The namespace create call was issued.
    NamespaceEnsured,
    /// The GitOps project exists.
    ProjectEnsured,
    /// The application-owner record exists.
    AppRegistered,
    /// The chart (and values) were accepted.
    ManifestDeployed,
    /// The GitOps controller accepted the sync request.
    Synced,
    /// A fatal step failed; the unit stopped.
    Failed,
}

impl UnitState {
    /// Get the state name as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::NamespaceEnsured => "namespace_ensured",
            Self::ProjectEnsured => "project_ensured",
            Self::AppRegistered => "app_registered",
            Self::ManifestDeployed => "manifest_deployed",
            Self::Synced => "synced",
            Self::Failed => "failed",
        }
    }

    /// Whether no further transition is possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Synced | Self::Failed)
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for UnitState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "namespace_ensured" => Ok(Self::NamespaceEnsured),
            "project_ensured" => Ok(Self::ProjectEnsured),
            "app_registered" => Ok(Self::AppRegistered),
            "manifest_deployed" => Ok(Self::ManifestDeployed),
            "synced" => Ok(Self::Synced),
            "failed" => Ok(Self::Failed),
            _ => Err(format!("unknown unit state: {s}")),
        }
    }
}

/// Result of a check-then-create step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnsureOutcome {
    /// The resource was created by this call.
    Created,
    /// The resource was already there; nothing was created.
    AlreadyExists,
}

impl EnsureOutcome {
    /// Get the outcome as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::AlreadyExists => "already_exists",
        }
    }
}

impl fmt::Display for EnsureOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What happened to one unit during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitReport {
    /// Application name of the unit.
    pub application_name: String,
    /// Unit kind.
    pub kind: UnitKind,
    /// Final state.
    pub state: UnitState,
    /// Every state reached, in order, starting with `not_started`.
    pub states: Vec<UnitState>,
    /// Namespace create failure, if any. Not fatal.
    pub namespace_error: Option<String>,
    /// Project step outcome.
    pub project: Option<EnsureOutcome>,
    /// Application-owner step outcome.
    pub application_owner: Option<EnsureOutcome>,
    /// Sync requests sent, including the accepted one.
    pub sync_attempts: Option<u32>,
    /// The fatal error, when the unit failed.
    pub error: Option<String>,
    /// When the unit was started.
    pub started_at: DateTime<Utc>,
    /// When the unit reached a terminal state.
    pub finished_at: Option<DateTime<Utc>>,
}

impl UnitReport {
    /// Create a report for a unit that has not started.
    #[must_use]
    pub fn new(application_name: impl Into<String>, kind: UnitKind) -> Self {
        Self {
            application_name: application_name.into(),
            kind,
            state: UnitState::NotStarted,
            states: vec![UnitState::NotStarted],
            namespace_error: None,
            project: None,
            application_owner: None,
            sync_attempts: None,
            error: None,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Whether the unit synced.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.state == UnitState::Synced
    }
}
