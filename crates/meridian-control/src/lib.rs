//! Meridian deployment orchestration
//!
//! This crate deploys a pipeline, its aliases and its team namespace onto
//! the platform. Each of those is a deployable unit, and each unit goes
//! through the same chain of remote calls:
//!
//! - ensure the namespace (always created; the platform treats repeats as
//!   no-ops)
//! - ensure the GitOps project (created only if missing)
//! - ensure the application-owner record (created only if missing)
//! - deploy the manifest bundle (chart plus values, or chart only for the
//!   namespace unit)
//! - trigger a sync, retrying while the controller cannot see the
//!   application yet
//!
//! Units are independent: a failed alias is reported and the run carries on
//! with the next unit.
//!
//! # State Machine
//!
//! A unit's rollout is a typestate, so steps cannot be taken out of order:
//!
//! ```text
//! NotStarted ──▶ NamespaceEnsured ──▶ ProjectEnsured ──▶ AppRegistered ──▶ ManifestDeployed ──▶ Synced
//!                      │                    │                  │                  │
//!                      └────────────────────┴──────────────────┴──────────────────┴──▶ Failed
//! ```
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use meridian_control::{
//!     AllowListChecker, ControlConfig, DeploymentRequest, Orchestrator, PlatformClient,
//!     ReqwestTransport, TokioClock,
//! };
//!
//! let config = ControlConfig::load()?;
//! let client = PlatformClient::from_config(&config, transport, platform_token, gitops_token);
//! let orchestrator = Orchestrator::new(
//!     Arc::new(client),
//!     config,
//!     Arc::new(TokioClock::new()),
//!     Arc::new(AllowListChecker::allow_all()),
//! );
//! let summary = orchestrator.deploy_all(request, &cancel).await?;
//! ```

#![forbid(unsafe_code)]

pub mod authz;
pub mod build;
pub mod clock;
pub mod config;
pub mod deployment;
pub mod error;
pub mod platform;
pub mod provisioner;
pub mod remote;
pub mod state;
pub mod transport;
pub mod types;
pub mod unit;

// Re-export commonly used types at the crate root
pub use authz::{authorize, Action, AllowListChecker, Decision, PermissionChecker};
pub use build::{BuildOutcome, BuildRequest, ContainerBuilder};
pub use clock::{Clock, ManualClock, TokioClock};
pub use config::ControlConfig;
pub use deployment::{
    DeployScope, DeploymentRequest, DeploymentSummary, ManifestDeployer, Orchestrator, SyncTrigger,
};
pub use error::{ControlError, ControlResult};
pub use platform::PlatformClient;
pub use provisioner::{EnsureOutcome, ExistenceChecker, ResourceProvisioner};
pub use remote::{poll_until, AuthStyle, PollPolicy, RemoteCaller};
pub use state::Rollout;
pub use transport::{ApiRequest, ApiResponse, HttpMethod, HttpTransport, ReqwestTransport};
pub use types::{Environment, RunId, UnitKind, UnitReport, UnitState};
pub use unit::{DeployableUnit, PipelineDefinition, Team, UnitSet};
