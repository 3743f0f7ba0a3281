//! Per-unit state machine and the run loop over units.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn, Instrument};

use crate::authz::{authorize, Action, PermissionChecker};
use crate::clock::Clock;
use crate::config::ControlConfig;
use crate::error::{ControlError, ControlResult};
use crate::platform::{application_healthy, PlatformClient};
use crate::provisioner::ResourceProvisioner;
use crate::remote::poll_until;
use crate::state::{Finished, InFlight, Rollout};
use crate::transport::ApiResponse;
use crate::types::{Environment, RunId, UnitReport};
use crate::unit::{DeployableUnit, PipelineDefinition, Team, UnitSet};

use super::manifest::ManifestDeployer;
use super::sync::SyncTrigger;

/// Which units a run covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeployScope {
    /// Pipeline, then aliases, then namespace.
    #[default]
    All,
    /// Only the pipeline unit.
    Pipeline,
    /// Only the alias units.
    Aliases,
    /// Only the namespace unit.
    Namespace,
}

/// One deployment run.
#[derive(Debug, Clone)]
pub struct DeploymentRequest {
    /// Pipeline to deploy.
    pub definition: PipelineDefinition,
    /// Owning team.
    pub team: Team,
    /// Target environment.
    pub environment: Environment,
    /// Who asked; checked against the permission gate.
    pub user: String,
    /// Which units to deploy.
    pub scope: DeployScope,
}

/// Reports for every unit a run touched.
#[derive(Debug, Clone, Serialize)]
pub struct DeploymentSummary {
    /// Run identifier.
    pub run_id: RunId,
    /// Unit reports, in deployment order.
    pub units: Vec<UnitReport>,
}

impl DeploymentSummary {
    /// Whether every unit synced.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.units.iter().all(UnitReport::succeeded)
    }

    /// Units that did not sync.
    pub fn failures(&self) -> impl Iterator<Item = &UnitReport> {
        self.units.iter().filter(|u| !u.succeeded())
    }
}

/// Sequences provisioning, manifest deploy and sync for each unit.
pub struct Orchestrator {
    client: Arc<PlatformClient>,
    provisioner: ResourceProvisioner,
    manifests: ManifestDeployer,
    sync: SyncTrigger,
    config: ControlConfig,
    clock: Arc<dyn Clock>,
    permissions: Arc<dyn PermissionChecker>,
}

impl Orchestrator {
    /// Create an orchestrator.
    pub fn new(
        client: Arc<PlatformClient>,
        config: ControlConfig,
        clock: Arc<dyn Clock>,
        permissions: Arc<dyn PermissionChecker>,
    ) -> Self {
        Self {
            provisioner: ResourceProvisioner::new(Arc::clone(&client)),
            manifests: ManifestDeployer::new(Arc::clone(&client)),
            sync: SyncTrigger::new(Arc::clone(&client), Arc::clone(&clock), config.sync.policy()),
            client,
            config,
            clock,
            permissions,
        }
    }

    /// Configuration in use.
    #[must_use]
    pub const fn config(&self) -> &ControlConfig {
        &self.config
    }

    /// Deploy every unit in scope.
    ///
    /// The permission gate runs once, before any remote call. After that
    /// units run one at a time and a failed unit never stops the next
    /// one; the summary carries a report per unit.
    pub async fn deploy_all(
        &self,
        request: DeploymentRequest,
        cancel: &CancellationToken,
    ) -> ControlResult<DeploymentSummary> {
        let run_id = RunId::generate();
        let span = info_span!(
            "deploy_units",
            run_id = %run_id,
            team = %request.team.name,
            environment = %request.environment,
        );

        self.run(run_id, request, cancel).instrument(span).await
    }

    async fn run(
        &self,
        run_id: RunId,
        request: DeploymentRequest,
        cancel: &CancellationToken,
    ) -> ControlResult<DeploymentSummary> {
        authorize(
            self.permissions.as_ref(),
            &request.user,
            &request.team.name,
            Action::Deploy,
        )
        .await?;

        let units = UnitSet::resolve(
            &request.definition,
            request.team,
            request.environment,
            &self.config,
        );
        info!(units = units.len(), scope = ?request.scope, "starting deployment run");

        let mut reports = Vec::with_capacity(units.len());
        if matches!(request.scope, DeployScope::All | DeployScope::Pipeline) {
            reports.push(self.deploy_pipeline(&units, cancel).await);
        }
        if matches!(request.scope, DeployScope::All | DeployScope::Aliases) {
            reports.extend(self.deploy_aliases(&units, cancel).await);
        }
        if matches!(request.scope, DeployScope::All | DeployScope::Namespace) {
            reports.push(self.deploy_namespace(&units, cancel).await);
        }

        let summary = DeploymentSummary {
            run_id,
            units: reports,
        };
        info!(
            succeeded = summary.units.iter().filter(|u| u.succeeded()).count(),
            failed = summary.failures().count(),
            "deployment run finished"
        );
        Ok(summary)
    }

    /// Deploy the pipeline unit.
    pub async fn deploy_pipeline(&self, units: &UnitSet, cancel: &CancellationToken) -> UnitReport {
        self.deploy_application(&units.pipeline, cancel).await
    }

    /// Deploy each alias in declared order. A failed alias does not stop
    /// the ones after it.
    pub async fn deploy_aliases(
        &self,
        units: &UnitSet,
        cancel: &CancellationToken,
    ) -> Vec<UnitReport> {
        let mut reports = Vec::with_capacity(units.aliases.len());
        for alias in &units.aliases {
            reports.push(self.deploy_application(alias, cancel).await);
        }
        reports
    }

    /// Deploy the namespace unit.
    pub async fn deploy_namespace(&self, units: &UnitSet, cancel: &CancellationToken) -> UnitReport {
        self.deploy_application(&units.namespace, cancel).await
    }

    /// Run one unit through namespace, project, application owner,
    /// manifest and sync. Never fails: the outcome is in the report.
    pub async fn deploy_application(
        &self,
        unit: &DeployableUnit,
        cancel: &CancellationToken,
    ) -> UnitReport {
        let span = info_span!(
            "deploy_unit",
            unit = %unit.application_name(),
            kind = %unit.kind(),
        );
        self.rollout(unit, cancel)
            .instrument(span)
            .await
            .into_report()
    }

    async fn rollout(&self, unit: &DeployableUnit, cancel: &CancellationToken) -> Finished {
        let rollout = Rollout::start(unit.application_name(), unit.kind());
        if cancel.is_cancelled() {
            return fail(rollout, ControlError::cancelled("deploy unit"));
        }

        let namespace_meta = unit.namespace_metadata();
        let namespace = self.provisioner.ensure_namespace(&namespace_meta);
        let rollout = match step("ensure namespace", cancel, namespace).await {
            Ok(()) => rollout.namespace_ensured(),
            Err(e @ ControlError::Cancelled { .. }) => return fail(rollout, e),
            Err(e) => {
                warn!(error = %e, "namespace create failed, continuing");
                rollout.namespace_unconfirmed(e.to_string())
            }
        };

        let project_meta = unit.project_metadata();
        let project = self.provisioner.ensure_project(&project_meta);
        let rollout = match step("ensure project", cancel, project).await {
            Ok(outcome) => rollout.project_ensured(outcome),
            Err(e) => return fail(rollout, e),
        };

        let owner_meta = unit.application_owner();
        let owner = self.provisioner.ensure_application_owner(&owner_meta);
        let rollout = match step("ensure application owner", cancel, owner).await {
            Ok(outcome) => rollout.app_registered(outcome),
            Err(e) => return fail(rollout, e),
        };

        let manifest = self.manifests.deploy(unit);
        let rollout = match step("deploy manifest", cancel, manifest).await {
            Ok(_) => rollout.manifest_deployed(),
            Err(e) => return fail(rollout, e),
        };

        match self.sync.sync(&unit.sync_request(), cancel).await {
            Ok(attempts) => {
                info!(sync_attempts = attempts, "unit synced");
                rollout.synced(attempts).into()
            }
            Err(e) => fail(rollout, e),
        }
    }

    /// Poll an application status URL until it reports healthy.
    pub async fn await_healthy(
        &self,
        status_url: &str,
        cancel: &CancellationToken,
    ) -> ControlResult<ApiResponse> {
        poll_until(
            "application health",
            || self.client.application_status(status_url),
            application_healthy,
            self.config.poll.policy(),
            self.clock.as_ref(),
            cancel,
        )
        .await
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("client", &self.client)
            .field("sync", &self.sync)
            .finish_non_exhaustive()
    }
}

/// Run a step unless the run is cancelled first.
async fn step<T>(
    operation: &str,
    cancel: &CancellationToken,
    fut: impl Future<Output = ControlResult<T>>,
) -> ControlResult<T> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ControlError::cancelled(operation)),
        result = fut => result,
    }
}

fn fail<S: InFlight>(rollout: Rollout<S>, error: ControlError) -> Finished {
    error!(state = %rollout.state(), error = %error, "unit failed");
    rollout.fail(error.to_string()).into()
}
