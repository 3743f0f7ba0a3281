//! Deployable units.
//!
//! A run deploys up to three kinds of unit: the pipeline version itself,
//! one unit per alias, and the team namespace. [`DeployableUnit`] is a
//! closed enum over the three; every name, identifier and manifest the
//! remote calls need is derived here without any I/O.
//!
//! Units are resolved fresh for each run by [`UnitSet::resolve`].

pub mod chart;
pub mod definition;
pub mod values;

use std::sync::Arc;

use crate::config::{ChartPin, ChartsConfig, ControlConfig, TargetConfig};
use crate::error::ControlResult;
use crate::platform::{ApplicationOwner, AppSyncRequest, NamespaceMetadata, ProjectMetadata};
use crate::types::{Environment, UnitKind};

pub use chart::ChartYaml;
pub use definition::{AliasSpec, PipelineDefinition, PipelineSpec, RuntimeSpec};
pub use values::{AliasValues, PipelineValues};

/// The team a run deploys for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Team name; also the GitOps project identifier.
    pub name: String,
    /// Kubernetes namespace the team deploys into.
    pub namespace: String,
    /// Contact recorded on application-owner records.
    pub contact: String,
}

impl Team {
    /// Create a team. The contact defaults to the team name.
    pub fn new(name: impl Into<String>, namespace: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            contact: name.clone(),
            namespace: namespace.into(),
            name,
        }
    }

    /// Set the contact.
    #[must_use]
    pub fn with_contact(mut self, contact: impl Into<String>) -> Self {
        self.contact = contact.into();
        self
    }
}

/// State shared by every unit of one run.
#[derive(Debug, Clone)]
pub struct UnitContext {
    /// Owning team.
    pub team: Team,
    /// Target environment.
    pub environment: Environment,
    /// Platform identifiers.
    pub target: TargetConfig,
    /// Pinned charts.
    pub charts: ChartsConfig,
    /// Source repository name.
    pub repository: String,
    /// Source repository URL.
    pub repository_url: String,
}

/// One pipeline version.
#[derive(Debug, Clone)]
pub struct PipelineUnit {
    context: Arc<UnitContext>,
    pipeline: PipelineSpec,
    runtime: RuntimeSpec,
}

/// One alias of a pipeline.
#[derive(Debug, Clone)]
pub struct AliasUnit {
    context: Arc<UnitContext>,
    pipeline_name: String,
    alias: AliasSpec,
}

/// The team namespace.
#[derive(Debug, Clone)]
pub struct NamespaceUnit {
    context: Arc<UnitContext>,
}

/// Something the orchestrator can deploy.
#[derive(Debug, Clone)]
pub enum DeployableUnit {
    /// A pipeline version.
    Pipeline(PipelineUnit),
    /// A named alias routing to a pipeline version.
    Alias(AliasUnit),
    /// The team namespace. Deployed chart-only.
    Namespace(NamespaceUnit),
}

/// `{platform}-{project_identifier}-{environment}`.
#[must_use]
pub fn rendered_project_name(
    platform: &str,
    project_identifier: &str,
    environment: Environment,
) -> String {
    format!("{platform}-{project_identifier}-{environment}")
}

impl DeployableUnit {
    fn context(&self) -> &UnitContext {
        match self {
            Self::Pipeline(unit) => &unit.context,
            Self::Alias(unit) => &unit.context,
            Self::Namespace(unit) => &unit.context,
        }
    }

    /// Which kind of unit this is.
    #[must_use]
    pub const fn kind(&self) -> UnitKind {
        match self {
            Self::Pipeline(_) => UnitKind::Pipeline,
            Self::Alias(_) => UnitKind::Alias,
            Self::Namespace(_) => UnitKind::Namespace,
        }
    }

    /// Name of the application on the platform.
    #[must_use]
    pub fn application_name(&self) -> String {
        match self {
            Self::Pipeline(unit) => format!("{}-{}", unit.pipeline.name, unit.pipeline.version),
            Self::Alias(unit) => format!("{}-{}", unit.pipeline_name, unit.alias.alias_name),
            Self::Namespace(unit) => format!("{}-ns", unit.context.team.name),
        }
    }

    /// Kubernetes namespace.
    #[must_use]
    pub fn namespace_identifier(&self) -> &str {
        &self.context().team.namespace
    }

    /// GitOps project identifier.
    #[must_use]
    pub fn project_identifier(&self) -> &str {
        &self.context().team.name
    }

    /// Target environment.
    #[must_use]
    pub fn environment(&self) -> Environment {
        self.context().environment
    }

    /// Target environment as sent on the wire.
    #[must_use]
    pub fn environment_name(&self) -> &'static str {
        self.environment().as_str()
    }

    /// Platform name.
    #[must_use]
    pub fn platform(&self) -> &str {
        &self.context().target.platform
    }

    /// Target cluster type.
    #[must_use]
    pub fn cluster_type(&self) -> &str {
        &self.context().target.cluster_type
    }

    /// Chart this unit deploys.
    #[must_use]
    pub fn chart_pin(&self) -> &ChartPin {
        self.context().charts.pin(self.kind())
    }

    /// Project name derived from platform, project and environment.
    #[must_use]
    pub fn rendered_project_name(&self) -> String {
        rendered_project_name(
            self.platform(),
            self.project_identifier(),
            self.environment(),
        )
    }

    /// Chart.yaml text.
    pub fn chart_yaml(&self) -> ControlResult<String> {
        ChartYaml::wrapping(self.chart_pin(), &self.context().charts.repository).to_yaml()
    }

    /// Chart.yaml, encoded for transmission.
    pub fn chart_yaml_base64(&self) -> ControlResult<String> {
        Ok(chart::encode(&self.chart_yaml()?))
    }

    /// values.yaml text. Namespace units have none.
    pub fn values_yaml(&self) -> ControlResult<Option<String>> {
        let chart_name = &self.chart_pin().name;
        match self {
            Self::Pipeline(unit) => {
                let values = PipelineValues::render(
                    &unit.pipeline,
                    &unit.runtime,
                    &unit.context.team.namespace,
                    unit.context.environment,
                    &unit.context.target,
                );
                values::to_yaml_under(chart_name, &values).map(Some)
            }
            Self::Alias(unit) => {
                let values =
                    AliasValues::render(&unit.pipeline_name, &unit.alias, unit.context.environment);
                values::to_yaml_under(chart_name, &values).map(Some)
            }
            Self::Namespace(_) => Ok(None),
        }
    }

    /// values.yaml, encoded for transmission.
    pub fn values_yaml_base64(&self) -> ControlResult<Option<String>> {
        Ok(self.values_yaml()?.as_deref().map(chart::encode))
    }

    /// Namespace create payload.
    #[must_use]
    pub fn namespace_metadata(&self) -> NamespaceMetadata {
        NamespaceMetadata {
            environment_name: self.environment_name().to_owned(),
            application_name: self.application_name(),
            namespace_identifier: self.namespace_identifier().to_owned(),
            project_identifier: self.project_identifier().to_owned(),
            platform: self.platform().to_owned(),
            is_dynamic_environment: false,
            dynamic_environment_name: String::new(),
            account_id: self.context().target.account_id.clone(),
            cluster_type: self.cluster_type().to_owned(),
        }
    }

    /// Project create payload.
    #[must_use]
    pub fn project_metadata(&self) -> ProjectMetadata {
        ProjectMetadata {
            environment_name: self.environment_name().to_owned(),
            application_name: self.application_name(),
            project_identifier: self.project_identifier().to_owned(),
            platform: self.platform().to_owned(),
            rendered_project_name: self.rendered_project_name(),
        }
    }

    /// Application-owner payload.
    #[must_use]
    pub fn application_owner(&self) -> ApplicationOwner {
        let context = self.context();
        ApplicationOwner {
            repository: context.repository.clone(),
            repository_url: context.repository_url.clone(),
            application_contact: context.team.contact.clone(),
            application_name: self.application_name(),
            platform: self.platform().to_owned(),
            allowed_cluster_types: context.target.allowed_cluster_types.clone(),
        }
    }

    /// Sync payload.
    #[must_use]
    pub fn sync_request(&self) -> AppSyncRequest {
        AppSyncRequest {
            environment_name: self.environment_name().to_owned(),
            application_name: self.application_name(),
            project_identifier: self.project_identifier().to_owned(),
            platform: self.platform().to_owned(),
            is_dynamic_environment: false,
            dynamic_environment_name: String::new(),
        }
    }
}

/// Every unit of one run, in deployment order.
#[derive(Debug, Clone)]
pub struct UnitSet {
    /// The pipeline version.
    pub pipeline: DeployableUnit,
    /// Aliases, in declared order.
    pub aliases: Vec<DeployableUnit>,
    /// The team namespace.
    pub namespace: DeployableUnit,
}

impl UnitSet {
    /// Resolve the units for one run.
    #[must_use]
    pub fn resolve(
        definition: &PipelineDefinition,
        team: Team,
        environment: Environment,
        config: &ControlConfig,
    ) -> Self {
        let context = Arc::new(UnitContext {
            team,
            environment,
            target: config.target.clone(),
            charts: config.charts.clone(),
            repository: definition.pipeline.repository().to_owned(),
            repository_url: definition.pipeline.git_repo_url.clone(),
        });

        let pipeline = DeployableUnit::Pipeline(PipelineUnit {
            context: Arc::clone(&context),
            pipeline: definition.pipeline.clone(),
            runtime: definition.runtime.clone(),
        });

        let aliases = definition
            .aliases
            .iter()
            .map(|alias| {
                DeployableUnit::Alias(AliasUnit {
                    context: Arc::clone(&context),
                    pipeline_name: definition.pipeline.name.clone(),
                    alias: alias.clone(),
                })
            })
            .collect();

        Self {
            pipeline,
            aliases,
            namespace: DeployableUnit::Namespace(NamespaceUnit { context }),
        }
    }

    /// All units in deployment order.
    pub fn iter(&self) -> impl Iterator<Item = &DeployableUnit> {
        std::iter::once(&self.pipeline)
            .chain(self.aliases.iter())
            .chain(std::iter::once(&self.namespace))
    }

    /// Number of units.
    #[must_use]
    pub fn len(&self) -> usize {
        self.aliases.len() + 2
    }

    /// Never empty; present for clippy's `len_without_is_empty`.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }
}
