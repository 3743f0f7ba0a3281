//! values.yaml rendering for pipeline and alias charts.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::TargetConfig;
use crate::error::ControlResult;
use crate::types::Environment;

use super::definition::{AliasSpec, PipelineSpec, RuntimeSpec};

/// Port the alias router forwards to.
pub const ALIAS_MODEL_PORT: u16 = 8081;

/// Values for the pipeline chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineValues {
    /// Replica count, as a string.
    pub replica_count: String,
    /// Resource name override.
    pub fullname_override: String,
    /// Environment name.
    pub environment: String,
    /// Container name.
    pub container_name: String,
    /// Image reference.
    pub image: ImageValues,
    /// Requests and limits.
    pub resources: ResourceValues,
    /// Ingress routing.
    pub ingress: IngressValues,
    /// Container environment.
    pub envvars: Vec<EnvVar>,
    /// Present only for autoscaled pipelines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autoscaling: Option<AutoscalingValues>,
    /// Present only when tracing is off.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring: Option<MonitoringValues>,
}

/// Image reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageValues {
    /// Full image path including tag.
    pub path: String,
}

/// Requests and limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceValues {
    /// Upper bounds.
    pub limits: ResourceQuantity,
    /// Guaranteed amounts.
    pub requests: ResourceQuantity,
}

/// CPU and memory in Kubernetes quantity notation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceQuantity {
    /// CPU cores, e.g. `1.5`.
    pub cpu: String,
    /// Memory, e.g. `1500M`.
    pub memory: String,
}

/// Ingress routing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressValues {
    /// Host rules.
    pub hosts: Vec<IngressHost>,
}

/// One ingress host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngressHost {
    /// Hostname.
    pub host: String,
    /// Routed paths.
    pub paths: Vec<IngressPath>,
}

/// One routed path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngressPath {
    /// Path prefix.
    pub path: String,
    /// Always `Prefix`.
    pub path_type: String,
}

/// One environment variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    /// Name.
    pub name: String,
    /// Value.
    pub value: String,
}

impl EnvVar {
    fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Horizontal autoscaler settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoscalingValues {
    /// Always true when present.
    pub enabled: bool,
    /// Lower bound.
    #[serde(rename = "minReplicas")]
    pub min_replicas: u32,
    /// Upper bound.
    #[serde(rename = "maxReplicas")]
    pub max_replicas: u32,
    /// CPU target, as a string.
    #[serde(rename = "targetCPUUtilizationPercentage")]
    pub target_cpu_utilization_percentage: String,
    /// Memory target, as a string.
    #[serde(rename = "targetMemoryUtilizationPercentage")]
    pub target_memory_utilization_percentage: String,
}

/// Monitoring switches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoringValues {
    /// OpenTelemetry sidecar.
    pub otel: OtelValues,
}

/// OpenTelemetry sidecar switch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OtelValues {
    /// Whether the sidecar runs.
    pub enabled: bool,
}

impl PipelineValues {
    /// Render values for one pipeline version in a team namespace.
    #[must_use]
    pub fn render(
        pipeline: &PipelineSpec,
        runtime: &RuntimeSpec,
        namespace: &str,
        environment: Environment,
        target: &TargetConfig,
    ) -> Self {
        let name = &pipeline.name;
        let version = &pipeline.version;
        let full_name = format!("{name}-{version}");

        let mut envvars: Vec<EnvVar> = runtime
            .env
            .iter()
            .map(|(k, v)| EnvVar::new(k, v))
            .collect();
        envvars.push(EnvVar::new(
            "OTEL_RESOURCE_ATTRIBUTES",
            format!(
                "service.name=meridian - {name}, service.namespace={namespace}, service.version={version}"
            ),
        ));
        envvars.push(EnvVar::new(
            "OTEL_TRACES_SAMPLER",
            if runtime.tracing {
                "always_on"
            } else {
                "always_off"
            },
        ));

        let resources = &runtime.resources;

        Self {
            replica_count: runtime.replicas().to_string(),
            fullname_override: full_name.clone(),
            environment: environment.to_string(),
            container_name: runtime.container.clone().unwrap_or(full_name),
            image: ImageValues {
                path: format!(
                    "{}/internal/containerimages/{}/{namespace}/{name}:{version}",
                    target.registry, target.platform
                ),
            },
            resources: ResourceValues {
                limits: ResourceQuantity {
                    cpu: resources.max_cpu.to_string(),
                    memory: format!("{}M", resources.max_memory_mb),
                },
                requests: ResourceQuantity {
                    cpu: resources.min_cpu.to_string(),
                    memory: format!("{}M", resources.min_memory_mb),
                },
            },
            ingress: IngressValues {
                hosts: vec![IngressHost {
                    host: target.ingress_host(environment),
                    paths: vec![IngressPath {
                        path: format!("/v1/pipelines/{name}/versions/{version}"),
                        path_type: "Prefix".to_owned(),
                    }],
                }],
            },
            envvars,
            autoscaling: runtime.autoscale.map(|auto| AutoscalingValues {
                enabled: true,
                min_replicas: auto.minimum_replicas,
                max_replicas: auto.maximum_replicas,
                target_cpu_utilization_percentage: auto.target_cpu_utilization.to_string(),
                target_memory_utilization_percentage: auto
                    .target_memory_utilization
                    .to_string(),
            }),
            monitoring: (!runtime.tracing).then_some(MonitoringValues {
                otel: OtelValues { enabled: false },
            }),
        }
    }
}

/// Values for the alias chart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AliasValues {
    /// Pipeline name.
    pub model_name: String,
    /// Version the alias routes to.
    pub model_version: String,
    /// Alias label.
    pub alias_name: String,
    /// Environment name.
    pub environment: String,
    /// Port traffic is forwarded to.
    pub model_port: u16,
}

impl AliasValues {
    /// Render values for one alias.
    #[must_use]
    pub fn render(pipeline_name: &str, alias: &AliasSpec, environment: Environment) -> Self {
        Self {
            model_name: pipeline_name.to_owned(),
            model_version: alias.version_number.clone(),
            alias_name: alias.alias_name.clone(),
            environment: environment.to_string(),
            model_port: ALIAS_MODEL_PORT,
        }
    }
}

/// Serialise `values` nested under the dependency chart's name, which is
/// how Helm passes values to a subchart.
pub fn to_yaml_under<T: Serialize>(chart_name: &str, values: &T) -> ControlResult<String> {
    let mut root = BTreeMap::new();
    root.insert(chart_name, values);
    Ok(serde_yaml::to_string(&root)?)
}
