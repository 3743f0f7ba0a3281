//! Pipeline definition files.
//!
//! A definition describes one pipeline version, its aliases and how it runs:
//!
//! ```toml
//! [pipeline]
//! name = "demo-1"
//! version = "3"
//! git_repo_url = "https://git.example.com/team-a/demo-1"
//!
//! [[alias]]
//! alias_name = "champion"
//! version_number = "3"
//!
//! [runtime.autoscale]
//! minimum_replicas = 1
//! maximum_replicas = 4
//! target_cpu_utilization = 60
//! target_memory_utilization = 80
//! ```

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ControlError, ControlResult};

/// Highest replica count autoscaling may reach.
pub const MAX_REPLICAS: u32 = 32;

/// Accepted range for the autoscaling CPU target, in percent.
pub const CPU_TARGET_RANGE: std::ops::RangeInclusive<u32> = 40..=90;

/// A parsed, validated pipeline definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineDefinition {
    /// The pipeline itself.
    pub pipeline: PipelineSpec,

    /// Named aliases, deployed in declared order.
    #[serde(default, rename = "alias")]
    pub aliases: Vec<AliasSpec>,

    /// How the pipeline runs.
    #[serde(default)]
    pub runtime: RuntimeSpec,
}

/// Identity and source of a pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineSpec {
    /// Pipeline name.
    pub name: String,
    /// Pipeline version.
    pub version: String,
    /// Source repository URL.
    pub git_repo_url: String,
    /// Branch the image is built from.
    #[serde(default = "default_branch")]
    pub git_repo_branch: String,
    /// Path of the pipeline within the repository.
    #[serde(default)]
    pub git_repo_path: String,
}

fn default_branch() -> String {
    "main".to_owned()
}

impl PipelineSpec {
    /// Repository name: the last path segment of the URL, without `.git`.
    #[must_use]
    pub fn repository(&self) -> &str {
        let url = self.git_repo_url.trim_end_matches('/');
        let last = url.rsplit('/').next().unwrap_or(url);
        last.strip_suffix(".git").unwrap_or(last)
    }
}

/// A named alias pointing at a pipeline version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasSpec {
    /// Alias label.
    pub alias_name: String,
    /// Version the alias routes to.
    pub version_number: String,
}

/// Runtime settings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RuntimeSpec {
    /// Container name override.
    #[serde(default)]
    pub container: Option<String>,

    /// Fixed replica count. Exclusive with `autoscale`.
    #[serde(default)]
    pub fixed_scale: Option<FixedScale>,

    /// Autoscaling bounds. Exclusive with `fixed_scale`.
    #[serde(default)]
    pub autoscale: Option<Autoscale>,

    /// CPU and memory requests/limits.
    #[serde(default)]
    pub resources: Resources,

    /// Whether traces are sampled.
    #[serde(default)]
    pub tracing: bool,

    /// Extra environment variables.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

impl RuntimeSpec {
    /// Replica count written to values; autoscaled pipelines start at the minimum.
    #[must_use]
    pub fn replicas(&self) -> u32 {
        match (&self.fixed_scale, &self.autoscale) {
            (Some(fixed), _) => fixed.replicas,
            (None, Some(auto)) => auto.minimum_replicas,
            (None, None) => 1,
        }
    }
}

/// Fixed replica count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixedScale {
    /// Replicas.
    pub replicas: u32,
}

/// Autoscaling bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Autoscale {
    /// Lower bound.
    pub minimum_replicas: u32,
    /// Upper bound.
    pub maximum_replicas: u32,
    /// CPU utilisation target, percent.
    pub target_cpu_utilization: u32,
    /// Memory utilisation target, percent.
    pub target_memory_utilization: u32,
}

/// CPU and memory sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Resources {
    /// Requested CPU.
    #[serde(default = "default_min_cpu")]
    pub min_cpu: f64,
    /// CPU limit.
    #[serde(default = "default_max_cpu")]
    pub max_cpu: f64,
    /// Requested memory, MB.
    #[serde(default = "default_min_memory_mb")]
    pub min_memory_mb: u32,
    /// Memory limit, MB.
    #[serde(default = "default_max_memory_mb")]
    pub max_memory_mb: u32,
}

const fn default_min_cpu() -> f64 {
    0.5
}

const fn default_max_cpu() -> f64 {
    1.5
}

const fn default_min_memory_mb() -> u32 {
    750
}

const fn default_max_memory_mb() -> u32 {
    1500
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            min_cpu: default_min_cpu(),
            max_cpu: default_max_cpu(),
            min_memory_mb: default_min_memory_mb(),
            max_memory_mb: default_max_memory_mb(),
        }
    }
}

impl PipelineDefinition {
    /// Parse and validate a definition from TOML text.
    pub fn from_toml(text: &str) -> ControlResult<Self> {
        let definition: Self =
            toml::from_str(text).map_err(|e| ControlError::definition(e.to_string()))?;
        definition.validate()?;
        Ok(definition)
    }

    /// Read, parse and validate a definition file.
    pub fn from_file(path: impl AsRef<Path>) -> ControlResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ControlError::definition(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml(&text)
    }

    /// Check every rule a definition must satisfy before anything is deployed.
    pub fn validate(&self) -> ControlResult<()> {
        check_name("pipeline name", &self.pipeline.name)?;
        if self.pipeline.version.trim().is_empty() {
            return Err(ControlError::definition("pipeline version is empty"));
        }
        if self.pipeline.git_repo_url.trim().is_empty() {
            return Err(ControlError::definition("git_repo_url is empty"));
        }

        let mut seen = HashSet::new();
        for alias in &self.aliases {
            check_name("alias name", &alias.alias_name)?;
            if !seen.insert(alias.alias_name.as_str()) {
                return Err(ControlError::definition(format!(
                    "alias {} is declared twice",
                    alias.alias_name
                )));
            }
        }

        let runtime = &self.runtime;
        match (&runtime.fixed_scale, &runtime.autoscale) {
            (Some(_), Some(_)) => {
                return Err(ControlError::definition(
                    "fixed_scale and autoscale are mutually exclusive",
                ))
            }
            (Some(fixed), None) if fixed.replicas == 0 => {
                return Err(ControlError::definition("fixed_scale.replicas must be > 0"))
            }
            (None, Some(auto)) => check_autoscale(auto)?,
            _ => {}
        }

        let resources = &runtime.resources;
        if resources.min_cpu <= 0.0 || resources.min_cpu > resources.max_cpu {
            return Err(ControlError::definition(
                "resources need 0 < min_cpu <= max_cpu",
            ));
        }
        if resources.min_memory_mb == 0 || resources.min_memory_mb > resources.max_memory_mb {
            return Err(ControlError::definition(
                "resources need 0 < min_memory_mb <= max_memory_mb",
            ));
        }

        Ok(())
    }
}

fn check_name(what: &str, name: &str) -> ControlResult<()> {
    if name.trim().is_empty() {
        return Err(ControlError::definition(format!("{what} is empty")));
    }
    // Names end up in Kubernetes resource names.
    if name.contains('_') {
        return Err(ControlError::definition(format!(
            "{what} {name:?} must not contain '_'"
        )));
    }
    Ok(())
}

fn check_autoscale(auto: &Autoscale) -> ControlResult<()> {
    if auto.minimum_replicas == 0 {
        return Err(ControlError::definition(
            "autoscale.minimum_replicas must be > 0",
        ));
    }
    if auto.maximum_replicas > MAX_REPLICAS {
        return Err(ControlError::definition(format!(
            "autoscale.maximum_replicas must be <= {MAX_REPLICAS}"
        )));
    }
    if auto.minimum_replicas >= auto.maximum_replicas {
        return Err(ControlError::definition(
            "autoscale.minimum_replicas must be below maximum_replicas",
        ));
    }
    if !CPU_TARGET_RANGE.contains(&auto.target_cpu_utilization) {
        return Err(ControlError::definition(format!(
            "autoscale.target_cpu_utilization must be within {}..={}",
            CPU_TARGET_RANGE.start(),
            CPU_TARGET_RANGE.end()
        )));
    }
    if auto.target_memory_utilization == 0 || auto.target_memory_utilization > 100 {
        return Err(ControlError::definition(
            "autoscale.target_memory_utilization must be within 1..=100",
        ));
    }
    Ok(())
}
