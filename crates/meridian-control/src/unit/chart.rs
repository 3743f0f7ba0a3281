//! Chart.yaml rendering and manifest encoding.

use base64::engine::general_purpose::URL_SAFE;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::config::ChartPin;
use crate::error::{ControlError, ControlResult};

/// Version stamped on every wrapper chart, for both `version` and
/// `appVersion`.
pub const WRAPPER_VERSION: &str = "1.0.0";

/// A Helm Chart.yaml wrapping one pinned dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartYaml {
    /// Always `v2`.
    pub api_version: String,
    /// Chart name, the same as the wrapped chart.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Always `application`.
    #[serde(rename = "type")]
    pub chart_type: String,
    /// Wrapper chart version.
    pub version: String,
    /// Always [`WRAPPER_VERSION`].
    pub app_version: String,
    /// The single pinned dependency.
    pub dependencies: Vec<ChartDependency>,
}

/// A chart dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartDependency {
    /// Dependency chart name.
    pub name: String,
    /// Pinned version.
    pub version: String,
    /// Repository URL.
    pub repository: String,
}

impl ChartYaml {
    /// Wrap `pin` from `repository` in a chart of the same name.
    #[must_use]
    pub fn wrapping(pin: &ChartPin, repository: &str) -> Self {
        Self {
            api_version: "v2".to_owned(),
            name: pin.name.clone(),
            description: format!("Auto-generated template for {}", pin.name),
            chart_type: "application".to_owned(),
            version: WRAPPER_VERSION.to_owned(),
            app_version: WRAPPER_VERSION.to_owned(),
            dependencies: vec![ChartDependency {
                name: pin.name.clone(),
                version: pin.version.clone(),
                repository: repository.to_owned(),
            }],
        }
    }

    /// Serialise to YAML.
    pub fn to_yaml(&self) -> ControlResult<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}

/// Encode manifest text for transmission: URL-safe alphabet, padded.
#[must_use]
pub fn encode(text: &str) -> String {
    URL_SAFE.encode(text.as_bytes())
}

/// Decode a manifest blob produced by [`encode`].
pub fn decode(blob: &str) -> ControlResult<String> {
    let bytes = URL_SAFE
        .decode(blob)
        .map_err(|e| ControlError::manifest(format!("invalid base64: {e}")))?;
    String::from_utf8(bytes).map_err(|e| ControlError::manifest(format!("invalid UTF-8: {e}")))
}
