//! Chart and values submission.

use std::sync::Arc;

use tracing::info;

use crate::error::{ControlError, ControlResult};
use crate::platform::{HelmChartRequest, HelmDeployRequest, PlatformClient};
use crate::unit::DeployableUnit;

/// Which endpoint a manifest went to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestShape {
    /// Chart and values.
    ChartAndValues,
    /// Chart only.
    ChartOnly,
}

/// Submits a unit's manifest bundle.
#[derive(Debug, Clone)]
pub struct ManifestDeployer {
    client: Arc<PlatformClient>,
}

impl ManifestDeployer {
    /// Create a deployer.
    #[must_use]
    pub const fn new(client: Arc<PlatformClient>) -> Self {
        Self { client }
    }

    /// Deploy the unit's chart, with values when it has them. Anything but
    /// a 200 is a failure.
    pub async fn deploy(&self, unit: &DeployableUnit) -> ControlResult<ManifestShape> {
        let chart = unit.chart_yaml_base64()?;

        let (shape, response) = match unit.values_yaml_base64()? {
            Some(values) => {
                let request = HelmDeployRequest {
                    base64_chart_yaml_contents: chart,
                    base64_values_yaml_contents: values,
                    environment_name: unit.environment_name().to_owned(),
                    application_name: unit.application_name(),
                    namespace_identifier: unit.namespace_identifier().to_owned(),
                    project_identifier: unit.project_identifier().to_owned(),
                    platform: unit.platform().to_owned(),
                    is_dynamic_environment: false,
                    dynamic_environment_name: String::new(),
                    cluster_type: unit.cluster_type().to_owned(),
                };
                (
                    ManifestShape::ChartAndValues,
                    self.client.deploy_chart_and_values(&request).await?,
                )
            }
            None => {
                let request = HelmChartRequest {
                    base64_yaml_contents: chart,
                    environment_name: unit.environment_name().to_owned(),
                    application_name: unit.application_name(),
                    namespace_identifier: unit.namespace_identifier().to_owned(),
                    project_identifier: unit.project_identifier().to_owned(),
                    platform: unit.platform().to_owned(),
                    is_dynamic_environment: false,
                    dynamic_environment_name: String::new(),
                    cluster_type: unit.cluster_type().to_owned(),
                };
                (
                    ManifestShape::ChartOnly,
                    self.client.deploy_chart(&request).await?,
                )
            }
        };

        if !response.is_ok() {
            return Err(ControlError::remote("deploy manifest", &response));
        }

        info!(shape = ?shape, "manifest deployed");
        Ok(shape)
    }
}
