//! Fixtures: definitions, teams, requests and scripted platform states.

use meridian_control::{
    platform::endpoints,
    transport::HttpMethod,
    unit::{PipelineDefinition, Team, UnitSet},
    DeployScope, DeploymentRequest, Environment,
};

use super::{test_config, ScriptedTransport};

pub const SYNC_NOT_VISIBLE: &str =
    r#"{"detail":"Could not find any ArgoCD Applications matching demo-1-3"}"#;

/// Builder for pipeline definitions.
pub struct DefinitionBuilder {
    name: String,
    version: String,
    aliases: Vec<(String, String)>,
}

impl DefinitionBuilder {
    /// A pipeline called `name` at `version`.
    pub fn new(name: &str, version: &str) -> Self {
        Self {
            name: name.to_owned(),
            version: version.to_owned(),
            aliases: vec![],
        }
    }

    /// Adds an alias.
    pub fn with_alias(mut self, alias: &str, version: &str) -> Self {
        self.aliases.push((alias.to_owned(), version.to_owned()));
        self
    }

    /// Builds the definition.
    pub fn build(self) -> PipelineDefinition {
        let mut text = format!(
            "[pipeline]\nname = \"{}\"\nversion = \"{}\"\ngit_repo_url = \"https://git.example.com/team-a/{}\"\n",
            self.name, self.version, self.name
        );
        for (alias, version) in &self.aliases {
            text.push_str(&format!(
                "\n[[alias]]\nalias_name = \"{alias}\"\nversion_number = \"{version}\"\n"
            ));
        }
        PipelineDefinition::from_toml(&text).unwrap()
    }
}

/// The `team-a` team deploying into namespace `team-a`.
pub fn team_a() -> Team {
    Team::new("team-a", "team-a")
}

/// Units for `definition` deployed by team-a to nonprod.
pub fn units(definition: &PipelineDefinition) -> UnitSet {
    UnitSet::resolve(definition, team_a(), Environment::Nonprod, &test_config())
}

/// A run for team-a in nonprod.
pub fn request(definition: PipelineDefinition) -> DeploymentRequest {
    DeploymentRequest {
        definition,
        team: team_a(),
        environment: Environment::Nonprod,
        user: "alice".to_owned(),
        scope: DeployScope::All,
    }
}

/// Script a platform where nothing exists yet and every create succeeds.
pub fn fresh_platform(transport: &ScriptedTransport) {
    transport
        .respond(HttpMethod::Post, endpoints::NAMESPACE, 200, "{}")
        .respond(HttpMethod::Get, endpoints::PROJECTS, 200, "[]")
        .respond(HttpMethod::Post, endpoints::PROJECTS, 200, "{}")
        .respond(HttpMethod::Get, endpoints::APPLICATION_OWNER, 500, "not found")
        .respond(HttpMethod::Post, endpoints::APP_OWNERS, 200, "{}")
        .respond(HttpMethod::Post, endpoints::CHART_AND_VALUES, 200, "{}")
        .respond(HttpMethod::Post, endpoints::CHART_ONLY, 200, "{}")
        .respond(HttpMethod::Post, endpoints::APP_SYNC, 200, "{}");
}

/// Script a platform where the project and application owners exist.
pub fn provisioned_platform(transport: &ScriptedTransport) {
    transport
        .respond(HttpMethod::Post, endpoints::NAMESPACE, 200, "{}")
        .respond(
            HttpMethod::Get,
            endpoints::PROJECTS,
            200,
            r#"["eds-team-a-nonprod","eds-team-b-nonprod"]"#,
        )
        .respond(HttpMethod::Get, endpoints::APPLICATION_OWNER, 200, "{}")
        .respond(HttpMethod::Post, endpoints::CHART_AND_VALUES, 200, "{}")
        .respond(HttpMethod::Post, endpoints::CHART_ONLY, 200, "{}")
        .respond(HttpMethod::Post, endpoints::APP_SYNC, 200, "{}");
}
