//! Implementation of the `meridian build` command.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use meridian_control::platform::ContainerBuildRequest;
use meridian_control::{AllowListChecker, BuildRequest, ContainerBuilder, TokioClock};
use tokio_util::sync::CancellationToken;

/// Arguments for the build command.
#[derive(clap::Args)]
pub struct BuildArgs {
    /// Repository name
    #[arg(long)]
    pub repository: String,

    /// Branch to build
    #[arg(long, default_value = "main")]
    pub branch: String,

    /// Commit SHA to build
    #[arg(long)]
    pub commit: String,

    /// Image name
    #[arg(long)]
    pub image: String,

    /// Team requesting the build
    #[arg(short, long)]
    pub team: String,

    /// Namespace the image is published under
    #[arg(short, long)]
    pub namespace: String,

    /// Dockerfile path in the repository
    #[arg(long, default_value = "Dockerfile")]
    pub dockerfile: String,

    /// Build context in the repository
    #[arg(long, default_value = ".")]
    pub context: String,

    /// Image tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,

    /// Extra registry to push to (repeatable)
    #[arg(long = "registry")]
    pub registries: Vec<String>,

    /// Build argument as KEY=VALUE (repeatable)
    #[arg(long = "build-arg")]
    pub build_args: Vec<String>,

    /// Clone depth
    #[arg(long, default_value_t = 1)]
    pub fetch_depth: u32,

    /// User requesting the build
    #[arg(short, long, env = "USER", default_value = "unknown")]
    pub user: String,
}

fn parse_build_args(raw: &[String]) -> Result<BTreeMap<String, String>> {
    raw.iter()
        .map(|pair| {
            pair.split_once('=')
                .map(|(k, v)| (k.to_owned(), v.to_owned()))
                .with_context(|| format!("build argument {pair} is not KEY=VALUE"))
        })
        .collect()
}

pub async fn run(
    config_path: Option<&Path>,
    args: BuildArgs,
    cancel: &CancellationToken,
) -> Result<()> {
    let config = super::load_config(config_path)?;

    let mut registries = vec![config.target.registry.clone()];
    registries.extend(args.registries);

    let image = ContainerBuildRequest {
        repository: args.repository,
        git_branch: args.branch,
        git_commit_sha: args.commit,
        image_name: args.image,
        dockerfile_path: args.dockerfile,
        docker_context: args.context,
        namespace: args.namespace,
        injected_aws_role_arn: None,
        injected_aws_account_short_alias: None,
        image_tags: args.tags,
        registries,
        build_args: parse_build_args(&args.build_args)?,
        git_fetch_depth: args.fetch_depth,
    };
    let request = BuildRequest {
        user: args.user,
        team: args.team,
        image,
    };

    let client = super::platform_client(&config)?;
    let builder = ContainerBuilder::new(
        Arc::new(client),
        Arc::new(TokioClock::new()),
        config.poll.policy(),
        Arc::new(AllowListChecker::from_config(&config.authz)),
    );

    let outcome = builder
        .build(&request, cancel)
        .await
        .context("container build failed")?;

    println!("built {} at {}", request.image.image_name, outcome.commit_sha);
    if let Some(url) = outcome.html_url {
        println!("log: {url}");
    }
    Ok(())
}
