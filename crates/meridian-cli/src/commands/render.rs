//! Implementation of the `meridian render` command.

use std::path::Path;

use anyhow::Result;

use super::TargetArgs;

/// Arguments for the render command.
#[derive(clap::Args)]
pub struct RenderArgs {
    #[command(flatten)]
    pub target: TargetArgs,
}

pub fn run(config_path: Option<&Path>, args: &RenderArgs) -> Result<()> {
    let config = super::load_config(config_path)?;
    let units = args.target.units(&config)?;

    for unit in units.iter() {
        println!("# {} ({})", unit.application_name(), unit.kind());
        println!("# project: {}", unit.rendered_project_name());
        println!("---");
        print!("{}", unit.chart_yaml()?);
        if let Some(values) = unit.values_yaml()? {
            println!("---");
            print!("{values}");
        }
        println!();
    }
    Ok(())
}
