//! Command implementations for the CLI

use crate::{cli::Command, config::Config, core::PLUGINS, utils::process::display_command};
use anyhow::Context;
use tracing::{info, instrument};

/// Execute the appropriate command based on CLI arguments
#[instrument(skip(config))]
pub fn execute_command(config: &Config, command: &Command) -> anyhow::Result<()> {
    match command {
        Command::Build { .. } => execute_build_command(config),
        Command::Command { .. } => execute_print_command(config),
        Command::Schema { .. } => execute_schema_command(config),
        Command::Plugins => execute_plugins_command(),
    }
}

/// Execute the build command
#[instrument(skip(config))]
fn execute_build_command(config: &Config) -> anyhow::Result<()> {
    let plugin = config.selected_plugin()?;
    info!("Building part with the {} plugin...", plugin.name());

    config.validate_directories()?;
    let dirs = config.directories()?;
    let invoker = config.invoker();

    let report = plugin
        .build(&config.options, &dirs, &invoker)
        .with_context(|| format!("Build step of the {} plugin failed", plugin.name()))?;

    info!(
        "Build completed successfully. {} into {}",
        report.summary(),
        dirs.install_dir.display()
    );
    Ok(())
}

/// Execute the command command: print what a build would run
#[instrument(skip(config))]
fn execute_print_command(config: &Config) -> anyhow::Result<()> {
    let plugin = config.selected_plugin()?;
    let configuration = plugin
        .configure(&config.options)
        .context("Failed to configure plugin")?;

    let invoker = config.invoker();
    let program = invoker.program(&configuration, &config.part_build_dir);
    let args = crate::core::BuildInvoker::compose_command_line(&configuration);

    println!("{}", display_command(&program, &args));
    Ok(())
}

/// Execute the schema command
#[instrument(skip(config))]
fn execute_schema_command(config: &Config) -> anyhow::Result<()> {
    let plugin = config.selected_plugin()?;
    let schema =
        serde_yaml::to_string(&plugin.schema()).context("Failed to serialize option schema")?;

    print!("{schema}");
    Ok(())
}

/// Execute the plugins command
fn execute_plugins_command() -> anyhow::Result<()> {
    for plugin in PLUGINS {
        let packages = plugin.build_packages();
        if packages.is_empty() {
            println!("{:<10} {}", plugin.name(), plugin.description());
        } else {
            println!(
                "{:<10} {} (needs: {})",
                plugin.name(),
                plugin.description(),
                packages.join(", ")
            );
        }
    }
    Ok(())
}
