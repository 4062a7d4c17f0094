//! Configuration management for the dub builder
//!
//! Centralizes the options of one invocation and provides validation.

use crate::{
    cli::{Args, Command, PluginArgs},
    core::{
        invoker::DUB_PROGRAM, plugin, BuildDirectories, BuildInvoker, Plugin, PluginOptions,
    },
    error::BuilderError,
};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    /// Enable debug logging
    pub debug: bool,
    /// Registry name of the selected plugin
    pub plugin: String,
    /// Plugin options, file values overlaid with command-line overrides
    pub options: PluginOptions,
    /// dub executable to run
    pub dub_program: String,
    /// Project source root and dub output location
    pub part_build_dir: PathBuf,
    /// Destination for finished artifacts
    pub install_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            plugin: "dub".to_string(),
            options: PluginOptions::default(),
            dub_program: DUB_PROGRAM.to_string(),
            part_build_dir: PathBuf::from("."),
            install_dir: PathBuf::from("install"),
        }
    }
}

impl Config {
    /// Create configuration from command line arguments
    pub fn from_args(args: &Args) -> Result<Self, BuilderError> {
        let mut config = Self {
            debug: args.debug,
            ..Self::default()
        };

        // Override with command-specific options
        match &args.command {
            Command::Build {
                plugin,
                build_dir,
                install_dir,
            } => {
                config.apply_plugin_args(plugin)?;
                config.part_build_dir = build_dir.clone();
                config.install_dir = install_dir.clone();
            }
            Command::Command { plugin } => {
                config.apply_plugin_args(plugin)?;
            }
            Command::Schema { plugin } => {
                config.plugin = plugin.clone();
            }
            Command::Plugins => {}
        }

        config.validate()?;
        Ok(config)
    }

    fn apply_plugin_args(&mut self, args: &PluginArgs) -> Result<(), BuilderError> {
        let from_file = match &args.options_file {
            Some(path) => PluginOptions::from_yaml_file(path)?,
            None => PluginOptions::default(),
        };

        self.plugin = args.plugin.clone();
        self.options = from_file.overlay(args.overrides());
        self.dub_program = args.dub.clone();
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), BuilderError> {
        plugin::lookup(&self.plugin)?;

        if self.dub_program.is_empty() {
            return Err(BuilderError::configuration("dub executable must not be empty"));
        }

        Ok(())
    }

    /// Check that the build directory is usable before running a build
    pub fn validate_directories(&self) -> Result<(), BuilderError> {
        if !self.part_build_dir.is_dir() {
            return Err(BuilderError::configuration(format!(
                "Build directory not found: {}",
                self.part_build_dir.display()
            )));
        }
        if self.install_dir.exists() && !self.install_dir.is_dir() {
            return Err(BuilderError::configuration(format!(
                "Install directory is not a directory: {}",
                self.install_dir.display()
            )));
        }
        Ok(())
    }

    /// The selected plugin
    pub fn selected_plugin(&self) -> Result<&'static dyn Plugin, BuilderError> {
        plugin::lookup(&self.plugin)
    }

    /// Directories of the part being built
    pub fn directories(&self) -> Result<BuildDirectories, BuilderError> {
        BuildDirectories::new(&self.part_build_dir, &self.install_dir)
    }

    /// An invoker for this configuration
    pub fn invoker(&self) -> BuildInvoker {
        BuildInvoker::new(self.debug, self.dub_program.clone())
    }
}
