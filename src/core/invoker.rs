//! Build invocation
//!
//! Turns a `BuildConfiguration` into one external command, runs it in the
//! project directory, then materializes its output in the install directory.

use crate::{
    core::{
        artifacts::{ArtifactCollector, CollectedArtifact, CollectionSummary},
        configuration::{BuildConfiguration, BuildDirectories},
    },
    error::Result,
    utils::{env::Environment, process::display_command, process::ProcessRunner},
};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Default name of the dub executable
pub const DUB_PROGRAM: &str = "dub";

/// Script that bootstraps dub with dmd, ldmd2 or gdmd
pub const BOOTSTRAP_SCRIPT: &str = "build.sh";

/// Script that bootstraps dub with gdc
pub const BOOTSTRAP_SCRIPT_GDC: &str = "build-gdc.sh";

/// Progress of a single build step
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BuildStage {
    NotStarted,
    CommandExecuted,
    ArtifactsCollected,
}

impl std::fmt::Display for BuildStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::CommandExecuted => "command executed",
            Self::ArtifactsCollected => "artifacts collected",
        };
        f.write_str(name)
    }
}

/// Outcome of a successful build step
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Registry name of the plugin that ran
    pub plugin: String,
    /// The command line that was executed
    pub command: String,
    /// Last stage reached
    pub stage: BuildStage,
    /// Everything placed in the install directory
    pub artifacts: Vec<CollectedArtifact>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl BuildReport {
    /// Wall-clock time of the build step
    pub fn duration(&self) -> chrono::Duration {
        self.finished_at - self.started_at
    }

    /// Tally of collected artifacts
    pub fn summary(&self) -> CollectionSummary {
        CollectionSummary::from_artifacts(&self.artifacts)
    }
}

/// Runs the external build and collects its artifacts
#[derive(Debug)]
pub struct BuildInvoker {
    process_runner: ProcessRunner,
    collector: ArtifactCollector,
    dub_program: String,
    environment: Environment,
}

impl BuildInvoker {
    /// Create an invoker that runs `dub_program` with the inherited environment
    pub fn new(debug: bool, dub_program: impl Into<String>) -> Self {
        Self {
            process_runner: ProcessRunner::new(debug),
            collector: ArtifactCollector::new(),
            dub_program: dub_program.into(),
            environment: Environment::inherited(),
        }
    }

    /// Replace the base environment handed to external commands
    #[must_use]
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Arguments passed to dub for `configuration`.
    ///
    /// Empty options are left out entirely. Bootstrap builds do not call dub
    /// and get no arguments.
    pub fn compose_command_line(configuration: &BuildConfiguration) -> Vec<String> {
        let mut args = Vec::new();

        match configuration {
            BuildConfiguration::TypedBuild {
                build_type,
                build_config,
                build_target,
                ..
            } => {
                args.push("build".to_string());
                if !build_type.is_empty() {
                    args.push(format!("--build={build_type}"));
                }
                if !build_config.is_empty() {
                    args.push(format!("--config={build_config}"));
                }
                if !build_target.is_empty() {
                    args.push(build_target.clone());
                }
            }
            BuildConfiguration::FlagBased {
                build_target,
                build_flags,
                ..
            } => {
                args.push("build".to_string());
                if !build_target.is_empty() {
                    args.push(build_target.clone());
                }
                args.extend(build_flags.iter().filter(|f| !f.is_empty()).cloned());
            }
            BuildConfiguration::BootstrapBuild { .. } => {}
        }

        args
    }

    /// Program to execute for `configuration`, relative scripts resolved
    /// against `working_dir`
    pub fn program(&self, configuration: &BuildConfiguration, working_dir: &Path) -> String {
        match configuration {
            BuildConfiguration::BootstrapBuild { compiler_selector } => {
                let script = if compiler_selector == "gdc" {
                    BOOTSTRAP_SCRIPT_GDC
                } else {
                    BOOTSTRAP_SCRIPT
                };
                working_dir.join(script).to_string_lossy().into_owned()
            }
            _ => self.dub_program.clone(),
        }
    }

    /// Environment snapshot the external command runs with
    pub fn environment_for(&self, configuration: &BuildConfiguration) -> Environment {
        match configuration {
            BuildConfiguration::BootstrapBuild { compiler_selector } => {
                self.environment.with_compiler(compiler_selector)
            }
            _ => self.environment.clone(),
        }
    }

    /// Warn about build packages that are not on PATH
    pub fn check_build_packages(&self, packages: &[&str]) {
        for package in packages {
            if !self.process_runner.command_exists(package, &self.environment) {
                warn!("Build package '{}' was not found on PATH", package);
            }
        }
    }

    /// Run the external command to completion
    #[instrument(skip(self, env))]
    pub fn execute(
        &self,
        program: &str,
        args: &[String],
        env: &Environment,
        working_dir: &Path,
    ) -> Result<()> {
        self.process_runner.run_command(program, args, env, working_dir)
    }

    /// Copy the top-level entries of `artifact_dir` into `install_dir`
    pub fn collect_artifacts(
        &self,
        artifact_dir: &Path,
        install_dir: &Path,
    ) -> Result<Vec<CollectedArtifact>> {
        self.collector.collect(artifact_dir, install_dir)
    }

    /// Run one complete build step for `plugin`.
    ///
    /// Any failure stops the sequence; files already copied stay in place.
    #[instrument(skip(self, configuration, dirs), fields(style = configuration.style()))]
    pub fn run(
        &self,
        plugin: &str,
        configuration: &BuildConfiguration,
        dirs: &BuildDirectories,
    ) -> Result<BuildReport> {
        let started_at = Utc::now();
        let mut stage = BuildStage::NotStarted;

        let working_dir = dirs.part_build_dir.as_path();
        let program = self.program(configuration, working_dir);
        let args = Self::compose_command_line(configuration);
        let env = self.environment_for(configuration);
        let command = display_command(&program, &args);

        info!("Building part with plugin {}: {}", plugin, command);

        if let Err(e) = self.execute(&program, &args, &env, working_dir) {
            warn!("Build halted at stage '{}': {}", stage, e);
            return Err(e);
        }
        stage = BuildStage::CommandExecuted;
        debug!("Build reached stage '{}'", stage);

        let collected = match configuration {
            BuildConfiguration::BootstrapBuild { .. } => self
                .collector
                .install_bootstrap_executable(&dirs.part_build_dir, &dirs.install_dir)
                .map(|artifact| vec![artifact]),
            _ => {
                let target_path = configuration.target_path().unwrap_or(Path::new(""));
                let artifact_dir = dirs.artifact_dir(target_path);
                self.collect_artifacts(&artifact_dir, &dirs.install_dir)
            }
        };
        let artifacts = match collected {
            Ok(artifacts) => artifacts,
            Err(e) => {
                warn!("Build halted at stage '{}': {}", stage, e);
                return Err(e);
            }
        };
        stage = BuildStage::ArtifactsCollected;

        let report = BuildReport {
            plugin: plugin.to_string(),
            command,
            stage,
            artifacts,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            "{} in {} ms",
            report.summary(),
            report.duration().num_milliseconds()
        );
        Ok(report)
    }
}
