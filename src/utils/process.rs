//! Process execution utilities
//!
//! Runs external build commands synchronously with an explicit environment
//! and working directory.

use crate::{
    error::{BuilderError, Result},
    utils::env::Environment,
};
use std::path::Path;
use std::process::{Command, Stdio};
use tracing::{debug, info, instrument};

/// Utility for running external processes
#[derive(Debug)]
pub struct ProcessRunner {
    debug: bool,
}

impl ProcessRunner {
    /// Create a new process runner
    #[must_use]
    pub const fn new(debug: bool) -> Self {
        Self { debug }
    }

    /// Run `program` with `args` to completion, inheriting stdout/stderr.
    ///
    /// The child sees exactly the variables in `env`.
    #[instrument(skip(self, env))]
    pub fn run_command(
        &self,
        program: &str,
        args: &[String],
        env: &Environment,
        working_dir: &Path,
    ) -> Result<()> {
        let cmd_str = display_command(program, args);

        if self.debug {
            debug!(
                "Running command: {} (in {}, {} environment variables)",
                cmd_str,
                working_dir.display(),
                env.len()
            );
        } else {
            info!("+ {}", cmd_str);
        }

        let mut cmd = Command::new(program);
        cmd.args(args)
            .current_dir(working_dir)
            .env_clear()
            .envs(env.iter())
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let status = cmd.status().map_err(|e| {
            BuilderError::external_command(
                cmd_str.clone(),
                None,
                format!("Failed to execute command: {e}"),
            )
        })?;

        if !status.success() {
            return Err(BuilderError::external_command(
                cmd_str,
                status.code(),
                format!("Command failed with {status}"),
            ));
        }

        debug!("Command completed successfully");
        Ok(())
    }

    /// Check if a command exists in the PATH of `env`
    #[instrument(skip(self, env))]
    pub fn command_exists(&self, command: &str, env: &Environment) -> bool {
        debug!("Checking if command exists: {}", command);

        let exists = env.get("PATH").is_some_and(|path| {
            std::env::split_paths(path).any(|dir| dir.join(command).is_file())
        });

        debug!("Command '{}' exists: {}", command, exists);
        exists
    }
}

impl Default for ProcessRunner {
    fn default() -> Self {
        Self::new(false)
    }
}

/// Render a command line for logs and error messages
pub fn display_command(program: &str, args: &[String]) -> String {
    if args.is_empty() {
        program.to_string()
    } else {
        format!("{} {}", program, args.join(" "))
    }
}
