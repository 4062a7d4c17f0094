//! Command-line argument parsing and validation

use crate::core::{invoker::DUB_PROGRAM, PluginOptions};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// dub builder - build D projects with dub and install their artifacts
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(name = "builder")]
pub struct Args {
    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the build step of a part and install its artifacts
    Build {
        #[command(flatten)]
        plugin: PluginArgs,

        /// Project source root, where dub writes its output
        #[arg(long = "build-dir", default_value = ".")]
        build_dir: PathBuf,

        /// Directory that receives the finished artifacts
        #[arg(long = "install-dir")]
        install_dir: PathBuf,
    },

    /// Print the command line a build would run
    Command {
        #[command(flatten)]
        plugin: PluginArgs,
    },

    /// Print the option schema of a plugin
    Schema {
        /// Plugin name
        #[arg(short, long)]
        plugin: String,
    },

    /// List available plugins
    Plugins,
}

/// Plugin selection and option overrides
#[derive(clap::Args, Debug, Clone)]
pub struct PluginArgs {
    /// Plugin name
    #[arg(short, long)]
    pub plugin: String,

    /// YAML file with plugin options, e.g. a part definition
    #[arg(long = "options")]
    pub options_file: Option<PathBuf>,

    /// Build type (debug, release, docs, ...)
    #[arg(long)]
    pub build_type: Option<String>,

    /// Configuration from the project's dub recipe
    #[arg(long)]
    pub build_config: Option<String>,

    /// Target from the project's dub recipe
    #[arg(long)]
    pub build_target: Option<String>,

    /// Flag passed verbatim to `dub build` (repeatable)
    #[arg(long = "build-flag", allow_hyphen_values = true)]
    pub build_flags: Vec<String>,

    /// Directory where dub writes built files, relative to the build directory
    #[arg(long)]
    pub target_path: Option<String>,

    /// D compiler for bootstrapping dub (dmd, gdc, gdmd, ldmd2)
    #[arg(long = "compiler")]
    pub compiler_selector: Option<String>,

    /// dub executable to run
    #[arg(long = "dub", default_value = DUB_PROGRAM)]
    pub dub: String,
}

impl PluginArgs {
    /// Options given directly on the command line
    pub fn overrides(&self) -> PluginOptions {
        PluginOptions {
            build_type: self.build_type.clone(),
            build_config: self.build_config.clone(),
            build_target: self.build_target.clone(),
            build_flags: if self.build_flags.is_empty() {
                None
            } else {
                Some(self.build_flags.clone())
            },
            target_path: self.target_path.clone(),
            compiler_selector: self.compiler_selector.clone(),
        }
    }
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    Args::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plugins() {
        let args = Args::try_parse_from(["builder", "plugins"]).unwrap();
        assert!(!args.debug);
        assert!(matches!(args.command, Command::Plugins));
    }

    #[test]
    fn test_parse_debug_flag() {
        let args = Args::try_parse_from(["builder", "--debug", "plugins"]).unwrap();
        assert!(args.debug);
    }

    #[test]
    fn test_parse_build_with_options() {
        let args = Args::try_parse_from([
            "builder",
            "build",
            "--plugin",
            "dub",
            "--install-dir",
            "/parts/app/install",
            "--build-flag",
            "--compiler=ldc2",
            "--build-flag",
            "--build=release",
            "--build-target",
            "app",
        ])
        .unwrap();

        match args.command {
            Command::Build {
                plugin,
                build_dir,
                install_dir,
            } => {
                assert_eq!(plugin.plugin, "dub");
                assert_eq!(plugin.dub, "dub");
                assert_eq!(build_dir, PathBuf::from("."));
                assert_eq!(install_dir, PathBuf::from("/parts/app/install"));

                let overrides = plugin.overrides();
                assert_eq!(
                    overrides.build_flags,
                    Some(vec!["--compiler=ldc2".to_string(), "--build=release".to_string()])
                );
                assert_eq!(overrides.build_target.as_deref(), Some("app"));
                assert_eq!(overrides.build_type, None);
            }
            _ => panic!("Expected Build command"),
        }
    }

    #[test]
    fn test_build_requires_install_dir() {
        assert!(Args::try_parse_from(["builder", "build", "--plugin", "dub"]).is_err());
    }

    #[test]
    fn test_no_flags_means_no_override() {
        let args =
            Args::try_parse_from(["builder", "command", "--plugin", "dub-typed"]).unwrap();
        match args.command {
            Command::Command { plugin } => {
                assert_eq!(plugin.overrides(), PluginOptions::default());
            }
            _ => panic!("Expected Command command"),
        }
    }
}
