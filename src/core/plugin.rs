//! Build plugins and their registry
//!
//! A plugin declares its option schema, turns user options into a
//! `BuildConfiguration` and runs the build through a `BuildInvoker`.

use crate::{
    core::{
        configuration::{
            validated_flags, validated_target_path, BuildConfiguration, BuildDirectories,
            OptionSpec, PluginOptions,
        },
        invoker::{BuildInvoker, BuildReport},
    },
    error::{BuilderError, Result},
};
use tracing::{debug, instrument};

/// Capability contract between the packaging host and a build plugin
pub trait Plugin: Sync {
    /// Name the plugin is registered under
    fn name(&self) -> &'static str;

    /// One-line description for listings
    fn description(&self) -> &'static str;

    /// Options this plugin accepts, with their defaults
    fn schema(&self) -> Vec<OptionSpec>;

    /// Packages the host must provide before building
    fn build_packages(&self) -> Vec<&'static str> {
        Vec::new()
    }

    /// Validate `options` and fill in defaults
    fn configure(&self, options: &PluginOptions) -> Result<BuildConfiguration>;

    /// Configure and run one build step
    fn build(
        &self,
        options: &PluginOptions,
        dirs: &BuildDirectories,
        invoker: &BuildInvoker,
    ) -> Result<BuildReport> {
        let configuration = self.configure(options)?;
        debug!("Configured {}: {:?}", self.name(), configuration);
        invoker.check_build_packages(&self.build_packages());
        invoker.run(self.name(), &configuration, dirs)
    }
}

/// Reject options that are set but not part of `schema`
fn reject_unsupported(plugin: &str, schema: &[OptionSpec], options: &PluginOptions) -> Result<()> {
    let unsupported: Vec<&str> = options
        .present()
        .into_iter()
        .filter(|name| !schema.iter().any(|spec| spec.name == *name))
        .collect();

    if unsupported.is_empty() {
        Ok(())
    } else {
        Err(BuilderError::configuration(format!(
            "plugin {plugin} does not accept option(s): {}",
            unsupported.join(", ")
        )))
    }
}

/// `dub build <target> <flags...>`
#[derive(Debug, Clone, Copy, Default)]
pub struct DubPlugin;

impl Plugin for DubPlugin {
    fn name(&self) -> &'static str {
        "dub"
    }

    fn description(&self) -> &'static str {
        "Build a D project with `dub build` and raw build flags"
    }

    fn schema(&self) -> Vec<OptionSpec> {
        vec![
            OptionSpec::unique_array("build-flags"),
            OptionSpec::string("build-target", ""),
            OptionSpec::string("target-path", ""),
        ]
    }

    fn build_packages(&self) -> Vec<&'static str> {
        vec!["dub"]
    }

    #[instrument(skip(self))]
    fn configure(&self, options: &PluginOptions) -> Result<BuildConfiguration> {
        reject_unsupported(self.name(), &self.schema(), options)?;

        Ok(BuildConfiguration::FlagBased {
            build_target: options.build_target.clone().unwrap_or_default(),
            build_flags: validated_flags(options.build_flags.as_deref().unwrap_or_default())?,
            target_path: validated_target_path(options.target_path.as_deref().unwrap_or(""))?,
        })
    }
}

/// `dub build --build=<type> --config=<config> <target>`
#[derive(Debug, Clone, Copy, Default)]
pub struct TypedDubPlugin;

impl Plugin for TypedDubPlugin {
    fn name(&self) -> &'static str {
        "dub-typed"
    }

    fn description(&self) -> &'static str {
        "Build a D project with `dub build` and a build type and configuration"
    }

    fn schema(&self) -> Vec<OptionSpec> {
        vec![
            OptionSpec::string("build-type", "debug"),
            OptionSpec::string("build-config", ""),
            OptionSpec::string("build-target", ""),
            OptionSpec::string("target-path", ""),
        ]
    }

    fn build_packages(&self) -> Vec<&'static str> {
        vec!["dub"]
    }

    #[instrument(skip(self))]
    fn configure(&self, options: &PluginOptions) -> Result<BuildConfiguration> {
        reject_unsupported(self.name(), &self.schema(), options)?;

        Ok(BuildConfiguration::TypedBuild {
            build_type: options
                .build_type
                .clone()
                .unwrap_or_else(|| "debug".to_string()),
            build_config: options.build_config.clone().unwrap_or_default(),
            build_target: options.build_target.clone().unwrap_or_default(),
            target_path: validated_target_path(options.target_path.as_deref().unwrap_or(""))?,
        })
    }
}

/// Builds dub itself from source with a selectable D compiler
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildDubPlugin;

impl Plugin for BuildDubPlugin {
    fn name(&self) -> &'static str {
        "build-dub"
    }

    fn description(&self) -> &'static str {
        "Bootstrap dub from its own source tree (dmd, gdc, gdmd or ldmd2)"
    }

    fn schema(&self) -> Vec<OptionSpec> {
        vec![OptionSpec::string("compiler-selector", "")]
    }

    #[instrument(skip(self))]
    fn configure(&self, options: &PluginOptions) -> Result<BuildConfiguration> {
        reject_unsupported(self.name(), &self.schema(), options)?;

        Ok(BuildConfiguration::BootstrapBuild {
            compiler_selector: options.compiler_selector.clone().unwrap_or_default(),
        })
    }
}

/// Every registered plugin
pub static PLUGINS: &[&dyn Plugin] = &[&DubPlugin, &TypedDubPlugin, &BuildDubPlugin];

/// Find a plugin by registry name
pub fn lookup(name: &str) -> Result<&'static dyn Plugin> {
    PLUGINS
        .iter()
        .copied()
        .find(|plugin| plugin.name() == name)
        .ok_or_else(|| {
            let known: Vec<&str> = PLUGINS.iter().map(|p| p.name()).collect();
            BuilderError::configuration(format!(
                "unknown plugin {name}; available plugins: {}",
                known.join(", ")
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_lookup() {
        assert_eq!(lookup("dub").unwrap().name(), "dub");
        assert_eq!(lookup("dub-typed").unwrap().name(), "dub-typed");
        assert_eq!(lookup("build-dub").unwrap().name(), "build-dub");
        assert!(matches!(
            lookup("make"),
            Err(BuilderError::ConfigurationInvalid { .. })
        ));
    }

    #[test]
    fn test_typed_defaults() {
        let configuration = TypedDubPlugin.configure(&PluginOptions::default()).unwrap();
        assert_eq!(
            configuration,
            BuildConfiguration::TypedBuild {
                build_type: "debug".to_string(),
                build_config: String::new(),
                build_target: String::new(),
                target_path: PathBuf::new(),
            }
        );
        assert_eq!(
            BuildInvoker::compose_command_line(&configuration),
            vec!["build", "--build=debug"]
        );
    }

    #[test]
    fn test_typed_release_target() {
        let options = PluginOptions {
            build_type: Some("release".into()),
            build_target: Some("mytool".into()),
            ..PluginOptions::default()
        };
        let configuration = TypedDubPlugin.configure(&options).unwrap();
        assert_eq!(
            BuildInvoker::compose_command_line(&configuration),
            vec!["build", "--build=release", "mytool"]
        );
    }

    #[test]
    fn test_flags_with_empty_target() {
        let options = PluginOptions {
            build_flags: Some(vec!["--compiler=ldc2".into()]),
            build_target: Some(String::new()),
            ..PluginOptions::default()
        };
        let configuration = DubPlugin.configure(&options).unwrap();
        assert_eq!(
            BuildInvoker::compose_command_line(&configuration),
            vec!["build", "--compiler=ldc2"]
        );
    }

    #[test]
    fn test_styles_are_exclusive() {
        let flags_for_typed = PluginOptions {
            build_flags: Some(vec!["-v".into()]),
            ..PluginOptions::default()
        };
        let err = TypedDubPlugin.configure(&flags_for_typed).unwrap_err();
        assert!(err.to_string().contains("build-flags"));

        let type_for_flags = PluginOptions {
            build_type: Some("release".into()),
            ..PluginOptions::default()
        };
        assert!(DubPlugin.configure(&type_for_flags).is_err());

        let target_for_bootstrap = PluginOptions {
            build_target: Some("dub".into()),
            ..PluginOptions::default()
        };
        assert!(BuildDubPlugin.configure(&target_for_bootstrap).is_err());
    }

    #[test]
    fn test_absolute_target_path_rejected() {
        let options = PluginOptions {
            target_path: Some("/usr/lib".into()),
            ..PluginOptions::default()
        };
        assert!(matches!(
            DubPlugin.configure(&options),
            Err(BuilderError::ConfigurationInvalid { .. })
        ));
    }

    #[test]
    fn test_bootstrap_configuration() {
        let options = PluginOptions {
            compiler_selector: Some("gdc".into()),
            ..PluginOptions::default()
        };
        assert_eq!(
            BuildDubPlugin.configure(&options).unwrap(),
            BuildConfiguration::BootstrapBuild {
                compiler_selector: "gdc".to_string()
            }
        );
        assert!(BuildDubPlugin.build_packages().is_empty());
    }

    #[test]
    fn test_schema_defaults_are_accepted() {
        for plugin in PLUGINS {
            let mut yaml = String::new();
            for spec in plugin.schema() {
                let default = serde_yaml::to_string(&spec.default).unwrap();
                yaml.push_str(&format!("{}: {}", spec.name, default));
            }
            let options = PluginOptions::from_yaml_str(&yaml).unwrap();
            assert_eq!(options.present().len(), plugin.schema().len());
            plugin.configure(&options).unwrap();
        }
    }
}
