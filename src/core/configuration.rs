//! Plugin options and the build configuration derived from them
//!
//! `PluginOptions` is what the user wrote; `BuildConfiguration` is the
//! validated, immutable view a single build step runs with.

use crate::error::{BuilderError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, instrument};

/// Raw plugin options as found in a part definition or on the command line
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PluginOptions {
    /// Build profile, e.g. `debug`, `release`, `docs`
    #[serde(default, alias = "dub-build", skip_serializing_if = "Option::is_none")]
    pub build_type: Option<String>,
    /// Named configuration from the project's dub recipe
    #[serde(default, alias = "dub-config", skip_serializing_if = "Option::is_none")]
    pub build_config: Option<String>,
    /// Named target from the project's dub recipe
    #[serde(default, alias = "dub-target", skip_serializing_if = "Option::is_none")]
    pub build_target: Option<String>,
    /// Raw flags for `dub build`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_flags: Option<Vec<String>>,
    /// Where dub writes built files, relative to the project root
    #[serde(default, alias = "dub-target-path", skip_serializing_if = "Option::is_none")]
    pub target_path: Option<String>,
    /// D compiler used by the dub bootstrap scripts
    #[serde(default, alias = "d-compiler", skip_serializing_if = "Option::is_none")]
    pub compiler_selector: Option<String>,
}

impl PluginOptions {
    /// Load options from a YAML mapping, typically a part definition.
    ///
    /// Keys that are not plugin options are ignored.
    #[instrument]
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        debug!("Reading plugin options from {}", path.display());
        let content = std::fs::read_to_string(path)
            .map_err(|e| BuilderError::file_system("read", path, e))?;
        Self::from_yaml_str(&content).map_err(|e| match e {
            BuilderError::ConfigurationInvalid { message } => {
                BuilderError::configuration(format!("{}: {message}", path.display()))
            }
            other => other,
        })
    }

    /// Parse options from YAML text
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content)
            .map_err(|e| BuilderError::configuration(format!("malformed plugin options: {e}")))
    }

    /// Layer `overrides` on top of these options; set fields in `overrides` win
    #[must_use]
    pub fn overlay(self, overrides: Self) -> Self {
        Self {
            build_type: overrides.build_type.or(self.build_type),
            build_config: overrides.build_config.or(self.build_config),
            build_target: overrides.build_target.or(self.build_target),
            build_flags: overrides.build_flags.or(self.build_flags),
            target_path: overrides.target_path.or(self.target_path),
            compiler_selector: overrides.compiler_selector.or(self.compiler_selector),
        }
    }

    /// Names of the options that are set, in schema spelling
    pub fn present(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.build_type.is_some() {
            names.push("build-type");
        }
        if self.build_config.is_some() {
            names.push("build-config");
        }
        if self.build_target.is_some() {
            names.push("build-target");
        }
        if self.build_flags.is_some() {
            names.push("build-flags");
        }
        if self.target_path.is_some() {
            names.push("target-path");
        }
        if self.compiler_selector.is_some() {
            names.push("compiler-selector");
        }
        names
    }
}

/// Value type of a declared option
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionKind {
    String,
    Array,
}

/// Default value of a declared option
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionDefault {
    String(&'static str),
    Array(Vec<String>),
}

/// One entry of a plugin's option schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionSpec {
    pub name: &'static str,
    #[serde(rename = "type")]
    pub kind: OptionKind,
    pub default: OptionDefault,
    #[serde(rename = "unique-items", skip_serializing_if = "std::ops::Not::not")]
    pub unique_items: bool,
}

impl OptionSpec {
    /// A string option
    pub const fn string(name: &'static str, default: &'static str) -> Self {
        Self {
            name,
            kind: OptionKind::String,
            default: OptionDefault::String(default),
            unique_items: false,
        }
    }

    /// An array-of-strings option whose items must be unique.
    ///
    /// No lower bound on the item count: the default is empty.
    pub const fn unique_array(name: &'static str) -> Self {
        Self {
            name,
            kind: OptionKind::Array,
            default: OptionDefault::Array(Vec::new()),
            unique_items: true,
        }
    }
}

/// Validated configuration for one build step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildConfiguration {
    /// `dub build --build=<type> --config=<config> <target>`
    TypedBuild {
        build_type: String,
        build_config: String,
        build_target: String,
        target_path: PathBuf,
    },
    /// `dub build <target> <flags...>`
    FlagBased {
        build_target: String,
        build_flags: Vec<String>,
        target_path: PathBuf,
    },
    /// Runs dub's own bootstrap script with a chosen D compiler
    BootstrapBuild { compiler_selector: String },
}

impl BuildConfiguration {
    /// Short name of the variant for logs
    pub const fn style(&self) -> &'static str {
        match self {
            Self::TypedBuild { .. } => "typed",
            Self::FlagBased { .. } => "flags",
            Self::BootstrapBuild { .. } => "bootstrap",
        }
    }

    /// Artifact root relative to the part build directory, if the variant has one
    pub fn target_path(&self) -> Option<&Path> {
        match self {
            Self::TypedBuild { target_path, .. } | Self::FlagBased { target_path, .. } => {
                Some(target_path)
            }
            Self::BootstrapBuild { .. } => None,
        }
    }
}

/// Directories owned by the host for one part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDirectories {
    /// Project source root and dub's build output location
    pub part_build_dir: PathBuf,
    /// Where finished build outputs are placed
    pub install_dir: PathBuf,
}

impl BuildDirectories {
    /// Create the directory set, resolving relative paths against the
    /// current directory
    pub fn new(part_build_dir: impl AsRef<Path>, install_dir: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            part_build_dir: absolute(part_build_dir.as_ref())?,
            install_dir: absolute(install_dir.as_ref())?,
        })
    }

    /// The artifact directory for `target_path`
    pub fn artifact_dir(&self, target_path: &Path) -> PathBuf {
        if target_path.as_os_str().is_empty() {
            self.part_build_dir.clone()
        } else {
            self.part_build_dir.join(target_path)
        }
    }
}

fn absolute(path: &Path) -> Result<PathBuf> {
    std::path::absolute(path).map_err(|e| BuilderError::file_system("resolve", path, e))
}

/// Check that `target_path` stays inside the build directory
pub fn validated_target_path(target_path: &str) -> Result<PathBuf> {
    let path = PathBuf::from(target_path);
    if path.is_absolute() {
        return Err(BuilderError::configuration(format!(
            "target-path must be relative to the project root, got {target_path}"
        )));
    }
    if path.components().any(|c| c == Component::ParentDir) {
        return Err(BuilderError::configuration(format!(
            "target-path must not leave the project root, got {target_path}"
        )));
    }
    Ok(path)
}

/// Drop empty flags and reject duplicates
pub fn validated_flags(flags: &[String]) -> Result<Vec<String>> {
    let mut seen: Vec<String> = Vec::with_capacity(flags.len());
    for flag in flags {
        if flag.is_empty() {
            debug!("Dropping empty build flag");
            continue;
        }
        if seen.contains(flag) {
            return Err(BuilderError::configuration(format!(
                "build-flags contains {flag} more than once"
            )));
        }
        seen.push(flag.clone());
    }
    Ok(seen)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_kebab_case_options() {
        let options = PluginOptions::from_yaml_str(
            "build-target: mytool\nbuild-flags: [--compiler=ldc2, --build=release]\ntarget-path: bin\n",
        )
        .unwrap();

        assert_eq!(options.build_target.as_deref(), Some("mytool"));
        assert_eq!(
            options.build_flags,
            Some(vec!["--compiler=ldc2".to_string(), "--build=release".to_string()])
        );
        assert_eq!(options.target_path.as_deref(), Some("bin"));
        assert_eq!(options.build_type, None);
    }

    #[test]
    fn test_parse_historical_aliases() {
        let options = PluginOptions::from_yaml_str(
            "plugin: dub\nsource: .\ndub-build: release\ndub-config: cli\ndub-target: app\ndub-target-path: out\nd-compiler: ldmd2\n",
        )
        .unwrap();

        assert_eq!(options.build_type.as_deref(), Some("release"));
        assert_eq!(options.build_config.as_deref(), Some("cli"));
        assert_eq!(options.build_target.as_deref(), Some("app"));
        assert_eq!(options.target_path.as_deref(), Some("out"));
        assert_eq!(options.compiler_selector.as_deref(), Some("ldmd2"));
    }

    #[test]
    fn test_parse_empty_and_malformed() {
        assert_eq!(PluginOptions::from_yaml_str("").unwrap(), PluginOptions::default());
        let err = PluginOptions::from_yaml_str("build-flags: just-a-string").unwrap_err();
        assert!(matches!(err, BuilderError::ConfigurationInvalid { .. }));
    }

    #[test]
    fn test_overlay_prefers_overrides() {
        let file = PluginOptions {
            build_type: Some("debug".into()),
            build_target: Some("lib".into()),
            ..PluginOptions::default()
        };
        let cli = PluginOptions {
            build_type: Some("release".into()),
            ..PluginOptions::default()
        };

        let merged = file.overlay(cli);
        assert_eq!(merged.build_type.as_deref(), Some("release"));
        assert_eq!(merged.build_target.as_deref(), Some("lib"));
        assert_eq!(merged.present(), vec!["build-type", "build-target"]);
    }

    #[test]
    fn test_validated_target_path() {
        assert_eq!(validated_target_path("").unwrap(), PathBuf::new());
        assert_eq!(validated_target_path("out/bin").unwrap(), PathBuf::from("out/bin"));
        assert!(validated_target_path("/usr/bin").is_err());
        assert!(validated_target_path("../elsewhere").is_err());
    }

    #[test]
    fn test_validated_flags() {
        let flags = vec![
            "--compiler=ldc2".to_string(),
            String::new(),
            "--build=release".to_string(),
        ];
        assert_eq!(
            validated_flags(&flags).unwrap(),
            vec!["--compiler=ldc2".to_string(), "--build=release".to_string()]
        );

        let duplicated = vec!["-v".to_string(), "-v".to_string()];
        assert!(matches!(
            validated_flags(&duplicated),
            Err(BuilderError::ConfigurationInvalid { .. })
        ));
    }

    #[test]
    fn test_build_flags_schema_accepts_empty_list() {
        let yaml = serde_yaml::to_string(&OptionSpec::unique_array("build-flags")).unwrap();
        assert_eq!(
            yaml,
            "name: build-flags\ntype: array\ndefault: []\nunique-items: true\n"
        );

        assert!(validated_flags(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_artifact_dir() {
        let dirs = BuildDirectories::new("/parts/app/build", "/parts/app/install").unwrap();
        assert_eq!(dirs.artifact_dir(Path::new("")), PathBuf::from("/parts/app/build"));
        assert_eq!(
            dirs.artifact_dir(Path::new("bin")),
            PathBuf::from("/parts/app/build/bin")
        );
    }

    #[test]
    fn test_relative_directories_become_absolute() {
        let dirs = BuildDirectories::new("build", "install").unwrap();
        assert!(dirs.part_build_dir.is_absolute());
        assert!(dirs.install_dir.is_absolute());
    }
}
