//! Core functionality for building dub projects
//!
//! Contains the plugin contract, the build configuration model, the build
//! invoker and artifact collection.

pub mod artifacts;
pub mod configuration;
pub mod invoker;
pub mod plugin;

pub use artifacts::{ArtifactCollector, CollectedArtifact, CollectionSummary};
pub use configuration::{BuildConfiguration, BuildDirectories, OptionSpec, PluginOptions};
pub use invoker::{BuildInvoker, BuildReport, BuildStage};
pub use plugin::{Plugin, PLUGINS};
