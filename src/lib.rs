//! # dub builder
//!
//! Build plugins that let a packaging pipeline build D projects with the
//! `dub` build manager. dub has no install command, so after `dub build`
//! the plugins copy the build output into the install directory.
//!
//! ## Plugins
//!
//! - `dub`: `dub build <target> <flags...>`
//! - `dub-typed`: `dub build --build=<type> --config=<config> <target>`
//! - `build-dub`: bootstraps dub itself with a chosen D compiler
//!
//! ## Example
//!
//! ```no_run
//! use dub_builder::core::{plugin, BuildDirectories, BuildInvoker, PluginOptions};
//!
//! let options = PluginOptions {
//!     build_type: Some("release".into()),
//!     build_target: Some("mytool".into()),
//!     ..PluginOptions::default()
//! };
//! let dirs = BuildDirectories::new("parts/mytool/build", "parts/mytool/install")?;
//! let invoker = BuildInvoker::new(false, "dub");
//! let report = plugin::lookup("dub-typed")?.build(&options, &dirs, &invoker)?;
//! println!("{}", report.summary());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod config;
pub mod core;
pub mod error;
pub mod utils;

use anyhow::Result;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging with appropriate verbosity.
///
/// Logs go to stderr so printed commands and schemas stay clean on stdout.
pub fn setup_logging(debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true)
                .compact(),
        )
        .with(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
