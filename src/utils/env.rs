//! Environment handling utilities
//!
//! External commands are launched with an explicit environment snapshot
//! instead of mutating the environment of the running process.

use std::collections::BTreeMap;
use std::ffi::{OsStr, OsString};
use tracing::debug;

/// Variable read by the dub bootstrap scripts to pick a D compiler
pub const COMPILER_VARIABLE: &str = "DMD";

/// Immutable snapshot of environment variables handed to a child process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<OsString, OsString>,
}

impl Environment {
    /// Snapshot the environment inherited by this process
    pub fn inherited() -> Self {
        let vars: BTreeMap<OsString, OsString> = std::env::vars_os().collect();
        debug!("Captured {} inherited environment variables", vars.len());
        Self { vars }
    }

    /// An empty environment
    pub fn empty() -> Self {
        Self::default()
    }

    /// Return a new snapshot with `key` set to `value`
    #[must_use]
    pub fn with_var(&self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        let mut vars = self.vars.clone();
        vars.insert(key.as_ref().to_os_string(), value.as_ref().to_os_string());
        Self { vars }
    }

    /// Return a new snapshot selecting the D compiler for a bootstrap build.
    ///
    /// An empty selector leaves the snapshot unchanged so the build script
    /// falls back to its own default.
    #[must_use]
    pub fn with_compiler(&self, compiler: &str) -> Self {
        if compiler.is_empty() {
            return self.clone();
        }
        debug!("Selecting D compiler via {}={}", COMPILER_VARIABLE, compiler);
        self.with_var(COMPILER_VARIABLE, compiler)
    }

    /// Look up a variable
    pub fn get(&self, key: impl AsRef<OsStr>) -> Option<&OsStr> {
        self.vars.get(key.as_ref()).map(OsString::as_os_str)
    }

    /// Iterate over all variables in key order
    pub fn iter(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> {
        self.vars
            .iter()
            .map(|(k, v)| (k.as_os_str(), v.as_os_str()))
    }

    /// Number of variables in the snapshot
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the snapshot holds no variables
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_var_leaves_original_untouched() {
        let base = Environment::empty().with_var("PATH", "/usr/bin");
        let derived = base.with_var("DMD", "ldmd2");

        assert_eq!(base.get("DMD"), None);
        assert_eq!(derived.get("DMD"), Some(OsStr::new("ldmd2")));
        assert_eq!(derived.get("PATH"), Some(OsStr::new("/usr/bin")));
        assert_eq!(derived.len(), 2);
    }

    #[test]
    fn test_with_compiler_skips_empty_selector() {
        let base = Environment::empty();
        assert!(base.with_compiler("").is_empty());
        assert_eq!(
            base.with_compiler("gdc").get(COMPILER_VARIABLE),
            Some(OsStr::new("gdc"))
        );
    }

    #[test]
    fn test_with_var_overrides_existing_value() {
        let env = Environment::empty()
            .with_var("DMD", "dmd")
            .with_var("DMD", "gdmd");
        assert_eq!(env.get("DMD"), Some(OsStr::new("gdmd")));
        assert_eq!(env.len(), 1);
    }

    #[test]
    fn test_inherited_does_not_touch_process_environment() {
        let env = Environment::inherited().with_var("DUB_BUILDER_TEST_ONLY", "1");
        assert!(std::env::var_os("DUB_BUILDER_TEST_ONLY").is_none());
        assert_eq!(env.get("DUB_BUILDER_TEST_ONLY"), Some(OsStr::new("1")));
    }
}
