//! Artifact collection functionality
//!
//! dub has no install step, so finished outputs are copied out of the build
//! directory into the install directory by hand.

use crate::{
    error::{BuilderError, Result},
    utils::fs::{same_path, FileSystemUtils},
};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, instrument, trace};

/// Subdirectory of the install directory that receives the bootstrapped dub
pub const BOOTSTRAP_BIN_DIR: &str = "bin";

/// Name of the executable produced by dub's bootstrap scripts
pub const BOOTSTRAP_EXECUTABLE: &str = "dub";

/// Copies build outputs into the install directory
#[derive(Debug, Default)]
pub struct ArtifactCollector {
    fs_utils: FileSystemUtils,
}

/// Information about a collected artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectedArtifact {
    /// Original path
    pub source: PathBuf,
    /// Destination path
    pub destination: PathBuf,
    /// What kind of entry was copied
    pub kind: ArtifactKind,
}

/// Kind of top-level entry copied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    /// A regular file
    File,
    /// A directory, copied with its contents
    Directory,
}

impl ArtifactCollector {
    /// Create a new artifact collector
    pub fn new() -> Self {
        Self {
            fs_utils: FileSystemUtils::new(),
        }
    }

    /// Copy every top-level file and directory of `artifact_dir` into
    /// `install_dir`.
    ///
    /// Nothing is written when `artifact_dir` is missing or unreadable, or
    /// when both paths name the same directory.
    #[instrument(skip(self))]
    pub fn collect(&self, artifact_dir: &Path, install_dir: &Path) -> Result<Vec<CollectedArtifact>> {
        info!(
            "Collecting artifacts: {} -> {}",
            artifact_dir.display(),
            install_dir.display()
        );

        let entries = self.list_entries(artifact_dir)?;

        let same = same_path(artifact_dir, install_dir)
            .map_err(|e| BuilderError::file_system("resolve install directory", install_dir, e))?;
        if same {
            return Err(BuilderError::configuration(format!(
                "Install directory {} is the artifact directory {}",
                install_dir.display(),
                artifact_dir.display()
            )));
        }

        self.fs_utils.create_dir_all(install_dir).map_err(|e| {
            BuilderError::file_system("create install directory", install_dir, e)
        })?;
        let install_real = fs::canonicalize(install_dir)
            .map_err(|e| BuilderError::file_system("resolve install directory", install_dir, e))?;

        let mut collected = Vec::with_capacity(entries.len());
        for (source, kind) in entries {
            // Never copy a directory into itself
            let contains_install = fs::canonicalize(&source)
                .map(|real| install_real.starts_with(real))
                .unwrap_or(false);
            if contains_install {
                debug!("Skipping {}: contains the install directory", source.display());
                continue;
            }
            collected.push(self.collect_entry(&source, kind, install_dir)?);
        }

        info!("Successfully collected {} artifacts", collected.len());
        Ok(collected)
    }

    /// Copy the bootstrapped dub executable into a fresh `bin` directory of
    /// `install_dir`.
    ///
    /// Fails without touching anything if `bin` already exists.
    #[instrument(skip(self))]
    pub fn install_bootstrap_executable(
        &self,
        part_build_dir: &Path,
        install_dir: &Path,
    ) -> Result<CollectedArtifact> {
        let source = part_build_dir
            .join(BOOTSTRAP_BIN_DIR)
            .join(BOOTSTRAP_EXECUTABLE);
        let bin_dir = install_dir.join(BOOTSTRAP_BIN_DIR);
        let destination = bin_dir.join(BOOTSTRAP_EXECUTABLE);

        info!("Installing {} into {}", source.display(), bin_dir.display());

        if fs::symlink_metadata(&bin_dir).is_ok() {
            return Err(BuilderError::destination_conflict(bin_dir));
        }

        match fs::metadata(&source) {
            Ok(metadata) if metadata.is_file() => {}
            Ok(_) => return Err(BuilderError::artifact_directory_missing(source, None)),
            Err(e) => return Err(BuilderError::artifact_directory_missing(source, Some(e))),
        }

        self.fs_utils.create_dir_all(install_dir).map_err(|e| {
            BuilderError::file_system("create install directory", install_dir, e)
        })?;
        self.fs_utils.create_dir(&bin_dir).map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                BuilderError::destination_conflict(&bin_dir)
            } else {
                BuilderError::file_system("create directory", &bin_dir, e)
            }
        })?;

        self.fs_utils
            .copy_file(&source, &destination)
            .map_err(|e| BuilderError::file_system("copy", &source, e))?;
        info!("  Installed: {}", destination.display());

        Ok(CollectedArtifact {
            source,
            destination,
            kind: ArtifactKind::File,
        })
    }

    /// List the files and directories directly inside `artifact_dir`,
    /// sorted by name
    fn list_entries(&self, artifact_dir: &Path) -> Result<Vec<(PathBuf, ArtifactKind)>> {
        let read_dir = fs::read_dir(artifact_dir).map_err(|e| {
            BuilderError::artifact_directory_missing(artifact_dir, Some(e))
        })?;

        let mut entries = Vec::new();
        for entry in read_dir {
            let entry = entry
                .map_err(|e| BuilderError::artifact_directory_missing(artifact_dir, Some(e)))?;
            let path = entry.path();

            // Symlinked entries count as what they point to
            let metadata = match fs::metadata(&path) {
                Ok(metadata) => metadata,
                Err(e) => {
                    trace!("Skipping unreadable entry {}: {}", path.display(), e);
                    continue;
                }
            };

            if metadata.is_dir() {
                entries.push((path, ArtifactKind::Directory));
            } else if metadata.is_file() {
                entries.push((path, ArtifactKind::File));
            } else {
                debug!("Skipping special file: {}", path.display());
            }
        }

        entries.sort_by(|a, b| a.0.cmp(&b.0));
        debug!(
            "Found {} entries in {}",
            entries.len(),
            artifact_dir.display()
        );
        Ok(entries)
    }

    /// Copy one top-level entry
    fn collect_entry(
        &self,
        source: &Path,
        kind: ArtifactKind,
        install_dir: &Path,
    ) -> Result<CollectedArtifact> {
        let file_name = source.file_name().ok_or_else(|| {
            BuilderError::file_system(
                "read entry name",
                source,
                io::Error::new(io::ErrorKind::InvalidInput, "entry has no file name"),
            )
        })?;
        let destination = install_dir.join(file_name);

        match kind {
            ArtifactKind::File => {
                self.fs_utils
                    .copy_file(source, &destination)
                    .map_err(|e| BuilderError::file_system("copy", source, e))?;
            }
            ArtifactKind::Directory => {
                self.fs_utils
                    .copy_dir(source, &destination)
                    .map_err(|e| BuilderError::file_system("copy directory", source, e))?;
            }
        }
        info!("  Copied: {} -> {}", source.display(), destination.display());

        Ok(CollectedArtifact {
            source: source.to_path_buf(),
            destination,
            kind,
        })
    }
}

/// Summary of artifact collection results
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CollectionSummary {
    /// Total number of artifacts collected
    pub total: usize,
    /// Number of files
    pub files: usize,
    /// Number of directories
    pub directories: usize,
}

impl CollectionSummary {
    /// Tally collected artifacts by kind
    pub fn from_artifacts(artifacts: &[CollectedArtifact]) -> Self {
        let files = artifacts
            .iter()
            .filter(|a| a.kind == ArtifactKind::File)
            .count();
        Self {
            total: artifacts.len(),
            files,
            directories: artifacts.len() - files,
        }
    }
}

impl std::fmt::Display for CollectionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Collected {} artifacts: {} files, {} directories",
            self.total, self.files, self.directories
        )
    }
}
