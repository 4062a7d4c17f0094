//! File system utility functions
//!
//! Copies that keep permissions and timestamps, the way `cp -p` does.

use std::fs::{self, File, FileTimes, Metadata};
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, instrument, trace};
use walkdir::WalkDir;

/// Utility struct for file system operations
#[derive(Debug)]
pub struct FileSystemUtils;

impl FileSystemUtils {
    /// Create a new file system utilities instance
    pub fn new() -> Self {
        Self
    }

    /// Copy a file from source to destination, preserving metadata.
    ///
    /// An existing file at `dst` is replaced.
    #[instrument(skip(self))]
    pub fn copy_file<P: AsRef<Path> + std::fmt::Debug, Q: AsRef<Path> + std::fmt::Debug>(
        &self,
        src: P,
        dst: Q,
    ) -> io::Result<u64> {
        let src = src.as_ref();
        let dst = dst.as_ref();

        debug!("Copying file: {} -> {}", src.display(), dst.display());

        if same_path(src, dst)? {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} and {} are the same file", src.display(), dst.display()),
            ));
        }

        // A read-only file left by a previous build cannot be opened for writing
        self.remove_file_if_exists(dst)?;

        let bytes_copied = fs::copy(src, dst)?;

        let metadata = fs::metadata(src)?;
        apply_times(&metadata, dst)?;
        fs::set_permissions(dst, metadata.permissions())?;

        debug!("Successfully copied {} bytes", bytes_copied);
        Ok(bytes_copied)
    }

    /// Copy a directory tree, preserving the metadata of every file and
    /// directory. Contents merge into an existing `dst`.
    ///
    /// Returns the number of files copied.
    #[instrument(skip(self))]
    pub fn copy_dir<P: AsRef<Path> + std::fmt::Debug, Q: AsRef<Path> + std::fmt::Debug>(
        &self,
        src: P,
        dst: Q,
    ) -> io::Result<u64> {
        let src = src.as_ref();
        let dst = dst.as_ref();

        debug!("Copying directory: {} -> {}", src.display(), dst.display());

        if same_path(src, dst)? {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} and {} are the same directory", src.display(), dst.display()),
            ));
        }

        let mut files_copied = 0;
        let mut directories: Vec<(Metadata, PathBuf)> = Vec::new();

        for entry in WalkDir::new(src).follow_links(true) {
            let entry = entry?;
            let relative = entry
                .path()
                .strip_prefix(src)
                .map_err(io::Error::other)?;
            let target = dst.join(relative);
            let metadata = entry.metadata()?;

            if metadata.is_dir() {
                self.create_dir_all(&target)?;
                directories.push((metadata, target));
            } else if metadata.is_file() {
                self.copy_file(entry.path(), &target)?;
                files_copied += 1;
            } else {
                trace!("Skipping special file: {}", entry.path().display());
            }
        }

        // Children first, so writing into a directory does not bump its mtime
        // after it was restored, and read-only directories stay writable until
        // their contents are in place.
        for (metadata, target) in directories.iter().rev() {
            apply_times(metadata, target)?;
            fs::set_permissions(target, metadata.permissions())?;
        }

        debug!(
            "Copied {} files in {} directories",
            files_copied,
            directories.len()
        );
        Ok(files_copied)
    }

    /// Create directories recursively
    #[instrument(skip(self))]
    pub fn create_dir_all<P: AsRef<Path> + std::fmt::Debug>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        trace!("Creating directory: {}", path.display());
        fs::create_dir_all(path)
    }

    /// Create a single directory, failing with `AlreadyExists` if it is present
    #[instrument(skip(self))]
    pub fn create_dir<P: AsRef<Path> + std::fmt::Debug>(&self, path: P) -> io::Result<()> {
        let path = path.as_ref();
        debug!("Creating fresh directory: {}", path.display());
        fs::create_dir(path)
    }

    /// Remove a file if it exists
    #[instrument(skip(self))]
    pub fn remove_file_if_exists<P: AsRef<Path> + std::fmt::Debug>(
        &self,
        path: P,
    ) -> io::Result<bool> {
        let path = path.as_ref();

        match fs::symlink_metadata(path) {
            Ok(metadata) if !metadata.is_dir() => {
                fs::remove_file(path)?;
                trace!("Removed file: {}", path.display());
                Ok(true)
            }
            Ok(_) => Ok(false),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}

impl Default for FileSystemUtils {
    fn default() -> Self {
        Self::new()
    }
}

/// Whether `a` and `b` resolve to the same existing path
pub fn same_path(a: &Path, b: &Path) -> io::Result<bool> {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => Ok(a == b),
        (Err(e), _) | (_, Err(e)) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        (Err(e), _) | (_, Err(e)) => Err(e),
    }
}

/// Set the access and modification times of `dst` from `metadata`
fn apply_times(metadata: &Metadata, dst: &Path) -> io::Result<()> {
    let times = FileTimes::new()
        .set_accessed(metadata.accessed()?)
        .set_modified(metadata.modified()?);
    File::open(dst)?.set_times(times)
}
