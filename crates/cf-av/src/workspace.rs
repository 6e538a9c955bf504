//! Scratch space for job inputs and outputs.
//!
//! A [`Workspace`] hands out uniquely named paths inside a scratch directory,
//! each wrapped in a [`TempArtifact`] guard that deletes the file when it is
//! dropped. Cleanup failures are logged, never raised.

use std::path::{Path, PathBuf};

use cf_core::{ArtifactId, Error};

/// Scratch directory shared by all jobs of a process.
#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Open (creating if needed) a workspace rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> cf_core::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Allocate a unique `<prefix>_<uuid>.<ext>` path. The file itself is not
    /// created.
    pub fn allocate(&self, prefix: &str, extension: &str) -> TempArtifact {
        let id = ArtifactId::new();
        let path = self
            .root
            .join(format!("{prefix}_{}.{extension}", id.simple()));
        TempArtifact { id, path }
    }

    /// Unique path for a fetched source file.
    pub fn input(&self, extension: &str) -> TempArtifact {
        self.allocate("input", extension)
    }

    /// Unique path for an engine output.
    pub fn output(&self, extension: &str) -> TempArtifact {
        self.allocate("output", extension)
    }
}

/// Scoped ownership of one scratch file.
///
/// Dropping the guard removes the file. A file that never came into existence
/// is not an error.
#[derive(Debug)]
pub struct TempArtifact {
    id: ArtifactId,
    path: PathBuf,
}

impl TempArtifact {
    pub fn id(&self) -> ArtifactId {
        self.id
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Remove the file now instead of waiting for drop.
    pub fn release(self) {
        drop(self);
    }

    fn remove(&self) -> cf_core::Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::Cleanup(format!(
                "failed to remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

impl Drop for TempArtifact {
    fn drop(&mut self) {
        if let Err(e) = self.remove() {
            tracing::warn!(artifact = %self.id, error = %e, kind = %e.kind(), "temp artifact cleanup failed");
        } else {
            tracing::trace!(path = %self.path.display(), "temp artifact removed");
        }
    }
}
