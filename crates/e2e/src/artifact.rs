//! Artifact directory ownership: reset, environment descriptor, evidence capture

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

use storefront_common::{ArtifactDescriptor, EnvironmentDescriptor, ENVIRONMENT_FILE};

use crate::error::{E2eError, E2eResult};

/// Handle to the on-disk artifact directory.
///
/// Cheap to clone; every clone points at the same directory and may capture
/// concurrently.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        self.dir.is_dir()
    }

    /// Delete and recreate the directory.
    ///
    /// Best-effort: failures are logged and the run continues with whatever
    /// state the directory is left in. Returns whether the directory is now
    /// present and empty.
    pub fn reset(&self) -> bool {
        match self.try_reset() {
            Ok(()) => {
                debug!("Reset artifact directory {}", self.dir.display());
                true
            }
            Err(e) => {
                warn!(
                    "Could not reset artifact directory {}: {}",
                    self.dir.display(),
                    e
                );
                false
            }
        }
    }

    fn try_reset(&self) -> E2eResult<()> {
        match fs::remove_dir_all(&self.dir) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
        fs::create_dir_all(&self.dir)?;
        Ok(())
    }

    fn ensure_dir(&self) -> E2eResult<()> {
        fs::create_dir_all(&self.dir).map_err(|e| {
            E2eError::ArtifactDir(format!("{}: {}", self.dir.display(), e))
        })
    }

    /// Write `environment.properties`, replacing any previous descriptor.
    pub fn write_environment(&self, descriptor: &EnvironmentDescriptor) -> E2eResult<PathBuf> {
        self.ensure_dir()?;
        let path = self.dir.join(ENVIRONMENT_FILE);
        let content = descriptor.clone().normalized().to_properties();
        self.write_atomic(&path, content.as_bytes())?;
        debug!("Wrote environment descriptor to {}", path.display());
        Ok(path)
    }

    /// Read back the environment descriptor, if one was written.
    pub fn read_environment(&self) -> Option<EnvironmentDescriptor> {
        read_environment_file(&self.dir.join(ENVIRONMENT_FILE))
    }

    /// Persist one artifact under its unique file name.
    ///
    /// The payload is written to a temporary file in the same directory and
    /// renamed into place, so readers only ever see complete files.
    pub fn capture(&self, descriptor: &ArtifactDescriptor) -> E2eResult<PathBuf> {
        self.ensure_dir()?;
        let path = self.dir.join(descriptor.file_name());
        self.write_atomic(&path, descriptor.payload.as_bytes())?;
        debug!(
            "Captured {} ({} bytes, {})",
            path.display(),
            descriptor.payload.len(),
            descriptor.media_type
        );
        Ok(path)
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> E2eResult<()> {
        let mut tmp = NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| E2eError::Io(e.error))?;
        Ok(())
    }

    /// File names currently in the directory, sorted. Missing directory is empty.
    pub fn list(&self) -> Vec<String> {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }
}

/// Parse an environment descriptor file; missing or unreadable yields `None`.
pub fn read_environment_file(path: &Path) -> Option<EnvironmentDescriptor> {
    let content = fs::read_to_string(path).ok()?;
    match EnvironmentDescriptor::from_properties(&content) {
        Ok(env) => Some(env),
        Err(e) => {
            warn!("Ignoring {}: {}", path.display(), e);
            None
        }
    }
}
