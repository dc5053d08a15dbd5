//! Build artifacts flowing into and out of the post-processor.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Builder id reported by [`TarballArtifact`].
pub const BUILDER_ID: &str = "guestfish-tarball.post-processor";

/// What the post-processor needs from a build artifact.
pub trait Artifact {
    fn builder_id(&self) -> &str;
    fn files(&self) -> &[PathBuf];
}

/// An artifact handed over by the host build tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildArtifact {
    builder_id: String,
    files: Vec<PathBuf>,
}

impl BuildArtifact {
    pub fn new(builder_id: impl Into<String>, files: Vec<PathBuf>) -> Self {
        Self {
            builder_id: builder_id.into(),
            files,
        }
    }
}

impl Artifact for BuildArtifact {
    fn builder_id(&self) -> &str {
        &self.builder_id
    }

    fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

/// The output directory and the tarballs written into it, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TarballArtifact {
    path: PathBuf,
    files: Vec<PathBuf>,
}

impl TarballArtifact {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            files: Vec::new(),
        }
    }

    pub fn id(&self) -> &'static str {
        "TARBALL"
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub(crate) fn push(&mut self, file: PathBuf) {
        self.files.push(file);
    }

    /// Remove the output directory and everything in it.
    pub fn destroy(&self) -> io::Result<()> {
        fs::remove_dir_all(&self.path)
    }
}

impl Artifact for TarballArtifact {
    fn builder_id(&self) -> &str {
        BUILDER_ID
    }

    fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl fmt::Display for TarballArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let files = self
            .files
            .iter()
            .map(|p| p.display().to_string())
            .collect::<Vec<_>>();
        write!(f, "{}", files.join(", "))
    }
}
