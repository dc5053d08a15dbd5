//! Error taxonomy for the tarball post-processor.

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use thiserror::Error;

use crate::session::SessionState;

pub type Result<T, E = TarballError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum TarballError {
    /// Every configuration problem found, reported together.
    #[error("invalid configuration:\n{}", format_problems(.problems))]
    InvalidConfig { problems: Vec<String> },

    #[error("tarball post-processor can only be used with the QEMU builder, got '{0}'")]
    UnsupportedBuilder(String),

    #[error("error interpolating output path '{template}': {reason}")]
    Template { template: String, reason: String },

    #[error("output directory {} already exists", .0.display())]
    OutputExists(PathBuf),

    #[error("error creating output directory {}: {source}", .path.display())]
    CreateOutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("error running guestfish '{}': {source}", .binary.display())]
    Spawn {
        binary: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("guestfish session I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("failed to locate root filesystem: {0}")]
    RootNotFound(String),

    #[error(
        "failed to locate root filesystem: timed out after {seconds}s waiting for response from guestfish"
    )]
    MountTimeout { seconds: u64 },

    #[error("guestfish session cannot {action} while {state:?}")]
    OutOfOrder {
        action: &'static str,
        state: SessionState,
    },

    #[error("guestfish exited with {status}")]
    ToolFailed { status: ExitStatus },
}

impl TarballError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, TarballError::MountTimeout { .. })
    }
}

fn format_problems(problems: &[String]) -> String {
    problems
        .iter()
        .map(|p| format!("  {}", p))
        .collect::<Vec<_>>()
        .join("\n")
}
