//! Post-processor configuration.
//!
//! [`RawConfig`] mirrors the TOML surface with every key optional.
//! [`Config::resolve`] applies defaults, locates the guestfish binary and
//! validates the output template, aggregating every problem into a single
//! [`TarballError::InvalidConfig`].

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

use crate::error::{Result, TarballError};
use crate::preflight::BinaryLocator;
use crate::template::{self, TemplateVars};

pub const DEFAULT_BINARY: &str = "guestfish";
pub const DEFAULT_OUTPUT: &str = "packer_{{.BuildName}}_tarball";
pub const DEFAULT_COMPRESSION: &str = "gz";
pub const DEFAULT_MOUNT_TIMEOUT_SECS: u64 = 10;

/// Compression codecs accepted by `tar-out`, with the archive suffix each implies.
pub const CODECS: &[(&str, &str)] = &[
    ("gz", ".tar.gz"),
    ("gzip", ".tar.gz"),
    ("bzip2", ".tar.bz2"),
    ("xz", ".tar.xz"),
    ("lzop", ".tar.lzo"),
    ("compress", ".tar.Z"),
    ("zstd", ".tar.zst"),
];

/// Suffix implied by a compression codec, if the codec is known.
pub fn default_extension(codec: &str) -> Option<&'static str> {
    CODECS
        .iter()
        .find(|(name, _)| *name == codec)
        .map(|(_, ext)| *ext)
}

/// Configuration as written by the user.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RawConfig {
    pub output: Option<String>,
    pub tarball_filename: Option<String>,
    pub tarball_extension: Option<String>,
    pub guestfish_binary: Option<String>,
    pub guestfish_mount_timeout: Option<u64>,
    #[serde(default)]
    pub keep_input_artifact: bool,
    pub compression: Option<String>,
    #[serde(alias = "packer_build_name")]
    pub build_name: Option<String>,
    #[serde(alias = "packer_builder_type")]
    pub builder_type: Option<String>,
}

impl RawConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).map_err(|e| TarballError::InvalidConfig {
            problems: vec![format!("error parsing configuration: {}", e)],
        })
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading tarball config '{}'", path.display()))?;
        Self::from_toml_str(&raw)
            .with_context(|| format!("parsing tarball config '{}'", path.display()))
    }
}

/// Resolved, immutable settings for one post-processing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub binary: PathBuf,
    pub output_template: String,
    pub tarball_filename: Option<String>,
    pub tarball_extension: String,
    pub compression: String,
    pub mount_timeout: Duration,
    pub keep_input_artifact: bool,
    pub vars: TemplateVars,
}

impl Config {
    /// Apply defaults and validate `raw`.
    ///
    /// All problems are collected before failing so the user sees them at once.
    pub fn resolve(raw: RawConfig, locator: &dyn BinaryLocator) -> Result<Self> {
        let mut problems = Vec::new();

        let binary_name = non_empty(raw.guestfish_binary).unwrap_or_else(|| DEFAULT_BINARY.into());
        let output_template = non_empty(raw.output).unwrap_or_else(|| DEFAULT_OUTPUT.into());
        let compression =
            non_empty(raw.compression).unwrap_or_else(|| DEFAULT_COMPRESSION.into());

        let timeout_secs = match raw.guestfish_mount_timeout {
            None | Some(0) => DEFAULT_MOUNT_TIMEOUT_SECS,
            Some(secs) => secs,
        };

        let binary = match locator.locate(&binary_name) {
            Ok(path) => path,
            Err(reason) => {
                problems.push(format!(
                    "error finding executable {}: {}",
                    binary_name, reason
                ));
                PathBuf::from(&binary_name)
            }
        };

        if let Err(reason) = template::validate(&output_template) {
            problems.push(format!("error parsing target template: {}", reason));
        }

        let implied_extension = default_extension(&compression);
        if implied_extension.is_none() {
            let known = CODECS.iter().map(|(name, _)| *name).collect::<Vec<_>>();
            problems.push(format!(
                "unsupported compression '{}'; expected one of: {}",
                compression,
                known.join(", ")
            ));
        }
        let tarball_extension = non_empty(raw.tarball_extension)
            .unwrap_or_else(|| implied_extension.unwrap_or(".tar.gz").to_string());

        let tarball_filename = non_empty(raw.tarball_filename);
        if let Some(name) = &tarball_filename {
            if name.contains('/') {
                problems.push(format!(
                    "tarball_filename must be a plain file name, got '{}'",
                    name
                ));
            }
        }

        if !problems.is_empty() {
            return Err(TarballError::InvalidConfig { problems });
        }

        Ok(Self {
            binary,
            output_template,
            tarball_filename,
            tarball_extension,
            compression,
            mount_timeout: Duration::from_secs(timeout_secs),
            keep_input_artifact: raw.keep_input_artifact,
            vars: TemplateVars {
                build_name: raw.build_name.unwrap_or_default(),
                builder_type: raw.builder_type.unwrap_or_default(),
            },
        })
    }

    /// Render the output directory template.
    pub fn output_dir(&self) -> Result<PathBuf> {
        template::render(&self.output_template, &self.vars)
            .map(PathBuf::from)
            .map_err(|reason| TarballError::Template {
                template: self.output_template.clone(),
                reason,
            })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
