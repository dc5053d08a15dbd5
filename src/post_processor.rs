//! Drives one guestfish session per source image and collects the tarballs.

use std::collections::HashSet;
use std::path::Path;

use tracing::{info, info_span, warn};

use crate::artifact::{Artifact, TarballArtifact};
use crate::config::{Config, RawConfig};
use crate::error::{Result, TarballError};
use crate::output::{establish_output_dir, resolve};
use crate::preflight::BinaryLocator;
use crate::session::{discover_root, emit, prepare, Session};

/// Builder ids whose artifacts are disk images guestfish can read.
pub const ACCEPTED_BUILDER_IDS: &[&str] = &["transcend.qemu"];

#[derive(Debug, Clone)]
pub struct PostProcessor {
    config: Config,
}

impl PostProcessor {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Resolve `raw` and build a post-processor from it.
    pub fn configure(raw: RawConfig, locator: &dyn BinaryLocator) -> Result<Self> {
        Config::resolve(raw, locator).map(Self::new)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Convert every file of `input` into a tarball.
    ///
    /// Returns the produced artifact and whether the input should be kept.
    /// The first failing source aborts the run; the output directory is left
    /// in place for inspection.
    pub fn post_process(&self, input: &dyn Artifact) -> Result<(TarballArtifact, bool)> {
        if !ACCEPTED_BUILDER_IDS.contains(&input.builder_id()) {
            return Err(TarballError::UnsupportedBuilder(
                input.builder_id().to_string(),
            ));
        }

        let output_dir = self.config.output_dir()?;
        establish_output_dir(&output_dir)?;

        let mut artifact = TarballArtifact::new(output_dir.clone());
        let mut seen = HashSet::new();

        for source in input.files() {
            let outfile = resolve(&self.config, &output_dir, source);
            if !seen.insert(outfile.clone()) {
                warn!(
                    "{} is produced by more than one source; the last one wins",
                    outfile.display()
                );
            }

            self.process_source(source, &outfile)?;
            artifact.push(outfile);
        }

        Ok((artifact, self.config.keep_input_artifact))
    }

    fn process_source(&self, source: &Path, outfile: &Path) -> Result<()> {
        let _span = info_span!("tarball", source = %source.display()).entered();

        let mut session = Session::open(&self.config.binary)?;
        let device = discover_root(&mut session, source, self.config.mount_timeout)?;
        prepare(&mut session, &device)?;
        emit(&mut session, outfile, &self.config.compression)?;
        session.close()?;

        info!("Wrote {}", outfile.display());
        Ok(())
    }
}
