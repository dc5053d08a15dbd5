//! Turn VM disk images into compressed root filesystem tarballs.
//!
//! Each source image is loaded into its own `guestfish` session. The session
//! finds the root filesystem with `inspect-os`, mounts it, creates the device
//! nodes a container or VM root needs and streams the tree out with `tar-out`.
//!
//! - **Configuration** - [`config`]: TOML surface, defaults, aggregated validation
//! - **Preflight** - [`preflight`]: locating the guestfish binary
//! - **Sessions** - [`session`]: the guestfish line protocol
//! - **Output layout** - [`output`]: tarball paths and the output directory
//! - **Artifacts** - [`artifact`]: input and output artifacts
//!
//! # Architecture
//!
//! ```text
//! PostProcessor::post_process
//!     │
//!     ├── output::establish_output_dir   (once, before any session)
//!     │
//!     └── for each source image:
//!             output::resolve
//!             Session::open
//!             session::discover_root     add-drive, run, inspect-os (bounded read)
//!             session::prepare           mount, mknod-c / mkdir-mode batch
//!             session::emit              tar-out, quit
//!             Session::close             wait for exit, check status
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use guestfish_tarball::artifact::BuildArtifact;
//! use guestfish_tarball::config::RawConfig;
//! use guestfish_tarball::preflight::PathSearch;
//! use guestfish_tarball::PostProcessor;
//!
//! let pp = PostProcessor::configure(RawConfig::default(), &PathSearch)?;
//! let input = BuildArtifact::new("transcend.qemu", vec!["output-qemu/disk.img".into()]);
//! let (tarballs, _keep_input) = pp.post_process(&input)?;
//! println!("{}", tarballs);
//! # Ok::<(), guestfish_tarball::TarballError>(())
//! ```

pub mod artifact;
pub mod config;
pub mod error;
pub mod logging;
pub mod output;
pub mod post_processor;
pub mod preflight;
pub mod session;
pub mod template;

#[cfg(test)]
mod test_support;

pub use artifact::{Artifact, BuildArtifact, TarballArtifact};
pub use config::{Config, RawConfig};
pub use error::TarballError;
pub use post_processor::PostProcessor;
