use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use guestfish_tarball::config::RawConfig;
use guestfish_tarball::preflight::PathSearch;
use guestfish_tarball::{BuildArtifact, PostProcessor, TarballArtifact};
use tracing::info;

#[derive(Parser)]
#[command(name = "guestfish-tarball")]
#[command(about = "Convert VM disk images into compressed root filesystem tarballs", long_about = None)]
struct Cli {
    /// Log every command sent to guestfish
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pack the root filesystem of each disk image into a tarball
    Run {
        /// TOML configuration file (all keys optional)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Builder id of the artifact the images came from
        #[arg(long, default_value = "transcend.qemu")]
        builder_id: String,

        /// Value for {{.BuildName}} in the output template
        #[arg(long)]
        build_name: Option<String>,

        /// Value for {{.BuilderType}} in the output template
        #[arg(long)]
        builder_type: Option<String>,

        /// Print the resulting artifact as JSON
        #[arg(long)]
        json: bool,

        /// Disk images to convert, in order
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Remove an output directory produced by an earlier run
    Destroy {
        output: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    guestfish_tarball::logging::init_logging(cli.verbose)?;

    match cli.command {
        Command::Run {
            config,
            builder_id,
            build_name,
            builder_type,
            json,
            images,
        } => run(
            config.as_deref(),
            builder_id,
            build_name,
            builder_type,
            json,
            images,
        ),
        Command::Destroy { output } => TarballArtifact::new(output.clone())
            .destroy()
            .with_context(|| format!("removing output directory '{}'", output.display())),
    }
}

fn run(
    config_path: Option<&Path>,
    builder_id: String,
    build_name: Option<String>,
    builder_type: Option<String>,
    json: bool,
    images: Vec<PathBuf>,
) -> Result<()> {
    let mut raw = match config_path {
        Some(path) => RawConfig::load(path)?,
        None => RawConfig::default(),
    };
    if build_name.is_some() {
        raw.build_name = build_name;
    }
    if builder_type.is_some() {
        raw.builder_type = builder_type;
    }

    let pp = PostProcessor::configure(raw, &PathSearch)
        .context("configuring tarball post-processor")?;
    let input = BuildArtifact::new(builder_id, images);
    let (artifact, keep_input) = pp
        .post_process(&input)
        .context("converting disk images to tarballs")?;

    if !keep_input {
        info!("Input artifact is not required after this step");
    }

    if json {
        let rendered = serde_json::to_string_pretty(&serde_json::json!({
            "id": artifact.id(),
            "artifact": artifact,
            "keep_input_artifact": keep_input,
        }))
        .context("serializing tarball artifact")?;
        println!("{}", rendered);
    } else {
        println!("{}", artifact);
    }
    Ok(())
}
