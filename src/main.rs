use clap::Parser;
use crop_annotator::config::{self, Config};
use crop_annotator::pipeline::{self, ResizeMode, RunOptions};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "crop-annotator")]
#[command(about = "Build a crop-example dataset from an edited photo library")]
#[command(long_about = "\
Build a crop-example dataset from an edited photo library

Scans a directory for photos and XMP sidecars carrying crop metadata,
computes a crop factor for each image, and (with --save) writes a resized
JPEG copy of every cropped photo plus a JSON annotations manifest.

Metadata is read through a single long-lived exiftool session; exiftool
must be on PATH. Which tags feed the pipeline is configured in the
EXTRACTABLES section of the config file.

A run without --save only scans and reports how many cropped and
uncropped images were found.")]
#[command(version)]
struct Cli {
    /// Directory to scan for photos and XMP sidecars
    source_dir: PathBuf,

    /// Resize one image at a time instead of fanning out across CPU cores
    #[arg(long)]
    sequential: bool,

    /// Resize the cropped images and save the annotations manifest
    #[arg(long)]
    save: bool,

    /// Pipeline configuration file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    init_thread_pool(&config.settings);

    let opts = RunOptions {
        source_dir: cli.source_dir,
        mode: if cli.sequential {
            ResizeMode::Sequential
        } else {
            ResizeMode::Parallel
        },
        save: cli.save,
    };

    pipeline::run(&config, &opts)?;
    println!("Done");
    Ok(())
}

/// Initialize the rayon thread pool for the resize stage.
///
/// Caps at the number of available CPU cores — config can constrain down,
/// not up.
fn init_thread_pool(settings: &config::Settings) {
    let threads = config::effective_threads(settings);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
