use std::path::PathBuf;

use anyhow::{Result, anyhow};
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "description-overlay",
    version,
    about = "Draw a description box onto photos"
)]
struct Cli {
    /// Images to annotate
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Description record (JSON)
    #[arg(short = 'R', long = "record")]
    record: Option<PathBuf>,

    /// Directory for annotated copies
    #[arg(short = 'o', long = "out-dir", default_value = "annotated")]
    out_dir: PathBuf,

    /// Print the computed layout as JSON instead of writing images
    #[arg(long = "preview")]
    preview: bool,

    /// Fill a missing date/time from the current UTC clock
    #[arg(long = "stamp")]
    stamp: bool,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    description_overlay::logging::init(cli.verbose)?;

    let config = description_overlay::Config {
        images: cli.images,
        record_path: cli.record,
        out_dir: cli.out_dir,
        preview: cli.preview,
        stamp: cli.stamp,
        settings_path: cli.read_settings,
    };
    let report = description_overlay::run(config)?;
    for line in &report.lines {
        println!("{}", line);
    }
    if report.failures > 0 {
        return Err(anyhow!("{} image(s) failed", report.failures));
    }
    Ok(())
}
