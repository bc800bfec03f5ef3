use clap::{Args, Parser, Subcommand};
use radargram::RadarKey;
use std::path::PathBuf;

/// Resample, align and export digitized glacier radargrams.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Data directory holding `processed_radar/` and `submitted/`.
    #[arg(short, long, default_value = ".")]
    pub data_dir: PathBuf,

    /// Along-track sampling step (meters).
    #[arg(short, long, default_value_t = 5.0)]
    pub step: f64,

    /// Track segments longer than this (meters) start a new part.
    #[arg(short, long, default_value_t = 100.0)]
    pub jump_threshold: f64,

    /// Numerical tolerance of the resampler.
    #[arg(short, long, default_value_t = 1e-12)]
    pub tolerance: f64,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Print the sampling grid of a radargram as `x,part,distance`
    /// CSV.
    Resample(Key),

    /// Print or write the aligned points of one radargram as GeoJSON.
    Align(Align),

    /// Align every interpreted radargram into one GeoJSON file.
    Export(Export),

    /// Print a radargram's summary as JSON.
    Summary(Summary),

    /// Store a submission document.
    Submit(Submit),
}

#[derive(Debug, Clone, Args)]
pub struct Key {
    /// Radar key, e.g. `amenfonna-20240507-DAT_0042_A1`.
    #[arg(short, long)]
    pub key: RadarKey,
}

#[derive(Debug, Clone, Args)]
pub struct Align {
    #[arg(short, long)]
    pub key: RadarKey,

    /// Output file, stdout if omitted.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Clone, Args)]
pub struct Export {
    #[arg(short, long)]
    pub out: PathBuf,
}

#[derive(Debug, Clone, Args)]
pub struct Summary {
    #[arg(short, long)]
    pub key: RadarKey,

    /// Recompute even if a cached summary exists.
    #[arg(short = 'O', long)]
    pub override_cache: bool,
}

#[derive(Debug, Clone, Args)]
pub struct Submit {
    /// Submitting user, defaults to the document's `user`.
    #[arg(short, long)]
    pub user: Option<String>,

    /// Submission document (JSON).
    pub file: PathBuf,
}
