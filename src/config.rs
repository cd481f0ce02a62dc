use crate::formats::index_path_for;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Parser)]
#[command(name = "seqregion")]
#[command(version)]
#[command(about = "Region-based FASTA retrieval and BAM alignment counting")]
pub struct Config {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "RUST_LOG", default_value = "warn", global = true)]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Print sequence for regions of an indexed FASTA file
    ///
    /// REGION is <seq>, <seq>:<pos> or <seq>:<start>..<end>, with 1-based
    /// inclusive coordinates.
    Fetch(FetchArgs),

    /// Print the number of alignments in a BAM file, optionally within a region
    Count(CountArgs),
}

#[derive(Debug, Clone, Args)]
pub struct FetchArgs {
    /// FASTA reference file
    #[arg(env = "SEQREGION_REFERENCE")]
    pub fasta: PathBuf,

    /// Generate <fasta>.fai even if it already exists
    #[arg(short = 'i', long)]
    pub index: bool,

    /// Print the specified region
    #[arg(short, long)]
    pub region: Option<String>,

    /// Read line-delimited regions on stdin and print the sequence of each;
    /// overrides --region
    #[arg(short = 'c', long = "stdin")]
    pub stdin: bool,

    /// Print the Shannon entropy of each region instead of its sequence
    #[arg(short, long)]
    pub entropy: bool,

    /// Emit one JSON object per region
    #[arg(long)]
    pub json: bool,
}

impl FetchArgs {
    pub fn index_path(&self) -> PathBuf {
        index_path_for(&self.fasta)
    }
}

#[derive(Debug, Clone, Args)]
pub struct CountArgs {
    /// Input BAM file (stdin when absent or "-")
    #[arg(long = "in", value_name = "BAM")]
    pub input: Option<PathBuf>,

    /// Genomic region; an index is used automatically when one exists
    #[arg(long)]
    pub region: Option<String>,

    /// BAI index location, if not next to the BAM file
    #[arg(long, env = "SEQREGION_BAM_INDEX")]
    pub index: Option<PathBuf>,

    /// Emit the count as JSON
    #[arg(long)]
    pub json: bool,
}

impl CountArgs {
    /// BAM path to open, `None` for stdin
    pub fn input_path(&self) -> Option<&Path> {
        self.input
            .as_deref()
            .filter(|path| path.as_os_str() != "-")
    }
}
