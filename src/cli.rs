//! Command-line interface definition.

use clap::{Parser, ValueEnum};
use std::{num::NonZeroUsize, path::PathBuf, thread};

use crate::kmer::{MAX_K, MIN_K};

/// Computes canonical k-mer genomic signatures for every sequence in a FASTA file.
#[derive(Parser, Debug)]
#[command(name = "kmersig")]
#[command(version, author, about, long_about = None)]
pub struct Args {
    /// K-mer length (1-10)
    #[arg(value_parser = parse_k)]
    pub k: usize,

    /// Path to a FASTA file
    pub path: PathBuf,

    /// Output file (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Number of worker threads (defaults to available parallelism)
    #[arg(short, long, value_parser = parse_threads)]
    pub threads: Option<usize>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "tsv")]
    pub format: OutputFormat,

    /// Bound the work and result queues to this many messages
    #[arg(long)]
    pub queue_capacity: Option<usize>,

    /// Suppress progress and informational output
    #[arg(short, long)]
    pub quiet: bool,
}

impl Args {
    /// Worker count, falling back to the machine's available parallelism.
    #[must_use]
    pub fn workers(&self) -> usize {
        self.threads.unwrap_or_else(|| {
            thread::available_parallelism()
                .map(NonZeroUsize::get)
                .unwrap_or(1)
        })
    }
}

/// Output format for signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Tab-separated table with a `Sequence Id` header row
    #[default]
    Tsv,
    /// One JSON object per line
    Json,
}

fn parse_k(s: &str) -> Result<usize, String> {
    let k: usize = s
        .parse()
        .map_err(|_| format!("'{s}' is not a valid number"))?;
    if k < MIN_K {
        return Err(format!("k-mer length must be at least {MIN_K}"));
    }
    if k > MAX_K {
        return Err(format!("k-mer length must be at most {MAX_K}"));
    }
    Ok(k)
}

fn parse_threads(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("at least one thread is required".to_string()),
        Ok(n) => Ok(n),
        Err(_) => Err(format!("'{s}' is not a valid number")),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_k_bounds() {
        assert_eq!(parse_k("4"), Ok(4));
        assert!(parse_k("0").is_err());
        assert!(parse_k("11").is_err());
        assert!(parse_k("four").is_err());
    }

    #[test]
    fn parse_threads_rejects_zero() {
        assert_eq!(parse_threads("8"), Ok(8));
        assert!(parse_threads("0").is_err());
    }

    #[test]
    fn args_defaults() {
        let args = Args::try_parse_from(["kmersig", "4", "seqs.fa"]).unwrap();
        assert_eq!(args.k, 4);
        assert_eq!(args.format, OutputFormat::Tsv);
        assert!(args.output.is_none());
        assert!(args.workers() >= 1);
    }

    #[test]
    fn args_all_options() {
        let args = Args::try_parse_from([
            "kmersig", "3", "seqs.fa", "-o", "out.tsv", "-t", "8", "-f", "json", "-q",
        ])
        .unwrap();
        assert_eq!(args.workers(), 8);
        assert_eq!(args.format, OutputFormat::Json);
        assert_eq!(args.output, Some(PathBuf::from("out.tsv")));
        assert!(args.quiet);
    }
}
