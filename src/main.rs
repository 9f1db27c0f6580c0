use std::{
    fs::File,
    io::{self, stdout, BufWriter, Write},
    process,
};

use clap::Parser;
use colored::Colorize;
use kmersig::{
    builder::SignatureCalculator, cli::Args, error::BuilderError, pipeline::PipelineReport,
    progress::Progress,
};
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse();

    let default_level = if args.quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(io::stderr)
        .init();

    if !args.quiet {
        eprintln!("{}: {}", "k-length".bold(), args.k.to_string().blue().bold());
        eprintln!(
            "{}: {}",
            "data".bold(),
            args.path.display().to_string().underline().bold().blue()
        );
        eprintln!(
            "{}: {}",
            "workers".bold(),
            args.workers().to_string().blue().bold()
        );
        eprintln!();
    }

    match run(&args) {
        Ok(report) => {
            if !report.failures.is_empty() {
                eprintln!(
                    "{}",
                    "Signatures could not be computed for:".blue().bold()
                );
                for failure in &report.failures {
                    eprintln!(" {}: {}", failure.id.bold(), failure.error);
                }
            }
        }
        Err(e) => {
            eprintln!(
                "{}\n {}",
                "Application error:".blue().bold(),
                e.to_string().blue()
            );
            process::exit(1);
        }
    }
}

fn run(args: &Args) -> Result<PipelineReport, BuilderError> {
    let mut calculator = SignatureCalculator::new()
        .k(args.k)?
        .workers(args.workers())?
        .format(args.format);
    if let Some(capacity) = args.queue_capacity {
        calculator = calculator.queue_capacity(capacity);
    }
    let signatures = calculator.build()?;

    let quiet = args.quiet;
    let show_progress = move |progress: Progress| {
        if !quiet {
            eprint!(
                "\r  Finished processing {} of {} ({:.2}%) sequences.",
                progress.sequences_finished,
                progress.total,
                progress.percent()
            );
            if progress.is_complete() {
                eprintln!();
            }
        }
    };

    let output = args.output.as_deref();
    let open_output = || -> io::Result<Box<dyn Write + Send>> {
        let writer: Box<dyn Write + Send> = match output {
            Some(path) => Box::new(BufWriter::new(File::create(path)?)),
            None => Box::new(BufWriter::new(stdout())),
        };
        Ok(writer)
    };

    let (report, _) = signatures.calculate_into(&args.path, open_output, show_progress)?;
    Ok(report)
}
