//! datamgr CLI tool
//!
//! Split large record files into chunks, deduplicate them and join them back.
//!
//! Usage:
//!   datamgr split big.txt --chunk-mb 64          # big/big-001 ...
//!   datamgr dedup big --join big.dedup.txt --clean
//!   datamgr join big big.txt
//!   datamgr sample data.jsonl --min 100 --max 10
//!   datamgr project data.jsonl city cities.jsonl
//!   datamgr estimate big.txt --chunk-mb 64
//!
//! Defaults can come from the environment or a `.env` file (`DATAMGR_*`).
//! Log verbosity follows `RUST_LOG`; `--verbose` raises the default to info.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;

use datamgr::naming::default_chunk_dir;
use datamgr::ops::{dedup, project, sample, split};
use datamgr::source::{DataSource, Format, JsonLines, Lines};
use datamgr::{clean, discover, estimate, join, Epilogue};

#[derive(Parser)]
#[command(name = "datamgr")]
#[command(about = "Chunked split, dedup and join of large record files")]
struct Cli {
    /// Record format (lines or jsonl); guessed from the file extension if unset
    #[arg(long, global = true, env = "DATAMGR_FORMAT")]
    format: Option<Format>,

    /// Print reports as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Log progress at info level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split a file into numbered chunk files
    Split {
        input: PathBuf,
        /// Chunk size budget in megabytes; whole file in one chunk if unset
        #[arg(long, env = "DATAMGR_CHUNK_MB")]
        chunk_mb: Option<f64>,
        /// Chunk directory (default: the input file stem)
        #[arg(long)]
        chunk_dir: Option<PathBuf>,
        /// Join the chunks into this file afterwards
        #[arg(long)]
        join: Option<PathBuf>,
        /// Remove the chunk directory afterwards
        #[arg(long)]
        clean: bool,
    },
    /// Concatenate the chunk files of a directory in order
    Join { chunk_dir: PathBuf, output: PathBuf },
    /// Remove duplicate records across all chunks of a directory
    Dedup {
        chunk_dir: PathBuf,
        #[arg(long)]
        join: Option<PathBuf>,
        #[arg(long)]
        clean: bool,
    },
    /// Take complete records from the first chunk that has enough of them
    Sample {
        input: PathBuf,
        #[arg(long, env = "DATAMGR_CHUNK_MB")]
        chunk_mb: Option<f64>,
        /// Scratch chunk directory, removed afterwards
        #[arg(long)]
        chunk_dir: Option<PathBuf>,
        #[arg(long, default_value_t = 1)]
        min: usize,
        #[arg(long, default_value_t = 10)]
        max: usize,
    },
    /// Write one field of every JSON-lines document to a new file
    Project {
        input: PathBuf,
        /// Field name, or element position for array documents
        key: String,
        output: PathBuf,
        #[arg(long, env = "DATAMGR_CHUNK_MB")]
        chunk_mb: Option<f64>,
        /// Scratch chunk directory, removed afterwards
        #[arg(long)]
        chunk_dir: Option<PathBuf>,
        /// Write null for documents without the field instead of skipping them
        #[arg(long)]
        keep_na: bool,
    },
    /// Show rows per chunk and chunk count for a budget
    Estimate {
        input: PathBuf,
        #[arg(long, env = "DATAMGR_CHUNK_MB")]
        chunk_mb: f64,
    },
    /// Remove a chunk directory
    Clean { chunk_dir: PathBuf },
    /// List the chunk files of a directory in processing order
    List { chunk_dir: PathBuf },
}

fn main() -> Result<()> {
    // .env must be loaded before clap reads env defaults
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Split {
            input,
            chunk_mb,
            chunk_dir,
            join,
            clean,
        } => {
            let chunk_dir = chunk_dir.unwrap_or_else(|| default_chunk_dir(&input));
            let mut epilogue = Epilogue::new().clean(clean);
            epilogue.join_path = join;

            let report = match resolve_format(cli.format, &input) {
                Format::Lines => split(&Lines, &input, &chunk_dir, chunk_mb, epilogue),
                Format::Jsonl => split(&JsonLines, &input, &chunk_dir, chunk_mb, epilogue),
            }
            .with_context(|| format!("Failed to split {}", input.display()))?;

            if cli.json {
                print_json(&report)?;
            } else {
                println!(
                    "Split {} rows into {} chunks under {}",
                    report.rows,
                    report.handle.chunk_paths.len(),
                    chunk_dir.display()
                );
                print_epilogue(report.handle.joined.as_deref(), report.handle.cleaned);
            }
        }
        Commands::Join { chunk_dir, output } => {
            let paths = discover(&chunk_dir)?;
            match join::join(&paths, &output)? {
                Some(bytes) => println!(
                    "Joined {} chunks ({} bytes) into {}",
                    paths.len(),
                    bytes,
                    output.display()
                ),
                None => println!("No chunks under {}, nothing written", chunk_dir.display()),
            }
        }
        Commands::Dedup {
            chunk_dir,
            join,
            clean,
        } => {
            let mut epilogue = Epilogue::new().clean(clean);
            epilogue.join_path = join;

            // Chunk files carry no extension; a join target may hint the format
            let hint = epilogue.join_path.clone().unwrap_or_else(|| chunk_dir.clone());
            let report = match resolve_format(cli.format, &hint) {
                Format::Lines => dedup(&Lines, &chunk_dir, epilogue),
                Format::Jsonl => dedup(&JsonLines, &chunk_dir, epilogue),
            }
            .with_context(|| format!("Failed to deduplicate {}", chunk_dir.display()))?;

            if cli.json {
                print_json(&report)?;
            } else {
                let stats = &report.stats;
                println!(
                    "Deduplicated {} chunks ({} pairs): {} rows kept, \
                     {} repeats within chunks, {} across chunks",
                    report.handle.chunk_paths.len(),
                    stats.pairs,
                    stats.rows_kept,
                    stats.within_removed,
                    stats.across_removed
                );
                print_epilogue(report.handle.joined.as_deref(), report.handle.cleaned);
            }
        }
        Commands::Sample {
            input,
            chunk_mb,
            chunk_dir,
            min,
            max,
        } => {
            let chunk_dir = chunk_dir.unwrap_or_else(|| scratch_dir(&input, "sample"));
            match resolve_format(cli.format, &input) {
                Format::Lines => {
                    let rows = sample(&Lines, &input, &chunk_dir, chunk_mb, min, max)?;
                    print_sample(&Lines, rows)?
                }
                Format::Jsonl => {
                    let rows = sample(&JsonLines, &input, &chunk_dir, chunk_mb, min, max)?;
                    print_sample(&JsonLines, rows)?
                }
            }
        }
        Commands::Project {
            input,
            key,
            output,
            chunk_mb,
            chunk_dir,
            keep_na,
        } => {
            let chunk_dir = chunk_dir.unwrap_or_else(|| scratch_dir(&input, "project"));
            let report = project(&input, &output, &chunk_dir, &key, !keep_na, chunk_mb)
                .with_context(|| format!("Failed to project {key} from {}", input.display()))?;

            if cli.json {
                print_json(&report)?;
            } else {
                println!(
                    "Wrote {} values of '{}' to {} ({} documents without it skipped)",
                    report.values,
                    key,
                    output.display(),
                    report.skipped
                );
            }
        }
        Commands::Estimate { input, chunk_mb } => {
            let est = estimate::estimate(&input, chunk_mb)?;
            if cli.json {
                print_json(&est)?;
            } else {
                println!("Lines:          {}", est.lines);
                println!("Bytes:          {}", est.bytes);
                println!("Rows per chunk: {}", est.rows_per_chunk);
                println!("Chunk count:    {}", est.chunk_count);
            }
        }
        Commands::Clean { chunk_dir } => {
            if clean::clean(&chunk_dir)? {
                println!("Removed {}", chunk_dir.display());
            } else {
                println!("{} does not exist", chunk_dir.display());
            }
        }
        Commands::List { chunk_dir } => {
            let paths = discover(&chunk_dir)?;
            if cli.json {
                print_json(&paths)?;
            } else {
                for path in &paths {
                    println!("{}", path.display());
                }
            }
        }
    }

    Ok(())
}

fn resolve_format(format: Option<Format>, path: &Path) -> Format {
    format.unwrap_or_else(|| Format::from_path(path))
}

fn scratch_dir(input: &Path, purpose: &str) -> PathBuf {
    let mut name = default_chunk_dir(input).into_os_string();
    name.push(".");
    name.push(purpose);
    PathBuf::from(name)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_epilogue(joined: Option<&Path>, cleaned: bool) {
    if let Some(path) = joined {
        println!("Joined into {}", path.display());
    }
    if cleaned {
        println!("Removed chunk directory");
    }
}

fn print_sample<D: DataSource>(source: &D, rows: Option<Vec<D::Record>>) -> Result<()> {
    let Some(rows) = rows else {
        println!("No chunk had enough complete rows");
        return Ok(());
    };

    let mut out = std::io::stdout().lock();
    for row in &rows {
        // Keys are the row text without its terminator
        out.write_all(&source.record_key(row))?;
        out.write_all(b"\n")?;
    }
    Ok(())
}
