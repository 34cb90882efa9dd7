use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use ymmsl::{Configuration, PartialConfiguration};

mod diagnostics;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "ymmsl")]
#[command(about = "Check, merge and format yMMSL configuration files", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge the files left to right and check that the result is consistent.
    Check {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Fail when components lack an implementation or resources.
        #[arg(long)]
        strict: bool,
    },

    /// Merge the files left to right and write the result in canonical form.
    Merge {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },

    /// Rewrite one document in canonical form.
    Fmt {
        file: PathBuf,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },

    /// Write a JSON summary of the merged files.
    Summary {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[arg(short = 'o', long)]
        out: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Check { files, strict } => {
            let config = load_merged(&files)?;

            let problems = config.check_runnable();
            for problem in &problems {
                diagnostics::warn(problem);
            }
            if strict && !problems.is_empty() {
                bail!(
                    "{}",
                    diagnostics::error_message(format!(
                        "{} problem(s) found, configuration cannot be run",
                        problems.len()
                    ))
                );
            }
            println!("OK: {} file(s) checked", files.len());
        }

        Commands::Merge { files, out } => {
            let config = load_merged(&files)?;
            let text = ymmsl::dump(&config).map_err(library_error)?;
            write_output(out.as_deref(), &text)?;
        }

        Commands::Fmt { file, out } => {
            let config = load_file(&file)?;
            let text = ymmsl::dump(&config).map_err(library_error)?;
            write_output(out.as_deref(), &text)?;
        }

        Commands::Summary { files, out } => {
            let config = load_merged(&files)?;
            let summary = ymmsl::report::build_summary(&config);
            let mut json = serde_json::to_string_pretty(&summary)?;
            json.push('\n');
            write_output(out.as_deref(), &json)?;
        }
    }

    Ok(())
}

fn library_error(err: ymmsl::Error) -> anyhow::Error {
    anyhow::anyhow!(diagnostics::describe(&err))
}

fn load_file(path: &Path) -> Result<PartialConfiguration> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    ymmsl::load_partial(&text)
        .map_err(library_error)
        .with_context(|| format!("failed to load {}", path.display()))
}

/// Load every file and layer them in order, later files overriding earlier
/// ones.
fn load_merged(files: &[PathBuf]) -> Result<Configuration> {
    let mut merged = PartialConfiguration::new();
    for path in files {
        let fragment = load_file(path)?;
        merged
            .update(&fragment)
            .map_err(library_error)
            .with_context(|| format!("failed to merge {}", path.display()))?;
    }
    Configuration::new(merged)
        .map_err(library_error)
        .context("merged configuration is not valid")
}

fn write_output(out: Option<&Path>, text: &str) -> Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, text)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => print!("{text}"),
    }
    Ok(())
}
