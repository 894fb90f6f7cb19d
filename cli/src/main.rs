//! wpblocks CLI - WordPress HTML to stream block conversion tool
//!
//! A command-line tool for surveying signatures, cleaning HTML and building
//! stream blocks from WordPress content.

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use wpblocks::{
    convert_all, BatchOptions, PipelineConfig, SignatureInspector, SignatureMaker, SignatureTable,
    SourceDocument, WpBlocks,
};

/// WordPress HTML to stream blocks
#[derive(Parser)]
#[command(
    name = "wpblocks",
    version,
    about = "Convert WordPress HTML into structured stream blocks",
    long_about = "wpblocks - Signature-driven WordPress content conversion.\n\n\
                  Classifies top-level HTML fragments by tag signature, cleans them\n\
                  with prefix rules and builds typed blocks from a signature table.\n\n\
                  Usage:\n  \
                  wpblocks inspect posts.json --save signatures.json\n  \
                  wpblocks convert posts.json --table signatures.json -o blocks.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Pipeline configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// List the distinct tag signatures of an HTML file
    #[command(visible_alias = "sig")]
    Signatures {
        /// Input HTML file
        input: PathBuf,

        /// Include sorted attributes in each segment
        #[arg(long)]
        attrs: bool,

        /// Segment separator
        #[arg(long, default_value = ":")]
        separator: String,

        /// Keep duplicate signatures
        #[arg(long)]
        all: bool,
    },

    /// Survey the signatures used across a corpus
    Inspect {
        /// Corpus file (JSON array of documents)
        input: PathBuf,

        /// Clean documents before inspecting them
        #[arg(long)]
        clean: bool,

        /// Upsert the signatures into this signature table file
        #[arg(long)]
        save: Option<PathBuf>,

        /// Record this model name instead of each document's own model
        #[arg(long, requires = "save")]
        model: Option<String>,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Clean an HTML file with the configured rules
    Clean {
        /// Input HTML file
        input: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also strip every div wrapper from the result
        #[arg(long)]
        unwrap_divs: bool,
    },

    /// Build blocks from an already cleaned HTML file
    Build {
        /// Input HTML file
        input: PathBuf,

        /// Signature table file
        #[arg(short, long)]
        table: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,
    },

    /// Clean and build every document in a corpus
    Convert {
        /// Corpus file (JSON array of documents)
        input: PathBuf,

        /// Signature table file
        #[arg(short, long)]
        table: PathBuf,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Disable parallel processing
        #[arg(long)]
        sequential: bool,

        /// Output compact JSON (no indentation)
        #[arg(long)]
        compact: bool,
    },

    /// Show version information
    Version,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Signatures {
            input,
            attrs,
            separator,
            all,
        } => {
            let html = fs::read_to_string(&input)?;
            let maker = SignatureMaker::new()
                .with_separator(separator)
                .with_attrs(attrs)
                .with_dedupe(!all);

            for signature in maker.signatures(&html) {
                println!("{}", signature);
            }
        }

        Commands::Inspect {
            input,
            clean,
            save,
            model,
            output,
        } => {
            let pb = create_spinner("Loading corpus...");
            let documents = load_corpus(&input)?;

            pb.set_message("Inspecting signatures...");
            let inspector = config.inspector(clean)?;
            let report = inspector.inspect(&documents);
            pb.finish_and_clear();

            let listing: String = report
                .counts
                .iter()
                .map(|(signature, count)| format!("{}\t{}\n", signature, count))
                .collect();
            write_output(output.as_ref(), listing.trim_end())?;

            if let Some(path) = save {
                let mut table = if path.exists() {
                    SignatureTable::load(&path)?
                } else {
                    SignatureTable::new()
                };
                let summary = SignatureInspector::save(&report, model.as_deref(), &mut table);
                table.save(&path)?;

                println!(
                    "{} Saved {} signatures to {} ({} new, {} updated)",
                    "✓".green().bold(),
                    report.len(),
                    path.display(),
                    summary.inserted,
                    summary.updated
                );
            }
        }

        Commands::Clean {
            input,
            output,
            unwrap_divs,
        } => {
            let html = fs::read_to_string(&input)?;
            let cleaner = config.cleaner()?;
            let report = cleaner.clean_report(&html);

            let cleaned = if unwrap_divs {
                wpblocks::unwrap_tags(&report.html, &["div"])
            } else {
                report.html
            };
            write_output(output.as_ref(), &cleaned)?;

            if !report.unmatched.is_empty() {
                eprintln!(
                    "{} {} fragments matched no cleaning rule",
                    "!".yellow().bold(),
                    report.unmatched.len()
                );
            }
            if let Some(path) = output {
                println!(
                    "{} Cleaned {} ({} kept, {} cleaned): {}",
                    "✓".green().bold(),
                    input.display(),
                    report.kept,
                    report.cleaned,
                    path.display()
                );
            }
        }

        Commands::Build {
            input,
            table,
            output,
            compact,
        } => {
            let html = fs::read_to_string(&input)?;
            let table = SignatureTable::load(&table)?;
            let builder = config.block_builder(&table)?;
            let report = builder.build_report(&html);

            let json = if compact {
                serde_json::to_string(&report.blocks)?
            } else {
                serde_json::to_string_pretty(&report.blocks)?
            };
            write_output(output.as_ref(), &json)?;

            print_diagnostics(report.diagnostics.len());
            if let Some(path) = output {
                println!(
                    "{} Built {} blocks: {}",
                    "✓".green().bold(),
                    report.blocks.len(),
                    path.display()
                );
            }
        }

        Commands::Convert {
            input,
            table,
            output,
            sequential,
            compact,
        } => {
            let pb = create_spinner("Loading corpus...");
            let documents = load_corpus(&input)?;
            let table = SignatureTable::load(&table)?;
            let converter = WpBlocks::from_config(&config)?
                .with_table(table)
                .converter()?;

            pb.set_message(format!("Converting {} documents...", documents.len()));
            let options = if sequential {
                BatchOptions::new().sequential()
            } else {
                BatchOptions::new()
            };
            let converted = convert_all(&converter, &documents, options);
            pb.finish_and_clear();

            let json = if compact {
                serde_json::to_string(&converted)?
            } else {
                serde_json::to_string_pretty(&converted)?
            };
            write_output(output.as_ref(), &json)?;

            let blocks: usize = converted.iter().map(|d| d.conversion.blocks.len()).sum();
            let diagnostics: usize = converted
                .iter()
                .map(|d| d.conversion.diagnostics.len())
                .sum();
            print_diagnostics(diagnostics);

            if let Some(path) = output {
                println!("{}", "Conversion Complete".green().bold());
                println!("{}", "─".repeat(40));
                println!("{}: {}", "Output".bold(), path.display());
                println!("{}: {}", "Documents".bold(), converted.len());
                println!("{}: {}", "Blocks".bold(), blocks);
            }
        }

        Commands::Version => {
            print_version();
        }
    }
    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<PipelineConfig, Box<dyn std::error::Error>> {
    match path {
        Some(p) => Ok(PipelineConfig::from_path(p)?),
        None => Ok(PipelineConfig::default()),
    }
}

fn load_corpus(path: &Path) -> Result<Vec<SourceDocument>, Box<dyn std::error::Error>> {
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn print_diagnostics(count: usize) {
    if count > 0 {
        eprintln!(
            "{} {} fragments were skipped (run with RUST_LOG=debug for details)",
            "!".yellow().bold(),
            count
        );
    }
}

fn print_version() {
    println!("{} {}", "wpblocks".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("Signature-driven WordPress HTML to stream block conversion");
    println!();
    println!(
        "Block types: heading, image, block_quote, description, address, embed, rich_text, raw_html"
    );
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap(),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_inspect_model_requires_save() {
        let result =
            Cli::try_parse_from(["wpblocks", "inspect", "posts.json", "--model", "WPPost"]);
        assert!(result.is_err());

        let result = Cli::try_parse_from(["wpblocks", "inspect", "posts.json", "--save", "t.json"]);
        assert!(result.is_ok());

        let result = Cli::try_parse_from([
            "wpblocks",
            "inspect",
            "posts.json",
            "--save",
            "t.json",
            "--model",
            "WPPost",
        ]);
        assert!(result.is_ok());
    }
}
