mod commands;
mod output;

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "docsort",
    version,
    about = "Extract fields from PDFs and triage folders of documents with a local LLM"
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
pub struct GlobalArgs {
    /// Configuration file (TOML). Missing file means built-in defaults
    #[arg(long, global = true, env = "DOCSORT_CONFIG", default_value = "docsort.toml")]
    pub config: PathBuf,

    /// Ollama base URL, overrides the config file
    #[arg(long, global = true, env = "DOCSORT_OLLAMA_URL", value_name = "URL")]
    pub ollama_url: Option<String>,

    /// Model used for classification, overrides the config file
    #[arg(long, global = true, env = "DOCSORT_MODEL")]
    pub model: Option<String>,

    /// Disable OCR fallback for image-only pages
    #[arg(long, global = true)]
    pub no_ocr: bool,

    /// Log progress details to stderr (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify every PDF in a folder and move it to the relevant or irrelevant folder
    Triage {
        /// Folder with the PDFs to triage
        #[arg(long)]
        source: PathBuf,

        /// Destination for documents matching the criteria
        #[arg(long)]
        relevant: PathBuf,

        /// Destination for all other documents
        #[arg(long)]
        irrelevant: PathBuf,

        /// Natural-language relevance criteria
        #[arg(short, long)]
        criteria: String,

        /// Pages analysed per document, 0 for all (default from config: 5)
        #[arg(long)]
        max_pages: Option<usize>,

        /// Append the audit trail to this CSV file
        #[arg(long, value_name = "FILE")]
        audit_csv: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },
    /// Extract text, tables and fields from a PDF
    Extract {
        /// Path to PDF file
        input_file: PathBuf,

        /// Pages to extract, 0 for all
        #[arg(long, default_value = "0")]
        max_pages: usize,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,

        /// Write the extraction result to a JSON file
        #[arg(short = 'O', long = "out", value_name = "FILE")]
        out: Option<PathBuf>,
    },
    /// Classify a single PDF against criteria without moving it
    Classify {
        /// Path to PDF file
        input_file: PathBuf,

        /// Natural-language relevance criteria
        #[arg(short, long)]
        criteria: String,

        /// Pages analysed, 0 for all (default from config: 5)
        #[arg(long)]
        max_pages: Option<usize>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,
    },
    /// Check that the external tools and the inference service are reachable
    Check,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "docsort_core=debug,info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.global.verbose);

    let result = commands::load_config(&cli.global).and_then(|config| match cli.command {
        Commands::Triage {
            source,
            relevant,
            irrelevant,
            criteria,
            max_pages,
            audit_csv,
            output,
        } => commands::triage::run(
            &config,
            commands::triage::TriageArgs {
                source,
                relevant,
                irrelevant,
                criteria,
                max_pages,
                audit_csv,
            },
            output,
        ),
        Commands::Extract {
            input_file,
            max_pages,
            output,
            out,
        } => commands::extract::run(&config, input_file, max_pages, output, out),
        Commands::Classify {
            input_file,
            criteria,
            max_pages,
            output,
        } => commands::classify::run(&config, input_file, &criteria, max_pages, output),
        Commands::Check => commands::check::run(&config),
    });

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
