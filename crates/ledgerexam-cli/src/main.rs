//! ledgerexam CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ledgerexam",
    version,
    about = "Timed bookkeeping exams with partial-credit grading"
)]
struct Cli {
    /// Config file path
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List exams in the catalog
    List {
        /// Exam file or directory (defaults to catalog_dir from config)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate exam TOML files
    Validate {
        /// Exam file or directory (defaults to catalog_dir from config)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Take an exam interactively against the clock
    Take {
        /// Exam id
        #[arg(long)]
        exam: u32,

        /// Exam file or directory (defaults to catalog_dir from config)
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Grade a JSON answer file without the clock
    Grade {
        /// Exam id
        #[arg(long)]
        exam: u32,

        /// JSON object mapping sub-question ids to answers
        #[arg(long)]
        answers: PathBuf,

        /// Exam file or directory (defaults to catalog_dir from config)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Output format: text, json
        #[arg(long, default_value = "text")]
        format: String,

        /// Append the result to the history file
        #[arg(long)]
        save: bool,
    },

    /// Show past results, newest first
    History {
        /// History file (defaults to history_file from config)
        #[arg(long)]
        file: Option<PathBuf>,

        /// Show at most this many results
        #[arg(long)]
        limit: Option<usize>,

        /// Delete all stored results
        #[arg(long)]
        clear: bool,
    },

    /// Create a starter config and sample exam
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ledgerexam=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let result = match cli.command {
        Commands::List { catalog, format } => commands::list::execute(config, catalog, format),
        Commands::Validate { catalog } => commands::validate::execute(config, catalog),
        Commands::Take { exam, catalog } => commands::take::execute(config, catalog, exam).await,
        Commands::Grade {
            exam,
            answers,
            catalog,
            format,
            save,
        } => commands::grade::execute(config, catalog, exam, answers, format, save).await,
        Commands::History { file, limit, clear } => {
            commands::history::execute(config, file, limit, clear)
        }
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
