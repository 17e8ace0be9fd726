//! lessonquiz CLI: chapter tests and inline quizzes in the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

mod commands;
mod terminal;

#[derive(Parser)]
#[command(
    name = "lessonquiz",
    version,
    about = "Adaptive grammar chapter tests and inline quizzes"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Where to find configuration and content.
#[derive(Args)]
pub struct Paths {
    /// Config file path
    #[arg(long)]
    config: Option<PathBuf>,

    /// Folder holding one subfolder per chapter
    #[arg(long)]
    content_dir: Option<PathBuf>,

    /// Results JSON file
    #[arg(long)]
    results: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Take the final test of a chapter
    Play {
        /// Chapter id (folder name under the content directory)
        chapter: String,

        /// Seed for question selection and order
        #[arg(long)]
        seed: Option<u64>,

        /// Also write an HTML results page
        #[arg(long)]
        html: Option<PathBuf>,

        #[command(flatten)]
        paths: Paths,
    },

    /// Run an inline quiz block of a chapter
    Quiz {
        /// Chapter id
        chapter: String,

        /// Quiz block id (default: the first quiz block)
        #[arg(long)]
        block: Option<String>,

        #[command(flatten)]
        paths: Paths,
    },

    /// Check chapter documents for content problems
    Validate {
        /// Chapter JSON file or content directory (default: configured content dir)
        path: Option<PathBuf>,

        #[command(flatten)]
        paths: Paths,
    },

    /// Show or clear stored test results
    Results {
        /// Show the full breakdown of one chapter
        #[arg(long)]
        chapter: Option<String>,

        /// Remove the stored result of --chapter, or every result
        #[arg(long)]
        clear: bool,

        /// Output format: table, markdown, json
        #[arg(long, default_value = "table")]
        format: String,

        /// Also write an HTML results page
        #[arg(long)]
        html: Option<PathBuf>,

        #[command(flatten)]
        paths: Paths,
    },

    /// List chapters grouped by section
    Chapters {
        #[command(flatten)]
        paths: Paths,
    },

    /// Create starter config and a sample chapter
    Init,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("lessonquiz=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Play {
            chapter,
            seed,
            html,
            paths,
        } => commands::play::execute(chapter, seed, html, paths).await,
        Commands::Quiz {
            chapter,
            block,
            paths,
        } => commands::quiz::execute(chapter, block, paths).await,
        Commands::Validate { path, paths } => commands::validate::execute(path, paths),
        Commands::Results {
            chapter,
            clear,
            format,
            html,
            paths,
        } => commands::results::execute(chapter, clear, format, html, paths),
        Commands::Chapters { paths } => commands::chapters::execute(paths).await,
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
