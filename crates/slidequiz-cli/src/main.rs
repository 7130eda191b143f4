//! slidequiz CLI: the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "slidequiz",
    version,
    about = "Quizzes and scenario simulations for slide-based lessons"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate unit set TOML files
    Validate {
        /// Path to unit set file or directory
        #[arg(long)]
        unit_set: PathBuf,
    },

    /// List unit sets in a directory
    List {
        /// Directory to search (default: lessons_dir from config)
        #[arg(long)]
        dir: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Work through a unit set interactively
    Play {
        /// Path to .toml unit set
        #[arg(long)]
        unit_set: PathBuf,

        /// Shuffle seed for a reproducible session
        #[arg(long)]
        seed: Option<u64>,

        /// Run in another mode: review, simulation, checkpoint
        #[arg(long)]
        mode: Option<String>,

        /// Write a session report (.json, or .md for markdown)
        #[arg(long)]
        report: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create starter config and example unit set
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("slidequiz=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Validate { unit_set } => commands::validate::execute(unit_set),
        Commands::List { dir, config } => commands::list::execute(dir, config),
        Commands::Play {
            unit_set,
            seed,
            mode,
            report,
            config,
        } => commands::play::execute(unit_set, seed, mode, report, config),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
