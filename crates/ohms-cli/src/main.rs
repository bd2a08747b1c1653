//! ohms CLI: homework submission and gradebook statistics from the terminal.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ohms", version, about = "Online homework: submit answers, summarize gradebooks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a starter config, homework layout and gradebook
    Init,

    /// Validate homework layout TOML files
    Validate {
        /// Path to a homework file or directory
        #[arg(long)]
        homework: PathBuf,
    },

    /// Summary statistics for each gradebook column
    Stats {
        /// Gradebook TOML file
        #[arg(long)]
        gradebook: PathBuf,

        /// Only this assignment
        #[arg(long)]
        assignment: Option<String>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Assign letter grades from the gradebook
    Grades {
        /// Gradebook TOML file
        #[arg(long)]
        gradebook: PathBuf,

        /// Twelve comma-separated cutoffs, A+ down to D- (default: from config)
        #[arg(long)]
        cutoffs: Option<String>,

        /// Grade one assignment instead of the course
        #[arg(long)]
        assignment: Option<String>,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,

        /// Also save the full report as JSON
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Load a homework page's prior submissions from the server
    Load {
        /// Homework layout TOML file
        #[arg(long)]
        homework: PathBuf,

        /// Max question loads in flight (default: from config)
        #[arg(long)]
        parallelism: Option<usize>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Submit responses for one question
    Submit {
        /// Homework layout TOML file
        #[arg(long)]
        homework: PathBuf,

        /// Question id
        #[arg(long)]
        question: String,

        /// Item responses in order (repeat once per item)
        #[arg(long = "response")]
        responses: Vec<String>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Change one gradebook cell on the server and show the new column
    UpdateGrade {
        /// Gradebook TOML file
        #[arg(long)]
        gradebook: PathBuf,

        /// Student id
        #[arg(long)]
        student: String,

        /// Assignment id
        #[arg(long)]
        assignment: String,

        /// New score, "EX" for excused, or "" to clear
        #[arg(long, allow_hyphen_values = true)]
        score: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("ohms=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init => commands::init::execute(),
        Commands::Validate { homework } => commands::validate::execute(homework),
        Commands::Stats {
            gradebook,
            assignment,
            format,
        } => commands::stats::execute(gradebook, assignment, format),
        Commands::Grades {
            gradebook,
            cutoffs,
            assignment,
            format,
            output,
            config,
        } => commands::grades::execute(gradebook, cutoffs, assignment, format, output, config),
        Commands::Load {
            homework,
            parallelism,
            config,
        } => commands::load::execute(homework, parallelism, config).await,
        Commands::Submit {
            homework,
            question,
            responses,
            config,
        } => commands::submit::execute(homework, question, responses, config).await,
        Commands::UpdateGrade {
            gradebook,
            student,
            assignment,
            score,
            config,
        } => commands::update_grade::execute(gradebook, student, assignment, score, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
