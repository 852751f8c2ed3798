//! Zhiyuan CLI - the main entry point.
//!
//! Commands:
//! - `serve`   - Start the HTTP gateway
//! - `ask`     - Ask a question (streamed by default)
//! - `search`  - Search the knowledge corpus
//! - `consult` - Generate a personalized registration plan

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "zhiyuan",
    about = "Zhiyuan - streaming gaokao admissions assistant",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Ask the assistant a question
    Ask {
        /// The question
        question: String,

        /// Gateway base URL
        #[arg(long, default_value = "http://127.0.0.1:3000")]
        url: String,

        /// Province, e.g. 北京
        #[arg(long)]
        province: Option<String>,

        /// Exam track, e.g. 理科
        #[arg(long)]
        subject: Option<String>,

        /// Total score
        #[arg(long)]
        score: Option<u32>,

        /// Wait for the whole answer instead of streaming
        #[arg(long)]
        single: bool,
    },

    /// Search the knowledge corpus locally
    Search {
        /// Substring to look for
        query: String,

        /// Maximum hits to print
        #[arg(long, default_value_t = 10)]
        max_results: usize,
    },

    /// Generate a personalized registration plan
    Consult {
        /// Province, e.g. 北京
        province: String,

        /// Interest tags, e.g. 理工
        #[arg(long)]
        interests: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Ask {
            question,
            url,
            province,
            subject,
            score,
            single,
        } => commands::ask::run(question, url, province, subject, score, single).await?,
        Commands::Search { query, max_results } => {
            commands::search::run(query, max_results).await?
        }
        Commands::Consult {
            province,
            interests,
        } => commands::consult::run(province, interests).await?,
    }

    Ok(())
}
