//! magicform CLI: turn a JSON question list into a Google Forms quiz.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "magicform",
    version,
    about = "Create Google Forms quizzes from JSON question lists"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize with Google and store the token
    Auth {
        /// Loopback port for the OAuth redirect (default: config `port`)
        #[arg(long)]
        port: Option<u16>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a quiz form from a questions file
    Create {
        /// Path to the questions JSON file
        #[arg(long)]
        questions: PathBuf,

        /// Form title (prompted for when omitted)
        #[arg(long)]
        title: Option<String>,

        /// Loopback port for the OAuth redirect (default: config `port`)
        #[arg(long)]
        port: Option<u16>,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Check a questions file and list what will be created
    Validate {
        /// Path to the questions JSON file
        #[arg(long)]
        questions: PathBuf,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Print the API calls `create` would make, without sending them
    Preview {
        /// Path to the questions JSON file
        #[arg(long)]
        questions: PathBuf,

        /// Form title
        #[arg(long, default_value = "Untitled quiz")]
        title: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create a starter config and sample questions file
    Init {
        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Run the web front end
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8501")]
        addr: SocketAddr,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("magicform=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Auth { port, config } => commands::auth::execute(port, config).await,
        Commands::Create {
            questions,
            title,
            port,
            config,
        } => commands::create::execute(questions, title, port, config).await,
        Commands::Validate { questions, config } => commands::validate::execute(questions, config),
        Commands::Preview {
            questions,
            title,
            config,
        } => commands::preview::execute(questions, title, config).await,
        Commands::Init { config } => commands::init::execute(config),
        Commands::Serve { addr, config } => commands::serve::execute(addr, config).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
