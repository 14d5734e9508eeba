use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use quotebatch::core::log::init_logging;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Fetch quotes for a category, or every category
    Quotes {
        #[arg(long)]
        category: Option<String>,
    },
    /// Fetch benchmark indices, estimating unsupported ones from proxies
    Indices,
    /// Serve the quote API over HTTP
    Serve {
        /// Address to listen on, overrides server.bind
        #[arg(long)]
        bind: Option<String>,
    },
}

impl From<Commands> for quotebatch::AppCommand {
    fn from(cmd: Commands) -> quotebatch::AppCommand {
        match cmd {
            Commands::Quotes { category } => quotebatch::AppCommand::Quotes { category },
            Commands::Indices => quotebatch::AppCommand::Indices,
            Commands::Serve { bind } => quotebatch::AppCommand::Serve { bind },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => quotebatch::cli::setup::setup(),
        Some(cmd) => quotebatch::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
