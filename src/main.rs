use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use jiraflow::models::{BridgeConfig, CONFIG_FILE};
use jiraflow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jiraflow")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Drive Jira issues through Claude analysis, implementation and evaluation", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Log filter (overrides RUST_LOG), e.g. "debug" or "jiraflow=trace"
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the webhook server
    Serve {
        /// Bind host (default: [server].host)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (default: [server].port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Process one webhook body and print the outcome JSON
    Process {
        /// Webhook JSON file, or "-" for stdin
        input: String,

        /// Use an in-memory tracker and store instead of Jira and disk
        #[arg(long)]
        dry_run: bool,
    },

    /// Print how a webhook body would be classified
    Classify {
        /// Webhook JSON file, or "-" for stdin
        input: String,
    },

    /// Write a default config file
    Init {
        /// Overwrite an existing config
        #[arg(short, long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    if let Err(e) = run(cli).await {
        eprintln!("{}", format!("Error: {:#}", e).red());
        std::process::exit(1);
    }
}

/// Logs go to stderr so `process` output stays machine-readable
fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Init { force } => {
            println!("{}", "🚀 Initializing jiraflow...".cyan());
            jiraflow::cli::init::run(&cli.config, force)?;
        }

        Commands::Completions { shell } => {
            generate(shell, &mut Cli::command(), "jiraflow", &mut io::stdout());
        }

        Commands::Serve { host, port } => {
            let config = load_config(&cli.config)?;
            jiraflow::cli::serve::run(config, host, port).await?;
        }

        Commands::Process { input, dry_run } => {
            let config = load_config(&cli.config)?;
            jiraflow::cli::process::run(config, &input, dry_run).await?;
        }

        Commands::Classify { input } => {
            let config = load_config(&cli.config)?;
            jiraflow::cli::classify::run(&config.workflow, &input)?;
        }
    }

    Ok(())
}

fn load_config(path: &Path) -> Result<BridgeConfig> {
    BridgeConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))
}
