use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

use nbc_rates_runtime::cli::{self, LogFormat};
use nbc_rates_runtime::config::{Config, Overrides};

#[derive(Parser)]
#[command(
    name = "nbc-rates",
    about = "NBC rates: National Bank of Cambodia daily exchange rates as JSON",
    version,
    after_help = "Run 'nbc-rates <command> --help' for details on each command.\nRun 'nbc-rates' with no command to start the server."
)]
struct Cli {
    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Plain)]
    log_format: LogFormat,

    /// Exchange-rate page URL (env: NBC_URL)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Chromium binary (env: NBC_CHROMIUM_PATH)
    #[arg(long, global = true)]
    chromium: Option<PathBuf>,

    /// Maximum concurrently open browser tabs (env: NBC_MAX_PAGES)
    #[arg(long, global = true)]
    max_pages: Option<usize>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the HTTP API
    Serve {
        /// Bind host (env: HOST)
        #[arg(long)]
        host: Option<String>,
        /// Bind port (env: PORT)
        #[arg(long, short)]
        port: Option<u16>,
    },
    /// Fetch one date's rates and print the JSON body
    Fetch {
        /// Date as YYYY-MM-DD; defaults to today (UTC)
        #[arg(long, short)]
        date: Option<String>,
    },
    /// Check environment and configuration
    Doctor,
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Commands::Completions { shell }) = &cli.command {
        let mut cmd = Cli::command();
        clap_complete::generate(*shell, &mut cmd, "nbc-rates", &mut std::io::stdout());
        return Ok(());
    }

    cli::init_tracing(&cli.log_level, cli.log_format);

    let mut overrides = Overrides {
        url: cli.url.clone(),
        chromium_path: cli.chromium.clone(),
        max_pages: cli.max_pages,
        ..Default::default()
    };
    if let Some(Commands::Serve { host, port }) = &cli.command {
        overrides.host = host.clone();
        overrides.port = *port;
    }
    let config = Config::resolve(&overrides)?;

    let is_fetch = matches!(cli.command, Some(Commands::Fetch { .. }));
    let result = match cli.command {
        None | Some(Commands::Serve { .. }) => cli::serve::run(config).await,
        Some(Commands::Fetch { date }) => cli::fetch::run(config, date.as_deref()).await,
        Some(Commands::Doctor) => cli::doctor::run(&config).await,
        Some(Commands::Completions { .. }) => Ok(()),
    };

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if is_fetch {
            println!("{}", serde_json::json!({ "error": e.to_string() }));
        } else {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}
