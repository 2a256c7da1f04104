//! Property registry command line host
//!
//! Opens a local sled ledger, builds the registry once, and runs a single
//! `init`, `invoke` or `query` call. The response envelope is printed to
//! stdout as JSON; logs go to stderr.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use folio_registry::{PropertyRegistry, ResponseEnvelope};
use folio_storage::SledLedgerStore;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod settings;

use settings::AppConfig;

#[derive(Parser)]
#[command(name = "folio-cli")]
#[command(about = "Property ownership registry host", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (TOML); defaults to ./folio.toml when present
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Ledger data directory
    #[arg(long, value_name = "PATH")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the init entry point
    Init {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Run a state-changing function: init, register, reconcile
    Invoke {
        /// Function name
        function: String,
        /// Positional string arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    /// Run a query function: search, delete, get
    Query {
        /// Function name
        function: String,
        /// Positional string arguments
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    init_logging(&config);

    let store = Arc::new(
        SledLedgerStore::new(&config.data_dir)
            .with_context(|| format!("failed to open ledger at {}", config.data_dir.display()))?,
    );
    debug!(data_dir = %config.data_dir.display(), "ledger opened");

    let registry = PropertyRegistry::with_config(store.clone(), config.registry_config());
    let envelope = dispatch(&registry, cli.command);
    store.flush().context("failed to flush ledger")?;

    info!(status = %envelope.status, message = %envelope.message, "call finished");
    print_envelope(&envelope)?;

    Ok(if envelope.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn dispatch(registry: &PropertyRegistry, command: Commands) -> ResponseEnvelope {
    match command {
        Commands::Init { args } => registry.init("init", &args),
        Commands::Invoke { function, args } => registry.invoke(&function, &args),
        Commands::Query { function, args } => registry.query(&function, &args),
    }
}

fn print_envelope(envelope: &ResponseEnvelope) -> Result<()> {
    let bytes = envelope
        .to_bytes()
        .context("failed to encode response envelope")?;
    let mut stdout = std::io::stdout().lock();
    stdout.write_all(&bytes)?;
    stdout.write_all(b"\n")?;
    Ok(())
}

fn init_logging(config: &AppConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    if config.log_format == "compact" {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use folio_storage::MemoryLedgerStore;

    #[test]
    fn test_cli_parses_empty_and_hyphenated_arguments() {
        let cli = Cli::parse_from([
            "folio-cli",
            "--data-dir",
            "/tmp/ledger",
            "invoke",
            "register",
            "100 Main St",
            "1/12345",
            "Jane Doe",
            "",
            "-",
        ]);
        assert_eq!(cli.data_dir, Some(PathBuf::from("/tmp/ledger")));
        match cli.command {
            Commands::Invoke { function, args } => {
                assert_eq!(function, "register");
                assert_eq!(args, vec!["100 Main St", "1/12345", "Jane Doe", "", "-"]);
            }
            _ => panic!("expected invoke"),
        }
    }

    #[test]
    fn test_dispatch_routes_to_registry() {
        let registry = PropertyRegistry::new(Arc::new(MemoryLedgerStore::new()));

        let env = dispatch(&registry, Commands::Init { args: vec![] });
        assert!(env.is_ok());

        let env = dispatch(
            &registry,
            Commands::Invoke {
                function: "register".into(),
                args: vec![
                    "100 Main St".into(),
                    "1/12345".into(),
                    "Jane Doe".into(),
                    "John".into(),
                    "50".into(),
                ],
            },
        );
        assert!(env.is_ok(), "{env:?}");

        let env = dispatch(
            &registry,
            Commands::Query {
                function: "search".into(),
                args: vec!["LegalOwner".into(), "Jane Doe".into()],
            },
        );
        assert_eq!(env.properties().len(), 1);
    }
}
