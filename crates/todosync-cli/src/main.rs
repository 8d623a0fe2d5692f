//! todosync CLI
//!
//! Command-line interface for todosync - a todo list kept in sync with a
//! remote store.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use todosync_core::{
    Config, HttpRemoteStore, MemoryRemoteStore, RemoteStore, ServerId, Session, StatusFilter,
    TodoState,
};

mod commands;
mod output;
mod tui;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "todosync")]
#[command(about = "todosync - A todo list synced with a remote store")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to an alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Use an in-memory store instead of the remote API
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI interface
    Tui,
    /// List todos
    #[command(alias = "ls")]
    List {
        /// Which todos to show (all, active, completed)
        #[arg(short, long, default_value_t = StatusFilter::All)]
        filter: StatusFilter,
    },
    /// Add a todo
    Add {
        /// Todo title
        title: String,
    },
    /// Delete a todo
    #[command(alias = "rm")]
    Delete {
        /// Todo id
        id: ServerId,
    },
    /// Delete all completed todos
    ClearCompleted,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (api_url, owner_id, notice_timeout_ms, request_timeout_secs, log_file)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    // Config commands work without an owner
    if let Some(Commands::Config { command }) = &cli.command {
        return handle_config_command(command.clone(), config_path, &output);
    }

    let config =
        Config::load_with_cli_override(config_path).context("Failed to load configuration")?;
    init_logging(&config);

    let owner = config.owner()?;
    let remote = open_remote(&config, cli.memory)?;

    let command = cli.command.unwrap_or(Commands::Tui);
    if let Commands::Tui = command {
        return tui::run(&config, owner, remote).await;
    }

    let state = TodoState::new(owner).with_notice_timeout(config.notice_timeout());
    let mut session = Session::with_state(state, remote);

    match command {
        Commands::List { filter } => commands::task::list(&mut session, filter, &output).await,
        Commands::Add { title } => commands::task::add(&mut session, title, &output).await,
        Commands::Delete { id } => commands::task::delete(&mut session, id, &output).await,
        Commands::ClearCompleted => commands::task::clear_completed(&mut session, &output).await,
        Commands::Tui | Commands::Config { .. } => unreachable!(), // Handled above
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Pick the store backing this run
fn open_remote(config: &Config, memory: bool) -> Result<Arc<dyn RemoteStore>> {
    if memory {
        info!("Using in-memory store");
        return Ok(Arc::new(MemoryRemoteStore::new()));
    }

    let store = HttpRemoteStore::from_config(config).context("Failed to create HTTP client")?;
    info!("Using remote store at {}", store.base_url());
    Ok(Arc::new(store))
}

/// Initialize file-based logging, only if TODOSYNC_LOG is set
///
/// Logs never go to the terminal so they cannot corrupt the TUI.
fn init_logging(config: &Config) {
    let Ok(log_level) = std::env::var("TODOSYNC_LOG") else {
        return;
    };

    let log_path = config.log_path();
    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not create log file {:?}: {}", log_path, e);
            return;
        }
    };

    let env_filter = EnvFilter::new(format!(
        "todosync_core={},todosync={}",
        log_level, log_level
    ));

    // Ignore error if already initialized
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(log_file)
        .try_init();

    info!("Logging initialized to {:?}", log_path);
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_tui() {
        let cli = Cli::try_parse_from(["todosync"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_list_filter_parsing() {
        let cli = Cli::try_parse_from(["todosync", "list", "--filter", "completed"]).unwrap();
        match cli.command {
            Some(Commands::List { filter }) => assert_eq!(filter, StatusFilter::Completed),
            _ => panic!("expected list"),
        }

        assert!(Cli::try_parse_from(["todosync", "list", "--filter", "done"]).is_err());
    }

    #[test]
    fn test_delete_requires_numeric_id() {
        let cli = Cli::try_parse_from(["todosync", "rm", "17"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Delete { id: ServerId(17) })
        ));

        assert!(Cli::try_parse_from(["todosync", "delete", "abc"]).is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli =
            Cli::try_parse_from(["todosync", "clear-completed", "--memory", "--json"]).unwrap();
        assert!(cli.memory);
        assert!(cli.json);
        assert!(matches!(cli.command, Some(Commands::ClearCompleted)));
    }

    #[test]
    fn test_memory_store() {
        let remote = open_remote(&Config::default(), true).unwrap();
        let session = Session::new(todosync_core::OwnerId(1), remote);
        assert!(session.state().is_empty());
    }
}
