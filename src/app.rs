//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::config::get_config_path;
use crate::logging;
use crate::setup::{self, version::SetupNeeded};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;

/// Writes the default config on first run and re-stamps configs from older versions.
fn check_and_run_setup() -> anyhow::Result<()> {
    let config_path = get_config_path()?;

    match setup::version::check_setup_needed(&config_path)? {
        Some(SetupNeeded::Missing) => {
            tracing::info!("No config file found, running first-time setup");
            setup::run_setup(&config_path).map_err(|e| {
                tracing::error!("Setup failed: {e}");
                anyhow::anyhow!("Setup failed: {e}")
            })?;
        }
        Some(SetupNeeded::Outdated(old_version)) => {
            tracing::info!(
                "Migrating config from version {} to {}",
                old_version,
                env!("CARGO_PKG_VERSION")
            );
            setup::version::update_config_version(&config_path).map_err(|e| {
                tracing::error!("Failed to update config version: {e}");
                anyhow::anyhow!("Failed to update config version: {e}")
            })?;
        }
        None => {
            tracing::debug!("Config version up to date ({})", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// Record a whistled tune and tag it with a genre and comments
#[derive(Parser)]
#[command(name = "whistle")]
#[command(version)]
#[command(about = "What's that Whistle? Record a tune you can't name.")]
#[command(long_about = "What's that Whistle? Record a tune you can't name.\n\nRecord your whistle, play it back, pick a genre, and add comments.\nThe result is printed as TOML for whoever identifies the tune.\n\nDEFAULT COMMAND:\n    If no command is specified, 'record' is used by default.\n    The -o option can be used without explicitly saying 'record'.\n\nEXAMPLES:\n    # Record and print the submission\n    $ whistle\n\n    # Record and write the submission to a file\n    $ whistle -o submission.toml\n\n    # Listen to the last whistle again\n    $ whistle play\n\n    # Edit configuration file\n    $ whistle config")]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/whistle/whistle.toml\n    Whistle file:       ~/.local/share/whistle/whistle.m4a\n    Logs:               ~/.local/state/whistle/whistle.log.*"
)]
struct Cli {
    /// Write the submission to a file instead of stdout (record default command)
    #[arg(short, long, value_name = "FILE")]
    output: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Record a whistle, choose its genre, and add comments (default)
    ///
    /// Space records and stops, p plays, Enter moves on, Esc goes back.
    /// The submission is printed to stdout as TOML.
    #[command(visible_alias = "r")]
    Record {
        /// Write the submission to a file instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<String>,
    },

    /// Play the stored whistle with the configured player
    #[command(visible_alias = "p")]
    Play,

    /// Print the list of genres
    Genres,

    /// Open configuration file in your preferred editor
    ///
    /// Edit the input device, player, and storage directory.
    /// Uses $EDITOR environment variable or falls back to nano/vi.
    #[command(visible_alias = "c")]
    Config,

    /// List available audio input devices
    ///
    /// Shows device IDs, names, and configurations to help configure
    /// the correct input device in whistle.toml.
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    ///
    /// Display the last 50 lines of the most recent log file.
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   whistle completions bash > whistle.bash
    ///   whistle completions zsh > _whistle
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the application based on command-line arguments.
///
/// # Errors
/// - If logging initialization or setup fails
/// - If the command fails
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that need neither logging nor a config file
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "whistle", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::Genres) => {
            commands::handle_genres();
            return Ok(());
        }
        Some(Commands::ListDevices) => return commands::handle_list_devices(),
        Some(Commands::Logs) => return commands::handle_logs(),
        _ => {}
    }

    logging::init_logging()?;
    check_and_run_setup()?;

    match cli.command {
        None => commands::handle_record(cli.output).await?,
        Some(Commands::Record { output }) => {
            // An explicit record option wins over the top-level one.
            commands::handle_record(output.or(cli.output)).await?
        }
        Some(Commands::Play) => commands::handle_play()?,
        Some(Commands::Config) => commands::handle_config()?,
        Some(Commands::Completions { .. })
        | Some(Commands::Genres)
        | Some(Commands::ListDevices)
        | Some(Commands::Logs) => unreachable!("These commands are handled earlier"),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_record_is_the_default_command() {
        let cli = Cli::try_parse_from(["whistle", "-o", "out.toml"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.output.as_deref(), Some("out.toml"));

        let cli = Cli::try_parse_from(["whistle", "r"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::Record { output: None })));
    }
}
