//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::events::NarrationFormat;

/// Workshop - a coordinator serving a full cohort and groups of three
#[derive(Parser)]
#[command(
    name = "wk",
    about = "Coordinator serving a full cohort and serialized groups of three",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the workshop until Ctrl-C or the duration elapses
    Run {
        /// Stop after this many seconds
        #[arg(short, long, value_name = "SECS")]
        duration: Option<u64>,

        /// Narration format (text, json); overrides the config file
        #[arg(short, long)]
        format: Option<NarrationFormat>,

        /// Disable colored narration
        #[arg(long)]
        no_color: bool,
    },

    /// Print the effective configuration as YAML
    Config,
}

impl Command {
    /// The command used when none is given: run until interrupted
    pub fn default_run() -> Self {
        Self::Run {
            duration: None,
            format: None,
            no_color: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_with_options() {
        let cli = Cli::try_parse_from(["wk", "-l", "debug", "run", "--duration", "3", "--format", "json", "--no-color"])
            .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        match cli.command {
            Some(Command::Run {
                duration,
                format,
                no_color,
            }) => {
                assert_eq!(duration, Some(3));
                assert_eq!(format, Some(NarrationFormat::Json));
                assert!(no_color);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_config_after_subcommand() {
        let cli = Cli::try_parse_from(["wk", "config", "--config", "/tmp/w.yml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/w.yml")));
        assert!(matches!(cli.command, Some(Command::Config)));
    }

    #[test]
    fn test_no_command() {
        let cli = Cli::try_parse_from(["wk"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["wk", "run", "--format", "table"]).is_err());
    }
}
