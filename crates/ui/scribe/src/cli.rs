// src/cli.rs
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "scribe", version, about = "Fill in dynamic forms from the terminal")]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Cmd,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Cmd {
    /// Run interactive TUI
    Run {
        /// Use the built-in demo form instead of the HTTP service
        #[arg(long)]
        offline: bool,
        /// Base URL of the form service
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
        /// Autosave quiet period in milliseconds
        #[arg(long, value_name = "MS")]
        debounce_ms: Option<u64>,
        /// Disable autosave
        #[arg(long)]
        no_autosave: bool,
    },
    /// Print the fetched field descriptors as JSON
    Fields {
        #[arg(long)]
        offline: bool,
    },
    /// Print the effective configuration as JSON
    Config,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_flags_parse() {
        let cli = Cli::parse_from([
            "scribe",
            "run",
            "--base-url",
            "http://localhost:3000",
            "--debounce-ms",
            "500",
        ]);
        assert_eq!(
            cli.cmd,
            Cmd::Run {
                offline: false,
                base_url: Some("http://localhost:3000".into()),
                debounce_ms: Some(500),
                no_autosave: false,
            }
        );
    }
}
