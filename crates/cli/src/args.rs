//! Command-line arguments (clap 4 derive).

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Submit video generation jobs and follow them to completion.
#[derive(Parser, Debug)]
#[command(name = "reelgen")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Generation service base URL (overrides REELGEN_API_URL)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Session storage directory (overrides REELGEN_DATA_DIR)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Submit a script and follow the job until it finishes
    Generate {
        /// The script to turn into a video
        script: String,

        /// Visual style
        #[arg(short, long, default_value = "cinematic")]
        style: String,

        /// Model to request from the service
        #[arg(short, long)]
        model: Option<String>,

        /// Previously uploaded asset to attach (repeatable)
        #[arg(short, long = "attach")]
        attachments: Vec<String>,

        /// Return after submission instead of waiting for the result
        #[arg(long)]
        no_wait: bool,
    },

    /// Continue tracking the active session's job after a restart
    Resume,

    /// Submit a new job for an existing session, optionally edited
    Retry {
        /// Session to retry
        session_id: String,

        /// Replacement script
        #[arg(long)]
        script: Option<String>,

        /// Replacement style
        #[arg(long)]
        style: Option<String>,

        /// Replacement model
        #[arg(long)]
        model: Option<String>,
    },

    /// List stored sessions, newest first
    Sessions {
        /// Maximum number of sessions to list
        #[arg(short, long)]
        limit: Option<usize>,

        /// Print sessions as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show one session's timeline and jobs (defaults to the active one)
    Show {
        session_id: Option<String>,
    },

    /// Forget the active session pointer
    Clear,
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_generate_with_options() {
        let cli = Cli::try_parse_from([
            "reelgen",
            "generate",
            "A fox in snow",
            "--style",
            "watercolor",
            "--attach",
            "asset-1",
            "--attach",
            "asset-2",
            "--no-wait",
        ])
        .unwrap();

        assert_matches!(
            cli.command,
            Commands::Generate { ref script, ref style, ref attachments, no_wait: true, model: None }
                if script == "A fox in snow" && style == "watercolor" && attachments.len() == 2
        );
    }

    #[test]
    fn global_overrides_follow_subcommand() {
        let cli = Cli::try_parse_from(["reelgen", "sessions", "--api-url", "http://h:1"]).unwrap();
        assert_eq!(cli.api_url.as_deref(), Some("http://h:1"));
        assert_matches!(cli.command, Commands::Sessions { limit: None, json: false });
    }

    #[test]
    fn retry_requires_session_id() {
        assert!(Cli::try_parse_from(["reelgen", "retry"]).is_err());
    }
}
