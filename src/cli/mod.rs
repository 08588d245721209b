//! CLI module for DeepSearch
//!
//! Provides command-line interface parsing and the interactive chat loop.
//! Uses clap for argument parsing and owo-colors for colored terminal output.

pub mod output;
pub mod repl;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// DeepSearch - multi-agent deep research assistant
///
/// Routes each question through coordinator, requirement gathering, planning
/// and lead agents backed by web search and user memory.
#[derive(Parser, Debug)]
#[command(
    name = "deepsearch",
    author = "Dirmacs <build@dirmacs.com>",
    version,
    about = "DeepSearch - multi-agent deep research assistant",
    after_help = "EXAMPLES:\n    \
                  deepsearch                          # Interactive chat\n    \
                  deepsearch ask \"latest on WASI\"     # One question, one answer\n    \
                  deepsearch serve --port 8080        # HTTP chat server\n    \
                  deepsearch config --validate        # Check config and API keys"
)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "deepsearch.toml", global = true)]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Subcommand to execute (defaults to `chat`)
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available CLI subcommands
#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Start an interactive research chat
    Chat,

    /// Ask a single question and print the answer
    Ask {
        /// The question; multiple words are joined with spaces
        #[arg(required = true)]
        prompt: Vec<String>,
    },

    /// Serve the chat over HTTP
    Serve {
        /// Host address (overrides [server].host)
        #[arg(long)]
        host: Option<String>,

        /// Port (overrides [server].port)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print the agent topology
    Agents,

    /// Show configuration information
    Config {
        /// Validate the configuration file and required API keys
        #[arg(long)]
        validate: bool,
    },
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// The subcommand to run, `chat` when none was given
    pub fn command(&self) -> &Commands {
        self.command.as_ref().unwrap_or(&Commands::Chat)
    }
}
