//! # Configuration
//!
//! Runtime settings for the server, resolved from the command line.

use clap::Parser;
use std::time::Duration;

/// MCP server exposing `droid exec` as a tool over stdio.
#[derive(Debug, Parser)]
#[command(name = "droid-mcp", version, about)]
pub struct Cli {
    /// Executable to invoke (resolved via PATH unless absolute)
    #[arg(long, default_value = "droid")]
    pub droid_bin: String,

    /// Upper bound on a single droid exec run, in seconds
    #[arg(long, default_value_t = 300)]
    pub timeout_secs: u64,

    /// Directory for the session log file
    #[arg(long, default_value = "data")]
    pub log_dir: String,

    /// Skip the droid binary provisioning check at startup
    #[arg(long)]
    pub skip_install: bool,
}

/// Settings the tool handler needs at call time.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub droid_bin: String,
    pub exec_timeout: Duration,
}

impl ServerConfig {
    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            droid_bin: cli.droid_bin.clone(),
            exec_timeout: Duration::from_secs(cli.timeout_secs),
        }
    }
}
