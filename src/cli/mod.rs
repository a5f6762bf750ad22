//! CLI argument parsing
//!
//! Defines command-line interface using clap.

use clap::{Parser, Subcommand};

/// Dependency-ordered runner for cluster diagnostic checks
#[derive(Parser, Debug)]
#[command(name = "runtime-tester")]
#[command(version)]
#[command(about = "Run cluster diagnostic checks in dependency order")]
#[command(long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run every check of a plan against its target
    Run(RunArgs),

    /// List the checks of a plan in display order
    List(ListArgs),

    /// Validate a plan file without running it
    Validate(ValidateArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

/// Arguments for run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Plan file (YAML or JSON)
    pub plan: String,

    /// Output format (table, json, json-pretty, csv, summary)
    #[arg(short, long)]
    pub format: Option<String>,

    /// Maximum checks running at once
    #[arg(short, long)]
    pub concurrent: Option<usize>,

    /// Connect timeout in seconds, overriding the plan
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Skip specific checks (comma-separated ids)
    #[arg(long, value_delimiter = ',')]
    pub skip: Vec<String>,

    /// Set a target variable (KEY=VALUE), may be repeated
    #[arg(long = "var", value_name = "KEY=VALUE")]
    pub vars: Vec<String>,

    /// Do not print progress while running
    #[arg(short, long)]
    pub quiet: bool,

    /// Save the report to file
    #[arg(short, long)]
    pub output: Option<String>,
}

/// Arguments for list command
#[derive(Parser, Debug)]
pub struct ListArgs {
    /// Plan file (YAML or JSON)
    pub plan: String,

    /// Show dependencies and check kinds
    #[arg(short, long)]
    pub detailed: bool,
}

/// Arguments for validate command
#[derive(Parser, Debug)]
pub struct ValidateArgs {
    /// Plan file (YAML or JSON)
    pub plan: String,
}

/// Arguments for config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default configuration file
    Init {
        /// Output path (defaults to ~/.config/runtime-tester/config.yaml)
        #[arg(short, long)]
        output: Option<String>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Show the effective configuration
    Show {
        /// Show environment variable help instead
        #[arg(short, long)]
        env: bool,

        /// Output format (yaml, json)
        #[arg(short, long, default_value = "yaml")]
        format: String,
    },
}

/// Split `KEY=VALUE` pairs
pub fn parse_vars(vars: &[String]) -> anyhow::Result<Vec<(String, String)>> {
    vars.iter()
        .map(|pair| {
            pair.split_once('=')
                .filter(|(key, _)| !key.trim().is_empty())
                .map(|(key, value)| (key.trim().to_string(), value.to_string()))
                .ok_or_else(|| anyhow::anyhow!("Invalid variable '{pair}', expected KEY=VALUE"))
        })
        .collect()
}
