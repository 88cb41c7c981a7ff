// Sempred - Semantic Predicate Evaluator
// Copyright (C) 2024 Zhuo Zhang and Wuqi Zhang
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Sempred command-line front end.
//!
//! Evaluates semantic predicates outside a running debug session: single
//! expressions from the command line, or every predicate of a manifest that
//! lists a grammar's predicates together with the bindings to decide them with.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use eyre::Result;
use sempred_common::{env::SEMPRED_CONFIG, init_logging, init_simple_logging};
use sempred_engine::PredicateConfig;
use tracing::Level;

mod cmd;
mod manifest;

/// Command-line interface for Sempred
#[derive(Debug, Parser)]
#[command(name = "sempred")]
#[command(about = "Sempred - Semantic predicate evaluator for interactive grammar debugging")]
#[command(version)]
pub struct Cli {
    /// Predicate configuration file
    #[arg(long, global = true, env = SEMPRED_CONFIG)]
    pub config: Option<PathBuf>,

    /// Also write detailed logs to a daily rolling file
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Do not evaluate predicates; `run` reports the configured disabled value
    #[arg(long, global = true)]
    pub no_predicates: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Evaluate a single predicate expression
    Eval(EvalArgs),
    /// Parse every predicate of a manifest and report problems
    Check {
        /// Predicate manifest (TOML)
        manifest: PathBuf,
    },
    /// Decide the predicates of a manifest against its bindings
    Run {
        /// Predicate manifest (TOML)
        manifest: PathBuf,

        /// Only decide the predicate at this location
        #[arg(long, value_name = "RULE:INDEX")]
        at: Option<String>,
    },
}

/// Arguments of the `eval` command
#[derive(Debug, Args)]
pub struct EvalArgs {
    /// Predicate expression, optionally in `{ ... }?` form
    pub expression: String,

    /// Bind a name, e.g. `--bind version=999`; values are literals or raw strings
    #[arg(long = "bind", short = 'b', value_name = "NAME=VALUE")]
    pub bindings: Vec<String>,

    /// Read bindings from a JSON object of scalars; `--bind` entries take precedence
    #[arg(long, value_name = "PATH")]
    pub bindings_file: Option<PathBuf>,

    /// Print the value of the expression instead of requiring a boolean
    #[arg(long)]
    pub value: bool,
}

fn main() -> Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Parse CLI arguments
    let cli = Cli::parse();

    if cli.log_file {
        init_logging("sempred", true)?;
    } else {
        init_simple_logging(Level::WARN)?;
    }

    let config = load_config(&cli)?;
    tracing::debug!("Predicate configuration: {config:?}");

    match &cli.command {
        Commands::Eval(args) => cmd::eval_expression(args),
        Commands::Check { manifest } => cmd::check_manifest(manifest),
        Commands::Run { manifest, at } => cmd::run_manifest(manifest, at.as_deref(), config),
    }
}

fn load_config(cli: &Cli) -> Result<PredicateConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = PredicateConfig::load_from(path)?;
            config.apply_env_overrides();
            config
        }
        None => PredicateConfig::load()?,
    };
    if cli.no_predicates {
        config.enabled = false;
    }
    Ok(config)
}
