//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

/// Friendlier patsopt diagnostics: highlighted source excerpts and readable constraints
#[derive(Parser, Debug)]
#[command(name = "patsfmt")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output (repeat for more: -d info, -dd debug, -ddd trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Directory for `.patsfmt.toml` and relative source paths (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    /// Use this config file instead of the global/local lookup
    #[arg(long, global = true, env = "PATSFMT_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Disable colors and use plain `>>`/`<<` highlight markers
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Keep single-child type wrappers such as `int(x)`
    #[arg(long, global = true)]
    pub show_types: bool,

    /// Excerpt lines shown before truncation
    #[arg(long, global = true, value_name = "N")]
    pub max_lines: Option<usize>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Format patsopt output (default command)
    Format {
        /// Captured compiler output (default: stdin)
        #[arg(value_hint = ValueHint::FilePath)]
        file: Option<PathBuf>,
    },

    /// Prettify a single expression
    Expr {
        /// Expression in patsopt notation, e.g. `S2Eapp(S2Ecst(f); S2Evar(x$1(2)))`
        notation: String,

        /// Print the rewritten tree instead of the expression
        #[arg(long)]
        tree: bool,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Show config paths
    Path,

    /// Print a commented config template
    Template,
}
