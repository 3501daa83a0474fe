//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand, ValueHint};

/// Inspect, validate and edit Defold project files
#[derive(Parser, Debug)]
#[command(name = "deftree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug output: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Project directory for local config (default: cwd)
    #[arg(short = 'C', long, global = true, value_hint = ValueHint::DirPath)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse a file and print it re-serialized
    Dump {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Check that files survive a parse/serialize round trip unchanged
    Validate {
        /// File, or directory to walk
        #[arg(value_hint = ValueHint::AnyPath)]
        path: PathBuf,
    },

    /// Show the element hierarchy of a file
    Tree {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Include attributes as leaves
        #[arg(short, long)]
        attributes: bool,
    },

    /// Print matching attributes
    Get {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Attribute name
        attribute: String,
        /// Only attributes whose parent element has this name
        #[arg(short, long)]
        element: Option<String>,
    },

    /// Assign a value to matching attributes and write the file
    Set {
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Attribute name
        attribute: String,
        /// New value, checked against the attribute's kind
        value: String,
        /// Only attributes whose parent element has this name
        #[arg(short, long)]
        element: Option<String>,
        /// Write here instead of back to FILE
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        output: Option<PathBuf>,
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

    /// Print a config template
    Template,

    /// Show config paths
    Path,
}
