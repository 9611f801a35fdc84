use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::application::data::LogLevel;

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Browse and edit the files served from a folder")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[clap(long, short, default_value = "warn", value_enum, global = true)]
    pub log_level: LogLevel,

    /// The folder serving the files
    #[clap(long, short, default_value = ".", global = true)]
    pub root: PathBuf,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print every file path
    List,
    /// Print the files as a tree
    Tree,
    /// Print the content of a file
    Cat { path: String },
    /// Replace the content of a file, creating it if needed
    Write { path: String, content: String },
    /// Remove a file
    Rm { path: String },
    /// Move a file to a new path
    Mv { old_path: String, new_path: String },
}
