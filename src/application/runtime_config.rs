use std::path::PathBuf;

use supports_color::Stream;

use crate::cli::{Cli, Command};

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub command: Command,
    pub root: PathBuf,
    /// Whether output may use terminal colors
    pub color: bool,
}

impl From<Cli> for RuntimeConfig {
    fn from(cli: Cli) -> Self {
        Self {
            command: cli.command,
            root: cli.root,
            color: supports_color::on(Stream::Stdout).is_some(),
        }
    }
}
