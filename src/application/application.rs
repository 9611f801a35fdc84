use futures::StreamExt;
use snafu::Snafu;
use snafu::prelude::*;
use tracing::{debug, info};

use crate::application::{RuntimeConfig, render_tree};
use crate::cli::Command;
use crate::config::{Settings, SettingsError};
use crate::remote::{LocalFolder, RemoteError};
use crate::system_files::{PendingSync, SyncError, SystemFiles, SystemFilesError};

pub struct Application;

impl Application {
    pub async fn run(app_config: impl Into<RuntimeConfig>) -> Result<(), ApplicationError> {
        let output = Self::execute(app_config.into()).await?;
        print!("{output}");
        Ok(())
    }

    /// Loads the files below the configured root, runs the command against them
    /// and returns what it prints.
    pub async fn execute(app_config: RuntimeConfig) -> Result<String, ApplicationError> {
        let settings = Settings::read(&app_config.root)
            .await
            .context(SettingsSnafu)?;
        debug!("Loaded settings: {:?}", settings);

        let remote = LocalFolder::new(app_config.root.clone(), settings.exclude);
        let mut files = SystemFiles::new(remote, settings.prefetch);
        let events = files.subscribe();
        files.init().await.context(LoadSnafu)?;

        let output: String = match app_config.command {
            Command::List => files
                .list()
                .map(|list| list.keys().map(|path| format!("{path}\n")).collect())
                .unwrap_or_default(),
            Command::Tree => files
                .list_as_tree()
                .map(|tree| render_tree(tree, app_config.color))
                .unwrap_or_default(),
            Command::Cat { path } => files
                .get(&path)
                .await
                .context(ReadSnafu { path: path.clone() })?,
            Command::Write { path, content } => {
                wait_for(files.set(path, content).context(ChangeSnafu)?).await?;
                String::new()
            }
            Command::Rm { path } => {
                wait_for(files.remove(path).context(ChangeSnafu)?).await?;
                String::new()
            }
            Command::Mv { old_path, new_path } => {
                wait_for(files.rename(old_path, new_path).context(ChangeSnafu)?).await?;
                String::new()
            }
        };

        // Closes the event channel so the log below terminates
        drop(files);
        events
            .for_each(|event| {
                info!("{}", event);
                futures::future::ready(())
            })
            .await;

        Ok(output)
    }
}

async fn wait_for(pending: PendingSync) -> Result<(), ApplicationError> {
    debug!("Waiting for remote {}", pending.operation());
    pending.wait().await.context(SyncSnafu)
}

#[derive(Debug, Snafu)]
pub enum ApplicationError {
    #[snafu(display("Critical failure encountered while reading settings"))]
    SettingsError { source: SettingsError },
    #[snafu(display("Failed to load the files"))]
    LoadError { source: SystemFilesError },
    #[snafu(display("Failed to read '{}'", path))]
    ReadError { path: String, source: RemoteError },
    #[snafu(display("Failed to change the files"))]
    ChangeError { source: SystemFilesError },
    #[snafu(display("Failed to apply the change to the folder"))]
    SyncError { source: SyncError },
}
