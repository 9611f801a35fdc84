use std::borrow::Cow;
use std::io::ErrorKind;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use compio::fs;
use hashlink::LinkedHashMap;
use saphyr::{LoadableYamlNode, Scalar, Yaml};
use snafu::prelude::*;
use tracing::{debug, info};

const SETTINGS_FILE_NAME: &str = "systemfiles.yaml";
const DEFAULT_EXCLUDE: &[&str] = &[".remix.config", SETTINGS_FILE_NAME];

fn get_settings_file_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE_NAME)
}

fn key(name: &'static str) -> Yaml<'static> {
    Yaml::Value(Scalar::String(Cow::Borrowed(name)))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// Names hidden from the remote listing wherever they appear in a path
    pub exclude: Vec<String>,
    /// Maximum number of file contents fetched at once while loading
    pub prefetch: NonZeroUsize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            exclude: DEFAULT_EXCLUDE.iter().map(|name| name.to_string()).collect(),
            prefetch: NonZeroUsize::MIN,
        }
    }
}

impl Settings {
    /// Reads `systemfiles.yaml` from `root`, falling back to defaults when it is absent.
    pub async fn read(root: &Path) -> Result<Self, SettingsError> {
        Self::from_path(get_settings_file_path(root)).await
    }

    pub async fn from_path(path: PathBuf) -> Result<Self, SettingsError> {
        debug!("Opening settings file: {}", path.display());
        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("No settings file at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).context(ReadSnafu {
                    file_path: path.display().to_string(),
                });
            }
        };

        let contents = String::from_utf8(bytes).context(EncodingSnafu {
            file_path: path.display().to_string(),
        })?;
        debug!("Successfully read settings file: {} bytes", contents.len());
        contents.as_str().try_into()
    }

    fn parse_exclude(top_level: &LinkedHashMap<Yaml, Yaml>) -> Result<Vec<String>, SettingsError> {
        let Some(exclude) = top_level.get(&key("exclude")) else {
            return Ok(Self::default().exclude);
        };

        exclude
            .as_sequence()
            .ok_or(SettingsError::ExcludeNotList)?
            .iter()
            .map(|entry| match entry {
                Yaml::Value(Scalar::String(name)) => Ok(name.to_string()),
                other => Err(SettingsError::InvalidExcludeEntry {
                    entry: format!("{other:?}"),
                }),
            })
            .collect()
    }

    fn parse_prefetch(top_level: &LinkedHashMap<Yaml, Yaml>) -> Result<NonZeroUsize, SettingsError> {
        match top_level.get(&key("prefetch")) {
            None => Ok(Self::default().prefetch),
            Some(Yaml::Value(Scalar::Integer(n))) => usize::try_from(*n)
                .ok()
                .and_then(NonZeroUsize::new)
                .ok_or_else(|| SettingsError::InvalidPrefetch {
                    value: n.to_string(),
                }),
            Some(other) => Err(SettingsError::InvalidPrefetch {
                value: format!("{other:?}"),
            }),
        }
    }
}

impl TryFrom<&str> for Settings {
    type Error = SettingsError;

    fn try_from(contents: &str) -> Result<Self, Self::Error> {
        let contents_vec =
            Yaml::load_from_str(contents).map_err(|e| SettingsError::ParseError { source: e })?;
        let contents = contents_vec
            .first()
            .ok_or(SettingsError::MalformedConfig)?;

        let top_level = contents
            .as_mapping()
            .ok_or(SettingsError::TopLevelNotMap)?;

        Ok(Settings {
            exclude: Self::parse_exclude(top_level)?,
            prefetch: Self::parse_prefetch(top_level)?,
        })
    }
}

#[derive(Debug, Snafu)]
pub enum SettingsError {
    #[snafu(display("Failed to read the settings file: {}", file_path))]
    ReadError {
        file_path: String,
        source: std::io::Error,
    },
    #[snafu(display("Settings file {} is not valid UTF-8", file_path))]
    EncodingError {
        file_path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Failed to parse the settings file"))]
    ParseError { source: saphyr::ScanError },
    #[snafu(display("Improperly formatted settings file"))]
    MalformedConfig,
    #[snafu(display("Top level of settings should be a map"))]
    TopLevelNotMap,
    #[snafu(display("Exclude section should be a list"))]
    ExcludeNotList,
    #[snafu(display("Exclude entry {} should be a string", entry))]
    InvalidExcludeEntry { entry: String },
    #[snafu(display("Prefetch should be a positive integer, got {}", value))]
    InvalidPrefetch { value: String },
}
