use snafu::Snafu;

use crate::filesystem::InvalidPathError;

/// The service holding the authoritative copy of the files.
///
/// Paths are `/`-delimited and relative to whatever root the service serves.
#[allow(async_fn_in_trait)]
pub trait Remote {
    /// Lists every file path, in the order the service reports them
    async fn list(&self) -> Result<Vec<String>, RemoteError>;
    async fn get(&self, path: &str) -> Result<String, RemoteError>;
    async fn set(&self, path: &str, content: &str) -> Result<(), RemoteError>;
    async fn remove(&self, path: &str) -> Result<(), RemoteError>;
    async fn rename(&self, old_path: &str, new_path: &str) -> Result<(), RemoteError>;
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RemoteError {
    #[snafu(display("Remote file '{}' does not exist", path))]
    NotFoundError { path: String },
    #[snafu(display("Remote I/O failed for '{}'", path))]
    IoError {
        path: String,
        source: std::io::Error,
    },
    #[snafu(display("Remote file '{}' is not valid UTF-8", path))]
    Utf8Error {
        path: String,
        source: std::string::FromUtf8Error,
    },
    #[snafu(display("Remote refused the path"))]
    PathError { source: InvalidPathError },
}
