use snafu::Snafu;

const SEPARATOR: char = '/';

/// Splits a `/`-delimited path into its segments.
///
/// Empty paths, empty segments (leading, trailing or doubled separators) and
/// `.`/`..` segments are rejected, so every accepted path names exactly one
/// location below the root.
pub fn split_path(path: &str) -> Result<Vec<&str>, InvalidPathError> {
    let segments = path.split(SEPARATOR).collect::<Vec<_>>();

    let is_valid = segments
        .iter()
        .all(|segment| !segment.is_empty() && *segment != "." && *segment != "..");

    if is_valid {
        Ok(segments)
    } else {
        Err(InvalidPathError {
            path: path.to_string(),
        })
    }
}

pub fn validate_path(path: &str) -> Result<(), InvalidPathError> {
    split_path(path).map(|_| ())
}

#[derive(Debug, Clone, PartialEq, Eq, Snafu)]
#[snafu(display("Invalid path '{}'", path))]
pub struct InvalidPathError {
    pub path: String,
}
