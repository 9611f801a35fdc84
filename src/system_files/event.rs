use derive_more::Display;

/// Notification sent to subscribers after the cache changed locally.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum FileEvent {
    #[display("loaded {count} files")]
    Loaded { count: usize },
    #[display("changed '{path}'")]
    Changed { path: String },
    #[display("removed '{path}'")]
    Removed { path: String },
    #[display("renamed '{old_path}' to '{new_path}'")]
    Renamed { old_path: String, new_path: String },
}
