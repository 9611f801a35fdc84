use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::rc::Rc;

use futures::{StreamExt, stream};
use futures_channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use hashlink::LinkedHashMap;
use snafu::{OptionExt, ResultExt, Snafu, ensure};
use tracing::{debug, info};

use crate::filesystem::{FileTree, InvalidPathError, TreeError, validate_path};
use crate::remote::{Remote, RemoteError};
use crate::system_files::{FileEvent, PendingSync, RemoteOperation, SyncQueue};

/// The flat mapping and the tree built from it. They are only ever replaced together.
#[derive(Debug, Clone, Default)]
struct Cache {
    files: LinkedHashMap<String, String>,
    tree: FileTree,
}

/// Cache of the files served by a [`Remote`].
///
/// Nothing is cached until [`SystemFiles::init`] succeeds. After that every
/// mutation updates the flat mapping and the tree at once, and is queued for
/// replay on the remote. Queued changes reach the remote one at a time in the
/// order they were made.
pub struct SystemFiles<R: Remote> {
    remote: Rc<R>,
    prefetch: NonZeroUsize,
    cache: Option<Cache>,
    queue: Option<SyncQueue>,
    read_only: HashSet<String>,
    subscribers: Vec<UnboundedSender<FileEvent>>,
}

impl<R: Remote + 'static> SystemFiles<R> {
    /// `prefetch` bounds how many file contents [`SystemFiles::init`] fetches at once.
    pub fn new(remote: R, prefetch: NonZeroUsize) -> Self {
        Self {
            remote: Rc::new(remote),
            prefetch,
            cache: None,
            queue: None,
            read_only: HashSet::new(),
            subscribers: Vec::new(),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    /// Loads every file from the remote.
    ///
    /// The first failing fetch aborts the ones not yet started and is returned.
    /// The cache is replaced only when the whole listing was fetched and fits in
    /// a tree, otherwise it keeps whatever it held before. Read-only files are
    /// local and do not survive a reload.
    ///
    /// The first call also starts the worker that replays changes on the remote.
    pub async fn init(&mut self) -> Result<(), SystemFilesError> {
        if self.queue.is_none() {
            self.queue = Some(SyncQueue::start(Rc::clone(&self.remote)));
        }

        let paths = self.remote.list().await.context(ListSnafu)?;
        debug!("Remote listed {} paths", paths.len());

        let files = self.fetch_all(paths).await?;
        let tree = FileTree::from_flat(&files).context(TreeSnafu)?;
        let count = files.len();

        self.cache = Some(Cache { files, tree });
        self.read_only.clear();
        info!("Loaded {} files from remote", count);
        self.emit(FileEvent::Loaded { count });

        Ok(())
    }

    async fn fetch_all(
        &self,
        paths: Vec<String>,
    ) -> Result<LinkedHashMap<String, String>, SystemFilesError> {
        let remote = self.remote.as_ref();
        let mut fetches = stream::iter(paths)
            .map(|path| async move {
                let content = remote.get(&path).await;
                (path, content)
            })
            .buffered(self.prefetch.get());

        let mut files = LinkedHashMap::new();
        while let Some((path, content)) = fetches.next().await {
            let content = content.context(FetchSnafu { path: path.clone() })?;
            debug!("Fetched '{}' ({} bytes)", path, content.len());
            files.insert(path, content);
        }

        Ok(files)
    }

    /// Whether `path` is a cached file. Always false before [`SystemFiles::init`].
    pub fn exists(&self, path: &str) -> bool {
        self.cache
            .as_ref()
            .is_some_and(|cache| cache.files.contains_key(path))
    }

    /// Reads `path` straight from the remote, bypassing the cache.
    pub async fn get(&self, path: &str) -> Result<String, RemoteError> {
        self.remote.get(path).await
    }

    /// Stores `content` at `path` in the cache and on the remote.
    pub fn set(
        &mut self,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<PendingSync, SystemFilesError> {
        let path = path.into();
        let content = content.into();
        self.ensure_writable(&path)?;

        let cache = self.cache.as_mut().context(NotInitializedSnafu)?;
        cache
            .tree
            .insert(&path, false, content.clone())
            .context(TreeSnafu)?;
        cache.files.replace(path.clone(), content.clone());

        self.emit(FileEvent::Changed { path: path.clone() });
        self.sync(RemoteOperation::Set { path, content })
    }

    /// Drops `path` from the cache and removes it on the remote.
    ///
    /// A path the cache does not know is still removed remotely.
    pub fn remove(&mut self, path: impl Into<String>) -> Result<PendingSync, SystemFilesError> {
        let path = path.into();
        self.ensure_writable(&path)?;

        let cache = self.cache.as_mut().context(NotInitializedSnafu)?;
        if cache.files.remove(&path).is_some() {
            cache.tree.remove(&path);
            self.emit(FileEvent::Removed { path: path.clone() });
        } else {
            debug!("'{}' is not cached, removing it remotely only", path);
        }

        self.sync(RemoteOperation::Remove { path })
    }

    /// Moves the cached file at `old_path` to `new_path`, locally and on the remote.
    pub fn rename(
        &mut self,
        old_path: impl Into<String>,
        new_path: impl Into<String>,
    ) -> Result<PendingSync, SystemFilesError> {
        let old_path = old_path.into();
        let new_path = new_path.into();
        self.ensure_writable(&old_path)?;
        self.ensure_writable(&new_path)?;

        let cache = self.cache.as_mut().context(NotInitializedSnafu)?;
        let content = cache
            .files
            .get(&old_path)
            .cloned()
            .context(NotFoundSnafu {
                path: old_path.clone(),
            })?;

        if old_path != new_path {
            let mut tree = cache.tree.clone();
            tree.remove(&old_path);
            tree.insert(&new_path, false, content.clone())
                .context(TreeSnafu)?;

            cache.tree = tree;
            cache.files.remove(&old_path);
            cache.files.replace(new_path.clone(), content);

            self.emit(FileEvent::Renamed {
                old_path: old_path.clone(),
                new_path: new_path.clone(),
            });
        }

        self.sync(RemoteOperation::Rename { old_path, new_path })
    }

    /// Adds a file that lives only in the cache and cannot be changed through it.
    pub fn add_read_only(
        &mut self,
        path: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<(), SystemFilesError> {
        let path = path.into();
        let content = content.into();
        validate_path(&path).context(PathSnafu)?;

        let cache = self.cache.as_mut().context(NotInitializedSnafu)?;
        if cache.files.contains_key(&path) && !self.read_only.contains(&path) {
            return Err(SystemFilesError::AlreadyExistsError { path });
        }

        cache
            .tree
            .insert(&path, true, content.clone())
            .context(TreeSnafu)?;
        cache.files.replace(path.clone(), content);
        self.read_only.insert(path.clone());

        self.emit(FileEvent::Changed { path });
        Ok(())
    }

    pub fn is_read_only(&self, path: &str) -> bool {
        self.read_only.contains(path)
    }

    /// The cached `path -> content` mapping, `None` before [`SystemFiles::init`].
    pub fn list(&self) -> Option<&LinkedHashMap<String, String>> {
        self.cache.as_ref().map(|cache| &cache.files)
    }

    /// The cached tree, `None` before [`SystemFiles::init`].
    pub fn list_as_tree(&self) -> Option<&FileTree> {
        self.cache.as_ref().map(|cache| &cache.tree)
    }

    /// Registers a new listener for [`FileEvent`]s.
    pub fn subscribe(&mut self) -> UnboundedReceiver<FileEvent> {
        let (sender, receiver) = mpsc::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    fn emit(&mut self, event: FileEvent) {
        debug!("Emitting event: {}", event);
        self.subscribers
            .retain(|subscriber| subscriber.unbounded_send(event.clone()).is_ok());
    }

    fn ensure_writable(&self, path: &str) -> Result<(), SystemFilesError> {
        validate_path(path).context(PathSnafu)?;
        ensure!(!self.is_read_only(path), ReadOnlySnafu { path });
        Ok(())
    }

    fn sync(&self, operation: RemoteOperation) -> Result<PendingSync, SystemFilesError> {
        let queue = self.queue.as_ref().context(NotInitializedSnafu)?;
        Ok(queue.enqueue(operation))
    }
}

#[derive(Debug, Snafu)]
pub enum SystemFilesError {
    #[snafu(display("Files are not loaded yet"))]
    NotInitializedError,
    #[snafu(display("File '{}' is not cached", path))]
    NotFoundError { path: String },
    #[snafu(display("File '{}' is read-only", path))]
    ReadOnlyError { path: String },
    #[snafu(display("File '{}' already exists", path))]
    AlreadyExistsError { path: String },
    #[snafu(display("Invalid file path"))]
    PathError { source: InvalidPathError },
    #[snafu(display("Files do not form a tree"))]
    TreeError { source: TreeError },
    #[snafu(display("Failed to list remote files"))]
    ListError { source: RemoteError },
    #[snafu(display("Failed to fetch remote file '{}'", path))]
    FetchError { path: String, source: RemoteError },
}
