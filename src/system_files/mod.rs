//! Client-side cache over a [`Remote`](crate::remote::Remote) file listing.
//!
//! [`SystemFiles`] keeps a flat `path -> content` mapping and the tree derived
//! from it in step. Local changes are applied immediately, the matching remote
//! calls are replayed in order in the background and each is reported through a
//! [`PendingSync`].

mod event;
mod sync;
mod system_files;

pub use event::FileEvent;
pub use sync::{PendingSync, RemoteOperation, SyncError};
pub(crate) use sync::SyncQueue;
pub use system_files::{SystemFiles, SystemFilesError};
