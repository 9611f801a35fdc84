mod local_folder;
#[cfg(test)]
mod memory;
mod remote;

pub use local_folder::LocalFolder;
#[cfg(test)]
pub use memory::MemoryRemote;
pub use remote::{Remote, RemoteError};
