use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::task::Poll;

use hashlink::LinkedHashMap;

use crate::remote::{Remote, RemoteError};

/// In-memory remote with failure injection and call bookkeeping.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    files: RefCell<LinkedHashMap<String, String>>,
    failing_gets: RefCell<HashSet<String>>,
    fail_writes: Cell<bool>,
    fail_list: Cell<bool>,
    calls: RefCell<Vec<String>>,
    in_flight: Cell<usize>,
    max_in_flight: Cell<usize>,
}

impl MemoryRemote {
    pub fn with_files(files: &[(&str, &str)]) -> Self {
        let remote = Self::default();
        remote.files.replace(
            files
                .iter()
                .map(|(path, content)| (path.to_string(), content.to_string()))
                .collect(),
        );
        remote
    }

    pub fn fail_get(&self, path: &str) {
        self.failing_gets.borrow_mut().insert(path.to_string());
    }

    pub fn fail_writes(&self) {
        self.fail_writes.set(true);
    }

    pub fn fail_list(&self) {
        self.fail_list.set(true);
    }

    pub fn content(&self, path: &str) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.get()
    }

    fn record(&self, call: String) {
        self.calls.borrow_mut().push(call);
    }

    fn check_writable(&self, path: &str) -> Result<(), RemoteError> {
        if self.fail_writes.get() {
            Err(RemoteError::IoError {
                path: path.to_string(),
                source: std::io::Error::other("write rejected"),
            })
        } else {
            Ok(())
        }
    }
}

/// Gives other futures a chance to run before resolving.
async fn yield_now() {
    let mut yielded = false;
    futures::future::poll_fn(|cx| {
        if yielded {
            Poll::Ready(())
        } else {
            yielded = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    })
    .await
}

impl Remote for MemoryRemote {
    async fn list(&self) -> Result<Vec<String>, RemoteError> {
        self.record("list".to_string());
        if self.fail_list.get() {
            return Err(RemoteError::IoError {
                path: String::new(),
                source: std::io::Error::other("listing unavailable"),
            });
        }
        Ok(self.files.borrow().keys().cloned().collect())
    }

    async fn get(&self, path: &str) -> Result<String, RemoteError> {
        self.record(format!("get {path}"));
        self.in_flight.set(self.in_flight.get() + 1);
        self.max_in_flight
            .set(self.max_in_flight.get().max(self.in_flight.get()));
        yield_now().await;
        self.in_flight.set(self.in_flight.get() - 1);

        if self.failing_gets.borrow().contains(path) {
            return Err(RemoteError::NotFoundError {
                path: path.to_string(),
            });
        }
        self.content(path).ok_or_else(|| RemoteError::NotFoundError {
            path: path.to_string(),
        })
    }

    async fn set(&self, path: &str, content: &str) -> Result<(), RemoteError> {
        self.record(format!("set {path}"));
        self.check_writable(path)?;
        self.files
            .borrow_mut()
            .insert(path.to_string(), content.to_string());
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<(), RemoteError> {
        self.record(format!("remove {path}"));
        self.check_writable(path)?;
        self.files
            .borrow_mut()
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| RemoteError::NotFoundError {
                path: path.to_string(),
            })
    }

    async fn rename(&self, old_path: &str, new_path: &str) -> Result<(), RemoteError> {
        self.record(format!("rename {old_path} {new_path}"));
        self.check_writable(old_path)?;
        let mut files = self.files.borrow_mut();
        let content = files
            .remove(old_path)
            .ok_or_else(|| RemoteError::NotFoundError {
                path: old_path.to_string(),
            })?;
        files.insert(new_path.to_string(), content);
        Ok(())
    }
}
