use std::rc::Rc;

use compio::runtime::spawn;
use derive_more::Display;
use futures::StreamExt;
use futures_channel::{mpsc, oneshot};
use snafu::{ResultExt, Snafu};
use tracing::{debug, warn};

use crate::remote::{Remote, RemoteError};

/// A change to replay on the remote after the cache applied it locally.
#[derive(Debug, Clone, PartialEq, Eq, Display)]
pub enum RemoteOperation {
    #[display("set '{path}'")]
    Set { path: String, content: String },
    #[display("remove '{path}'")]
    Remove { path: String },
    #[display("rename '{old_path}' to '{new_path}'")]
    Rename { old_path: String, new_path: String },
}

impl RemoteOperation {
    async fn apply<R: Remote>(&self, remote: &R) -> Result<(), RemoteError> {
        match self {
            RemoteOperation::Set { path, content } => remote.set(path, content).await,
            RemoteOperation::Remove { path } => remote.remove(path).await,
            RemoteOperation::Rename { old_path, new_path } => {
                remote.rename(old_path, new_path).await
            }
        }
    }
}

type Reply = oneshot::Sender<Result<(), RemoteError>>;

/// Replays [`RemoteOperation`]s on the remote one at a time, in the order they were queued.
///
/// A single worker task drains the queue. It keeps running after the queue is
/// dropped until every operation queued so far has been applied.
#[derive(Debug)]
pub(crate) struct SyncQueue {
    sender: mpsc::UnboundedSender<(RemoteOperation, Reply)>,
}

impl SyncQueue {
    /// Spawns the worker, so it must be called on a compio runtime.
    pub(crate) fn start<R: Remote + 'static>(remote: Rc<R>) -> Self {
        let (sender, mut receiver) = mpsc::unbounded::<(RemoteOperation, Reply)>();

        spawn(async move {
            while let Some((operation, reply)) = receiver.next().await {
                let result = operation.apply(remote.as_ref()).await;
                match &result {
                    Ok(()) => debug!("Remote {} succeeded", operation),
                    Err(e) => warn!("Remote {} failed: {}", operation, e),
                }

                if reply.send(result).is_err() {
                    debug!("Nobody waits for remote {}", operation);
                }
            }
            debug!("Sync queue drained");
        })
        .detach();

        Self { sender }
    }

    /// Queues `operation` without touching the runtime.
    pub(crate) fn enqueue(&self, operation: RemoteOperation) -> PendingSync {
        let (reply, receiver) = oneshot::channel();
        if self
            .sender
            .unbounded_send((operation.clone(), reply))
            .is_err()
        {
            // The reply sender is gone with the rejected message, so waiting yields CanceledError
            warn!("Sync queue is closed, remote {} is dropped", operation);
        }

        PendingSync {
            operation,
            receiver,
        }
    }
}

/// Outcome of a remote call that is queued or running.
///
/// Dropping it does not cancel the call; a failure is then only logged.
#[derive(Debug)]
pub struct PendingSync {
    operation: RemoteOperation,
    receiver: oneshot::Receiver<Result<(), RemoteError>>,
}

impl PendingSync {
    pub fn operation(&self) -> &RemoteOperation {
        &self.operation
    }

    /// Waits for the remote call to finish
    pub async fn wait(self) -> Result<(), SyncError> {
        let operation = self.operation;
        self.receiver
            .await
            .context(CanceledSnafu {
                operation: operation.clone(),
            })?
            .context(RemoteSnafu { operation })
    }
}

#[derive(Debug, Snafu)]
pub enum SyncError {
    #[snafu(display("Remote {} failed", operation))]
    RemoteError {
        operation: RemoteOperation,
        source: RemoteError,
    },
    #[snafu(display("Remote {} got cancelled", operation))]
    CanceledError {
        operation: RemoteOperation,
        source: oneshot::Canceled,
    },
}
