//! Fixed-size async worker pool.
//!
//! This is the tokio-native shape of the original crawler's pthread pool: a
//! shared work queue, a fixed number of workers pulling from it, and a way
//! for the dispatcher to tell whether any worker is currently busy. Where
//! the C version used a mutex/condvar pair and a `working_count` guarded by
//! the same mutex, the async version uses a channel behind a shared
//! `tokio::sync::Mutex` for the queue and an `AtomicUsize` plus a `Notify`
//! for "is anything in flight" — the same two facts the dispatcher's
//! termination check needs, just without blocking an OS thread to get them.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, Mutex, Notify};
use tokio::task::JoinHandle;

/// A fixed-size pool of workers processing items of type `T` with an
/// async closure. Modeled directly on the "spawn N tasks sharing one
/// receiver" pattern used for concurrent downloads elsewhere in this
/// crate's lineage.
pub struct Pool<T> {
    sender: mpsc::Sender<T>,
    handles: Vec<JoinHandle<()>>,
    working: Arc<AtomicUsize>,
    idle_notify: Arc<Notify>,
}

impl<T> Pool<T>
where
    T: Send + 'static,
{
    /// Spawn `workers` tasks, each looping on `handler` until the queue is
    /// closed. `handler` is cloned once per worker, so it should be cheap
    /// to clone (an `Arc` wrapper, typically).
    pub fn new<Fut, H>(workers: usize, queue_capacity: usize, handler: H) -> Self
    where
        H: Fn(T) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = ()> + Send,
    {
        let (tx, rx) = mpsc::channel::<T>(queue_capacity);
        let rx = Arc::new(Mutex::new(rx));
        let working = Arc::new(AtomicUsize::new(0));
        let idle_notify = Arc::new(Notify::new());
        let handler = Arc::new(handler);

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let rx = rx.clone();
            let working = working.clone();
            let idle_notify = idle_notify.clone();
            let handler = handler.clone();

            let handle = tokio::spawn(async move {
                loop {
                    // `working` must go up while `rx` is still locked: a
                    // dispatcher observing the queue as empty right after
                    // this dequeue must also observe this worker as busy,
                    // or it can declare the pool idle with this item's
                    // fetch still unstarted.
                    let item = {
                        let mut rx = rx.lock().await;
                        let item = rx.recv().await;
                        if item.is_some() {
                            working.fetch_add(1, Ordering::SeqCst);
                        }
                        item
                    };
                    let Some(item) = item else {
                        break;
                    };

                    handler(item).await;
                    if working.fetch_sub(1, Ordering::SeqCst) == 1 {
                        idle_notify.notify_waiters();
                    }
                }
            });
            handles.push(handle);
        }

        Self {
            sender: tx,
            handles,
            working,
            idle_notify,
        }
    }

    /// Submit an item. Blocks (asynchronously) if every worker's queue
    /// slot is full, providing natural backpressure on the dispatcher.
    pub async fn submit(&self, item: T) -> Result<(), mpsc::error::SendError<T>> {
        self.sender.send(item).await
    }

    /// True if at least one worker is currently processing an item.
    pub fn is_busy(&self) -> bool {
        self.working.load(Ordering::SeqCst) > 0
    }

    /// Wait until no worker is processing anything. Racy by nature (a new
    /// item could be submitted immediately after this returns) — callers
    /// that need an atomic "queue empty and no worker busy" check should
    /// combine [`Pool::is_busy`] with [`crate::storage::Storage::queue_empty_and`]
    /// under the storage lock instead of relying on this alone.
    pub async fn wait_idle(&self) {
        loop {
            // Register interest in the next notification *before* checking
            // `is_busy`, not after: `notify_waiters` only wakes waiters
            // already registered at the time it's called, so a check-then-
            // wait ordering can miss a notification fired in between and
            // hang forever.
            let notified = self.idle_notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if !self.is_busy() {
                return;
            }
            notified.await;
        }
    }

    /// Close the submission channel and wait for every worker to drain and
    /// exit.
    pub async fn shutdown(self) {
        drop(self.sender);
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}
