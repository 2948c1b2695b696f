use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use thiserror::Error;

/// Errors from submitting work to a [`TaskSlot`].
#[derive(Debug, Error)]
pub enum TaskSlotError {
    /// A task is already in flight; the new request is dropped, never queued.
    #[error("a background task is already running")]
    Busy,

    #[error("failed to spawn worker thread: {0}")]
    Spawn(#[from] io::Error),
}

/// Completion marker handed to every submitted task.
///
/// A task must call [`complete`](CompletionToken::complete) after its work
/// is done and *before* signaling its notifier; that ordering is what lets
/// the GUI-side [`retire`](TaskSlot::retire) distinguish a genuine
/// completion from a collapse signal sent while the task still runs. The
/// slot also marks completion after the closure returns, as a backstop.
pub struct CompletionToken {
    done: Arc<AtomicBool>,
}

impl CompletionToken {
    pub fn complete(&self) {
        self.done.store(true, Ordering::Release);
    }
}

struct Occupant {
    handle: JoinHandle<()>,
    done: Arc<AtomicBool>,
}

/// Single-occupancy guard for background work.
///
/// Holds zero or one worker thread handle. At most one task is ever in
/// flight; a second submission is rejected with [`TaskSlotError::Busy`].
/// The handle is owned, never leaked: it is joined either by `retire` from
/// the GUI thread once the task has completed, or unconditionally on drop.
pub struct TaskSlot {
    occupant: Option<Occupant>,
}

impl TaskSlot {
    pub fn new() -> Self {
        Self { occupant: None }
    }

    pub fn is_occupied(&self) -> bool {
        self.occupant.is_some()
    }

    /// Spawn `task` on a new worker thread if the slot is empty.
    ///
    /// The caller must treat [`TaskSlotError::Busy`] as "do not spawn":
    /// inform the user and resolve the requesting flow as though it had
    /// completed, so no window is left waiting for a response that will
    /// never come.
    pub fn try_submit<F>(&mut self, name: &str, task: F) -> Result<(), TaskSlotError>
    where
        F: FnOnce(CompletionToken) + Send + 'static,
    {
        if self.occupant.is_some() {
            tracing::warn!(task = name, "task slot occupied, rejecting submission");
            return Err(TaskSlotError::Busy);
        }

        let done = Arc::new(AtomicBool::new(false));
        let task_done = Arc::clone(&done);
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                task(CompletionToken {
                    done: Arc::clone(&task_done),
                });
                // Backstop for tasks that returned without completing.
                task_done.store(true, Ordering::Release);
            })?;

        tracing::debug!(task = name, "worker thread started");
        self.occupant = Some(Occupant { handle, done });
        Ok(())
    }

    /// Join and release the worker, provided it has completed.
    ///
    /// Call only from the GUI thread, in response to a completion or error
    /// notification. When the worker has marked completion the join is
    /// effectively non-blocking (the thread is finished or finishing) and
    /// `retire` returns true. When the slot is empty, or the notification
    /// was a collapse while a task is still in flight, nothing is joined
    /// and `retire` returns false.
    pub fn retire(&mut self) -> bool {
        match self.occupant.take() {
            None => false,
            Some(occupant) if occupant.done.load(Ordering::Acquire) => {
                if occupant.handle.join().is_err() {
                    tracing::error!("worker thread panicked before completing");
                }
                true
            }
            Some(occupant) => {
                self.occupant = Some(occupant);
                false
            }
        }
    }
}

impl Default for TaskSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TaskSlot {
    fn drop(&mut self) {
        if let Some(occupant) = self.occupant.take() {
            tracing::debug!("joining in-flight worker thread on teardown");
            if occupant.handle.join().is_err() {
                tracing::error!("worker thread panicked during teardown join");
            }
        }
    }
}
