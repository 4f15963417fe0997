//! Cooperative shutdown on Ctrl-C
//!
//! The handler never touches the aggregate or the filesystem. It only flips
//! cancellation tokens; the scheduler observes them and the coordinator
//! performs the single flush once dispatch has stopped.
//!
//! | Trigger | Effect |
//! |---------|--------|
//! | first  | `drain`: no new work items are dispatched, in-flight items finish |
//! | second | `abort`: in-flight items are abandoned so the flush happens promptly |
//! | later  | ignored |

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Pair of cancellation tokens threaded through the scheduler
#[derive(Debug, Clone, Default)]
pub struct Shutdown {
    drain: CancellationToken,
    abort: CancellationToken,
}

impl Shutdown {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stop dispatching new work items
    pub fn begin_drain(&self) {
        self.drain.cancel();
    }

    /// Abandon in-flight work items; implies draining
    pub fn abort(&self) {
        self.drain.cancel();
        self.abort.cancel();
    }

    pub fn is_draining(&self) -> bool {
        self.drain.is_cancelled()
    }

    pub fn is_aborted(&self) -> bool {
        self.abort.is_cancelled()
    }

    /// Resolves once in-flight work should be abandoned
    pub async fn aborted(&self) {
        self.abort.cancelled().await
    }
}

/// What a trigger did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerAction {
    Drain,
    Abort,
    Ignored,
}

/// Maps interrupt signals onto a [`Shutdown`]
#[derive(Debug)]
pub struct InterruptHandler {
    shutdown: Shutdown,
    triggers: AtomicU32,
}

impl InterruptHandler {
    pub fn new(shutdown: Shutdown) -> Self {
        Self {
            shutdown,
            triggers: AtomicU32::new(0),
        }
    }

    pub fn shutdown(&self) -> &Shutdown {
        &self.shutdown
    }

    /// Registers one interrupt
    pub fn trigger(&self) -> TriggerAction {
        match self.triggers.fetch_add(1, Ordering::SeqCst) {
            0 => {
                tracing::warn!("Received interrupt signal. Finishing in-flight listings and saving partial results...");
                self.shutdown.begin_drain();
                TriggerAction::Drain
            }
            1 => {
                tracing::warn!("Received second interrupt. Abandoning in-flight listings...");
                self.shutdown.abort();
                TriggerAction::Abort
            }
            _ => {
                tracing::debug!("Interrupt ignored; shutdown already in progress");
                TriggerAction::Ignored
            }
        }
    }

    /// Spawns a task that feeds Ctrl-C presses into [`trigger`](Self::trigger)
    ///
    /// The returned handle should be aborted once the run is over.
    pub fn install(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::error!("Failed to listen for interrupt signal: {}", e);
                    return;
                }
                self.trigger();
            }
        })
    }
}
