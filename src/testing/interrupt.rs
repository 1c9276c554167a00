//! Operator interrupt handling
//!
//! `Interrupt` is a one-shot cancellation token. The run loop checks it
//! before each test and races it against the in-flight emulator.

use tokio::sync::watch;

/// Trips an `Interrupt`
#[derive(Debug, Clone)]
pub struct InterruptHandle {
    tx: watch::Sender<bool>,
}

impl InterruptHandle {
    /// Request that the run stop. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }
}

/// Cancellation token observed by the run loop
#[derive(Debug, Clone)]
pub struct Interrupt {
    rx: watch::Receiver<bool>,
}

impl Interrupt {
    /// Create a token and the handle that trips it
    pub fn new() -> (InterruptHandle, Interrupt) {
        let (tx, rx) = watch::channel(false);
        (InterruptHandle { tx }, Interrupt { rx })
    }

    /// Token that never fires
    pub fn never() -> Interrupt {
        let (handle, interrupt) = Self::new();
        // Dropping the sender leaves the value at false forever
        drop(handle);
        interrupt
    }

    /// Token tripped by Ctrl-C (SIGINT)
    ///
    /// Spawns a background task on the current tokio runtime.
    pub fn on_ctrl_c() -> Interrupt {
        let (handle, interrupt) = Self::new();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Received Ctrl-C, stopping the run");
                    handle.trigger();
                }
                Err(e) => tracing::warn!(error = %e, "Could not listen for Ctrl-C"),
            }
        });
        interrupt
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once the interrupt fires; pend forever if it never can
    pub async fn triggered(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|tripped| *tripped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
