//! Graceful shutdown for the front controller.
//!
//! A [`Shutdown`] is a latch: once triggered it stays triggered, and every
//! future handed out by [`Shutdown::signal`] resolves, including ones created
//! after the trigger.

use std::future::Future;

use tokio::sync::watch;

pub struct Shutdown {
    stopped: watch::Sender<bool>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (stopped, _) = watch::channel(false);
        Self { stopped }
    }

    /// Request shutdown. Calling it again is a no-op.
    pub fn trigger(&self) {
        self.stopped.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.stopped.borrow()
    }

    /// Future for `axum::serve(..).with_graceful_shutdown`: resolves on
    /// Ctrl+C, on [`trigger`](Self::trigger), or when this `Shutdown` is dropped.
    pub fn signal(&self) -> impl Future<Output = ()> + Send + 'static {
        let rx = self.stopped.subscribe();
        async move {
            tokio::select! {
                result = tokio::signal::ctrl_c() => match result {
                    Ok(()) => tracing::info!("Ctrl+C received"),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to listen for Ctrl+C, waiting for shutdown trigger");
                        triggered(rx).await;
                    }
                },
                _ = triggered(rx.clone()) => tracing::info!("Shutdown triggered"),
            }
        }
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

async fn triggered(mut rx: watch::Receiver<bool>) {
    loop {
        let stopped = *rx.borrow_and_update();
        if stopped || rx.changed().await.is_err() {
            return;
        }
    }
}
