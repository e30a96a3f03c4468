//! A reusable graceful-shutdown signal, generalized from the pattern each
//! binary in this workspace used to hand-roll: one `oneshot` channel, a
//! `Future` side a server's graceful-shutdown hook can await, and a sender
//! side that is safe to invoke more than once (§8 "shutdown safety" —
//! calling shutdown N times has the same effect as calling it once).

pub struct ShutdownController {
    shutdown: tokio::sync::oneshot::Receiver<()>,
}

#[derive(Clone)]
pub struct ShutdownSignal(std::sync::Arc<std::sync::Mutex<Option<tokio::sync::oneshot::Sender<()>>>>);

impl ShutdownController {
    /// Reacts to SIGINT/SIGTERM from the OS.
    pub fn new_shutdown_on_signal() -> Self {
        let (signal, controller) = Self::new_manual_shutdown();
        tokio::spawn(Self::wait_for_os_signal(signal));
        controller
    }

    /// A controller that can only be triggered by calling
    /// [`ShutdownSignal::shutdown`] explicitly (tests, or a binary composing
    /// its own trigger).
    pub fn new_manual_shutdown() -> (ShutdownSignal, Self) {
        let (sender, receiver) = tokio::sync::oneshot::channel();
        (
            ShutdownSignal(std::sync::Arc::new(std::sync::Mutex::new(Some(sender)))),
            Self { shutdown: receiver },
        )
    }

    async fn wait_for_os_signal(signal: ShutdownSignal) {
        #[cfg(unix)]
        {
            use tokio::signal::unix;
            let mut sigterm = unix::signal(unix::SignalKind::terminate()).expect("install SIGTERM handler");
            tokio::select! {
                _ = tokio::signal::ctrl_c() => tracing::info!("received SIGINT"),
                _ = sigterm.recv() => tracing::info!("received SIGTERM"),
            }
        }
        #[cfg(not(unix))]
        {
            tokio::signal::ctrl_c().await.expect("install CTRL+C handler");
            tracing::info!("received SIGINT");
        }
        signal.shutdown();
    }

    /// Consumes the controller and resolves once shutdown has been
    /// signaled. Suitable as `axum::serve(..).with_graceful_shutdown(...)`'s
    /// future.
    pub async fn wait(self) {
        let _ = self.shutdown.await;
    }
}

impl ShutdownSignal {
    /// Triggers shutdown. Idempotent: a second and subsequent call is a
    /// silent no-op rather than panicking on a consumed `oneshot::Sender`.
    pub fn shutdown(&self) {
        if let Some(sender) = self.0.lock().unwrap().take() {
            let _ = sender.send(());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn manual_shutdown_resolves_the_controller() {
        let (signal, controller) = ShutdownController::new_manual_shutdown();
        signal.shutdown();
        controller.wait().await;
    }

    #[tokio::test]
    async fn shutdown_is_idempotent_across_clones() {
        let (signal, controller) = ShutdownController::new_manual_shutdown();
        let other = signal.clone();
        signal.shutdown();
        other.shutdown();
        controller.wait().await;
    }
}
