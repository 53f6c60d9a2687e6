//! Cancellation for in-flight list loads.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

/// Owner side of a cancellation flag.
///
/// Cloning shares the same flag. Dropping every controller without calling
/// [`AbortController::abort`] leaves signals un-aborted forever.
#[derive(Clone, Debug)]
pub struct AbortController {
    tx: Arc<watch::Sender<bool>>,
}

/// Observer side of a cancellation flag, handed to requests.
#[derive(Clone, Debug)]
pub struct AbortSignal {
    rx: watch::Receiver<bool>,
}

impl Default for AbortController {
    fn default() -> Self {
        Self::new()
    }
}

impl AbortController {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    pub fn signal(&self) -> AbortSignal {
        AbortSignal {
            rx: self.tx.subscribe(),
        }
    }

    pub fn abort(&self) {
        self.tx.send_replace(true);
    }
}

impl AbortSignal {
    pub fn is_aborted(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal is aborted; never resolves otherwise.
    pub async fn aborted(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|aborted| *aborted).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Runs `fut` until it completes or the signal fires.
    ///
    /// Returns `None` when aborted first, including when the signal was
    /// already aborted before the call.
    pub async fn run<F: Future>(&self, fut: F) -> Option<F::Output> {
        if self.is_aborted() {
            return None;
        }
        tokio::select! {
            biased;
            _ = self.aborted() => None,
            out = fut => Some(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_completes_when_not_aborted() {
        let controller = AbortController::new();
        let out = controller.signal().run(async { 7 }).await;
        assert_eq!(out, Some(7));
    }

    #[tokio::test]
    async fn test_run_returns_none_when_already_aborted() {
        let controller = AbortController::new();
        let signal = controller.signal();
        controller.abort();
        assert!(signal.is_aborted());
        assert_eq!(signal.run(async { 7 }).await, None);
    }

    #[tokio::test]
    async fn test_abort_interrupts_pending_future() {
        let controller = AbortController::new();
        let signal = controller.signal();

        let handle = tokio::spawn(async move {
            signal
                .run(tokio::time::sleep(Duration::from_secs(60)))
                .await
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        controller.abort();

        let out = tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .expect("abort should wake the task")
            .unwrap();
        assert!(out.is_none());
    }

    #[tokio::test]
    async fn test_dropped_controller_never_aborts() {
        let signal = AbortController::new().signal();
        let out = signal.run(async { "done" }).await;
        assert_eq!(out, Some("done"));
        assert!(!signal.is_aborted());
    }
}
