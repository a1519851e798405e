//! Shutdown flag shared between the OS signal path and the poll loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::signal::unix::{signal, SignalKind};
use tokio::task::JoinHandle;

/// Single boolean cell: cleared once by the signal path, polled by the loop.
#[derive(Debug, Clone)]
pub struct ShutdownFlag {
    running: Arc<AtomicBool>,
}

impl ShutdownFlag {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn request_shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Default for ShutdownFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Listen for SIGINT and SIGTERM and clear `flag` on the first one.
///
/// Must be called from within a Tokio runtime.
pub fn install(flag: ShutdownFlag) -> std::io::Result<JoinHandle<()>> {
    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;

    Ok(tokio::spawn(async move {
        let name = tokio::select! {
            _ = interrupt.recv() => "SIGINT",
            _ = terminate.recv() => "SIGTERM",
        };
        tracing::info!("Received signal {}. Shutting down gracefully...", name);
        flag.request_shutdown();
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_is_shared_between_clones() {
        let flag = ShutdownFlag::new();
        let handle = flag.clone();

        assert!(flag.is_running());
        handle.request_shutdown();
        assert!(!flag.is_running());
    }

    #[tokio::test]
    async fn test_sigterm_clears_flag() {
        let flag = ShutdownFlag::new();
        let task = install(flag.clone()).unwrap();

        nix::sys::signal::raise(nix::sys::signal::Signal::SIGTERM).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();

        assert!(!flag.is_running());
    }

    #[tokio::test]
    async fn test_sigint_clears_flag() {
        let flag = ShutdownFlag::new();
        let task = install(flag.clone()).unwrap();

        nix::sys::signal::raise(nix::sys::signal::Signal::SIGINT).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), task)
            .await
            .unwrap()
            .unwrap();

        assert!(!flag.is_running());
    }
}
