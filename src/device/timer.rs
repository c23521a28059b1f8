//! Cooperatively cancellable delay shared by streaming and playback.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

/// Longest uninterrupted sleep; bounds how late a cancel request is noticed.
const SLICE: Duration = Duration::from_millis(5);

/// Delay timer whose waits end early once the shared cancel flag is raised.
#[derive(Debug, Clone, Default)]
pub struct CancellableTimer {
    cancelled: Arc<AtomicBool>,
}

impl CancellableTimer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Timer observing an existing cancel flag.
    pub fn with_handle(cancelled: Arc<AtomicBool>) -> Self {
        Self { cancelled }
    }

    /// Get cancellation handle.
    pub fn cancel_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancelled)
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Clear a previous cancel request.
    pub fn reset(&self) {
        self.cancelled.store(false, Ordering::Release);
    }

    /// Wait for `duration`. Returns `false` if cancelled before it elapsed.
    pub fn sleep(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.is_cancelled() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            thread::sleep((deadline - now).min(SLICE));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_completes() {
        let timer = CancellableTimer::new();
        let start = Instant::now();
        assert!(timer.sleep(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_cancel_from_other_thread() {
        let timer = CancellableTimer::new();
        let handle = timer.cancel_handle();

        let canceller = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            handle.store(true, Ordering::Release);
        });

        let start = Instant::now();
        assert!(!timer.sleep(Duration::from_secs(10)));
        assert!(start.elapsed() < Duration::from_secs(5));
        canceller.join().unwrap();

        timer.reset();
        assert!(!timer.is_cancelled());
        assert!(timer.sleep(Duration::ZERO));
    }
}
