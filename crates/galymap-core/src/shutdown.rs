//! Cooperative shutdown for the poll loop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Flag set once by a signal handler and observed between ticks.
///
/// `wait` doubles as the tick sleep, so a shutdown request wakes the poller
/// immediately instead of after the rest of the interval.
#[derive(Debug, Default)]
pub struct ShutdownSignal {
    flag: AtomicBool,
    lock: Mutex<()>,
    condvar: Condvar,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn trigger(&self) {
        self.flag.store(true, Ordering::SeqCst);
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.condvar.notify_all();
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn as_atomic(&self) -> &AtomicBool {
        &self.flag
    }

    /// Sleep for up to `timeout`. Returns `true` if shutdown was requested.
    pub fn wait(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);

        while !self.is_shutdown() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            guard = match self.condvar.wait_timeout(guard, deadline - now) {
                Ok((guard, _)) => guard,
                Err(poisoned) => poisoned.into_inner().0,
            };
        }
        self.is_shutdown()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_wait_times_out() {
        let signal = ShutdownSignal::new();
        let start = Instant::now();
        assert!(!signal.wait(Duration::from_millis(20)));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_trigger_wakes_waiter() {
        let signal = Arc::new(ShutdownSignal::new());
        let waiter = {
            let signal = Arc::clone(&signal);
            thread::spawn(move || signal.wait(Duration::from_secs(30)))
        };

        thread::sleep(Duration::from_millis(10));
        signal.trigger();

        assert!(waiter.join().unwrap());
        assert!(signal.is_shutdown());
    }

    #[test]
    fn test_wait_after_trigger_returns_immediately() {
        let signal = ShutdownSignal::new();
        signal.trigger();
        assert!(signal.wait(Duration::from_secs(30)));
        assert!(signal.as_atomic().load(Ordering::SeqCst));
    }
}
