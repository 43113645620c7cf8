//! Shutdown flag shared between the signal handler and the event loop.
//!
//! The interrupt handler only sets the flag; the loop polls it at the top of
//! each iteration and bounds its poll wait so the signal is observed promptly.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cancellation token polled by the event loop.
#[derive(Debug, Clone, Default)]
pub struct ShutdownFlag(Arc<AtomicBool>);

impl ShutdownFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request shutdown. Safe to call from a signal handler.
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Arrange for SIGINT and SIGTERM to set this flag.
    pub fn register_signals(&self) -> io::Result<()> {
        signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&self.0))?;
        signal_hook::flag::register(signal_hook::consts::SIGTERM, Arc::clone(&self.0))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_set_visible_through_clones() {
        let flag = ShutdownFlag::new();
        let other = flag.clone();

        assert!(!other.is_set());
        flag.set();
        assert!(other.is_set());
    }
}
