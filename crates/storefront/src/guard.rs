use std::sync::atomic::{AtomicBool, Ordering};

/// Holds a single-flight flag for as long as it lives.
///
/// Only one guard per flag can exist at a time. The flag is released on drop,
/// so an operation that errors, panics or is abandoned mid-await still frees
/// the controls.
#[derive(Debug)]
pub struct ProcessingGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> ProcessingGuard<'a> {
    /// Sets the flag, or returns `None` if it was already set.
    pub fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for ProcessingGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
