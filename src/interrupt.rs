//! Ctrl+C handling.
//!
//! One process-wide handler is installed at startup. While an
//! `InterruptGuard` is alive it only raises a flag, which the batch loop
//! polls between items. The child `apt-get` shares our process group, so it
//! receives the same signal and ends on its own; we never kill it ourselves.
//! Outside a batch, Ctrl+C leaves the program.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

static BATCH_ACTIVE: AtomicBool = AtomicBool::new(false);
static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Route Ctrl+C through `on_interrupt`. Call once, before any menu.
pub fn install_handler() -> Result<(), ctrlc::Error> {
    ctrlc::set_handler(on_interrupt)
}

fn on_interrupt() {
    if BATCH_ACTIVE.load(Ordering::SeqCst) {
        INTERRUPTED.store(true, Ordering::SeqCst);
        return;
    }
    let mut out = std::io::stdout();
    drop(writeln!(out, "\nExiting... 👋"));
    drop(out.flush());
    std::process::exit(0);
}

/// Marks a batch as running so Ctrl+C stops it instead of exiting.
/// Clears the flag on both ends.
pub struct InterruptGuard {
    _armed: (),
}

impl InterruptGuard {
    pub fn arm() -> Self {
        INTERRUPTED.store(false, Ordering::SeqCst);
        BATCH_ACTIVE.store(true, Ordering::SeqCst);
        Self { _armed: () }
    }

    /// The flag raised by Ctrl+C, suitable for `BatchExecutor::new`
    pub fn flag(&self) -> &'static AtomicBool {
        &INTERRUPTED
    }
}

impl Drop for InterruptGuard {
    fn drop(&mut self) {
        BATCH_ACTIVE.store(false, Ordering::SeqCst);
        INTERRUPTED.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::thread;
    use std::time::{Duration, Instant};

    // The flags are process-wide
    static SERIAL: Mutex<()> = Mutex::new(());

    #[test]
    fn interrupt_during_batch_only_raises_flag() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());

        let guard = InterruptGuard::arm();
        assert!(!guard.flag().load(Ordering::SeqCst));
        on_interrupt();
        assert!(guard.flag().load(Ordering::SeqCst));

        drop(guard);
        assert!(!INTERRUPTED.load(Ordering::SeqCst));
        assert!(!BATCH_ACTIVE.load(Ordering::SeqCst));
    }

    #[test]
    fn sigint_reaches_the_guard_flag() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        install_handler().unwrap();

        let guard = InterruptGuard::arm();
        unsafe {
            libc::raise(libc::SIGINT);
        }
        let deadline = Instant::now() + Duration::from_secs(5);
        while !guard.flag().load(Ordering::SeqCst) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert!(guard.flag().load(Ordering::SeqCst));

        drop(guard);
        assert!(!INTERRUPTED.load(Ordering::SeqCst));
    }

    #[test]
    fn arming_clears_a_stale_flag() {
        let _serial = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        INTERRUPTED.store(true, Ordering::SeqCst);

        let guard = InterruptGuard::arm();
        assert!(!guard.flag().load(Ordering::SeqCst));
    }
}
