//! Dedicated OS-thread hotkey listener using `rdev::listen`.
//!
//! `rdev::listen` is a blocking call that must live on its own OS thread.
//! [`HotkeyListener`] owns that thread and a stop flag; dropping it sets the
//! flag so the callback silently ignores further events.
//!
//! # Shutdown caveat
//!
//! `rdev::listen` has **no graceful shutdown API**.  Setting the stop flag
//! prevents events from being forwarded, but the OS thread itself stays
//! blocked in the rdev event loop until the process exits.  rdev holds no
//! resources that need explicit cleanup.
//!
//! On macOS the event tap requires the Accessibility permission; without it
//! `rdev::listen` returns an error, which is logged.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::mpsc;

use super::{Chord, ChordMatcher, HotkeyEvent};

/// Handle to a running hotkey listener thread.
///
/// Construct one with [`HotkeyListener::start`].  Drop it to stop forwarding
/// events.
pub struct HotkeyListener {
    stop: Arc<AtomicBool>,
    /// Kept so the thread is not detached; never joined because
    /// `rdev::listen` never returns.
    _thread: std::thread::JoinHandle<()>,
}

impl HotkeyListener {
    /// Spawn a dedicated OS thread that watches global key events and sends
    /// [`HotkeyEvent::ExportRequested`] on `tx` each time `chord` is struck.
    ///
    /// Uses `try_send`: if the consumer is still busy with a backlog of
    /// requests the extra press is discarded rather than blocking the event
    /// tap.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to create the thread (extremely unlikely).
    pub fn start(chord: Chord, tx: mpsc::Sender<HotkeyEvent>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_clone = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("hotkey-listener".into())
            .spawn(move || {
                let mut matcher = ChordMatcher::new(chord);
                let result = rdev::listen(move |event| {
                    if stop_clone.load(Ordering::Relaxed) {
                        return;
                    }
                    if matcher.handle(&event.event_type) {
                        log::info!("export shortcut detected");
                        if let Err(e) = tx.try_send(HotkeyEvent::ExportRequested) {
                            log::warn!("export request dropped: {e}");
                        }
                    }
                });

                if let Err(e) = result {
                    log::error!("hotkey-listener: rdev::listen exited with error: {:?}", e);
                }
            })
            .expect("failed to spawn hotkey-listener thread");

        Self {
            stop,
            _thread: thread,
        }
    }
}

impl Drop for HotkeyListener {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}
