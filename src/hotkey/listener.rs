//! Dedicated OS-thread hotkey listener using `rdev::listen`.
//!
//! `rdev::listen` has no graceful shutdown API.  Dropping the
//! [`HotkeyListener`] sets a stop flag so the callback discards further
//! events; the thread itself stays blocked in rdev until the process exits.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::mpsc;

use crate::assistant::AssistantCommand;

use super::{HotkeyBindings, HotkeyEvent};

/// Handle to a running hotkey listener thread.
pub struct HotkeyListener {
    stop: Arc<AtomicBool>,
    _thread: std::thread::JoinHandle<()>,
}

/// Filters key auto-repeat: one event per physical press.
#[derive(Debug, Default)]
pub(crate) struct PressTracker {
    held: Vec<rdev::Key>,
}

impl PressTracker {
    pub(crate) fn on_event(
        &mut self,
        bindings: &HotkeyBindings,
        event: &rdev::EventType,
    ) -> Option<HotkeyEvent> {
        match event {
            rdev::EventType::KeyPress(key) => {
                let hotkey = bindings.event_for(*key)?;
                if self.held.contains(key) {
                    return None;
                }
                self.held.push(*key);
                Some(hotkey)
            }
            rdev::EventType::KeyRelease(key) => {
                self.held.retain(|k| k != key);
                None
            }
            _ => None,
        }
    }
}

impl HotkeyListener {
    /// Spawn the listener thread.  Commands are forwarded on `tx` with
    /// `blocking_send`, which is safe from a non-async thread.
    ///
    /// # Panics
    ///
    /// Panics if the OS refuses to create the thread.
    pub fn start(bindings: HotkeyBindings, tx: mpsc::Sender<AssistantCommand>) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let stop_flag = Arc::clone(&stop);

        let thread = std::thread::Builder::new()
            .name("hotkey-listener".into())
            .spawn(move || {
                let mut tracker = PressTracker::default();
                let result = rdev::listen(move |event| {
                    if stop_flag.load(Ordering::Relaxed) {
                        return;
                    }
                    if let Some(hotkey) = tracker.on_event(&bindings, &event.event_type) {
                        log::debug!("hotkey: {hotkey:?}");
                        let _ = tx.blocking_send(hotkey.command());
                    }
                });

                if let Err(e) = result {
                    log::error!("hotkey-listener: rdev::listen exited with error: {:?}", e);
                }
            })
            .expect("failed to spawn hotkey-listener thread");

        log::info!(
            "hotkey: talk = {:?}, pause = {:?}",
            bindings.talk,
            bindings.pause
        );
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
