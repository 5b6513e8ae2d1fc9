//! Shared runtime state - centralized, thread-safe state accessible from all components
//!
//! Single-writer discipline: the key listener owns the mode flags, the voice
//! pipeline owns the mailbox and the status string. `running` is the one
//! exception - the key listener, the Ctrl+C handler, and the main loop's
//! fatal-error path may all clear it, and clearing is idempotent.

use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared control state - accessible from all components
///
/// Mode flags use atomic operations for lock-free reads on the frame path.
/// Readers tolerate staleness of one frame.
pub struct ControlState {
    /// Gaze drives the cursor (toggled by the mode key)
    pub eye_control: AtomicBool,
    /// Landmark markers drawn in the preview window (toggled by the overlay key)
    pub show_landmarks: AtomicBool,
    /// Main loop keeps iterating; cleared to request shutdown
    pub running: AtomicBool,
    /// Human-readable voice channel state, last writer wins
    voice_status: Mutex<String>,
}

impl ControlState {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            eye_control: AtomicBool::new(true),
            show_landmarks: AtomicBool::new(true),
            running: AtomicBool::new(true),
            voice_status: Mutex::new("Initializing...".to_string()),
        })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn request_stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// Toggle gaze control, returns new state
    pub fn toggle_eye_control(&self) -> bool {
        let new_state = !self.eye_control.load(Ordering::SeqCst);
        self.eye_control.store(new_state, Ordering::SeqCst);
        new_state
    }

    /// Toggle landmark overlay, returns new state
    pub fn toggle_landmarks(&self) -> bool {
        let new_state = !self.show_landmarks.load(Ordering::SeqCst);
        self.show_landmarks.store(new_state, Ordering::SeqCst);
        new_state
    }

    pub fn set_voice_status(&self, status: impl Into<String>) {
        if let Ok(mut s) = self.voice_status.lock() {
            *s = status.into();
        }
    }

    pub fn voice_status(&self) -> String {
        self.voice_status
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }
}

impl fmt::Debug for ControlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControlState")
            .field("eye_control", &self.eye_control.load(Ordering::SeqCst))
            .field(
                "show_landmarks",
                &self.show_landmarks.load(Ordering::SeqCst),
            )
            .field("running", &self.running.load(Ordering::SeqCst))
            .field("voice_status", &self.voice_status())
            .finish()
    }
}

/// Type alias for shared state
pub type SharedState = Arc<ControlState>;

/// Single-slot command mailbox with overwrite-on-write semantics.
///
/// The voice pipeline publishes here; the main loop consumes with `take`.
/// A newer command overwrites an unconsumed older one, and a taken command
/// is never redelivered. At-most-once delivery, depth 1.
pub struct Mailbox {
    slot: Mutex<Option<String>>,
}

impl Mailbox {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }

    /// Store a command, replacing any unconsumed one
    pub fn publish(&self, command: impl Into<String>) {
        if let Ok(mut slot) = self.slot.lock() {
            *slot = Some(command.into());
        }
    }

    /// Consume the pending command, leaving the slot empty
    pub fn take(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|mut slot| slot.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_defaults() {
        let state = ControlState::new();
        assert!(state.eye_control.load(Ordering::SeqCst));
        assert!(state.show_landmarks.load(Ordering::SeqCst));
        assert!(state.is_running());
    }

    #[test]
    fn test_toggle_twice_restores() {
        let state = ControlState::new();

        let original = state.eye_control.load(Ordering::SeqCst);
        state.toggle_eye_control();
        state.toggle_eye_control();
        assert_eq!(state.eye_control.load(Ordering::SeqCst), original);

        let original = state.show_landmarks.load(Ordering::SeqCst);
        state.toggle_landmarks();
        state.toggle_landmarks();
        assert_eq!(state.show_landmarks.load(Ordering::SeqCst), original);
    }

    #[test]
    fn test_stop_observed_within_one_iteration() {
        let state = ControlState::new();
        let mut iterations = 0;

        while state.is_running() {
            iterations += 1;
            state.request_stop();
        }

        assert_eq!(iterations, 1);
    }

    #[test]
    fn test_voice_status_last_writer_wins() {
        let state = ControlState::new();
        state.set_voice_status("Voice control ready");
        state.set_voice_status("Command: scroll up");
        assert_eq!(state.voice_status(), "Command: scroll up");
    }

    #[test]
    fn test_mailbox_overwrites_unconsumed() {
        let mailbox = Mailbox::new();
        mailbox.publish("scroll up");
        mailbox.publish("left click");
        assert_eq!(mailbox.take().as_deref(), Some("left click"));
    }

    #[test]
    fn test_mailbox_take_clears_slot() {
        let mailbox = Mailbox::new();
        mailbox.publish("double click");
        assert!(mailbox.take().is_some());
        assert!(mailbox.take().is_none());
    }
}
