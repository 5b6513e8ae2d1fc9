//! Global key listener - translates three bound keys into mode toggles
//! and the shutdown request.
//!
//! Runs on its own thread around rdev's blocking `listen`. rdev offers no
//! way to stop the hook, so the thread is spawned detached and abandoned at
//! process exit; it only ever touches the shared state, which it owns as
//! writer.

use rdev::{Event, EventType, listen};
use std::thread;

use crate::config::KeysConfig;
use crate::state::SharedState;

/// Effect of one bound key press
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    ToggleEyeControl,
    ToggleLandmarks,
    Quit,
}

/// Map a pressed key name to its bound action; unbound keys are ignored
pub fn action_for(name: &str, bindings: &KeysConfig) -> Option<KeyAction> {
    if name.eq_ignore_ascii_case(&bindings.mode) {
        Some(KeyAction::ToggleEyeControl)
    } else if name.eq_ignore_ascii_case(&bindings.overlay) {
        Some(KeyAction::ToggleLandmarks)
    } else if name.eq_ignore_ascii_case(&bindings.quit) {
        Some(KeyAction::Quit)
    } else {
        None
    }
}

fn handle(action: KeyAction, state: &SharedState) {
    match action {
        KeyAction::ToggleEyeControl => {
            let eye = state.toggle_eye_control();
            eprintln!(
                "Switched to {} Mouse",
                if eye { "Eye" } else { "Normal" }
            );
        }
        KeyAction::ToggleLandmarks => {
            let shown = state.toggle_landmarks();
            eprintln!(
                "Landmarks: {}",
                if shown { "Visible" } else { "Hidden" }
            );
        }
        KeyAction::Quit => {
            eprintln!("Quit command received");
            state.request_stop();
        }
    }
}

/// Start the global key listener thread
pub fn start_key_listener(bindings: KeysConfig, state: SharedState) {
    thread::spawn(move || {
        let callback = move |event: Event| {
            if !state.is_running() {
                return;
            }
            if let EventType::KeyPress(_) = event.event_type {
                if let Some(name) = event.name.as_deref() {
                    if let Some(action) = action_for(name, &bindings) {
                        handle(action, &state);
                    }
                }
            }
        };

        // Blocks for the life of the process
        if let Err(e) = listen(callback) {
            eprintln!("Key listener error: {:?}", e);
        }
    });
}
