use std::io::Write;

use crate::config::Config;

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const RESET: &str = "\x1b[0m";

/// Compose the per-frame status line
pub fn status_line(eye_control: bool, face: bool, voice_status: &str) -> String {
    let mode = if eye_control { "Eye" } else { "Normal" };
    let face_note = if eye_control && !face {
        " (No Face Detected)"
    } else {
        ""
    };
    format!("Mode: {} Mouse{} | {}", mode, face_note, voice_status)
}

/// Rewrite the status line in place; skips the write when nothing changed.
/// Green while the voice channel is healthy, red otherwise.
pub fn show_status(status: &str, last: &mut String) {
    if status == last {
        return;
    }
    let healthy = {
        let lower = status.to_lowercase();
        lower.contains("ready") || lower.contains("command")
    };
    let color = if healthy { GREEN } else { RED };
    print!("\r\x1b[K{}{}{}", color, status, RESET);
    std::io::stdout().flush().ok();
    *last = status.to_string();
}

pub fn clear_status() {
    print!("\r\x1b[K");
    std::io::stdout().flush().ok();
}

pub fn banner(config: &Config) {
    println!("Starting Mouse Control Program");
    println!(
        "Press '{}' to toggle between Eye Mouse and Normal Mouse",
        config.keys.mode
    );
    println!("Press '{}' to toggle landmark visibility", config.keys.overlay);
    println!("Press '{}' to quit", config.keys.quit);
    if config.voice.enabled {
        println!("Voice commands: 'scroll up', 'scroll down', 'scroll left', 'scroll right',");
        println!("'move up', 'move down', 'move left', 'move right',");
        println!("'left click', 'right click', 'double click'");
    }
}
