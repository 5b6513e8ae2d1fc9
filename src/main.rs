mod camera;
mod command;
mod config;
mod keys;
mod mesh;
mod pointer;
mod state;
mod tracker;
mod ui;
mod vad;
mod voice;
mod window;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use image::imageops;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::thread;
use std::time::Duration;

use camera::Camera;
use config::Config;
use mesh::FaceMesh;
use pointer::Pointer;
use state::{ControlState, Mailbox};
use window::PreviewWindow;

#[derive(Parser)]
#[command(name = "eyemouse")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Disable the voice command channel
    #[arg(long)]
    no_voice: bool,

    /// Camera device index override
    #[arg(long)]
    camera: Option<u32>,
}

#[derive(Subcommand)]
enum Command {
    /// List attached camera devices
    Devices,
}

#[hotpath::main]
fn main() -> Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Command::Devices)) {
        for (index, name) in camera::list()? {
            println!("  [{}] {}", index, name);
        }
        return Ok(());
    }

    let mut config = Config::load();
    if cli.no_voice {
        config.voice.enabled = false;
    }
    if let Some(index) = cli.camera {
        config.camera.index = index;
    }

    run(config)
}

fn run(config: Config) -> Result<()> {
    let state = ControlState::new();
    let mailbox = Arc::new(Mailbox::new());

    let ctrlc_state = state.clone();
    ctrlc::set_handler(move || ctrlc_state.request_stop())?;

    // Fatal before the loop: camera, mesh model, injection backend
    let mut camera = Camera::open(config.camera.index)?;
    let mut mesh = FaceMesh::load(&config.tracking.model, config.tracking.min_face_confidence)
        .context("Failed to initialize face mesh")?;
    let mut pointer = Pointer::new().context("Failed to initialize input injection")?;
    let (screen_w, screen_h) = pointer.screen_size()?;
    let screen = (screen_w as f64, screen_h as f64);

    println!(
        "Camera: {} ({}x{})",
        camera.name(),
        camera.width(),
        camera.height()
    );
    println!("Screen: {}x{}", screen_w, screen_h);
    ui::banner(&config);

    keys::start_key_listener(config.keys.clone(), state.clone());

    let voice_handles = if config.voice.enabled {
        voice::spawn_voice_pipeline(config.voice.clone(), state.clone(), mailbox.clone())
    } else {
        state.set_voice_status("Voice control disabled");
        Vec::new()
    };

    let mut window = PreviewWindow::new(&config.window.title, camera.width(), camera.height())?;
    let cooldown = Duration::from_millis(config.tracking.click_cooldown_ms);
    let mut last_status = String::new();

    while state.is_running() {
        if !window.is_open() {
            eprintln!("Preview window closed");
            break;
        }

        let frame = match camera.frame() {
            Ok(frame) => frame,
            Err(e) => {
                eprintln!("Failed to capture frame: {}", e);
                break;
            }
        };
        // Mirror so on-screen motion matches the operator's own
        let frame = imageops::flip_horizontal(&frame);

        let eye_control = state.eye_control.load(Ordering::SeqCst);
        let landmarks = if eye_control {
            match mesh.detect(&frame) {
                Ok(landmarks) => landmarks,
                Err(e) => {
                    eprintln!("Error processing frame: {}", e);
                    None
                }
            }
        } else {
            None
        };

        let decision = tracker::decide(
            landmarks.as_deref(),
            eye_control,
            screen,
            config.tracking.blink_threshold,
        );

        if let Some((x, y)) = decision.cursor {
            if let Err(e) = pointer.move_to(x, y) {
                eprintln!("Cursor move failed: {}", e);
            }
        }

        if eye_control && decision.should_click {
            match pointer.click() {
                Ok(()) => eprintln!("Click executed"),
                Err(e) => eprintln!("Click failed: {}", e),
            }
            // One sustained blink, one click
            thread::sleep(cooldown);
        }

        if let Some(spoken) = mailbox.take() {
            if let Some(action) = command::parse(&spoken) {
                if let Err(e) = pointer.apply(
                    action,
                    config.voice.move_step,
                    config.voice.scroll_amount,
                    (screen_w, screen_h),
                ) {
                    eprintln!("Voice action failed: {}", e);
                }
            }
        }

        let markers = match (&landmarks, state.show_landmarks.load(Ordering::SeqCst)) {
            (Some(landmarks), true) => tracker::markers(landmarks),
            _ => Vec::new(),
        };
        if let Err(e) = window.show(&frame, &markers) {
            eprintln!("Window update failed: {}", e);
            break;
        }

        ui::show_status(
            &ui::status_line(eye_control, decision.face, &state.voice_status()),
            &mut last_status,
        );
    }

    // STOPPING: release resources exactly once, join the voice workers.
    // The key listener is a daemon and is abandoned with the process.
    state.request_stop();
    ui::clear_status();
    drop(window);
    drop(camera);
    for handle in voice_handles {
        let _ = handle.join();
    }
    println!("Program terminated");
    Ok(())
}
