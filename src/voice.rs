//! Voice command pipeline - microphone capture, utterance detection,
//! transcription, mailbox publishing
//!
//! Three worker threads joined at shutdown: capture (owns the cpal stream),
//! segmenter (VAD gating with an ambient-calibration pass), transcriber
//! (Parakeet, publishes lowercased text to the mailbox). A failure to open
//! the microphone or load a model is fatal to these threads only; the rest
//! of the program keeps running with the status line reflecting the loss.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use flume::{Receiver, Sender};
use rubato::{FftFixedIn, Resampler};
use std::path::Path;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use transcribe_rs::{
    TranscriptionEngine,
    engines::parakeet::{ParakeetEngine, ParakeetModelParams},
};

use crate::config::VoiceConfig;
use crate::state::{Mailbox, SharedState};
use crate::vad::VadEngine;

pub const TARGET_RATE: usize = 16000;

// 30ms frames at 16kHz
const VAD_FRAME_SAMPLES: usize = 480;
const RESAMPLE_CHUNK: usize = 1024;
const MIN_UTTERANCE_SAMPLES: usize = TARGET_RATE / 2;

struct FrameResampler {
    resampler: Option<FftFixedIn<f32>>,
    in_buf: Vec<f32>,
    pending: Vec<f32>,
    frame_samples: usize,
}

impl FrameResampler {
    fn new(in_hz: usize, out_hz: usize, frame_samples: usize) -> Self {
        let resampler = (in_hz != out_hz)
            .then(|| FftFixedIn::<f32>::new(in_hz, out_hz, RESAMPLE_CHUNK, 1, 1).unwrap());
        Self {
            resampler,
            in_buf: Vec::with_capacity(RESAMPLE_CHUNK),
            pending: Vec::with_capacity(frame_samples),
            frame_samples,
        }
    }

    fn push(&mut self, src: &[f32], mut emit: impl FnMut(&[f32])) {
        if self.resampler.is_none() {
            self.emit_frames(src, &mut emit);
            return;
        }

        self.in_buf.extend_from_slice(src);

        while self.in_buf.len() >= RESAMPLE_CHUNK {
            let chunk: Vec<f32> = self.in_buf.drain(..RESAMPLE_CHUNK).collect();
            if let Ok(out) = self.resampler.as_mut().unwrap().process(&[&chunk], None) {
                self.emit_frames(&out[0], &mut emit);
            }
        }
    }

    fn emit_frames(&mut self, data: &[f32], emit: &mut impl FnMut(&[f32])) {
        self.pending.extend_from_slice(data);

        while self.pending.len() >= self.frame_samples {
            let frame: Vec<f32> = self.pending.drain(..self.frame_samples).collect();
            emit(&frame);
        }
    }
}

/// Open the default input device and stream mono 16kHz VAD-sized frames
fn start_capture(
    tx: Sender<Vec<f32>>,
) -> Result<cpal::Stream, Box<dyn std::error::Error + Send + Sync>> {
    let host = cpal::default_host();
    let device = host.default_input_device().ok_or("No input device")?;
    let supported = device.default_input_config()?;
    let input_rate = u32::from(supported.sample_rate()) as usize;
    let channels = supported.channels() as usize;

    println!(
        "Mic: {}Hz {}ch -> {}Hz mono",
        input_rate, channels, TARGET_RATE
    );

    let mut resampler = FrameResampler::new(input_rate, TARGET_RATE, VAD_FRAME_SAMPLES);

    let stream = device.build_input_stream(
        &supported.config(),
        move |data: &[f32], _| {
            let mono: Vec<f32> = if channels == 1 {
                data.to_vec()
            } else {
                data.chunks(channels)
                    .map(|c| c.iter().sum::<f32>() / channels as f32)
                    .collect()
            };

            resampler.push(&mono, |frame| {
                let _ = tx.send(frame.to_vec());
            });
        },
        |err| eprintln!("Mic error: {}", err),
        None,
    )?;

    stream.play()?;
    Ok(stream)
}

/// Gate audio frames with VAD and emit finished utterances.
///
/// The first `calibration_secs` of audio sets the ambient energy floor
/// before listening starts. An utterance ends on trailing silence or at the
/// hard cap, whichever comes first.
fn run_segmenter(
    rx: Receiver<Vec<f32>>,
    tx: Sender<Vec<f32>>,
    mut vad: VadEngine,
    config: &VoiceConfig,
    state: &SharedState,
) {
    let silence_threshold_frames =
        ((config.silence_ms as usize * TARGET_RATE) / (1000 * VAD_FRAME_SAMPLES)).max(1);
    let max_samples = config.max_utterance_secs as usize * TARGET_RATE;
    let calibration_samples = config.calibration_secs as usize * TARGET_RATE;

    let mut ambient_buf: Vec<f32> = Vec::with_capacity(calibration_samples);
    let mut calibrated = calibration_samples == 0;
    let mut vad_buf: Vec<f32> = Vec::new();
    let mut speech_buf: Vec<f32> = Vec::new();
    let mut in_speech = false;
    let mut silence_frames: usize = 0;

    if calibrated {
        state.set_voice_status("Voice control ready");
    }

    while state.is_running() {
        match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(samples) => {
                if !calibrated {
                    ambient_buf.extend_from_slice(&samples);
                    if ambient_buf.len() >= calibration_samples {
                        vad.calibrate_ambient(&ambient_buf);
                        ambient_buf.clear();
                        calibrated = true;
                        state.set_voice_status("Voice control ready");
                        eprintln!("Microphone calibrated, listening for commands");
                    }
                    continue;
                }
                vad_buf.extend_from_slice(&samples);
            }
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => break,
        }

        while vad_buf.len() >= VAD_FRAME_SAMPLES {
            let chunk: Vec<f32> = vad_buf.drain(..VAD_FRAME_SAMPLES).collect();
            let is_speech = vad.is_speech(&chunk, in_speech);

            if is_speech {
                silence_frames = 0;
                in_speech = true;
                speech_buf.extend_from_slice(&chunk);
            } else if in_speech {
                silence_frames += 1;
                speech_buf.extend_from_slice(&chunk);
            }

            if in_speech
                && (silence_frames >= silence_threshold_frames || speech_buf.len() >= max_samples)
            {
                if speech_buf.len() >= MIN_UTTERANCE_SAMPLES {
                    let _ = tx.send(std::mem::take(&mut speech_buf));
                } else {
                    speech_buf.clear();
                }
                in_speech = false;
                silence_frames = 0;
                vad.reset();
            }
        }
    }
}

/// Transcribe utterances and publish the lowercased text to the mailbox
fn run_transcriber(
    rx: Receiver<Vec<f32>>,
    model_path: String,
    state: &SharedState,
    mailbox: &Mailbox,
) {
    let mut engine = ParakeetEngine::new();
    if let Err(e) = engine.load_model_with_params(Path::new(&model_path), ParakeetModelParams::int8())
    {
        state.set_voice_status(format!("Voice recognizer init failed: {}", e));
        eprintln!("Voice recognizer init failed: {}", e);
        return;
    }

    while state.is_running() {
        let samples = match rx.recv_timeout(Duration::from_millis(100)) {
            Ok(s) => s,
            Err(flume::RecvTimeoutError::Timeout) => continue,
            Err(flume::RecvTimeoutError::Disconnected) => break,
        };

        match engine.transcribe_samples(samples, None) {
            Ok(result) => {
                let command = result.text.trim().to_lowercase();
                if command.is_empty() {
                    state.set_voice_status("Could not understand audio");
                } else {
                    eprintln!("Voice command detected: {}", command);
                    state.set_voice_status(format!("Command: {}", command));
                    mailbox.publish(command);
                }
            }
            Err(e) => {
                state.set_voice_status(format!("Speech service error: {}", e));
            }
        }
    }
}

/// Wire up and start the voice pipeline threads
pub fn spawn_voice_pipeline(
    config: VoiceConfig,
    state: SharedState,
    mailbox: Arc<Mailbox>,
) -> Vec<JoinHandle<()>> {
    let (audio_tx, audio_rx) = flume::bounded::<Vec<f32>>(100);
    let (utterance_tx, utterance_rx) = flume::bounded::<Vec<f32>>(10);

    let capture_state = state.clone();
    let capture = thread::spawn(move || {
        let _stream = match start_capture(audio_tx) {
            Ok(stream) => stream,
            Err(e) => {
                capture_state.set_voice_status(format!("Microphone init failed: {}", e));
                eprintln!("Microphone initialization failed: {}", e);
                return;
            }
        };

        while capture_state.is_running() {
            thread::sleep(Duration::from_millis(100));
        }
    });

    let segmenter_state = state.clone();
    let segmenter_config = config.clone();
    let segmenter = thread::spawn(move || {
        let vad = if Path::new(&segmenter_config.vad_model).exists() {
            match VadEngine::silero(&segmenter_config.vad_model, TARGET_RATE) {
                Ok(v) => v,
                Err(e) => {
                    eprintln!("Silero VAD failed ({}), using energy-based", e);
                    VadEngine::energy()
                }
            }
        } else {
            eprintln!("VAD model not found, using energy-based");
            VadEngine::energy()
        };
        eprintln!("VAD: {}", vad.name());

        run_segmenter(
            audio_rx,
            utterance_tx,
            vad,
            &segmenter_config,
            &segmenter_state,
        );
    });

    let transcriber_state = state.clone();
    let model_path = config.transcriber_model.clone();
    let transcriber = thread::spawn(move || {
        run_transcriber(utterance_rx, model_path, &transcriber_state, &mailbox);
    });

    vec![capture, segmenter, transcriber]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ControlState;

    fn frames_of(samples: &[f32], n: usize) -> Vec<Vec<f32>> {
        samples.chunks(n).map(|c| c.to_vec()).collect()
    }

    #[test]
    fn test_resampler_passthrough_emits_fixed_frames() {
        let mut resampler = FrameResampler::new(TARGET_RATE, TARGET_RATE, VAD_FRAME_SAMPLES);
        let mut frames = Vec::new();
        resampler.push(&vec![0.1; 1000], |f| frames.push(f.len()));
        resampler.push(&vec![0.1; 1000], |f| frames.push(f.len()));

        assert!(!frames.is_empty());
        assert!(frames.iter().all(|&len| len == VAD_FRAME_SAMPLES));
    }

    #[test]
    fn test_segmenter_emits_utterance_then_stops() {
        let state = ControlState::new();
        let config = VoiceConfig {
            calibration_secs: 0,
            max_utterance_secs: 3,
            silence_ms: 90,
            ..VoiceConfig::default()
        };
        let (audio_tx, audio_rx) = flume::bounded::<Vec<f32>>(100);
        let (utterance_tx, utterance_rx) = flume::bounded::<Vec<f32>>(10);

        // One second of loud tone, then enough silence to close the segment
        let speech: Vec<f32> = (0..TARGET_RATE).map(|i| 0.5 * (i as f32 * 0.3).sin()).collect();
        for frame in frames_of(&speech, VAD_FRAME_SAMPLES) {
            audio_tx.send(frame).unwrap();
        }
        for _ in 0..10 {
            audio_tx.send(vec![0.0; VAD_FRAME_SAMPLES]).unwrap();
        }
        drop(audio_tx);

        run_segmenter(
            audio_rx,
            utterance_tx,
            VadEngine::energy(),
            &config,
            &state,
        );

        let utterance = utterance_rx.try_recv().expect("one utterance emitted");
        assert!(utterance.len() >= MIN_UTTERANCE_SAMPLES);
        assert!(utterance.len() <= config.max_utterance_secs as usize * TARGET_RATE);
    }

    #[test]
    fn test_segmenter_caps_utterance_length() {
        let state = ControlState::new();
        let config = VoiceConfig {
            calibration_secs: 0,
            max_utterance_secs: 1,
            silence_ms: 500,
            ..VoiceConfig::default()
        };
        let (audio_tx, audio_rx) = flume::bounded::<Vec<f32>>(200);
        let (utterance_tx, utterance_rx) = flume::bounded::<Vec<f32>>(10);

        // Four seconds of continuous speech against a one second cap
        let speech: Vec<f32> = (0..4 * TARGET_RATE)
            .map(|i| 0.5 * (i as f32 * 0.3).sin())
            .collect();
        for frame in frames_of(&speech, VAD_FRAME_SAMPLES) {
            audio_tx.send(frame).unwrap();
        }
        drop(audio_tx);

        run_segmenter(
            audio_rx,
            utterance_tx,
            VadEngine::energy(),
            &config,
            &state,
        );

        let cap = config.max_utterance_secs as usize * TARGET_RATE;
        let mut emitted = 0;
        while let Ok(utterance) = utterance_rx.try_recv() {
            emitted += 1;
            assert!(utterance.len() <= cap + VAD_FRAME_SAMPLES);
        }
        assert!(emitted >= 3);
    }

    #[test]
    fn test_segmenter_swallows_short_blips() {
        let state = ControlState::new();
        let config = VoiceConfig {
            calibration_secs: 0,
            silence_ms: 90,
            ..VoiceConfig::default()
        };
        let (audio_tx, audio_rx) = flume::bounded::<Vec<f32>>(100);
        let (utterance_tx, utterance_rx) = flume::bounded::<Vec<f32>>(10);

        // Two VAD frames of noise is far below the minimum utterance
        let blip: Vec<f32> = (0..2 * VAD_FRAME_SAMPLES)
            .map(|i| 0.5 * (i as f32 * 0.3).sin())
            .collect();
        for frame in frames_of(&blip, VAD_FRAME_SAMPLES) {
            audio_tx.send(frame).unwrap();
        }
        for _ in 0..10 {
            audio_tx.send(vec![0.0; VAD_FRAME_SAMPLES]).unwrap();
        }
        drop(audio_tx);

        run_segmenter(
            audio_rx,
            utterance_tx,
            VadEngine::energy(),
            &config,
            &state,
        );

        assert!(utterance_rx.try_recv().is_err());
    }

    #[test]
    fn test_calibration_consumes_leading_audio() {
        let state = ControlState::new();
        let config = VoiceConfig {
            calibration_secs: 1,
            silence_ms: 90,
            ..VoiceConfig::default()
        };
        let (audio_tx, audio_rx) = flume::bounded::<Vec<f32>>(100);
        let (utterance_tx, utterance_rx) = flume::bounded::<Vec<f32>>(10);

        // The calibration window swallows exactly the first second
        let ambient: Vec<f32> = vec![0.001; TARGET_RATE];
        for frame in frames_of(&ambient, VAD_FRAME_SAMPLES) {
            audio_tx.send(frame).unwrap();
        }
        drop(audio_tx);

        run_segmenter(
            audio_rx,
            utterance_tx,
            VadEngine::energy(),
            &config,
            &state,
        );

        assert_eq!(state.voice_status(), "Voice control ready");
        assert!(utterance_rx.try_recv().is_err());
    }
}
