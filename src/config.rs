use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub tracking: TrackingConfig,
    #[serde(default)]
    pub voice: VoiceConfig,
    #[serde(default)]
    pub keys: KeysConfig,
    #[serde(default)]
    pub window: WindowConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            tracking: TrackingConfig::default(),
            voice: VoiceConfig::default(),
            keys: KeysConfig::default(),
            window: WindowConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Self {
        let path = Path::new("config.toml");
        if path.exists() {
            fs::read_to_string(path)
                .ok()
                .and_then(|s| toml::from_str(&s).ok())
                .unwrap_or_default()
        } else {
            Config::default()
        }
    }
}

// ============================================================================
// Camera Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CameraConfig {
    /// Camera device index (see `eyemouse devices`)
    #[serde(default)]
    pub index: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self { index: 0 }
    }
}

// ============================================================================
// Tracking Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct TrackingConfig {
    /// Face mesh ONNX model path
    #[serde(default = "default_mesh_model")]
    pub model: String,

    /// Minimum face score below which a frame counts as "no face"
    #[serde(default = "default_min_face_confidence")]
    pub min_face_confidence: f32,

    /// Normalized lid gap below which a blink registers as a click.
    /// Sensitive to camera distance and resolution; there is no
    /// calibration, only this default.
    #[serde(default = "default_blink_threshold")]
    pub blink_threshold: f32,

    /// Pause after an injected click, so a sustained blink fires once
    #[serde(default = "default_click_cooldown")]
    pub click_cooldown_ms: u64,
}

impl Default for TrackingConfig {
    fn default() -> Self {
        Self {
            model: default_mesh_model(),
            min_face_confidence: default_min_face_confidence(),
            blink_threshold: default_blink_threshold(),
            click_cooldown_ms: default_click_cooldown(),
        }
    }
}

fn default_mesh_model() -> String {
    "models/face_landmarker.onnx".into()
}

fn default_min_face_confidence() -> f32 {
    0.5
}

fn default_blink_threshold() -> f32 {
    0.004
}

fn default_click_cooldown() -> u64 {
    500
}

// ============================================================================
// Voice Config
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct VoiceConfig {
    /// Enable the voice command channel
    #[serde(default = "default_voice_enabled")]
    pub enabled: bool,

    /// Silero VAD model path; energy-based detection if missing
    #[serde(default = "default_vad_model")]
    pub vad_model: String,

    /// Parakeet transcriber model directory
    #[serde(default = "default_transcriber_model")]
    pub transcriber_model: String,

    /// Pixels moved by "move up/down/left/right"
    #[serde(default = "default_move_step")]
    pub move_step: i32,

    /// Scroll magnitude for "scroll up/down/left/right"
    #[serde(default = "default_scroll_amount")]
    pub scroll_amount: i32,

    /// Hard cap on a single utterance
    #[serde(default = "default_max_utterance")]
    pub max_utterance_secs: u32,

    /// Trailing silence that ends an utterance
    #[serde(default = "default_silence_ms")]
    pub silence_ms: u32,

    /// Ambient-noise calibration window before listening starts
    #[serde(default = "default_calibration_secs")]
    pub calibration_secs: u32,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            enabled: default_voice_enabled(),
            vad_model: default_vad_model(),
            transcriber_model: default_transcriber_model(),
            move_step: default_move_step(),
            scroll_amount: default_scroll_amount(),
            max_utterance_secs: default_max_utterance(),
            silence_ms: default_silence_ms(),
            calibration_secs: default_calibration_secs(),
        }
    }
}

fn default_voice_enabled() -> bool {
    true
}

fn default_vad_model() -> String {
    "models/silero_vad_v4.onnx".into()
}

fn default_transcriber_model() -> String {
    "models/parakeet-tdt-0.6b-v3-int8".into()
}

fn default_move_step() -> i32 {
    50
}

fn default_scroll_amount() -> i32 {
    100
}

fn default_max_utterance() -> u32 {
    3
}

fn default_silence_ms() -> u32 {
    500
}

fn default_calibration_secs() -> u32 {
    1
}

// ============================================================================
// Keys Config
// ============================================================================

#[derive(Debug, Deserialize, Clone)]
pub struct KeysConfig {
    /// Toggle between gaze control and normal mouse
    #[serde(default = "default_mode_key")]
    pub mode: String,
    /// Toggle landmark overlay visibility
    #[serde(default = "default_overlay_key")]
    pub overlay: String,
    /// Request shutdown
    #[serde(default = "default_quit_key")]
    pub quit: String,
}

impl Default for KeysConfig {
    fn default() -> Self {
        Self {
            mode: default_mode_key(),
            overlay: default_overlay_key(),
            quit: default_quit_key(),
        }
    }
}

fn default_mode_key() -> String {
    "m".into()
}

fn default_overlay_key() -> String {
    "t".into()
}

fn default_quit_key() -> String {
    "q".into()
}

// ============================================================================
// Window Config
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
        }
    }
}

fn default_title() -> String {
    "Mouse Control".into()
}
