use vad_rs::Vad;

const VAD_THRESHOLD: f32 = 0.3;
const VAD_THRESHOLD_END: f32 = 0.25;
const ENERGY_THRESHOLD: f32 = 0.01;
const ENERGY_END_RATIO: f32 = 0.6;
/// Energy floor sits this far above the measured ambient level
const AMBIENT_MARGIN: f32 = 2.5;

pub enum VadEngine {
    Silero(Vad),
    Energy { threshold: f32 },
}

impl VadEngine {
    pub fn silero(model_path: &str, sample_rate: usize) -> Result<Self, String> {
        let vad = Vad::new(model_path, sample_rate).map_err(|e| e.to_string())?;
        Ok(VadEngine::Silero(vad))
    }

    pub fn energy() -> Self {
        VadEngine::Energy {
            threshold: ENERGY_THRESHOLD,
        }
    }

    /// Raise the energy floor from a window of ambient audio. The Silero
    /// model needs no calibration; for it this is a no-op.
    pub fn calibrate_ambient(&mut self, samples: &[f32]) {
        if let VadEngine::Energy { threshold } = self {
            let ambient = rms(samples);
            *threshold = (ambient * AMBIENT_MARGIN).max(ENERGY_THRESHOLD);
        }
    }

    pub fn is_speech(&mut self, frame: &[f32], currently_speaking: bool) -> bool {
        match self {
            VadEngine::Silero(vad) => {
                let threshold = if currently_speaking {
                    VAD_THRESHOLD_END
                } else {
                    VAD_THRESHOLD
                };
                vad.compute(frame)
                    .map(|r| r.prob > threshold)
                    .unwrap_or(false)
            }
            VadEngine::Energy { threshold } => {
                let threshold = if currently_speaking {
                    *threshold * ENERGY_END_RATIO
                } else {
                    *threshold
                };
                rms(frame) > threshold
            }
        }
    }

    pub fn reset(&mut self) {
        if let VadEngine::Silero(vad) = self {
            vad.reset();
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            VadEngine::Silero(_) => "Silero",
            VadEngine::Energy { .. } => "Energy",
        }
    }
}

fn rms(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    (samples.iter().map(|&s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tone(amplitude: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| amplitude * (i as f32 * 0.3).sin())
            .collect()
    }

    #[test]
    fn test_energy_detects_loud_frames() {
        let mut vad = VadEngine::energy();
        assert!(vad.is_speech(&tone(0.5, 480), false));
        assert!(!vad.is_speech(&vec![0.0; 480], false));
    }

    #[test]
    fn test_ambient_calibration_raises_floor() {
        let mut vad = VadEngine::energy();
        let ambient = tone(0.05, 16000);
        // Quiet speech over loud ambient noise should no longer trigger
        assert!(vad.is_speech(&tone(0.05, 480), false));
        vad.calibrate_ambient(&ambient);
        assert!(!vad.is_speech(&tone(0.05, 480), false));
        assert!(vad.is_speech(&tone(0.5, 480), false));
    }

    #[test]
    fn test_calibration_never_lowers_default_floor() {
        let mut vad = VadEngine::energy();
        vad.calibrate_ambient(&vec![0.0; 16000]);
        assert!(!vad.is_speech(&tone(0.005, 480), false));
    }

    #[test]
    fn test_hysteresis_keeps_fading_speech() {
        let mut vad = VadEngine::energy();
        let fading = tone(0.0095, 480);
        assert!(!vad.is_speech(&fading, false));
        assert!(vad.is_speech(&fading, true));
    }
}
