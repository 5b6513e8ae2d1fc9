//! Face mesh landmark provider - ONNX attention-mesh inference via ort
//!
//! The model takes one RGB image and returns 478 landmarks (the classic
//! 468-point mesh plus the refined 10-point iris rings) and a face score.
//! Landmarks come back normalized to [0,1] of the input frame. Everything
//! downstream only ever reads six of them.

use anyhow::{Result, anyhow};
use image::RgbImage;
use image::imageops::{self, FilterType};
use ndarray::Array;
use ort::session::Session;
use ort::value::Value;
use std::path::Path;

/// Landmarks produced by the attention mesh
pub const LANDMARK_COUNT: usize = 478;

/// Iris ring around the left pupil
pub const IRIS_RING: [usize; 4] = [474, 475, 476, 477];

/// Left-eye lower and upper lid, the blink pair
pub const LEFT_EYE_LIDS: [usize; 2] = [145, 159];

/// Model input edge length in pixels
const INPUT_SIZE: u32 = 192;

/// Normalized facial keypoint
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

pub struct FaceMesh {
    session: Session,
    input_name: String,
    output_names: Vec<String>,
    min_confidence: f32,
}

impl FaceMesh {
    pub fn load(model_path: impl AsRef<Path>, min_confidence: f32) -> Result<Self> {
        let model_path = model_path.as_ref();
        if !model_path.exists() {
            return Err(anyhow!(
                "Face mesh model not found: {}",
                model_path.display()
            ));
        }

        let session = Session::builder()?.commit_from_file(model_path)?;
        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .ok_or_else(|| anyhow!("Face mesh model has no inputs"))?;
        let output_names = session.outputs.iter().map(|o| o.name.clone()).collect();

        Ok(Self {
            session,
            input_name,
            output_names,
            min_confidence,
        })
    }

    /// Run the mesh over one frame. Returns None when no face clears the
    /// confidence gate - a normal per-frame outcome, not an error.
    #[hotpath::measure]
    pub fn detect(&mut self, frame: &RgbImage) -> Result<Option<Vec<Landmark>>> {
        let tensor = preprocess(frame);
        let value = Value::from_array(tensor)?;
        let outputs = self
            .session
            .run(ort::inputs! { self.input_name.as_str() => &value })?;

        // The export carries a landmark tensor and a face-flag scalar;
        // output order is not stable across exports, so sort by size.
        let mut landmarks: Option<Vec<f32>> = None;
        let mut score = 1.0f32;
        for name in &self.output_names {
            let (_, data) = outputs[name.as_str()].try_extract_tensor::<f32>()?;
            if data.len() >= LANDMARK_COUNT * 3 {
                landmarks = Some(data.to_vec());
            } else if let Some(&raw) = data.first() {
                score = face_score(raw);
            }
        }

        let Some(raw) = landmarks else {
            return Ok(None);
        };
        if score < self.min_confidence {
            return Ok(None);
        }

        let scale = INPUT_SIZE as f32;
        let points = raw
            .chunks_exact(3)
            .take(LANDMARK_COUNT)
            .map(|p| Landmark {
                x: p[0] / scale,
                y: p[1] / scale,
                z: p[2] / scale,
            })
            .collect();
        Ok(Some(points))
    }
}

/// Resize to the model input and scale pixels to [0,1], NHWC
fn preprocess(frame: &RgbImage) -> ndarray::Array4<f32> {
    let resized = imageops::resize(frame, INPUT_SIZE, INPUT_SIZE, FilterType::Triangle);
    let side = INPUT_SIZE as usize;
    let data: Vec<f32> = resized.into_raw().iter().map(|&b| b as f32 / 255.0).collect();
    Array::from_shape_vec((1, side, side, 3), data)
        .expect("resized frame matches model input shape")
}

/// The face flag is a logit in some exports and a probability in others
fn face_score(raw: f32) -> f32 {
    if (0.0..=1.0).contains(&raw) {
        raw
    } else {
        1.0 / (1.0 + (-raw).exp())
    }
}
