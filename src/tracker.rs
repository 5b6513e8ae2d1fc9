//! Per-frame decision logic: landmarks in, cursor target and click signal out.
//!
//! Deliberately pure - no OS calls, no drawing. The main loop applies the
//! decision through `pointer` and `window`.

use crate::mesh::{IRIS_RING, LEFT_EYE_LIDS, Landmark};

/// Iris center used as the gaze proxy
pub const CURSOR_LANDMARK: usize = 475;

/// What one frame asks of the OS
#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
    /// Absolute screen target for the cursor, if gaze control applies
    pub cursor: Option<(f64, f64)>,
    /// A blink closed below the threshold this frame
    pub should_click: bool,
    /// A face was visible
    pub face: bool,
}

impl Decision {
    fn idle(face: bool) -> Self {
        Self {
            cursor: None,
            should_click: false,
            face,
        }
    }
}

/// Overlay marker in normalized frame coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub x: f32,
    pub y: f32,
    pub rgb: u32,
}

const IRIS_COLOR: u32 = 0x00ff00;
const LID_COLOR: u32 = 0xffff00;

/// Decide what this frame does to the cursor.
///
/// Gaze off or no face: nothing moves, nothing clicks. Otherwise the cursor
/// target tracks the iris center every frame, unconditionally - there is no
/// deadzone and no smoothing. The blink signal is the raw lid gap against a
/// fixed threshold; it varies with camera distance, and nothing here
/// compensates for that.
pub fn decide(
    landmarks: Option<&[Landmark]>,
    eye_control: bool,
    screen: (f64, f64),
    blink_threshold: f32,
) -> Decision {
    if !eye_control {
        return Decision::idle(false);
    }

    let Some(landmarks) = landmarks else {
        return Decision::idle(false);
    };

    Decision {
        cursor: Some(cursor_target(&landmarks[CURSOR_LANDMARK], screen)),
        should_click: lid_gap(landmarks) < blink_threshold,
        face: true,
    }
}

/// Scale a normalized landmark to screen coordinates, clamped to the screen
pub fn cursor_target(lm: &Landmark, (screen_w, screen_h): (f64, f64)) -> (f64, f64) {
    let x = (screen_w * lm.x as f64).clamp(0.0, screen_w);
    let y = (screen_h * lm.y as f64).clamp(0.0, screen_h);
    (x, y)
}

/// Vertical gap between the left-eye lower and upper lid landmarks
pub fn lid_gap(landmarks: &[Landmark]) -> f32 {
    let [lower, upper] = LEFT_EYE_LIDS;
    landmarks[lower].y - landmarks[upper].y
}

/// Marker overlay for the preview window: iris ring green, lids yellow
pub fn markers(landmarks: &[Landmark]) -> Vec<Marker> {
    let iris = IRIS_RING.iter().map(|&i| (i, IRIS_COLOR));
    let lids = LEFT_EYE_LIDS.iter().map(|&i| (i, LID_COLOR));
    iris.chain(lids)
        .map(|(i, rgb)| Marker {
            x: landmarks[i].x,
            y: landmarks[i].y,
            rgb,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::LANDMARK_COUNT;

    const THRESHOLD: f32 = 0.004;

    fn face() -> Vec<Landmark> {
        vec![
            Landmark {
                x: 0.5,
                y: 0.5,
                z: 0.0
            };
            LANDMARK_COUNT
        ]
    }

    fn face_with_gap(gap: f32) -> Vec<Landmark> {
        let mut lm = face();
        let [lower, upper] = LEFT_EYE_LIDS;
        lm[upper].y = 0.4;
        lm[lower].y = 0.4 + gap;
        lm
    }

    #[test]
    fn test_blink_below_threshold_clicks() {
        let lm = face_with_gap(0.003);
        let d = decide(Some(&lm), true, (1920.0, 1080.0), THRESHOLD);
        assert!(d.should_click);
    }

    #[test]
    fn test_gap_at_or_above_threshold_does_not_click() {
        for gap in [0.004, 0.01, 0.1] {
            let lm = face_with_gap(gap);
            let d = decide(Some(&lm), true, (1920.0, 1080.0), THRESHOLD);
            assert!(!d.should_click, "gap {} should not click", gap);
        }
    }

    #[test]
    fn test_cursor_target_scales_and_clamps() {
        for &(w, h) in &[(1920.0, 1080.0), (1280.0, 720.0), (800.0, 600.0)] {
            for &(x, y) in &[(0.0, 0.0), (0.25, 0.75), (0.5, 0.5), (1.0, 1.0)] {
                let lm = Landmark { x, y, z: 0.0 };
                let (tx, ty) = cursor_target(&lm, (w, h));
                assert_eq!(tx, (w * x as f64).clamp(0.0, w));
                assert_eq!(ty, (h * y as f64).clamp(0.0, h));
                assert!(tx >= 0.0 && tx <= w);
                assert!(ty >= 0.0 && ty <= h);
            }
        }
    }

    #[test]
    fn test_cursor_follows_iris_landmark() {
        let mut lm = face();
        lm[CURSOR_LANDMARK] = Landmark {
            x: 0.25,
            y: 0.75,
            z: 0.0,
        };
        let d = decide(Some(&lm), true, (1000.0, 800.0), THRESHOLD);
        assert_eq!(d.cursor, Some((250.0, 600.0)));
    }

    #[test]
    fn test_eye_control_off_never_moves_or_clicks() {
        let lm = face_with_gap(0.0);
        let d = decide(Some(&lm), false, (1920.0, 1080.0), THRESHOLD);
        assert_eq!(d.cursor, None);
        assert!(!d.should_click);
    }

    #[test]
    fn test_no_face_is_idle() {
        let d = decide(None, true, (1920.0, 1080.0), THRESHOLD);
        assert_eq!(d.cursor, None);
        assert!(!d.should_click);
        assert!(!d.face);
    }

    #[test]
    fn test_markers_cover_iris_and_lids() {
        let lm = face();
        let markers = markers(&lm);
        assert_eq!(markers.len(), IRIS_RING.len() + LEFT_EYE_LIDS.len());
        assert_eq!(markers.iter().filter(|m| m.rgb == IRIS_COLOR).count(), 4);
        assert_eq!(markers.iter().filter(|m| m.rgb == LID_COLOR).count(), 2);
    }
}
