//! Preview window - the mirrored camera frame with landmark markers
//!
//! minifb's `update_with_buffer` doubles as the window's event pump, so the
//! main loop drives it every iteration; `is_open` feeds the stop condition.

use anyhow::Result;
use image::RgbImage;
use minifb::{Window, WindowOptions};

use crate::tracker::Marker;

const MARKER_RADIUS: i32 = 2;

pub struct PreviewWindow {
    window: Window,
    buffer: Vec<u32>,
    width: usize,
    height: usize,
}

impl PreviewWindow {
    pub fn new(title: &str, width: u32, height: u32) -> Result<Self> {
        let width = width as usize;
        let height = height as usize;
        let mut window = Window::new(title, width, height, WindowOptions::default())?;
        // 1ms tick keeps the event pump responsive without pacing the camera
        window.set_target_fps(1000);
        Ok(Self {
            window,
            buffer: vec![0; width * height],
            width,
            height,
        })
    }

    pub fn is_open(&self) -> bool {
        self.window.is_open()
    }

    /// Blit the frame, stamp the markers, pump window events
    pub fn show(&mut self, frame: &RgbImage, markers: &[Marker]) -> Result<()> {
        fill_buffer(&mut self.buffer, frame, self.width, self.height);
        for marker in markers {
            stamp_marker(&mut self.buffer, self.width, self.height, marker);
        }
        self.window
            .update_with_buffer(&self.buffer, self.width, self.height)?;
        Ok(())
    }
}

/// Pack the RGB frame into the window's 0RGB buffer, nearest-neighbor if
/// the sizes disagree
fn fill_buffer(buffer: &mut [u32], frame: &RgbImage, width: usize, height: usize) {
    let (fw, fh) = (frame.width() as usize, frame.height() as usize);
    for y in 0..height {
        let sy = (y * fh / height).min(fh - 1) as u32;
        for x in 0..width {
            let sx = (x * fw / width).min(fw - 1) as u32;
            let p = frame.get_pixel(sx, sy);
            buffer[y * width + x] =
                ((p[0] as u32) << 16) | ((p[1] as u32) << 8) | (p[2] as u32);
        }
    }
}

/// Filled circle at the marker's normalized position
fn stamp_marker(buffer: &mut [u32], width: usize, height: usize, marker: &Marker) {
    let cx = (marker.x * width as f32) as i32;
    let cy = (marker.y * height as f32) as i32;
    for dy in -MARKER_RADIUS..=MARKER_RADIUS {
        for dx in -MARKER_RADIUS..=MARKER_RADIUS {
            if dx * dx + dy * dy > MARKER_RADIUS * MARKER_RADIUS {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x >= 0 && y >= 0 && (x as usize) < width && (y as usize) < height {
                buffer[y as usize * width + x as usize] = marker.rgb;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fill_buffer_packs_0rgb() {
        let frame = RgbImage::from_pixel(2, 2, image::Rgb([0x12, 0x34, 0x56]));
        let mut buffer = vec![0u32; 4];
        fill_buffer(&mut buffer, &frame, 2, 2);
        assert!(buffer.iter().all(|&p| p == 0x123456));
    }

    #[test]
    fn test_stamp_marker_clips_at_edges() {
        let mut buffer = vec![0u32; 16];
        let marker = Marker {
            x: 0.0,
            y: 0.0,
            rgb: 0x00ff00,
        };
        stamp_marker(&mut buffer, 4, 4, &marker);
        assert_eq!(buffer[0], 0x00ff00);
    }

    #[test]
    fn test_stamp_marker_center() {
        let mut buffer = vec![0u32; 100];
        let marker = Marker {
            x: 0.5,
            y: 0.5,
            rgb: 0xffff00,
        };
        stamp_marker(&mut buffer, 10, 10, &marker);
        assert_eq!(buffer[5 * 10 + 5], 0xffff00);
        // Corners stay untouched
        assert_eq!(buffer[0], 0);
        assert_eq!(buffer[99], 0);
    }
}
