//! OS cursor, click, and scroll injection using enigo
//!
//! Every injection is a blocking call whose outcome is logged and otherwise
//! ignored - there is nothing sensible to do about a failed synthetic click.

use anyhow::Result;
use enigo::{Axis, Button, Coordinate, Direction, Enigo, Mouse, Settings};
use std::thread;
use std::time::Duration;

use crate::command::CursorAction;

/// Delay between the two clicks of an injected double click
const DOUBLE_CLICK_GAP: Duration = Duration::from_millis(50);

pub struct Pointer {
    enigo: Enigo,
}

impl Pointer {
    pub fn new() -> Result<Self> {
        let enigo = Enigo::new(&Settings::default())?;
        Ok(Self { enigo })
    }

    /// Primary display dimensions in pixels
    pub fn screen_size(&self) -> Result<(i32, i32)> {
        Ok(self.enigo.main_display()?)
    }

    /// Current cursor position
    pub fn position(&self) -> Result<(i32, i32)> {
        Ok(self.enigo.location()?)
    }

    /// Absolute cursor move
    pub fn move_to(&mut self, x: f64, y: f64) -> Result<()> {
        self.enigo
            .move_mouse(x as i32, y as i32, Coordinate::Abs)?;
        Ok(())
    }

    pub fn click(&mut self) -> Result<()> {
        self.enigo.button(Button::Left, Direction::Click)?;
        Ok(())
    }

    pub fn right_click(&mut self) -> Result<()> {
        self.enigo.button(Button::Right, Direction::Click)?;
        Ok(())
    }

    pub fn double_click(&mut self) -> Result<()> {
        self.enigo.button(Button::Left, Direction::Click)?;
        thread::sleep(DOUBLE_CLICK_GAP);
        self.enigo.button(Button::Left, Direction::Click)?;
        Ok(())
    }

    /// Positive scrolls toward the bottom/right of the document
    pub fn scroll(&mut self, amount: i32, axis: Axis) -> Result<()> {
        self.enigo.scroll(amount, axis)?;
        Ok(())
    }

    /// Execute a parsed voice action
    pub fn apply(
        &mut self,
        action: CursorAction,
        move_step: i32,
        scroll_amount: i32,
        screen: (i32, i32),
    ) -> Result<()> {
        use CursorAction::*;

        match action {
            ScrollUp => self.scroll(-scroll_amount, Axis::Vertical),
            ScrollDown => self.scroll(scroll_amount, Axis::Vertical),
            ScrollLeft => self.scroll(-scroll_amount, Axis::Horizontal),
            ScrollRight => self.scroll(scroll_amount, Axis::Horizontal),
            MoveUp | MoveDown | MoveLeft | MoveRight => {
                let current = self.position()?;
                let (x, y) = step_target(action, current, move_step, screen);
                self.move_to(x as f64, y as f64)
            }
            LeftClick => self.click(),
            RightClick => self.right_click(),
            DoubleClick => self.double_click(),
        }
    }
}

/// Target of a relative move, clamped to the screen
pub fn step_target(
    action: CursorAction,
    (x, y): (i32, i32),
    step: i32,
    (screen_w, screen_h): (i32, i32),
) -> (i32, i32) {
    match action {
        CursorAction::MoveUp => (x, (y - step).max(0)),
        CursorAction::MoveDown => (x, (y + step).min(screen_h)),
        CursorAction::MoveLeft => ((x - step).max(0), y),
        CursorAction::MoveRight => ((x + step).min(screen_w), y),
        _ => (x, y),
    }
}
