//! Voice command interpretation - maps transcribed text to cursor actions
//!
//! Matching is case-insensitive substring search in a fixed priority order:
//! scrolls, then moves, then clicks. The first matching rule wins and
//! unmatched text is silently dropped.

/// An OS input action requested by voice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorAction {
    ScrollUp,
    ScrollDown,
    ScrollLeft,
    ScrollRight,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    LeftClick,
    RightClick,
    DoubleClick,
}

/// Parse a transcribed command, first matching rule wins
pub fn parse(text: &str) -> Option<CursorAction> {
    let text = text.to_lowercase();
    let text = text.trim();

    let scroll = text.contains("scroll");
    let movement = text.contains("move");

    if scroll && text.contains("up") {
        Some(CursorAction::ScrollUp)
    } else if scroll && text.contains("down") {
        Some(CursorAction::ScrollDown)
    } else if scroll && text.contains("left") {
        Some(CursorAction::ScrollLeft)
    } else if scroll && text.contains("right") {
        Some(CursorAction::ScrollRight)
    } else if movement && text.contains("up") {
        Some(CursorAction::MoveUp)
    } else if movement && text.contains("down") {
        Some(CursorAction::MoveDown)
    } else if movement && text.contains("left") {
        Some(CursorAction::MoveLeft)
    } else if movement && text.contains("right") {
        Some(CursorAction::MoveRight)
    } else if text.contains("left click") {
        Some(CursorAction::LeftClick)
    } else if text.contains("right click") {
        Some(CursorAction::RightClick)
    } else if text.contains("double click") {
        Some(CursorAction::DoubleClick)
    } else {
        None
    }
}
