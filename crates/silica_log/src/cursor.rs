//! Cursor for navigating a log by event index.

use crate::error::{LogError, LogResult};

/// Bounded position in a log of `len` events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    position: usize,
    len: usize,
    direction: Direction,
}

/// Direction of the last move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward later events
    Forward,
    /// Toward earlier events
    Backward,
}

impl Cursor {
    /// Cursor at the first event
    #[must_use]
    pub fn new(len: usize) -> Self {
        Self {
            position: 0,
            len,
            direction: Direction::Forward,
        }
    }

    /// Cursor at `position`
    ///
    /// # Errors
    ///
    /// Returns error if `position` is outside the log
    pub fn at(position: usize, len: usize) -> LogResult<Self> {
        let mut cursor = Self::new(len);
        cursor.seek(position)?;
        Ok(cursor)
    }

    /// Whether an event follows the current one
    #[must_use]
    pub const fn can_advance(&self) -> bool {
        self.position + 1 < self.len
    }

    /// Whether an event precedes the current one
    #[must_use]
    pub const fn can_retreat(&self) -> bool {
        self.position > 0
    }

    /// Step one event forward; `None` at the last event
    pub fn advance(&mut self) -> Option<usize> {
        if !self.can_advance() {
            return None;
        }
        self.position += 1;
        self.direction = Direction::Forward;
        Some(self.position)
    }

    /// Step one event back; `None` at the first event
    pub fn retreat(&mut self) -> Option<usize> {
        if !self.can_retreat() {
            return None;
        }
        self.position -= 1;
        self.direction = Direction::Backward;
        Some(self.position)
    }

    /// Jump to `position`
    ///
    /// # Errors
    ///
    /// Returns error if `position` is outside the log
    pub fn seek(&mut self, position: usize) -> LogResult<()> {
        if position >= self.len {
            return Err(LogError::IndexOutOfBounds {
                index: position,
                len: self.len,
            });
        }
        self.direction = if position < self.position {
            Direction::Backward
        } else {
            Direction::Forward
        };
        self.position = position;
        Ok(())
    }

    /// Back to the first event
    pub fn reset(&mut self) {
        self.position = 0;
        self.direction = Direction::Forward;
    }

    /// Jump to the last event
    pub fn seek_end(&mut self) {
        self.position = self.len.saturating_sub(1);
        self.direction = Direction::Forward;
    }

    /// Current event index
    #[must_use]
    pub const fn pos(&self) -> usize {
        self.position
    }

    /// Events in the log
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Whether the log is empty
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Direction of the last move
    #[must_use]
    pub const fn direction(&self) -> Direction {
        self.direction
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_new() {
        let cursor = Cursor::new(3);
        assert_eq!(cursor.pos(), 0);
        assert!(cursor.can_advance());
        assert!(!cursor.can_retreat());
    }

    #[test]
    fn test_cursor_at() {
        let cursor = Cursor::at(2, 3).unwrap();
        assert_eq!(cursor.pos(), 2);
        assert!(!cursor.can_advance());
        assert!(Cursor::at(3, 3).is_err());
    }

    #[test]
    fn test_cursor_advance_and_retreat() {
        let mut cursor = Cursor::new(2);
        assert_eq!(cursor.advance(), Some(1));
        assert_eq!(cursor.advance(), None);
        assert_eq!(cursor.retreat(), Some(0));
        assert_eq!(cursor.retreat(), None);
        assert_eq!(cursor.direction(), Direction::Backward);
    }

    #[test]
    fn test_cursor_seek() {
        let mut cursor = Cursor::new(10);
        cursor.seek(7).unwrap();
        assert_eq!(cursor.pos(), 7);
        let err = cursor.seek(10).unwrap_err();
        assert_eq!(err, LogError::IndexOutOfBounds { index: 10, len: 10 });
        assert_eq!(cursor.pos(), 7);
    }

    #[test]
    fn test_cursor_reset_and_end() {
        let mut cursor = Cursor::new(5);
        cursor.seek_end();
        assert_eq!(cursor.pos(), 4);
        cursor.reset();
        assert_eq!(cursor.pos(), 0);
    }

    #[test]
    fn test_empty_cursor() {
        let mut cursor = Cursor::new(0);
        assert!(cursor.is_empty());
        assert!(!cursor.can_advance());
        assert!(cursor.seek(0).is_err());
    }
}
