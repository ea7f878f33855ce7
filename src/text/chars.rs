//! Character buffer with a visible window, backed by a rope.

use crate::error::{Error, Result};
use ropey::Rope;
use std::ops::Range;

/// Mutable character storage plus a `(start, len)` window into it.
///
/// Every offset taken or returned by this type is relative to the window
/// start. Edits through the window resize it; the characters outside the
/// window are never touched.
#[derive(Clone, Debug, Default)]
pub struct CharBuffer {
    rope: Rope,
    start: usize,
    len: usize,
}

impl CharBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer whose window covers all of `text`.
    #[must_use]
    pub fn from_str(text: &str) -> Self {
        let rope = Rope::from_str(text);
        let len = rope.len_chars();
        Self { rope, start: 0, len }
    }

    /// Replace the contents and reset the window to cover everything.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
        self.start = 0;
        self.len = self.rope.len_chars();
    }

    /// Restrict the visible window to `len` characters from `start`
    /// (absolute offsets into the whole buffer).
    pub fn set_window(&mut self, start: usize, len: usize) -> Result<()> {
        let total = self.rope.len_chars();
        let end = start.checked_add(len).ok_or(Error::OutOfBounds {
            index: start,
            len: total,
        })?;
        Error::check_position(end, total)?;
        self.start = start;
        self.len = len;
        Ok(())
    }

    /// Shrink or restore the window length, keeping its start.
    pub fn set_window_len(&mut self, len: usize) -> Result<()> {
        self.set_window(self.start, len)
    }

    /// Absolute window range.
    #[must_use]
    pub fn window(&self) -> Range<usize> {
        self.start..self.start + self.len
    }

    /// Number of characters in the window.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if the window is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Snapshot of the window as a contiguous slice of characters.
    #[must_use]
    pub fn chars(&self) -> Vec<char> {
        self.rope
            .slice(self.start..self.start + self.len)
            .chars()
            .collect()
    }

    /// Insert a character at a window offset.
    pub fn insert_char(&mut self, at: usize, ch: char) -> Result<()> {
        Error::check_position(at, self.len)?;
        self.rope.insert_char(self.start + at, ch);
        self.len += 1;
        Ok(())
    }

    /// Remove `count` characters at a window offset.
    pub fn remove(&mut self, at: usize, count: usize) -> Result<()> {
        let end = at.checked_add(count).ok_or(Error::OutOfBounds {
            index: at,
            len: self.len,
        })?;
        Error::check_position(end, self.len)?;
        self.rope.remove(self.start + at..self.start + end);
        self.len -= count;
        Ok(())
    }

    /// Window contents as a string.
    #[must_use]
    pub fn to_string(&self) -> String {
        self.rope.slice(self.window()).to_string()
    }
}

impl From<&str> for CharBuffer {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_basic() {
        let buf = CharBuffer::from_str("Hello, world!");
        assert_eq!(buf.len(), 13);
        assert_eq!(buf.chars()[4], 'o');
        assert!(!buf.is_empty());
    }

    #[test]
    fn test_window() {
        let mut buf = CharBuffer::from_str("0123456789");
        buf.set_window(2, 5).unwrap();
        assert_eq!(buf.to_string(), "23456");
        assert_eq!(buf.chars(), vec!['2', '3', '4', '5', '6']);
        assert!(buf.set_window(8, 5).is_err());
        assert_eq!(buf.window(), 2..7);
    }

    #[test]
    fn test_window_len_keeps_hidden_text() {
        let mut buf = CharBuffer::from_str("0123456789");
        buf.set_window(2, 5).unwrap();
        buf.set_window_len(2).unwrap();
        assert_eq!(buf.to_string(), "23");
        buf.set_window_len(8).unwrap();
        assert_eq!(buf.to_string(), "23456789");
        assert!(buf.set_window_len(9).is_err());
    }

    #[test]
    fn test_insert_and_remove_inside_window() {
        let mut buf = CharBuffer::from_str("abcdef");
        buf.set_window(1, 4).unwrap();
        buf.insert_char(2, 'X').unwrap();
        assert_eq!(buf.to_string(), "bcXde");

        buf.remove(0, 2).unwrap();
        assert_eq!(buf.to_string(), "Xde");
        assert!(buf.remove(2, 5).is_err());
        assert!(buf.insert_char(9, 'q').is_err());

        buf.set_window(0, 5).unwrap();
        assert_eq!(buf.to_string(), "aXdef");
    }
}
