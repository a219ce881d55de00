//! Trailing window of the most recently read source characters

use crate::config::constants::CONTEXT_BUFFER_SIZE;

/// Fixed-size ring of recently read characters
///
/// The lexer pushes every character it reads. Diagnostics receive a
/// `snapshot`, never a live reference to the ring.
#[derive(Debug, Clone)]
pub struct ContextBuffer {
    ring: [char; CONTEXT_BUFFER_SIZE],
    written: usize,
}

impl ContextBuffer {
    pub fn new() -> Self {
        Self {
            ring: ['\0'; CONTEXT_BUFFER_SIZE],
            written: 0,
        }
    }

    pub fn push(&mut self, ch: char) {
        // CONTEXT_BUFFER_SIZE is a power of two, checked by build.rs
        self.ring[self.written & (CONTEXT_BUFFER_SIZE - 1)] = ch;
        self.written += 1;
    }

    /// Buffered characters, oldest first
    pub fn snapshot(&self) -> String {
        let held = self.written.min(CONTEXT_BUFFER_SIZE);
        (self.written - held..self.written)
            .map(|i| self.ring[i & (CONTEXT_BUFFER_SIZE - 1)])
            .collect()
    }

    pub fn len(&self) -> usize {
        self.written.min(CONTEXT_BUFFER_SIZE)
    }

    pub fn is_empty(&self) -> bool {
        self.written == 0
    }
}

impl Default for ContextBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_before_wrap() {
        let mut buffer = ContextBuffer::new();
        "var x".chars().for_each(|c| buffer.push(c));
        assert_eq!(buffer.snapshot(), "var x");
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn test_snapshot_keeps_only_the_newest_characters() {
        let mut buffer = ContextBuffer::new();
        let text: String = (0..CONTEXT_BUFFER_SIZE + 3)
            .map(|i| char::from(b'a' + (i % 26) as u8))
            .collect();
        text.chars().for_each(|c| buffer.push(c));

        let snapshot = buffer.snapshot();
        assert_eq!(snapshot.chars().count(), CONTEXT_BUFFER_SIZE);
        assert_eq!(snapshot, text[3..]);
    }

    #[test]
    fn test_empty() {
        let buffer = ContextBuffer::default();
        assert!(buffer.is_empty());
        assert_eq!(buffer.snapshot(), "");
    }
}
