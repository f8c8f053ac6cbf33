//! Byte-offset source spans.

use serde::Serialize;

/// A half-open byte range `[start, end)` inside one source file.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    /// Span used for synthesized entities that have no source text.
    pub const EMPTY: Span = Span { start: 0, end: 0 };

    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Span { start, end }
    }

    #[inline]
    pub const fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(self, other: Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    #[inline]
    pub const fn contains(&self, offset: u32) -> bool {
        offset >= self.start && offset < self.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_cover_and_len() {
        let a = Span::new(4, 10);
        let b = Span::new(8, 20);
        let c = a.cover(b);
        assert_eq!(c, Span::new(4, 20));
        assert_eq!(c.len(), 16);
        assert!(c.contains(19));
        assert!(!c.contains(20));
        assert!(Span::EMPTY.is_empty());
    }
}
