use core::fmt;
use std::sync::{Arc, OnceLock};


/// Where a node came from in the source text. Spans are carried purely for
/// diagnostics and never take part in equality or evaluation.
#[derive(Clone)]
pub struct Span {
    start: usize,
    end: usize,
    text: Arc<str>,
}

static EMPTY: OnceLock<Span> = OnceLock::new();

impl Span {
    pub fn new(start: usize, end: usize, text: &str) -> Self {
        Self { start, end, text: Arc::from(text) }
    }

    /// The shared sentinel used when no real location applies
    pub fn empty() -> Self {
        EMPTY.get_or_init(|| Self::new(0, 0, "")).clone()
    }

    /// Span covering `source[start..end]`
    pub(crate) fn of(source: &str, start: usize, end: usize) -> Self {
        Self::new(start, end, &source[start..end])
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn end(&self) -> usize {
        self.end
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end && self.text.is_empty()
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}..{} {:?}", self.start, self.end, self.text)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_span_is_shared() {
        let a = Span::empty();
        let b = Span::default();

        assert!(a.is_empty());
        assert!(Arc::ptr_eq(&a.text, &b.text));
    }

    #[test]
    fn span_slices_source() {
        let span = Span::of("let a = 5 in a", 4, 5);
        assert_eq!((span.start(), span.end(), span.text()), (4, 5, "a"));
        assert!(!span.is_empty());
    }
}
