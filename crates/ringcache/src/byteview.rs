//! Immutable byte payloads handed out by the cache

use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;

use crate::lru::ByteSize;

/// An immutable view over a cached value
///
/// Cloning a view is cheap (the payload is reference counted). Every
/// accessor that yields bytes hands out a fresh copy, so holders can never
/// change what the cache stores.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct ByteView {
    b: Bytes,
}

impl ByteView {
    /// Create an empty view
    pub fn new() -> Self {
        Self::default()
    }

    /// Payload length in bytes
    pub fn len(&self) -> usize {
        self.b.len()
    }

    /// Check if the payload is empty
    pub fn is_empty(&self) -> bool {
        self.b.is_empty()
    }

    /// Copy of the payload, owned by the caller
    pub fn to_vec(&self) -> Vec<u8> {
        self.b.to_vec()
    }

    /// Payload decoded as UTF-8, replacing invalid sequences with U+FFFD
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.b)
    }
}

impl ByteSize for ByteView {
    fn byte_len(&self) -> usize {
        self.len()
    }
}

impl fmt::Debug for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ByteView").field(&self.text()).finish()
    }
}

impl fmt::Display for ByteView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl From<Bytes> for ByteView {
    fn from(b: Bytes) -> Self {
        Self { b }
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(v: Vec<u8>) -> Self {
        Self { b: Bytes::from(v) }
    }
}

impl From<&[u8]> for ByteView {
    fn from(s: &[u8]) -> Self {
        Self {
            b: Bytes::copy_from_slice(s),
        }
    }
}

impl From<String> for ByteView {
    fn from(s: String) -> Self {
        Self { b: Bytes::from(s) }
    }
}

impl From<&str> for ByteView {
    fn from(s: &str) -> Self {
        Self::from(s.as_bytes())
    }
}

impl PartialEq<[u8]> for ByteView {
    fn eq(&self, other: &[u8]) -> bool {
        self.b.as_ref() == other
    }
}

impl PartialEq<&str> for ByteView {
    fn eq(&self, other: &&str) -> bool {
        self.b.as_ref() == other.as_bytes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_basic() {
        let view = ByteView::from("hello");

        assert_eq!(view.len(), 5);
        assert!(!view.is_empty());
        assert_eq!(view.text(), "hello");
        assert_eq!(view.to_string(), "hello");
        assert_eq!(view.byte_len(), 5);
    }

    #[test]
    fn test_copies_are_independent() {
        let view = ByteView::from(vec![1u8, 2, 3]);

        let mut copy = view.to_vec();
        copy[0] = 99;
        copy.push(4);

        assert_eq!(view.to_vec(), vec![1, 2, 3]);
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn test_source_slice_is_copied() {
        let mut source = b"abc".to_vec();
        let view = ByteView::from(source.as_slice());
        source[0] = b'z';

        assert_eq!(view.to_vec(), b"abc");
        assert!(view == "abc");
    }

    #[test]
    fn test_invalid_utf8_is_lossy() {
        let view = ByteView::from(vec![b'o', b'k', 0xff]);

        assert_eq!(view.text(), "ok\u{fffd}");
        assert_eq!(view.len(), 3);
    }

    #[test]
    fn test_empty_view() {
        let view = ByteView::new();

        assert!(view.is_empty());
        assert_eq!(view.to_vec(), Vec::<u8>::new());
        assert_eq!(view.text(), "");
    }
}
