//! Character unit abstraction for automaton transitions.
//!
//! This module provides the [`CharUnit`] trait, which abstracts over byte-level
//! (u8) and character-level (char) transition labels. Both orders agree with
//! the byte-wise order of UTF-8 strings, so a sorted key sequence stays sorted
//! whichever unit the automaton is built over.

/// Trait abstracting the label type of automaton transitions.
///
/// # Trade-offs
///
/// - **Byte-level (u8)**: 1 byte per label and a smaller encoding, but a
///   multi-byte UTF-8 sequence becomes a chain of states.
///
/// - **Character-level (char)**: one transition per Unicode scalar value.
///   This is the default.
pub trait CharUnit:
    Copy + Eq + Ord + std::hash::Hash + std::fmt::Debug + Send + Sync + 'static
{
    /// Number of bytes recorded for this unit in the serialized header.
    const WIDTH: u8;

    /// Convert from a string slice to a vector of units.
    fn from_str(s: &str) -> Vec<Self>;

    /// Convert from a slice of units back to a string.
    ///
    /// For `u8`, this uses lossy UTF-8 decoding (invalid sequences become U+FFFD).
    /// For `char`, this is lossless.
    fn to_string(units: &[Self]) -> String;

    /// Iterator over the units of a string slice.
    type Units<'a>: Iterator<Item = Self>;

    /// Create an iterator over the units in a string without allocating.
    fn units(s: &str) -> Self::Units<'_>;

    /// Numeric code used by the binary encoding.
    fn to_code(self) -> u32;

    /// Inverse of [`CharUnit::to_code`]; `None` for codes outside the unit's range.
    fn from_code(code: u32) -> Option<Self>;
}

impl CharUnit for u8 {
    const WIDTH: u8 = 1;

    #[inline]
    fn from_str(s: &str) -> Vec<Self> {
        s.as_bytes().to_vec()
    }

    #[inline]
    fn to_string(units: &[Self]) -> String {
        String::from_utf8_lossy(units).into_owned()
    }

    type Units<'a> = std::str::Bytes<'a>;

    #[inline]
    fn units(s: &str) -> Self::Units<'_> {
        s.bytes()
    }

    #[inline]
    fn to_code(self) -> u32 {
        u32::from(self)
    }

    #[inline]
    fn from_code(code: u32) -> Option<Self> {
        u8::try_from(code).ok()
    }
}

impl CharUnit for char {
    const WIDTH: u8 = 4;

    #[inline]
    fn from_str(s: &str) -> Vec<Self> {
        s.chars().collect()
    }

    #[inline]
    fn to_string(units: &[Self]) -> String {
        units.iter().collect()
    }

    type Units<'a> = std::str::Chars<'a>;

    #[inline]
    fn units(s: &str) -> Self::Units<'_> {
        s.chars()
    }

    #[inline]
    fn to_code(self) -> u32 {
        u32::from(self)
    }

    #[inline]
    fn from_code(code: u32) -> Option<Self> {
        char::from_u32(code)
    }
}
