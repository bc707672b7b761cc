//! Contains a resumable search for the end of a CDATA section.

/// A parser that searches for a `]]>` sequence across chunk boundaries.
///
/// Feed data repeatedly; [`feed`] returns `Some` with the position right
/// after `]]>` once the terminator is found, `None` when more data is
/// needed. The state remembers how many braces ended the previous chunk, so
/// a terminator split between chunks is still recognised. `>` on its own is
/// an ordinary content byte inside a CDATA section.
///
/// [`feed`]: Self::feed()
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CDataParser {
    /// The previous data did not end with a closing brace.
    Seen0,
    /// The previous data ended with one closing brace.
    Seen1,
    /// The previous data ended with two or more closing braces.
    Seen2,
}

impl Default for CDataParser {
    #[inline]
    fn default() -> Self {
        Self::Seen0
    }
}

impl CDataParser {
    /// Searches `bytes` for the end of the CDATA content, taking braces
    /// carried over from the previous chunk into account.
    ///
    /// Returns the position after the `>` of the terminator, or `None`.
    pub fn feed(&mut self, bytes: &[u8]) -> Option<usize> {
        // a terminator split over the boundary completes with the carryover
        match self {
            Self::Seen2 if bytes.starts_with(b">") => return Some(1),
            Self::Seen1 | Self::Seen2 if bytes.starts_with(b"]>") => return Some(2),
            _ => {}
        }
        for i in memchr::memchr_iter(b'>', bytes) {
            if bytes[..i].ends_with(b"]]") {
                // +1 for `>` which is part of the token
                return Some(i + 1);
            }
        }
        *self = Self::from_braces(self.braces(), bytes);
        None
    }

    #[inline]
    fn braces(&self) -> usize {
        match self {
            Self::Seen0 => 0,
            Self::Seen1 => 1,
            Self::Seen2 => 2,
        }
    }

    /// Counts the braces that end the carryover-plus-`bytes` sequence.
    fn from_braces(carried: usize, bytes: &[u8]) -> Self {
        let trailing = bytes.len()
            - bytes
                .iter()
                .rposition(|&b| b != b']')
                .map_or(0, |p| p + 1);
        let total = if trailing == bytes.len() {
            carried + trailing
        } else {
            trailing
        };
        match total {
            0 => Self::Seen0,
            1 => Self::Seen1,
            _ => Self::Seen2,
        }
    }
}
