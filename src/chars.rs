//! Character classes of the XML 1.0 grammar.

/// A function to check whether the byte is a whitespace (blank, new line,
/// carriage return or tab).
#[inline]
pub(crate) const fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\r' | b'\n' | b'\t')
}

/// Checks whether the code point belongs to the `Char` production:
/// `#x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]`.
#[inline]
pub(crate) fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\u{9}' | '\u{A}' | '\u{D}'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}

/// Checks whether the code point belongs to the `NameStartChar` production.
#[inline]
pub(crate) fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}'
        | '\u{D8}'..='\u{F6}'
        | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}'
        | '\u{37F}'..='\u{1FFF}'
        | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}'
        | '\u{2C00}'..='\u{2FEF}'
        | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}'
        | '\u{FDF0}'..='\u{FFFD}'
        | '\u{10000}'..='\u{EFFFF}')
}

/// Checks whether the code point belongs to the `NameChar` production:
/// `NameStartChar | "-" | "." | [0-9] | #xB7 | [#x300-#x36F] | [#x203F-#x2040]`.
#[inline]
pub(crate) fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}'
            | '\u{300}'..='\u{36F}'
            | '\u{203F}'..='\u{2040}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitespace() {
        for b in [b' ', b'\t', b'\r', b'\n'] {
            assert!(is_whitespace(b));
        }
        assert!(!is_whitespace(b'x'));
        assert!(!is_whitespace(0x0C));
    }

    #[test]
    fn xml_char() {
        assert!(is_xml_char('\t'));
        assert!(is_xml_char('a'));
        assert!(is_xml_char('\u{D7FF}'));
        assert!(is_xml_char('\u{E000}'));
        assert!(is_xml_char('\u{10FFFF}'));

        assert!(!is_xml_char('\u{0}'));
        assert!(!is_xml_char('\u{B}'));
        assert!(!is_xml_char('\u{1F}'));
        assert!(!is_xml_char('\u{FFFE}'));
        assert!(!is_xml_char('\u{FFFF}'));
    }

    #[test]
    fn name_start() {
        for c in [':', '_', 'a', 'Z', 'é', 'あ', '\u{10000}'] {
            assert!(is_name_start_char(c), "{:?}", c);
        }
        for c in ['-', '.', '7', ' ', '\u{B7}', '\u{F7}', '\u{FFFE}'] {
            assert!(!is_name_start_char(c), "{:?}", c);
        }
    }

    #[test]
    fn name_char() {
        for c in ['-', '.', '0', '9', '\u{B7}', '\u{300}', 'x'] {
            assert!(is_name_char(c), "{:?}", c);
        }
        for c in [' ', '=', '/', '>', '\u{2041}'] {
            assert!(!is_name_char(c), "{:?}", c);
        }
    }
}
