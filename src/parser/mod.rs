//! A low-level XML tokenizer that finds token boundaries in a stream of
//! byte chunks. For advanced use; the [`SaxParser`] drives it for you.
//!
//! Create a [`Tokenizer`] and [`feed`] data into it. Each call scans for the
//! end of the current token. A successful scan returns a [`FeedResult`]
//! carrying the number of bytes to consume; those bytes, appended to whatever
//! the previous calls consumed via [`FeedResult::NeedData`], form one
//! complete token. When the provided bytes are exhausted before the token
//! ends, [`FeedResult::NeedData`] asks for the next chunk, and the tokenizer
//! resumes at the exact logical position. When no more data exists, call
//! [`finish`] to turn an in-flight token into the matching error.
//!
//! ```
//! use quick_sax::parser::{FeedResult, Tokenizer};
//!
//! let mut tokenizer = Tokenizer::new();
//! // Each result tells the caller how many bytes make up the token; a text
//! // result includes the `<` that opens the following markup token.
//! assert_eq!(tokenizer.feed(b"<a>hi</a>").unwrap(), FeedResult::Text(1));
//! assert_eq!(tokenizer.feed(b"a>hi</a>").unwrap(), FeedResult::StartTag(2));
//! assert_eq!(tokenizer.feed(b"hi</a>").unwrap(), FeedResult::Text(3));
//! assert_eq!(tokenizer.feed(b"/a>").unwrap(), FeedResult::EndTag(3));
//! assert_eq!(tokenizer.finish(), Ok(()));
//! ```
//!
//! [`SaxParser`]: crate::SaxParser
//! [`feed`]: Tokenizer::feed()
//! [`finish`]: Tokenizer::finish()

use crate::errors::SyntaxError;

mod cdata;
mod comment;
mod doctype;
mod pi;
mod quoted;

pub use cdata::CDataParser;
pub use comment::CommentParser;
pub use doctype::DoctypeParser;
pub use pi::PiParser;
pub use quoted::QuotedParser;

/// Keyword expected after `<![`.
const CDATA_KEYWORD: &[u8] = b"[CDATA[";
/// Keyword expected after `<!D`, matched case-insensitively.
const DOCTYPE_KEYWORD: &[u8] = b"DOCTYPE";

/// An internal state of a tokenizer, used to preserve the position inside the
/// currently scanned token between calls to [`Tokenizer::feed()`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum State {
    /// Nothing was scanned yet; a UTF-8 byte order mark may open the input.
    Start,
    /// A `0xEF` was seen as the first byte.
    BomEf,
    /// `0xEF 0xBB` were seen as the first bytes.
    BomEfBb,
    /// Inside character data.
    Text,
    /// A `<` was seen, but nothing else.
    Markup,
    /// A `<!` was seen; the kind of the construct is not known yet.
    MaybeBang,
    /// A `<!-` was seen; a second dash must follow.
    MaybeComment,
    /// Inside `<!-- ... -->`, searching for the terminator.
    Comment(CommentParser),
    /// Matched this many bytes of the `[CDATA[` keyword after `<!`.
    MaybeCData(u8),
    /// Inside `<![CDATA[ ... ]]>`, searching for the terminator.
    CData(CDataParser),
    /// Matched this many bytes of the `DOCTYPE` keyword after `<!`.
    MaybeDoctype(u8),
    /// Inside `<!DOCTYPE ... >`, skipping to the matching terminator.
    Doctype(DoctypeParser),
    /// Inside `<? ... ?>`, searching for the terminator.
    Pi(PiParser),
    /// A `</` was seen; searching for the closing `>`.
    EndTag,
    /// Inside a start or empty-element tag; the flag records whether the
    /// previously consumed bytes ended with `/`.
    StartTag(QuotedParser, bool),
}

impl Default for State {
    fn default() -> Self {
        Self::Start
    }
}

/// A result of feeding data into a [`Tokenizer`].
///
/// Every variant except [`NeedData`] carries the number of bytes that should
/// be consumed from the fed slice; the consumed bytes of all calls since the
/// previous emitted token form the token content.
///
/// [`NeedData`]: Self::NeedData
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FeedResult {
    /// All fed bytes belong to the current (unfinished) token; feed the next
    /// chunk to continue.
    NeedData,
    /// The consumed bytes are a UTF-8 byte order mark and carry no content.
    Bom(usize),
    /// The consumed bytes are a character-data run terminated by a `<`. The
    /// final `<` byte is part of the consumed count but belongs to the
    /// markup token that follows.
    Text(usize),
    /// The consumed bytes complete a `<...>` start tag.
    StartTag(usize),
    /// The consumed bytes complete a `<.../>` empty-element tag.
    EmptyTag(usize),
    /// The consumed bytes complete a `</...>` end tag.
    EndTag(usize),
    /// The consumed bytes complete a `<!-- ... -->` comment.
    Comment(usize),
    /// The consumed bytes complete a `<![CDATA[ ... ]]>` section.
    CData(usize),
    /// The consumed bytes complete a `<? ... ?>` processing instruction or
    /// XML declaration.
    Pi(usize),
    /// The consumed bytes complete a `<!DOCTYPE ... >` definition.
    Doctype(usize),
}

/// A resumable scanner for the boundaries of XML tokens.
///
/// The tokenizer only locates tokens; it does not validate names,
/// attributes or references. Every grammar decision that needs the complete
/// token happens one level up, once the caller has gathered the token bytes.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct Tokenizer(State);

impl Tokenizer {
    /// Creates a tokenizer positioned at the very start of a document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scans the provided bytes for the end of the current token.
    ///
    /// See the [module documentation](self) for the calling protocol.
    pub fn feed(&mut self, bytes: &[u8]) -> Result<FeedResult, SyntaxError> {
        for (offset, &byte) in bytes.iter().enumerate() {
            let trail = &bytes[offset..];
            let start = offset + 1;
            let rest = &bytes[start..];
            self.0 = match self.0 {
                State::Start => match byte {
                    0xEF => State::BomEf,
                    b'<' => {
                        self.0 = State::Markup;
                        return Ok(FeedResult::Text(start));
                    }
                    _ => return Ok(self.scan_text(trail, offset)),
                },
                // a partial match of the byte order mark turns out to be text
                State::BomEf => match byte {
                    0xBB => State::BomEfBb,
                    b'<' => {
                        self.0 = State::Markup;
                        return Ok(FeedResult::Text(start));
                    }
                    _ => return Ok(self.scan_text(trail, offset)),
                },
                State::BomEfBb => match byte {
                    0xBF => {
                        self.0 = State::Text;
                        return Ok(FeedResult::Bom(start));
                    }
                    b'<' => {
                        self.0 = State::Markup;
                        return Ok(FeedResult::Text(start));
                    }
                    _ => return Ok(self.scan_text(trail, offset)),
                },
                State::Text => match byte {
                    b'<' => {
                        self.0 = State::Markup;
                        return Ok(FeedResult::Text(start));
                    }
                    _ => return Ok(self.scan_text(trail, offset)),
                },
                State::Markup => match byte {
                    b'!' => State::MaybeBang,
                    b'?' => return Ok(self.scan_pi(rest, start, PiParser::default())),
                    b'/' => return Ok(self.scan_end(rest, start)),
                    _ => {
                        return Ok(self.scan_start(trail, offset, QuotedParser::default(), false))
                    }
                },
                State::MaybeBang => match byte {
                    b'-' => State::MaybeComment,
                    b'[' => State::MaybeCData(1),
                    b'D' | b'd' => State::MaybeDoctype(1),
                    _ => return Err(SyntaxError::InvalidBangMarkup),
                },
                State::MaybeComment => match byte {
                    b'-' => return Ok(self.scan_comment(rest, start, CommentParser::default())),
                    _ => return Err(SyntaxError::UnclosedComment),
                },
                State::Comment(parser) => return Ok(self.scan_comment(trail, offset, parser)),
                State::MaybeCData(matched) => {
                    if byte == CDATA_KEYWORD[matched as usize] {
                        if matched as usize + 1 == CDATA_KEYWORD.len() {
                            return Ok(self.scan_cdata(rest, start, CDataParser::default()));
                        }
                        State::MaybeCData(matched + 1)
                    } else {
                        return Err(SyntaxError::UnclosedCData);
                    }
                }
                State::CData(parser) => return Ok(self.scan_cdata(trail, offset, parser)),
                State::MaybeDoctype(matched) => {
                    if byte.eq_ignore_ascii_case(&DOCTYPE_KEYWORD[matched as usize]) {
                        if matched as usize + 1 == DOCTYPE_KEYWORD.len() {
                            return Ok(self.scan_doctype(rest, start, DoctypeParser::default()));
                        }
                        State::MaybeDoctype(matched + 1)
                    } else {
                        return Err(SyntaxError::UnclosedDoctype);
                    }
                }
                State::Doctype(parser) => return Ok(self.scan_doctype(trail, offset, parser)),
                State::Pi(parser) => return Ok(self.scan_pi(trail, offset, parser)),
                State::EndTag => return Ok(self.scan_end(trail, offset)),
                State::StartTag(parser, has_slash) => {
                    return Ok(self.scan_start(trail, offset, parser, has_slash))
                }
            };
        }
        Ok(FeedResult::NeedData)
    }

    /// Reports whether the tokenizer stopped on a token boundary.
    ///
    /// Bytes consumed in text-like states are a complete (possibly empty)
    /// character-data run at the end of input; any other state means the
    /// input ended inside a token and yields the matching error.
    pub fn finish(&self) -> Result<(), SyntaxError> {
        match self.0 {
            State::Start | State::BomEf | State::BomEfBb | State::Text => Ok(()),

            State::Markup | State::StartTag(..) | State::EndTag => Err(SyntaxError::UnclosedTag),
            State::MaybeBang => Err(SyntaxError::InvalidBangMarkup),
            State::MaybeComment | State::Comment(_) => Err(SyntaxError::UnclosedComment),
            State::MaybeCData(_) | State::CData(_) => Err(SyntaxError::UnclosedCData),
            State::MaybeDoctype(_) | State::Doctype(_) => Err(SyntaxError::UnclosedDoctype),
            State::Pi(_) => Err(SyntaxError::UnclosedPi),
        }
    }

    /// Character data cannot contain `<`, so the run ends on the first `<`.
    ///
    /// # Parameters
    /// - `bytes`: sub-slice of the slice passed to `feed()`, beginning at a
    ///   content byte
    /// - `offset`: position of `bytes` within the slice passed to `feed()`
    fn scan_text(&mut self, bytes: &[u8], offset: usize) -> FeedResult {
        match memchr::memchr(b'<', bytes) {
            Some(i) => {
                self.0 = State::Markup;
                // +1: the `<` is consumed here and opens the next token
                FeedResult::Text(offset + i + 1)
            }
            None => {
                self.0 = State::Text;
                FeedResult::NeedData
            }
        }
    }

    fn scan_comment(&mut self, bytes: &[u8], offset: usize, mut parser: CommentParser) -> FeedResult {
        match parser.feed(bytes) {
            Some(i) => {
                self.0 = State::Text;
                FeedResult::Comment(offset + i)
            }
            None => {
                self.0 = State::Comment(parser);
                FeedResult::NeedData
            }
        }
    }

    fn scan_cdata(&mut self, bytes: &[u8], offset: usize, mut parser: CDataParser) -> FeedResult {
        match parser.feed(bytes) {
            Some(i) => {
                self.0 = State::Text;
                FeedResult::CData(offset + i)
            }
            None => {
                self.0 = State::CData(parser);
                FeedResult::NeedData
            }
        }
    }

    fn scan_doctype(&mut self, bytes: &[u8], offset: usize, mut parser: DoctypeParser) -> FeedResult {
        match parser.feed(bytes) {
            Some(i) => {
                self.0 = State::Text;
                FeedResult::Doctype(offset + i)
            }
            None => {
                self.0 = State::Doctype(parser);
                FeedResult::NeedData
            }
        }
    }

    fn scan_pi(&mut self, bytes: &[u8], offset: usize, mut parser: PiParser) -> FeedResult {
        match parser.feed(bytes) {
            Some(i) => {
                self.0 = State::Text;
                FeedResult::Pi(offset + i)
            }
            None => {
                self.0 = State::Pi(parser);
                FeedResult::NeedData
            }
        }
    }

    fn scan_end(&mut self, bytes: &[u8], offset: usize) -> FeedResult {
        match memchr::memchr(b'>', bytes) {
            Some(i) => {
                self.0 = State::Text;
                // +1 for `>` which is part of the token
                FeedResult::EndTag(offset + i + 1)
            }
            None => {
                self.0 = State::EndTag;
                FeedResult::NeedData
            }
        }
    }

    /// Scans for the `>` closing a start or empty-element tag, honouring
    /// quoted attribute values which may contain a literal `>`.
    fn scan_start(
        &mut self,
        bytes: &[u8],
        offset: usize,
        mut parser: QuotedParser,
        has_slash: bool,
    ) -> FeedResult {
        match parser.feed(bytes) {
            Some(0) if has_slash => {
                self.0 = State::Text;
                // the `/` ended the previous chunk, the `>` opens this one
                FeedResult::EmptyTag(offset + 1)
            }
            Some(i) => {
                self.0 = State::Text;
                if i > 0 && bytes[i - 1] == b'/' {
                    FeedResult::EmptyTag(offset + i + 1)
                } else {
                    FeedResult::StartTag(offset + i + 1)
                }
            }
            None => {
                self.0 = State::StartTag(parser, bytes.last().copied() == Some(b'/'));
                FeedResult::NeedData
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FeedResult::*;
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn text() {
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"text with > symbol"), Ok(NeedData));
        assert_eq!(tokenizer.feed(b" more"), Ok(NeedData));
        assert_eq!(tokenizer.feed(b" and <tag"), Ok(Text(6)));
        //                          ^^^^^^ includes the `<`
    }

    #[test]
    fn bom() {
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"\xEF\xBB\xBF<r/>"), Ok(Bom(3)));
        assert_eq!(tokenizer.feed(b"<r/>"), Ok(Text(1)));
        assert_eq!(tokenizer.feed(b"r/>"), Ok(EmptyTag(3)));

        // split across chunks
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"\xEF"), Ok(NeedData));
        assert_eq!(tokenizer.feed(b"\xBB"), Ok(NeedData));
        assert_eq!(tokenizer.feed(b"\xBF<"), Ok(Bom(1)));

        // 0xEF not followed by a mark is ordinary (text) data
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"\xEFx<"), Ok(Text(3)));
    }

    #[test]
    fn comment() {
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"<"), Ok(Text(1)));
        assert_eq!(tokenizer.feed(b"!--"), Ok(NeedData));
        assert_eq!(tokenizer.feed(b"a-"), Ok(NeedData));
        assert_eq!(tokenizer.feed(b"->tail"), Ok(Comment(2)));

        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"<!--with > and -> inside-->"), Ok(Text(1)));
        assert_eq!(tokenizer.feed(b"!--with > and -> inside-->"), Ok(Comment(26)));
    }

    #[test]
    fn cdata() {
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"<![CDATA[a]b"), Ok(Text(1)));
        assert_eq!(tokenizer.feed(b"![CDATA[a]b"), Ok(NeedData));
        assert_eq!(tokenizer.feed(b"]"), Ok(NeedData));
        assert_eq!(tokenizer.feed(b"]>rest"), Ok(CData(2)));

        // lowercase keyword is not CDATA
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"<"), Ok(Text(1)));
        assert_eq!(tokenizer.feed(b"![cdata["), Err(SyntaxError::UnclosedCData));
    }

    #[test]
    fn doctype() {
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"<"), Ok(Text(1)));
        assert_eq!(
            tokenizer.feed(b"!DOCTYPE greeting [<!ENTITY e '>'>]>x"),
            Ok(Doctype(36))
        );

        // case-insensitive keyword, split across chunks
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"<!doc"), Ok(Text(1)));
        assert_eq!(tokenizer.feed(b"!doc"), Ok(NeedData));
        assert_eq!(tokenizer.feed(b"type r"), Ok(NeedData));
        assert_eq!(tokenizer.feed(b">"), Ok(Doctype(1)));
    }

    #[test]
    fn pi() {
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"<?pi data?>tail"), Ok(Text(1)));
        assert_eq!(tokenizer.feed(b"?pi data?>tail"), Ok(Pi(10)));

        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"<"), Ok(Text(1)));
        assert_eq!(tokenizer.feed(b"?pi?"), Ok(NeedData));
        assert_eq!(tokenizer.feed(b">"), Ok(Pi(1)));
    }

    #[test]
    fn start_tag() {
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"<a b='>'>"), Ok(Text(1)));
        assert_eq!(tokenizer.feed(b"a b='>'>"), Ok(StartTag(8)));

        // quote state survives chunk boundaries
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"<"), Ok(Text(1)));
        assert_eq!(tokenizer.feed(b"a b=\">"), Ok(NeedData));
        assert_eq!(tokenizer.feed(b"\">"), Ok(StartTag(2)));
    }

    #[test]
    fn empty_tag() {
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"<"), Ok(Text(1)));
        assert_eq!(tokenizer.feed(b"a/>"), Ok(EmptyTag(3)));

        // `/` and `>` in different chunks
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"<"), Ok(Text(1)));
        assert_eq!(tokenizer.feed(b"a/"), Ok(NeedData));
        assert_eq!(tokenizer.feed(b">"), Ok(EmptyTag(1)));
    }

    #[test]
    fn end_tag() {
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"<"), Ok(Text(1)));
        assert_eq!(tokenizer.feed(b"/a"), Ok(NeedData));
        assert_eq!(tokenizer.feed(b" >"), Ok(EndTag(2)));
    }

    #[test]
    fn bang_markup() {
        let mut tokenizer = Tokenizer::new();
        assert_eq!(tokenizer.feed(b"<"), Ok(Text(1)));
        assert_eq!(tokenizer.feed(b"!x"), Err(SyntaxError::InvalidBangMarkup));
    }

    #[test]
    fn finish_states() {
        let ok = |data: &[u8]| {
            let mut tokenizer = Tokenizer::new();
            assert_eq!(tokenizer.feed(data), Ok(NeedData));
            tokenizer.finish()
        };

        assert_eq!(ok(b""), Ok(()));
        assert_eq!(ok(b"text"), Ok(()));
        assert_eq!(ok(b"\xEF\xBB"), Ok(()));

        fn finish_after(data: &[u8]) -> Result<(), SyntaxError> {
            let mut tokenizer = Tokenizer::new();
            let mut chunk = data;
            loop {
                match tokenizer.feed(chunk).unwrap() {
                    NeedData => return tokenizer.finish(),
                    Bom(n) | Text(n) | StartTag(n) | EmptyTag(n) | EndTag(n) | Comment(n)
                    | CData(n) | Pi(n) | Doctype(n) => chunk = &chunk[n..],
                }
            }
        }

        assert_eq!(finish_after(b"<"), Err(SyntaxError::UnclosedTag));
        assert_eq!(finish_after(b"<a"), Err(SyntaxError::UnclosedTag));
        assert_eq!(finish_after(b"</a"), Err(SyntaxError::UnclosedTag));
        assert_eq!(finish_after(b"<!"), Err(SyntaxError::InvalidBangMarkup));
        assert_eq!(finish_after(b"<!-"), Err(SyntaxError::UnclosedComment));
        assert_eq!(finish_after(b"<!--x"), Err(SyntaxError::UnclosedComment));
        assert_eq!(finish_after(b"<![CD"), Err(SyntaxError::UnclosedCData));
        assert_eq!(finish_after(b"<![CDATA[x]]"), Err(SyntaxError::UnclosedCData));
        assert_eq!(finish_after(b"<!DOC"), Err(SyntaxError::UnclosedDoctype));
        assert_eq!(finish_after(b"<!DOCTYPE r ["), Err(SyntaxError::UnclosedDoctype));
        assert_eq!(finish_after(b"<?xml "), Err(SyntaxError::UnclosedPi));
    }
}
