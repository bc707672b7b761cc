//! Error management module

use std::fmt;
use std::io;

/// A low-level syntax error raised by the [`Tokenizer`] when a byte cannot
/// continue any production or when the input ends in the middle of a token.
///
/// [`Tokenizer`]: crate::parser::Tokenizer
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SyntaxError {
    /// A `<!` was not followed by `--`, `[CDATA[` or `DOCTYPE`.
    InvalidBangMarkup,
    /// The input ended inside a start, empty or end tag.
    UnclosedTag,
    /// The input ended inside a comment, before `-->` was found.
    UnclosedComment,
    /// The input ended inside a CDATA section, before `]]>` was found.
    UnclosedCData,
    /// The input ended inside a document type definition, before the
    /// closing `>` was found.
    UnclosedDoctype,
    /// The input ended inside a processing instruction or XML declaration,
    /// before `?>` was found.
    UnclosedPi,
}

impl fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::InvalidBangMarkup => {
                f.write_str("only comment, CDATA or DOCTYPE can start with '<!'")
            }
            Self::UnclosedTag => f.write_str("unclosed tag"),
            Self::UnclosedComment => f.write_str("unclosed comment"),
            Self::UnclosedCData => f.write_str("unclosed CDATA section"),
            Self::UnclosedDoctype => f.write_str("unclosed document type definition"),
            Self::UnclosedPi => f.write_str("unclosed processing instruction or XML declaration"),
        }
    }
}

impl std::error::Error for SyntaxError {}

/// The reason a parse failed.
///
/// Each variant carries a human-readable detail; positional information lives
/// in the surrounding [`Error`].
#[derive(Debug)]
pub enum ErrorKind {
    /// Malformed `<?xml ... ?>` declaration or an unsupported XML version.
    BadDeclaration(String),
    /// The declared document encoding is not UTF-8.
    UnsupportedEncoding(String),
    /// A grammar production did not match at the current position.
    BadToken(String),
    /// An identifier violates the NameStartChar/NameChar productions.
    BadName(String),
    /// A duplicate attribute, an unquoted value or a `<` inside a value.
    BadAttribute(String),
    /// A malformed entity or character reference, or an entity reference the
    /// configured policy cannot resolve.
    BadReference(String),
    /// A byte sequence that is not valid UTF-8, or a code point outside the
    /// XML character set.
    BadCharacter(String),
    /// An end tag that does not match the currently open element.
    MismatchedEndTag {
        /// Name of the element that is open.
        expected: String,
        /// Name found in the end tag.
        found: String,
    },
    /// The input ended in the middle of a token or with open elements.
    UnexpectedEof(String),
    /// The literal sequence `]]>` in character data.
    CDataEndInText,
    /// The handler aborted parsing; the detail is the handler's own message.
    Handler(String),
    /// An error raised by the underlying reader.
    Io(io::Error),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::BadDeclaration(detail) => write!(f, "malformed XML declaration: {}", detail),
            Self::UnsupportedEncoding(encoding) => write!(
                f,
                "declared encoding '{}' is not supported, only UTF-8 documents are accepted",
                encoding
            ),
            Self::BadToken(detail) => write!(f, "{}", detail),
            Self::BadName(detail) => write!(f, "invalid name: {}", detail),
            Self::BadAttribute(detail) => write!(f, "invalid attribute: {}", detail),
            Self::BadReference(detail) => write!(f, "invalid reference: {}", detail),
            Self::BadCharacter(detail) => write!(f, "invalid character: {}", detail),
            Self::MismatchedEndTag { expected, found } => {
                write!(f, "expected '</{}>', found '</{}>'", expected, found)
            }
            Self::UnexpectedEof(detail) => write!(f, "unexpected end of input: {}", detail),
            Self::CDataEndInText => f.write_str("']]>' is not allowed in character data"),
            Self::Handler(detail) => write!(f, "handler error: {}", detail),
            Self::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

/// An error produced while parsing an XML document.
#[derive(Debug)]
pub struct Error {
    /// Byte offset into the document at which the error was detected.
    pub offset: usize,
    /// What went wrong.
    pub kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(offset: usize, kind: ErrorKind) -> Self {
        Self { offset, kind }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "error at byte {}: {}", self.offset, self.kind)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match &self.kind {
            ErrorKind::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// A specialized `Result` type where the error is hard-wired to [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
