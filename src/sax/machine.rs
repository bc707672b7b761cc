//! The grammar-directed half of the parser: turns complete tokens into
//! events, enforces well-formedness and threads handler verdicts.

use std::borrow::Cow;
use std::str;

use crate::chars::{is_name_char, is_name_start_char, is_whitespace, is_xml_char};
use crate::errors::{Error, ErrorKind, Result};
use crate::escape::{parse_char_reference, resolve_predefined_entity};
use crate::events::{Attribute, Event, Prolog};
use crate::handler::{Control, SaxHandler};
use crate::parser::{FeedResult, Tokenizer};
use crate::sax::buffer::TokenBuffer;
use crate::sax::{Config, EntityPolicy};

/// Which part of the document grammar the machine currently accepts.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Section {
    /// Prolog and misc items before the root element.
    Misc,
    /// Inside the root element.
    Content,
    /// After the root element closed; only whitespace, comments and
    /// processing instructions may follow.
    Epilog,
}

/// Completed-token kinds handed from the tokenizer to the dispatchers.
#[derive(Clone, Copy, Debug)]
enum TokenKind {
    Start,
    Empty,
    End,
    Comment,
    CData,
    Pi,
    Doctype,
}

/// The parse state threaded through a whole document: tokenizer position,
/// carryover bytes, grammar section, prolog and the open-element stack.
#[derive(Debug, Default)]
pub(crate) struct Machine {
    tokenizer: Tokenizer,
    pending: TokenBuffer,
    /// Absolute byte offset of the first byte of the token being scanned.
    token_start: usize,
    section: Section,
    /// Names of all elements opened and not yet closed, in document order.
    open: Vec<String>,
    prolog: Prolog,
    document_started: bool,
    seen_root: bool,
    seen_doctype: bool,
    /// Whether any non-empty token was dispatched; the XML declaration is
    /// only recognised before that.
    seen_any_token: bool,
    stopped: bool,
}

impl Default for Section {
    fn default() -> Self {
        Self::Misc
    }
}

impl Machine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute offset of the next unconsumed byte.
    pub fn position(&self) -> usize {
        self.token_start + self.pending.len()
    }

    /// Consumes one chunk, dispatching every token that completes within it.
    ///
    /// Returns [`Control::Stop`] once the handler votes to stop; further
    /// calls are no-ops then.
    pub fn feed<H: SaxHandler>(
        &mut self,
        config: &Config,
        mut chunk: &[u8],
        handler: &mut H,
    ) -> Result<Control> {
        if self.stopped {
            return Ok(Control::Stop);
        }
        loop {
            let fed = self
                .tokenizer
                .feed(chunk)
                .map_err(|e| Error::new(self.token_start, ErrorKind::BadToken(e.to_string())))?;
            match fed {
                FeedResult::NeedData => {
                    self.pending.push_slice(chunk);
                    return Ok(Control::Continue);
                }
                FeedResult::Bom(n) => {
                    let (token, _) = self.complete(chunk, n);
                    if let Cow::Owned(spent) = token {
                        self.pending.recycle(spent);
                    }
                    chunk = &chunk[n..];
                }
                FeedResult::Text(n) => {
                    let (token, start) = self.complete(chunk, n);
                    // the consumed count includes the `<` that ended the run
                    let body = &token[..token.len() - 1];
                    let result = if body.is_empty() {
                        Ok(Control::Continue)
                    } else {
                        self.text_token(config, body, start, handler)
                    };
                    if let Cow::Owned(spent) = token {
                        self.pending.recycle(spent);
                    }
                    // the `<` opens the markup token that follows
                    self.pending.push_slice(b"<");
                    self.token_start -= 1;
                    chunk = &chunk[n..];
                    if result? == Control::Stop {
                        self.stopped = true;
                        return Ok(Control::Stop);
                    }
                }
                other => {
                    let (kind, n) = match other {
                        FeedResult::StartTag(n) => (TokenKind::Start, n),
                        FeedResult::EmptyTag(n) => (TokenKind::Empty, n),
                        FeedResult::EndTag(n) => (TokenKind::End, n),
                        FeedResult::Comment(n) => (TokenKind::Comment, n),
                        FeedResult::CData(n) => (TokenKind::CData, n),
                        FeedResult::Pi(n) => (TokenKind::Pi, n),
                        FeedResult::Doctype(n) => (TokenKind::Doctype, n),
                        FeedResult::NeedData | FeedResult::Bom(_) | FeedResult::Text(_) => {
                            unreachable!("handled above")
                        }
                    };
                    let (token, start) = self.complete(chunk, n);
                    let result = self.markup_token(config, kind, &token, start, handler);
                    if let Cow::Owned(spent) = token {
                        self.pending.recycle(spent);
                    }
                    chunk = &chunk[n..];
                    if result? == Control::Stop {
                        self.stopped = true;
                        return Ok(Control::Stop);
                    }
                }
            }
        }
    }

    /// Signals end of input: flushes a trailing character-data run, checks
    /// document completeness and emits the final event.
    pub fn finish<H: SaxHandler>(&mut self, config: &Config, handler: &mut H) -> Result<Control> {
        if self.stopped {
            return Ok(Control::Stop);
        }
        if let Err(e) = self.tokenizer.finish() {
            return Err(Error::new(
                self.token_start,
                ErrorKind::UnexpectedEof(e.to_string()),
            ));
        }
        let end = self.position();
        if let Some(open) = self.open.last() {
            return Err(Error::new(
                end,
                ErrorKind::UnexpectedEof(format!("unclosed element '{}'", open)),
            ));
        }
        if !self.pending.is_empty() {
            let tail = self.pending.take();
            let start = self.token_start;
            self.token_start = end;
            let result = self.text_token(config, &tail, start, handler);
            self.pending.recycle(tail);
            if result? == Control::Stop {
                self.stopped = true;
                return Ok(Control::Stop);
            }
        }
        if !self.seen_root {
            return Err(Error::new(
                end,
                ErrorKind::UnexpectedEof("missing root element".to_string()),
            ));
        }
        self.emit(end, Event::EndDocument, handler)
    }

    /// Takes the bytes of the completed token: the carryover from previous
    /// chunks plus `len` bytes of the current one. Single-chunk tokens are
    /// borrowed, spanning tokens come from the materialised carryover.
    fn complete<'a>(&mut self, chunk: &'a [u8], len: usize) -> (Cow<'a, [u8]>, usize) {
        let start = self.token_start;
        let token = if self.pending.is_empty() {
            Cow::Borrowed(&chunk[..len])
        } else {
            self.pending.push_slice(&chunk[..len]);
            Cow::Owned(self.pending.take())
        };
        self.token_start = start + token.len();
        (token, start)
    }

    fn markup_token<H: SaxHandler>(
        &mut self,
        config: &Config,
        kind: TokenKind,
        token: &[u8],
        start: usize,
        handler: &mut H,
    ) -> Result<Control> {
        let first = !self.seen_any_token;
        self.seen_any_token = true;
        // the XML declaration is the only token preceding start_document
        if !matches!(kind, TokenKind::Pi) {
            if self.ensure_started(start, handler)? == Control::Stop {
                return Ok(Control::Stop);
            }
        }
        match kind {
            TokenKind::Start => self.element_tag(config, token, start, false, handler),
            TokenKind::Empty => self.element_tag(config, token, start, true, handler),
            TokenKind::End => self.end_tag(token, start, handler),
            TokenKind::Comment => self.comment_token(token, start),
            TokenKind::CData => self.cdata_token(token, start, handler),
            TokenKind::Pi => self.pi_token(token, start, first, handler),
            TokenKind::Doctype => self.doctype_token(token, start),
        }
    }

    /// Dispatches a complete character-data run (without the terminating
    /// `<`, if any).
    fn text_token<H: SaxHandler>(
        &mut self,
        config: &Config,
        body: &[u8],
        start: usize,
        handler: &mut H,
    ) -> Result<Control> {
        self.seen_any_token = true;
        if self.ensure_started(start, handler)? == Control::Stop {
            return Ok(Control::Stop);
        }
        let text = decode_utf8(body, start)?;
        match self.section {
            Section::Misc | Section::Epilog => {
                if let Some(i) = text.bytes().position(|b| !is_whitespace(b)) {
                    return Err(Error::new(
                        start + i,
                        ErrorKind::BadToken(
                            "character data is not allowed outside the root element".to_string(),
                        ),
                    ));
                }
                Ok(Control::Continue)
            }
            Section::Content => {
                for i in memchr::memchr_iter(b'>', body) {
                    if body[..i].ends_with(b"]]") {
                        return Err(Error::new(start + i - 2, ErrorKind::CDataEndInText));
                    }
                }
                validate_chars(text, start)?;
                let expanded = expand_text(text, start, &config.expand_entity)?;
                self.emit(start, Event::Characters(&expanded), handler)
            }
        }
    }

    /// Dispatches a `<name ...>` or `<name .../>` tag.
    fn element_tag<H: SaxHandler>(
        &mut self,
        config: &Config,
        token: &[u8],
        start: usize,
        empty: bool,
        handler: &mut H,
    ) -> Result<Control> {
        if self.section == Section::Epilog {
            return Err(Error::new(
                start,
                ErrorKind::BadToken("a document can contain only one root element".to_string()),
            ));
        }
        // strip `<`, `>` and, for an empty-element tag, the `/`
        let content = &token[1..token.len() - if empty { 2 } else { 1 }];
        let content = decode_utf8(content, start + 1)?;
        let (name, rest) = parse_name(content, start + 1)?;

        let mut attributes: Vec<Attribute> = Vec::new();
        let mut cursor = rest;
        let mut cpos = start + 1 + name.len();
        loop {
            let ws = leading_whitespace(cursor);
            if ws == 0 {
                if cursor.is_empty() {
                    break;
                }
                return Err(Error::new(
                    cpos,
                    ErrorKind::BadToken("expected whitespace before an attribute".to_string()),
                ));
            }
            cursor = &cursor[ws..];
            cpos += ws;
            if cursor.is_empty() {
                break;
            }

            let (attr_name, after) = parse_name(cursor, cpos)?;
            if attributes.iter().any(|a| a.name == attr_name) {
                return Err(Error::new(
                    cpos,
                    ErrorKind::BadAttribute(format!("duplicate attribute '{}'", attr_name)),
                ));
            }
            cursor = after;
            cpos += attr_name.len();

            // Name S? = S? value
            let ws = leading_whitespace(cursor);
            cursor = &cursor[ws..];
            cpos += ws;
            if !cursor.starts_with('=') {
                return Err(Error::new(
                    cpos,
                    ErrorKind::BadAttribute(format!("expected '=' after '{}'", attr_name)),
                ));
            }
            cursor = &cursor[1..];
            cpos += 1;
            let ws = leading_whitespace(cursor);
            cursor = &cursor[ws..];
            cpos += ws;

            let quote = match cursor.bytes().next() {
                Some(q @ (b'"' | b'\'')) => q,
                _ => {
                    return Err(Error::new(
                        cpos,
                        ErrorKind::BadAttribute("attribute value must be quoted".to_string()),
                    ))
                }
            };
            cursor = &cursor[1..];
            cpos += 1;
            let end = match memchr::memchr(quote, cursor.as_bytes()) {
                Some(end) => end,
                None => {
                    return Err(Error::new(
                        cpos - 1,
                        ErrorKind::BadAttribute("unclosed attribute value".to_string()),
                    ))
                }
            };
            let raw = &cursor[..end];
            if let Some(i) = memchr::memchr(b'<', raw.as_bytes()) {
                return Err(Error::new(
                    cpos + i,
                    ErrorKind::BadAttribute(
                        "'<' is not allowed in an attribute value".to_string(),
                    ),
                ));
            }
            validate_chars(raw, cpos)?;
            let value = expand_attribute_value(raw, cpos, &config.expand_entity)?;
            attributes.push(Attribute {
                name: Cow::Borrowed(attr_name),
                value,
            });
            cursor = &cursor[end + 1..];
            cpos += end + 1;
        }

        let was_root = self.section == Section::Misc;
        if was_root {
            self.seen_root = true;
        }

        let ctrl = self.emit(
            start,
            Event::StartElement {
                name,
                attributes: &attributes,
            },
            handler,
        )?;
        if empty {
            if ctrl == Control::Stop {
                return Ok(Control::Stop);
            }
            if was_root {
                self.section = Section::Epilog;
            }
            self.emit(start, Event::EndElement { name }, handler)
        } else {
            self.open.push(name.to_string());
            self.section = Section::Content;
            Ok(ctrl)
        }
    }

    /// Dispatches a `</name>` tag; the name must match the innermost open
    /// element byte for byte.
    fn end_tag<H: SaxHandler>(
        &mut self,
        token: &[u8],
        start: usize,
        handler: &mut H,
    ) -> Result<Control> {
        let content = decode_utf8(&token[2..token.len() - 1], start + 2)?;
        let (name, rest) = parse_name(content, start + 2)?;
        if !rest.bytes().all(is_whitespace) {
            let extra = start + 2 + name.len() + leading_whitespace(rest);
            return Err(Error::new(
                extra,
                ErrorKind::BadToken("unexpected content in an end tag".to_string()),
            ));
        }
        match self.open.pop() {
            Some(expected) if expected == name => {
                if self.open.is_empty() {
                    self.section = Section::Epilog;
                }
                self.emit(start, Event::EndElement { name }, handler)
            }
            Some(expected) => Err(Error::new(
                start,
                ErrorKind::MismatchedEndTag {
                    expected,
                    found: name.to_string(),
                },
            )),
            None => Err(Error::new(
                start,
                ErrorKind::BadToken(format!("end tag '</{}>' outside the root element", name)),
            )),
        }
    }

    /// Validates a comment; comments produce no events.
    fn comment_token(&mut self, token: &[u8], start: usize) -> Result<Control> {
        let body = decode_utf8(&token[4..token.len() - 3], start + 4)?;
        if let Some(i) = body.find("--") {
            return Err(Error::new(
                start + 4 + i,
                ErrorKind::BadToken("'--' is not allowed in a comment".to_string()),
            ));
        }
        validate_chars(body, start + 4)?;
        Ok(Control::Continue)
    }

    /// Dispatches a CDATA section: its body is delivered verbatim, with no
    /// reference expansion and no normalization.
    fn cdata_token<H: SaxHandler>(
        &mut self,
        token: &[u8],
        start: usize,
        handler: &mut H,
    ) -> Result<Control> {
        if self.section != Section::Content {
            return Err(Error::new(
                start,
                ErrorKind::BadToken(
                    "a CDATA section is not allowed outside the root element".to_string(),
                ),
            ));
        }
        let body = decode_utf8(&token[9..token.len() - 3], start + 9)?;
        validate_chars(body, start + 9)?;
        self.emit(start, Event::Characters(body), handler)
    }

    /// Dispatches a processing instruction; the very first token of the
    /// document with the exact target `xml` is the XML declaration.
    fn pi_token<H: SaxHandler>(
        &mut self,
        token: &[u8],
        start: usize,
        first: bool,
        handler: &mut H,
    ) -> Result<Control> {
        let content = decode_utf8(&token[2..token.len() - 2], start + 2)?;
        let (target, rest) = parse_name(content, start + 2)?;
        if target.eq_ignore_ascii_case("xml") {
            if first && target == "xml" {
                self.prolog = parse_declaration(rest, start + 2 + target.len())?;
                self.document_started = true;
                return self.emit(start, Event::StartDocument(&self.prolog), handler);
            }
            return Err(Error::new(
                start,
                ErrorKind::BadToken(
                    "processing instruction target 'xml' is reserved for the XML declaration"
                        .to_string(),
                ),
            ));
        }
        if self.ensure_started(start, handler)? == Control::Stop {
            return Ok(Control::Stop);
        }
        if !rest.is_empty() && leading_whitespace(rest) == 0 {
            return Err(Error::new(
                start + 2 + target.len(),
                ErrorKind::BadToken(
                    "expected whitespace after the processing instruction target".to_string(),
                ),
            ));
        }
        validate_chars(rest, start + 2 + target.len())?;
        Ok(Control::Continue)
    }

    /// Validates the placement of a DOCTYPE definition; its content is
    /// skipped structurally and produces no events.
    fn doctype_token(&mut self, token: &[u8], start: usize) -> Result<Control> {
        if self.section != Section::Misc {
            return Err(Error::new(
                start,
                ErrorKind::BadToken("DOCTYPE is only allowed before the root element".to_string()),
            ));
        }
        if self.seen_doctype {
            return Err(Error::new(
                start,
                ErrorKind::BadToken("only one DOCTYPE definition is allowed".to_string()),
            ));
        }
        self.seen_doctype = true;
        let content = decode_utf8(&token[9..token.len() - 1], start + 9)?;
        validate_chars(content, start + 9)?;
        let ws = leading_whitespace(content);
        if ws == 0 {
            return Err(Error::new(
                start + 9,
                ErrorKind::BadToken("expected whitespace after DOCTYPE".to_string()),
            ));
        }
        parse_name(&content[ws..], start + 9 + ws)?;
        Ok(Control::Continue)
    }

    /// Emits `start_document` once, before the first structural event.
    fn ensure_started<H: SaxHandler>(&mut self, start: usize, handler: &mut H) -> Result<Control> {
        if self.document_started {
            return Ok(Control::Continue);
        }
        self.document_started = true;
        self.emit(start, Event::StartDocument(&self.prolog), handler)
    }

    fn emit<H: SaxHandler>(
        &self,
        start: usize,
        event: Event<'_>,
        handler: &mut H,
    ) -> Result<Control> {
        handler
            .event(event)
            .map_err(|e| Error::new(start, ErrorKind::Handler(e.to_string())))
    }
}

fn decode_utf8(bytes: &[u8], start: usize) -> Result<&str> {
    str::from_utf8(bytes).map_err(|e| {
        Error::new(
            start + e.valid_up_to(),
            ErrorKind::BadCharacter("invalid UTF-8 sequence".to_string()),
        )
    })
}

fn validate_chars(text: &str, start: usize) -> Result<()> {
    for (i, c) in text.char_indices() {
        if !is_xml_char(c) {
            return Err(Error::new(
                start + i,
                ErrorKind::BadCharacter(format!("code point U+{:04X} is not allowed", c as u32)),
            ));
        }
    }
    Ok(())
}

/// Splits a `Name` production off the front of `text`.
fn parse_name(text: &str, pos: usize) -> Result<(&str, &str)> {
    let mut chars = text.char_indices();
    match chars.next() {
        Some((_, c)) if is_name_start_char(c) => {}
        Some((_, c)) => {
            return Err(Error::new(
                pos,
                ErrorKind::BadName(format!("'{}' cannot start a name", c)),
            ))
        }
        None => return Err(Error::new(pos, ErrorKind::BadName("empty name".to_string()))),
    }
    let end = chars
        .find(|&(_, c)| !is_name_char(c))
        .map_or(text.len(), |(i, _)| i);
    Ok(text.split_at(end))
}

/// Number of leading whitespace bytes (XML `S` is ASCII-only).
fn leading_whitespace(text: &str) -> usize {
    text.bytes().take_while(|&b| is_whitespace(b)).count()
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if is_name_start_char(c) => chars.all(is_name_char),
        _ => false,
    }
}

/// Parses the pseudo-attributes of `<?xml ... ?>`.
fn parse_declaration(text: &str, pos: usize) -> Result<Prolog> {
    let mut version: Option<String> = None;
    let mut encoding: Option<String> = None;
    let mut standalone: Option<bool> = None;
    let mut cursor = text;
    let mut cpos = pos;
    loop {
        let ws = leading_whitespace(cursor);
        if ws == 0 && !cursor.is_empty() {
            return Err(Error::new(
                cpos,
                ErrorKind::BadDeclaration(
                    "expected whitespace between pseudo-attributes".to_string(),
                ),
            ));
        }
        cursor = &cursor[ws..];
        cpos += ws;
        if cursor.is_empty() {
            break;
        }

        let (key, after) = parse_name(cursor, cpos).map_err(|e| {
            Error::new(
                e.offset,
                ErrorKind::BadDeclaration("expected a pseudo-attribute name".to_string()),
            )
        })?;
        let mut rest = after;
        let mut rpos = cpos + key.len();
        let ws = leading_whitespace(rest);
        rest = &rest[ws..];
        rpos += ws;
        if !rest.starts_with('=') {
            return Err(Error::new(
                rpos,
                ErrorKind::BadDeclaration(format!("expected '=' after '{}'", key)),
            ));
        }
        rest = &rest[1..];
        rpos += 1;
        let ws = leading_whitespace(rest);
        rest = &rest[ws..];
        rpos += ws;
        let quote = match rest.bytes().next() {
            Some(q @ (b'"' | b'\'')) => q,
            _ => {
                return Err(Error::new(
                    rpos,
                    ErrorKind::BadDeclaration("pseudo-attribute value must be quoted".to_string()),
                ))
            }
        };
        rest = &rest[1..];
        rpos += 1;
        let end = match memchr::memchr(quote, rest.as_bytes()) {
            Some(end) => end,
            None => {
                return Err(Error::new(
                    rpos - 1,
                    ErrorKind::BadDeclaration("unclosed pseudo-attribute value".to_string()),
                ))
            }
        };
        let value = &rest[..end];
        match key {
            "version" if version.is_none() && encoding.is_none() && standalone.is_none() => {
                if value != "1.0" {
                    return Err(Error::new(
                        rpos,
                        ErrorKind::BadDeclaration(format!("unsupported version '{}'", value)),
                    ));
                }
                version = Some(value.to_string());
            }
            "encoding" if version.is_some() && encoding.is_none() && standalone.is_none() => {
                if !value.eq_ignore_ascii_case("utf-8") {
                    return Err(Error::new(
                        rpos,
                        ErrorKind::UnsupportedEncoding(value.to_string()),
                    ));
                }
                encoding = Some(value.to_string());
            }
            "standalone" if version.is_some() && standalone.is_none() => {
                standalone = Some(match value {
                    "yes" => true,
                    "no" => false,
                    _ => {
                        return Err(Error::new(
                            rpos,
                            ErrorKind::BadDeclaration(format!(
                                "standalone must be 'yes' or 'no', found '{}'",
                                value
                            )),
                        ))
                    }
                });
            }
            _ => {
                return Err(Error::new(
                    cpos,
                    ErrorKind::BadDeclaration(format!("unexpected pseudo-attribute '{}'", key)),
                ))
            }
        }
        cursor = &rest[end + 1..];
        cpos = rpos + end + 1;
    }
    match version {
        Some(version) => Ok(Prolog {
            version,
            encoding,
            standalone,
        }),
        None => Err(Error::new(
            pos,
            ErrorKind::BadDeclaration("the 'version' pseudo-attribute is required".to_string()),
        )),
    }
}

/// Expands references in a character-data run.
fn expand_text<'a>(raw: &'a str, start: usize, policy: &EntityPolicy) -> Result<Cow<'a, str>> {
    let bytes = raw.as_bytes();
    let mut expanded: Option<String> = None;
    let mut last_end = 0;
    for amp in memchr::memchr_iter(b'&', bytes) {
        if amp < last_end {
            continue;
        }
        let expanded = expanded.get_or_insert_with(|| String::with_capacity(raw.len()));
        expanded.push_str(&raw[last_end..amp]);
        let semi = match memchr::memchr(b';', &bytes[amp..]) {
            Some(p) => amp + p,
            None => {
                return Err(Error::new(
                    start + amp,
                    ErrorKind::BadReference("expected ';' to terminate the reference".to_string()),
                ))
            }
        };
        expand_reference(
            &raw[amp + 1..semi],
            &raw[amp..=semi],
            start + amp,
            policy,
            expanded,
        )?;
        last_end = semi + 1;
    }
    Ok(match expanded {
        Some(mut expanded) => {
            expanded.push_str(&raw[last_end..]);
            Cow::Owned(expanded)
        }
        None => Cow::Borrowed(raw),
    })
}

/// Expands references in an attribute value and normalizes literal
/// whitespace to spaces. Whitespace written as a character reference stays
/// the referenced code point.
fn expand_attribute_value<'a>(
    raw: &'a str,
    start: usize,
    policy: &EntityPolicy,
) -> Result<Cow<'a, str>> {
    let bytes = raw.as_bytes();
    if !bytes
        .iter()
        .any(|&b| matches!(b, b'&' | b'\t' | b'\n' | b'\r'))
    {
        return Ok(Cow::Borrowed(raw));
    }
    let mut out = String::with_capacity(raw.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\t' | b'\n' | b'\r' => {
                out.push(' ');
                i += 1;
            }
            b'&' => {
                let semi = match memchr::memchr(b';', &bytes[i..]) {
                    Some(p) => i + p,
                    None => {
                        return Err(Error::new(
                            start + i,
                            ErrorKind::BadReference(
                                "expected ';' to terminate the reference".to_string(),
                            ),
                        ))
                    }
                };
                expand_reference(&raw[i + 1..semi], &raw[i..=semi], start + i, policy, &mut out)?;
                i = semi + 1;
            }
            _ => {
                let mut j = i + 1;
                while j < bytes.len() && !matches!(bytes[j], b'&' | b'\t' | b'\n' | b'\r') {
                    j += 1;
                }
                out.push_str(&raw[i..j]);
                i = j;
            }
        }
    }
    Ok(Cow::Owned(out))
}

/// Expands a single `&...;` occurrence into `out`.
///
/// `body` is the text between `&` and `;`, `original` the whole reference
/// including the frame. Character references are range-checked; unknown
/// entities go through the configured policy. Replacement text returned by a
/// callback is spliced verbatim and never re-scanned.
fn expand_reference(
    body: &str,
    original: &str,
    pos: usize,
    policy: &EntityPolicy,
    out: &mut String,
) -> Result<()> {
    if let Some(digits) = body.strip_prefix("#x") {
        return match parse_char_reference(digits, true) {
            Some(c) => {
                out.push(c);
                Ok(())
            }
            None => Err(bad_reference(pos, original)),
        };
    }
    if let Some(digits) = body.strip_prefix('#') {
        return match parse_char_reference(digits, false) {
            Some(c) => {
                out.push(c);
                Ok(())
            }
            None => Err(bad_reference(pos, original)),
        };
    }
    if let Some(replacement) = resolve_predefined_entity(body) {
        out.push_str(replacement);
        return Ok(());
    }
    if !is_valid_name(body) {
        return Err(bad_reference(pos, original));
    }
    match policy {
        EntityPolicy::Keep => out.push_str(original),
        EntityPolicy::Skip => {}
        EntityPolicy::Callback(resolve) => match resolve(body) {
            Some(replacement) => out.push_str(&replacement),
            None => {
                return Err(Error::new(
                    pos,
                    ErrorKind::BadReference(format!("entity '{}' cannot be resolved", original)),
                ))
            }
        },
    }
    Ok(())
}

fn bad_reference(pos: usize, original: &str) -> Error {
    Error::new(
        pos,
        ErrorKind::BadReference(format!("malformed reference '{}'", original)),
    )
}
