//! The streaming SAX parser: configuration and entry points.

use std::fmt;
use std::io::{self, Read};

use crate::errors::{Error, ErrorKind, Result};
use crate::handler::{Control, SaxHandler};

use machine::Machine;

#[cfg(feature = "async-tokio")]
mod async_tokio;
mod buffer;
mod machine;

/// How entity references other than the five predefined ones are expanded in
/// character data and attribute values.
///
/// Character references (`&#N;`, `&#xH;`) and the predefined entities
/// (`&amp;` `&lt;` `&gt;` `&quot;` `&apos;`) are always resolved; this policy
/// only governs the rest.
pub enum EntityPolicy {
    /// Pass the reference through verbatim, `&name;` and all.
    Keep,
    /// Omit the reference from the output text.
    Skip,
    /// Ask a user function for the replacement text. The returned string is
    /// spliced in verbatim and not re-scanned for further references;
    /// `None` fails the parse with a reference error.
    Callback(Box<dyn Fn(&str) -> Option<String>>),
}

impl Default for EntityPolicy {
    fn default() -> Self {
        Self::Keep
    }
}

impl fmt::Debug for EntityPolicy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Keep => f.write_str("Keep"),
            Self::Skip => f.write_str("Skip"),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

/// User-defined settings that affect parsing.
#[derive(Debug, Default)]
pub struct Config {
    /// Expansion policy for entity references that are not predefined.
    /// Defaults to [`EntityPolicy::Keep`].
    pub expand_entity: EntityPolicy,
}

/// A streaming push parser for XML 1.0 documents.
///
/// The parser walks the input and calls the handler for every event in
/// document order; the handler accumulates whatever state it needs and can
/// halt the parse at any event. Input can be a complete string or slice, an
/// iterator of chunks, or a reader; the chunking never changes the emitted
/// events.
///
/// ```
/// use quick_sax::{Config, Control, EntityPolicy, Event, HandlerError, SaxParser};
///
/// let parser = SaxParser::with_config(Config {
///     expand_entity: EntityPolicy::Skip,
/// });
///
/// let mut text = String::new();
/// let mut handler = |event: Event<'_>| -> Result<Control, HandlerError> {
///     if let Event::Characters(chars) = event {
///         text.push_str(chars);
///     }
///     Ok(Control::Continue)
/// };
/// parser.parse_str("<p>fish &amp; chips&trade;</p>", &mut handler).unwrap();
/// assert_eq!(text, "fish & chips");
/// ```
#[derive(Debug, Default)]
pub struct SaxParser {
    config: Config,
}

impl SaxParser {
    /// Creates a parser with the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parser with the given configuration.
    pub fn with_config(config: Config) -> Self {
        Self { config }
    }

    /// Returns the parser configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns a mutable reference to the parser configuration.
    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    /// Parses a complete document held in a string.
    pub fn parse_str<H: SaxHandler>(&self, input: &str, handler: &mut H) -> Result<()> {
        self.parse_bytes(input.as_bytes(), handler)
    }

    /// Parses a complete document held in a byte slice.
    pub fn parse_bytes<H: SaxHandler>(&self, input: &[u8], handler: &mut H) -> Result<()> {
        let mut machine = Machine::new();
        if machine.feed(&self.config, input, handler)? == Control::Stop {
            return Ok(());
        }
        machine.finish(&self.config, handler)?;
        Ok(())
    }

    /// Parses a document delivered as a sequence of byte chunks.
    ///
    /// The chunks may split the document at any byte, including inside a
    /// multi-byte character. When the handler stops the parse no further
    /// chunks are pulled from the iterator.
    pub fn parse_chunks<I, H>(&self, chunks: I, handler: &mut H) -> Result<()>
    where
        I: IntoIterator,
        I::Item: AsRef<[u8]>,
        H: SaxHandler,
    {
        let mut machine = Machine::new();
        for chunk in chunks {
            if machine.feed(&self.config, chunk.as_ref(), handler)? == Control::Stop {
                return Ok(());
            }
        }
        machine.finish(&self.config, handler)?;
        Ok(())
    }

    /// Parses a document from a [`Read`] implementor, pulling it in chunks.
    pub fn parse_reader<R: Read, H: SaxHandler>(&self, mut reader: R, handler: &mut H) -> Result<()> {
        let mut machine = Machine::new();
        let mut buf = [0; 8 * 1024];
        loop {
            let read = match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(read) => read,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::new(machine.position(), ErrorKind::Io(e))),
            };
            if machine.feed(&self.config, &buf[..read], handler)? == Control::Stop {
                return Ok(());
            }
        }
        machine.finish(&self.config, handler)?;
        Ok(())
    }
}

/// Parses a complete document with the default configuration.
///
/// See [`SaxParser::parse_str`].
pub fn parse_str<H: SaxHandler>(input: &str, handler: &mut H) -> Result<()> {
    SaxParser::new().parse_str(input, handler)
}

/// Parses a document delivered as a sequence of byte chunks with the default
/// configuration.
///
/// See [`SaxParser::parse_chunks`].
pub fn parse_chunks<I, H>(chunks: I, handler: &mut H) -> Result<()>
where
    I: IntoIterator,
    I::Item: AsRef<[u8]>,
    H: SaxHandler,
{
    SaxParser::new().parse_chunks(chunks, handler)
}

/// An incremental push interface for callers that obtain chunks themselves.
///
/// [`feed`] each chunk as it arrives and [`finish`] when the input is
/// exhausted. Between calls the parser suspends at its exact logical
/// position, so the chunking never changes the emitted events.
///
/// ```
/// use quick_sax::{Control, Event, HandlerError, PushParser};
///
/// let mut names = Vec::new();
/// let handler = |event: Event<'_>| -> Result<Control, HandlerError> {
///     if let Event::StartElement { name, .. } = event {
///         names.push(name.to_string());
///     }
///     Ok(Control::Continue)
/// };
///
/// let mut parser = PushParser::new(handler);
/// parser.feed(b"<doc><ite").unwrap();
/// parser.feed(b"m/></doc>").unwrap();
/// parser.finish().unwrap();
/// assert_eq!(names, ["doc", "item"]);
/// ```
///
/// [`feed`]: Self::feed
/// [`finish`]: Self::finish
pub struct PushParser<H: SaxHandler> {
    config: Config,
    machine: Machine,
    handler: H,
}

impl<H: SaxHandler> PushParser<H> {
    /// Creates a push parser with the default configuration.
    pub fn new(handler: H) -> Self {
        Self::with_config(Config::default(), handler)
    }

    /// Creates a push parser with the given configuration.
    pub fn with_config(config: Config, handler: H) -> Self {
        Self {
            config,
            machine: Machine::new(),
            handler,
        }
    }

    /// Feeds the next chunk, dispatching every event that completes in it.
    ///
    /// Returns [`Control::Stop`] once the handler votes to stop; feeding
    /// after that is a no-op reporting [`Control::Stop`] again.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Control> {
        let Self {
            config,
            machine,
            handler,
        } = self;
        machine.feed(config, chunk, handler)
    }

    /// Signals end of input and returns the handler.
    ///
    /// Unless the handler already stopped the parse, this checks that the
    /// document is complete and emits the final event.
    pub fn finish(mut self) -> Result<H> {
        let Self {
            config,
            machine,
            handler,
        } = &mut self;
        machine.finish(config, handler)?;
        Ok(self.handler)
    }

    /// Returns the handler.
    pub fn handler(&self) -> &H {
        &self.handler
    }

    /// Returns a mutable reference to the handler.
    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    /// Consumes the parser, returning the handler without an end-of-input
    /// check.
    pub fn into_handler(self) -> H {
        self.handler
    }
}
