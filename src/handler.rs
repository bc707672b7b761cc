//! The capability invoked for every parse event.

use crate::events::Event;

/// The error type handlers may return; it is wrapped into
/// [`ErrorKind::Handler`] by the parser.
///
/// [`ErrorKind::Handler`]: crate::ErrorKind::Handler
pub type HandlerError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Verdict of a single handler invocation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Control {
    /// Keep parsing.
    Continue,
    /// Cease parsing immediately and report success, even if input remains.
    Stop,
}

/// Receives parse events and accumulates whatever state the caller needs.
///
/// Implement the trait on your own type, or pass a closure: any
/// `FnMut(Event<'_>) -> Result<Control, HandlerError>` is a handler.
///
/// ```
/// use quick_sax::{parse_str, Control, Event, HandlerError};
///
/// #[derive(Default)]
/// struct TextCollector(String);
///
/// impl quick_sax::SaxHandler for TextCollector {
///     fn event(&mut self, event: Event<'_>) -> Result<Control, HandlerError> {
///         if let Event::Characters(text) = event {
///             self.0.push_str(text);
///         }
///         Ok(Control::Continue)
///     }
/// }
///
/// let mut collector = TextCollector::default();
/// parse_str("<greeting>hello <b>world</b></greeting>", &mut collector).unwrap();
/// assert_eq!(collector.0, "hello world");
/// ```
pub trait SaxHandler {
    /// Handles one event.
    ///
    /// Returning [`Control::Stop`] halts the parse successfully before the
    /// next event; returning an error aborts it with
    /// [`ErrorKind::Handler`].
    ///
    /// [`ErrorKind::Handler`]: crate::ErrorKind::Handler
    fn event(&mut self, event: Event<'_>) -> Result<Control, HandlerError>;
}

impl<F> SaxHandler for F
where
    F: FnMut(Event<'_>) -> Result<Control, HandlerError>,
{
    fn event(&mut self, event: Event<'_>) -> Result<Control, HandlerError> {
        self(event)
    }
}
