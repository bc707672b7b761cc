//! Asynchronous chunk driver for `tokio` IO types.

use tokio::io::{AsyncRead, AsyncReadExt};

use crate::errors::{Error, ErrorKind, Result};
use crate::handler::{Control, SaxHandler};

use super::machine::Machine;
use super::SaxParser;

impl SaxParser {
    /// Parses a document from an async reader, pulling it in chunks.
    ///
    /// The handler is invoked synchronously between reads, exactly as in the
    /// blocking entry points, and the emitted events do not depend on how
    /// the reads are sized.
    ///
    /// ```
    /// # async fn example() -> quick_sax::Result<()> {
    /// use quick_sax::{Control, Event, HandlerError, SaxParser};
    ///
    /// let mut depth_max = 0;
    /// let mut depth = 0;
    /// let mut handler = |event: Event<'_>| -> Result<Control, HandlerError> {
    ///     match event {
    ///         Event::StartElement { .. } => {
    ///             depth += 1;
    ///             depth_max = depth_max.max(depth);
    ///         }
    ///         Event::EndElement { .. } => depth -= 1,
    ///         _ => {}
    ///     }
    ///     Ok(Control::Continue)
    /// };
    ///
    /// let input: &[u8] = b"<a><b><c/></b></a>";
    /// SaxParser::new().parse_reader_async(input, &mut handler).await?;
    /// assert_eq!(depth_max, 3);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn parse_reader_async<R, H>(&self, mut reader: R, handler: &mut H) -> Result<()>
    where
        R: AsyncRead + Unpin,
        H: SaxHandler,
    {
        let mut machine = Machine::new();
        let mut buf = [0; 8 * 1024];
        loop {
            let read = match reader.read(&mut buf).await {
                Ok(0) => break,
                Ok(read) => read,
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
