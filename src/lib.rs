//! High performance streaming SAX reader/writer for XML.
//!
//! ## Description
//!
//! - [`SaxParser`]: a streaming push parser that emits SAX events to a
//!   user-supplied handler, from a complete input, an iterator of byte
//!   chunks, or a reader. Event payloads borrow from the input; chunking
//!   never changes the emitted events.
//! - [`PushParser`]: the incremental interface for callers that obtain
//!   chunks themselves.
//! - [`encode`]: a writer from a tree-shaped "simple form" to a well-formed
//!   XML document.
//!
//! ## Examples
//!
//! ### Parsing
//!
//! ```rust
//! use quick_sax::{parse_str, Control, Event, HandlerError};
//!
//! let xml = r#"<?xml version="1.0"?>
//! <library>
//!     <book lang="en">Wonderland</book>
//!     <book lang="fr">Le Petit Prince</book>
//! </library>"#;
//!
//! let mut books = Vec::new();
//! let mut in_book = false;
//! let mut handler = |event: Event<'_>| -> Result<Control, HandlerError> {
//!     match event {
//!         Event::StartElement { name, attributes } => {
//!             if name == "book" {
//!                 in_book = true;
//!                 assert_eq!(attributes[0].name, "lang");
//!             }
//!         }
//!         Event::EndElement { name } => {
//!             if name == "book" {
//!                 in_book = false;
//!             }
//!         }
//!         Event::Characters(text) => {
//!             if in_book {
//!                 books.push(text.to_string());
//!             }
//!         }
//!         _ => {}
//!     }
//!     Ok(Control::Continue)
//! };
//!
//! parse_str(xml, &mut handler).unwrap();
//! assert_eq!(books, ["Wonderland", "Le Petit Prince"]);
//! ```
//!
//! ### Encoding
//!
//! ```rust
//! use quick_sax::{characters, element, encode, Prolog};
//!
//! let tree = element(
//!     "greeting",
//!     &[("lang", "en")],
//!     vec![characters("hello & goodbye")],
//! );
//! assert_eq!(
//!     encode(&tree, Some(&Prolog::default())),
//!     r#"<?xml version="1.0"?><greeting lang="en">hello &amp; goodbye</greeting>"#
//! );
//! ```
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![cfg_attr(
    feature = "document-features",
    cfg_attr(doc, doc = ::document_features::document_features!())
)]

mod chars;
mod encoder;
mod errors;
mod events;
mod handler;

pub mod escape;
pub mod parser;
pub mod sax;

// reexports
pub use encoder::{
    cdata, characters, comment, element, encode, encode_to_iodata, processing_instruction,
    reference, Element, Node,
};
pub use errors::{Error, ErrorKind, Result, SyntaxError};
pub use events::{Attribute, Event, Prolog};
pub use handler::{Control, HandlerError, SaxHandler};
pub use sax::{parse_chunks, parse_str, Config, EntityPolicy, PushParser, SaxParser};
