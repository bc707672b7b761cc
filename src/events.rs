//! Payload types delivered to a [`SaxHandler`].
//!
//! [`SaxHandler`]: crate::SaxHandler

use std::borrow::Cow;

/// Data of the `<?xml ... ?>` declaration.
///
/// A document without a declaration gets the default prolog (version `1.0`,
/// no encoding, no standalone flag).
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Prolog {
    /// The `version` pseudo-attribute. Only `1.0` is accepted on input.
    pub version: String,
    /// The `encoding` pseudo-attribute as written in the document. When
    /// present it always spells UTF-8, other encodings are rejected.
    pub encoding: Option<String>,
    /// The `standalone` pseudo-attribute (`yes` / `no`).
    pub standalone: Option<bool>,
}

impl Default for Prolog {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            encoding: None,
            standalone: None,
        }
    }
}

/// A single attribute of an element.
///
/// The value is fully expanded: references are resolved and literal
/// whitespace is normalized to spaces.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Attribute<'a> {
    /// Attribute name, exactly as written.
    pub name: Cow<'a, str>,
    /// Expanded attribute value.
    pub value: Cow<'a, str>,
}

/// One parse event.
///
/// All payloads borrow from parser-owned storage and are only valid for the
/// duration of the handler call; copy what needs to outlive it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Event<'a> {
    /// The document prolog was parsed (or defaulted). Always the first event.
    StartDocument(&'a Prolog),
    /// The input ended after a complete document. Always the last event.
    EndDocument,
    /// A start tag, or the start half of an empty-element tag.
    StartElement {
        /// Element name, exactly as written.
        name: &'a str,
        /// Attributes in document order.
        attributes: &'a [Attribute<'a>],
    },
    /// An end tag, or the end half of an empty-element tag.
    EndElement {
        /// Element name, exactly as written.
        name: &'a str,
    },
    /// A run of character data or the body of a CDATA section.
    ///
    /// Character-data runs are expanded and delivered as one event each;
    /// CDATA bodies are delivered verbatim. Consecutive `Characters` events
    /// are not coalesced across CDATA boundaries.
    Characters(&'a str),
}
