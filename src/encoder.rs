//! A module to encode a "simple form" tree into an XML document.

use std::borrow::Cow;

use crate::escape::{escape, escape_attribute_value};
use crate::events::Prolog;

/// One node of the simple form.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize)
)]
pub enum Node {
    /// An element with attributes and children.
    Element(Element),
    /// Character data; markup-significant characters are escaped on output.
    Characters(String),
    /// A CDATA section, emitted verbatim. A body containing `]]>` is split
    /// into adjacent sections at the marker boundary.
    CData(String),
    /// An entity reference, rendered as `&name;`.
    Reference(String),
    /// A comment. The body must not contain `--`.
    Comment(String),
    /// A processing instruction.
    ProcessingInstruction {
        /// The instruction target.
        target: String,
        /// Everything between the target and the closing `?>`.
        data: String,
    },
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// An element of the simple form.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(
    feature = "serde-types",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Element {
    /// Tag name.
    pub name: String,
    /// Attributes in document order. Values are raw text; escaping happens
    /// on output.
    pub attributes: Vec<(String, String)>,
    /// Child nodes in document order.
    pub children: Vec<Node>,
}

/// Builds an element node.
///
/// ```
/// use quick_sax::{characters, element, encode};
///
/// let tree = element("foo", &[("g", "f")], vec![characters("Alice")]);
/// assert_eq!(encode(&tree, None), r#"<foo g="f">Alice</foo>"#);
/// ```
pub fn element(name: &str, attributes: &[(&str, &str)], children: Vec<Node>) -> Element {
    Element {
        name: name.to_string(),
        attributes: attributes
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        children,
    }
}

/// Builds a character-data node.
pub fn characters(text: &str) -> Node {
    Node::Characters(text.to_string())
}

/// Builds a CDATA node.
pub fn cdata(text: &str) -> Node {
    Node::CData(text.to_string())
}

/// Builds an entity-reference node.
pub fn reference(name: &str) -> Node {
    Node::Reference(name.to_string())
}

/// Builds a comment node.
pub fn comment(text: &str) -> Node {
    Node::Comment(text.to_string())
}

/// Builds a processing-instruction node.
pub fn processing_instruction(target: &str, data: &str) -> Node {
    Node::ProcessingInstruction {
        target: target.to_string(),
        data: data.to_string(),
    }
}

/// Encodes the tree into an XML document.
///
/// The output is the concatenation of [`encode_to_iodata`]. An XML
/// declaration is rendered only when a prolog is provided.
///
/// ```
/// use quick_sax::{characters, element, encode, Prolog};
///
/// let tree = element("foo", &[("g", "f")], vec![characters("Alice")]);
/// assert_eq!(
///     encode(&tree, Some(&Prolog::default())),
///     r#"<?xml version="1.0"?><foo g="f">Alice</foo>"#
/// );
/// ```
pub fn encode(root: &Element, prolog: Option<&Prolog>) -> String {
    let mut out = String::new();
    for fragment in encode_to_iodata(root, prolog) {
        out.push_str(&fragment);
    }
    out
}

/// Encodes the tree into a sequence of fragments whose concatenation is the
/// document.
///
/// Fragments borrow from the tree wherever no escaping is required, so the
/// result can be written out without building one large string.
pub fn encode_to_iodata<'a>(root: &'a Element, prolog: Option<&'a Prolog>) -> Vec<Cow<'a, str>> {
    let mut out = Vec::new();
    if let Some(prolog) = prolog {
        write_prolog(prolog, &mut out);
    }
    write_element(root, &mut out);
    out
}

fn write_prolog<'a>(prolog: &'a Prolog, out: &mut Vec<Cow<'a, str>>) {
    out.push(Cow::Borrowed("<?xml version=\""));
    out.push(Cow::Borrowed(prolog.version.as_str()));
    out.push(Cow::Borrowed("\""));
    if let Some(encoding) = &prolog.encoding {
        out.push(Cow::Borrowed(" encoding=\""));
        out.push(Cow::Borrowed(encoding.as_str()));
        out.push(Cow::Borrowed("\""));
    }
    if let Some(standalone) = prolog.standalone {
        out.push(Cow::Borrowed(if standalone {
            " standalone=\"yes\""
        } else {
            " standalone=\"no\""
        }));
    }
    out.push(Cow::Borrowed("?>"));
}

fn write_element<'a>(element: &'a Element, out: &mut Vec<Cow<'a, str>>) {
    out.push(Cow::Borrowed("<"));
    out.push(Cow::Borrowed(element.name.as_str()));
    for (name, value) in &element.attributes {
        out.push(Cow::Borrowed(" "));
        out.push(Cow::Borrowed(name.as_str()));
        out.push(Cow::Borrowed("=\""));
        out.push(escape_attribute_value(value));
        out.push(Cow::Borrowed("\""));
    }
    if element.children.is_empty() {
        out.push(Cow::Borrowed("/>"));
        return;
    }
    out.push(Cow::Borrowed(">"));
    for child in &element.children {
        write_node(child, out);
    }
    out.push(Cow::Borrowed("</"));
    out.push(Cow::Borrowed(element.name.as_str()));
    out.push(Cow::Borrowed(">"));
}

fn write_node<'a>(node: &'a Node, out: &mut Vec<Cow<'a, str>>) {
    match node {
        Node::Element(element) => write_element(element, out),
        Node::Characters(text) => out.push(escape(text)),
        Node::CData(text) => write_cdata(text, out),
        Node::Reference(name) => {
            out.push(Cow::Borrowed("&"));
            out.push(Cow::Borrowed(name.as_str()));
            out.push(Cow::Borrowed(";"));
        }
        Node::Comment(text) => {
            out.push(Cow::Borrowed("<!--"));
            out.push(Cow::Borrowed(text.as_str()));
            out.push(Cow::Borrowed("-->"));
        }
        Node::ProcessingInstruction { target, data } => {
            out.push(Cow::Borrowed("<?"));
            out.push(Cow::Borrowed(target.as_str()));
            if !data.is_empty() {
                out.push(Cow::Borrowed(" "));
                out.push(Cow::Borrowed(data.as_str()));
            }
            out.push(Cow::Borrowed("?>"));
        }
    }
}

/// Emits a CDATA body, splitting at every `]]>` so the terminator never
/// appears inside a section.
fn write_cdata<'a>(text: &'a str, out: &mut Vec<Cow<'a, str>>) {
    out.push(Cow::Borrowed("<![CDATA["));
    let mut rest = text;
    while let Some(i) = rest.find("]]>") {
        out.push(Cow::Borrowed(&rest[..i + 2]));
        out.push(Cow::Borrowed("]]><![CDATA["));
        rest = &rest[i + 2..];
    }
    out.push(Cow::Borrowed(rest));
    out.push(Cow::Borrowed("]]>"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_element_is_self_closing() {
        assert_eq!(encode(&element("br", &[], vec![]), None), "<br/>");
    }

    #[test]
    fn characters_are_escaped() {
        let tree = element("p", &[], vec![characters("a<b&c")]);
        assert_eq!(encode(&tree, None), "<p>a&lt;b&amp;c</p>");
    }

    #[test]
    fn attribute_values_are_escaped() {
        let tree = element("a", &[("href", "x?b=\"1\"&c=2")], vec![]);
        assert_eq!(
            encode(&tree, None),
            "<a href=\"x?b=&quot;1&quot;&amp;c=2\"/>"
        );

        let tree = element("a", &[("title", "two\nlines")], vec![]);
        assert_eq!(encode(&tree, None), "<a title=\"two&#10;lines\"/>");
    }

    #[test]
    fn cdata_split_at_terminator() {
        let tree = element("s", &[], vec![cdata("a]]>b")]);
        assert_eq!(
            encode(&tree, None),
            "<s><![CDATA[a]]]]><![CDATA[>b]]></s>"
        );

        let tree = element("s", &[], vec![cdata("<b>&amp;</b>")]);
        assert_eq!(encode(&tree, None), "<s><![CDATA[<b>&amp;</b>]]></s>");
    }

    #[test]
    fn misc_nodes() {
        let tree = element(
            "r",
            &[],
            vec![
                comment(" note "),
                reference("copy"),
                processing_instruction("robot", "follow"),
                processing_instruction("stop", ""),
            ],
        );
        assert_eq!(
            encode(&tree, None),
            "<r><!-- note -->&copy;<?robot follow?><?stop?></r>"
        );
    }

    #[test]
    fn prolog_rendering() {
        let prolog = Prolog {
            version: "1.0".to_string(),
            encoding: Some("utf-8".to_string()),
            standalone: Some(false),
        };
        assert_eq!(
            encode(&element("r", &[], vec![]), Some(&prolog)),
            "<?xml version=\"1.0\" encoding=\"utf-8\" standalone=\"no\"?><r/>"
        );
    }

    #[test]
    fn iodata_concatenation_matches_encode() {
        let tree = element(
            "doc",
            &[("a", "1"), ("b", "<>")],
            vec![
                characters("x&y"),
                element("nested", &[], vec![cdata("]]>")]).into(),
            ],
        );
        let concatenated: String = encode_to_iodata(&tree, None)
            .iter()
            .map(|fragment| fragment.as_ref())
            .collect();
        assert_eq!(concatenated, encode(&tree, None));
    }
}
