// Order-normalized XML configuration trees.
//
// The drift engine compares trees semantically, so parsing normalizes
// everything textual that does not carry meaning: attributes are sorted
// by key and incidental whitespace around text is trimmed. Two fragments
// differing only in attribute order or indentation parse to equal trees.

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;

use crate::error::Error;

/// A single XML element: name, sorted attributes, trimmed text, and
/// ordered children.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Element {
    pub name: String,
    /// Attribute pairs, sorted by key at parse time.
    pub attrs: Vec<(String, String)>,
    /// Concatenated, trimmed text content. Empty if the element carries
    /// no meaningful text.
    pub text: String,
    pub children: Vec<Element>,
}

impl Element {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// Value of the given attribute, if present.
    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// The disambiguating `name` attribute used by entry-style lists.
    pub fn name_attr(&self) -> Option<&str> {
        self.attr("name")
    }

    /// First direct child with the given tag.
    pub fn child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == tag)
    }

    /// All direct children with the given tag.
    pub fn children_named<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |c| c.name == tag)
    }

    /// Trimmed text of a direct child, if the child exists and has text.
    pub fn child_text(&self, tag: &str) -> Option<&str> {
        self.child(tag)
            .map(|c| c.text.as_str())
            .filter(|t| !t.is_empty())
    }

    /// Walk a chain of direct-child tags.
    pub fn find_path(&self, path: &[&str]) -> Option<&Element> {
        let mut cur = self;
        for tag in path {
            cur = cur.child(tag)?;
        }
        Some(cur)
    }

    /// Depth-first pre-order traversal of all descendants (self excluded).
    pub fn descendants(&self) -> Descendants<'_> {
        let mut stack: Vec<&Element> = Vec::with_capacity(self.children.len());
        for child in self.children.iter().rev() {
            stack.push(child);
        }
        Descendants { stack }
    }

    /// First descendant with the given tag, in document order.
    pub fn descendant(&self, tag: &str) -> Option<&Element> {
        self.descendants().find(|e| e.name == tag)
    }

    /// Text of the first descendant with the given tag, like ElementTree's
    /// `findtext(".//tag")`.
    pub fn descendant_text(&self, tag: &str) -> Option<&str> {
        self.descendants()
            .find(|e| e.name == tag && !e.text.is_empty())
            .map(|e| e.text.as_str())
    }

    fn push_text(&mut self, fragment: &str) {
        let trimmed = fragment.trim();
        if trimmed.is_empty() {
            return;
        }
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.text.push_str(trimmed);
    }

    fn write_pretty(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        out.push_str(&indent);
        out.push('<');
        out.push_str(&self.name);
        for (k, v) in &self.attrs {
            out.push(' ');
            out.push_str(k);
            out.push_str("=\"");
            out.push_str(&escape(v));
            out.push('"');
        }
        if self.text.is_empty() && self.children.is_empty() {
            out.push_str("/>\n");
            return;
        }
        out.push('>');
        if self.children.is_empty() {
            out.push_str(&escape(&self.text));
        } else {
            out.push('\n');
            if !self.text.is_empty() {
                out.push_str(&"  ".repeat(depth + 1));
                out.push_str(&escape(&self.text));
                out.push('\n');
            }
            for child in &self.children {
                child.write_pretty(out, depth + 1);
            }
            out.push_str(&indent);
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push_str(">\n");
    }
}

/// Iterator over descendants in document order.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<Self::Item> {
        let next = self.stack.pop()?;
        for child in next.children.iter().rev() {
            self.stack.push(child);
        }
        Some(next)
    }
}

/// A parsed, order-normalized configuration tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigTree {
    pub root: Element,
}

impl ConfigTree {
    /// Parse an XML document into a normalized tree.
    pub fn parse(xml: &str) -> Result<Self, Error> {
        parse_element(xml).map(|root| Self { root })
    }

    pub fn from_element(root: Element) -> Self {
        Self { root }
    }

    /// Indented serialization without the incidental blank lines of the
    /// wire form. For display only -- not a round-trip format.
    pub fn pretty(&self) -> String {
        let mut out = String::new();
        self.root.write_pretty(&mut out, 0);
        out
    }
}

/// Parse a document into its root element.
pub(crate) fn parse_element(xml: &str) -> Result<Element, Error> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(start)) => {
                if root.is_some() && stack.is_empty() {
                    return Err(Error::Xml("multiple root elements".into()));
                }
                stack.push(element_from_start(&start)?);
            }
            Ok(Event::Empty(start)) => {
                let element = element_from_start(&start)?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(element),
                    None if root.is_none() => root = Some(element),
                    None => return Err(Error::Xml("multiple root elements".into())),
                }
            }
            Ok(Event::End(_)) => {
                let Some(done) = stack.pop() else {
                    return Err(Error::Xml("unbalanced closing tag".into()));
                };
                match stack.last_mut() {
                    Some(parent) => parent.children.push(done),
                    None => root = Some(done),
                }
            }
            Ok(Event::Text(t)) => {
                let text = t
                    .unescape()
                    .map_err(|e| Error::Xml(format!("bad text node: {e}")))?;
                if let Some(cur) = stack.last_mut() {
                    cur.push_text(&text);
                }
            }
            Ok(Event::CData(t)) => {
                let bytes = t.into_inner();
                let text = String::from_utf8_lossy(&bytes);
                if let Some(cur) = stack.last_mut() {
                    cur.push_text(&text);
                }
            }
            Ok(Event::Eof) => break,
            // Declarations, comments, processing instructions, doctypes
            // carry no configuration content.
            Ok(_) => {}
            Err(e) => return Err(Error::Xml(e.to_string())),
        }
    }

    if !stack.is_empty() {
        return Err(Error::Xml("unexpected end of document".into()));
    }
    root.ok_or_else(|| Error::Xml("empty document".into()))
}

fn element_from_start(start: &BytesStart<'_>) -> Result<Element, Error> {
    let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
    let mut element = Element::new(name);
    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::Xml(format!("bad attribute: {e}")))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Xml(format!("bad attribute value: {e}")))?
            .into_owned();
        element.attrs.push((key, value));
    }
    // Attribute order is presentation, not meaning.
    element.attrs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(element)
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn attribute_order_is_normalized() {
        let a = ConfigTree::parse(r#"<rule name="A" action="allow"/>"#).expect("parse a");
        let b = ConfigTree::parse(r#"<rule action="allow" name="A"/>"#).expect("parse b");
        assert_eq!(a, b);
    }

    #[test]
    fn whitespace_is_trimmed() {
        let a = ConfigTree::parse("<a>\n  <b>  value  </b>\n</a>").expect("parse a");
        let b = ConfigTree::parse("<a><b>value</b></a>").expect("parse b");
        assert_eq!(a, b);
    }

    #[test]
    fn nested_structure_round_trips() {
        let tree = ConfigTree::parse(
            r#"<config><devices><entry name="fw1"><network><interface name="eth0"/></network></entry></devices></config>"#,
        )
        .expect("parse");
        assert_eq!(tree.root.name, "config");
        let entry = tree
            .root
            .find_path(&["devices", "entry"])
            .expect("entry path");
        assert_eq!(entry.name_attr(), Some("fw1"));
        let iface = entry.descendant("interface").expect("interface");
        assert_eq!(iface.name_attr(), Some("eth0"));
    }

    #[test]
    fn descendant_text_finds_nested_value() {
        let tree =
            ConfigTree::parse("<response><result><key>LUFRPT</key></result></response>")
                .expect("parse");
        assert_eq!(tree.root.descendant_text("key"), Some("LUFRPT"));
    }

    #[test]
    fn malformed_xml_is_an_error() {
        assert!(ConfigTree::parse("<a><b></a>").is_err());
        assert!(ConfigTree::parse("").is_err());
        assert!(ConfigTree::parse("<a/><b/>").is_err());
    }

    #[test]
    fn entities_are_unescaped() {
        let tree = ConfigTree::parse("<a desc=\"x &amp; y\">1 &lt; 2</a>").expect("parse");
        assert_eq!(tree.root.attr("desc"), Some("x & y"));
        assert_eq!(tree.root.text, "1 < 2");
    }

    #[test]
    fn pretty_output_is_indented() {
        let tree = ConfigTree::parse("<a><b>text</b><c/></a>").expect("parse");
        let pretty = tree.pretty();
        assert_eq!(pretty, "<a>\n  <b>text</b>\n  <c/>\n</a>\n");
    }
}
