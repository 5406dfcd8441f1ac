//! The generic tree of named nodes exchanged with the mapping engine.
//!
//! A [`Node`] is a name, an ordered list of attributes, an ordered list of
//! children and an optional leaf text. It is deliberately independent of the
//! textual XML form: [`Node::parse`] and [`Node::to_xml_string`] convert
//! between the two, and the serde derives allow a tree to be stored through
//! any serde data format.

use crate::error::{Error, Result};
use crate::reader::{XmlEvent, XmlReader};
use crate::writer::{IndentConfig, XmlWriter};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::io::Write;

/// A single `name="value"` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Unescaped attribute value.
    pub value: String,
}

/// A named node with attributes, children and optional leaf text.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Node {
    /// Element name.
    pub name: String,
    /// Attributes in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<Attribute>,
    /// Child elements in document order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Node>,
    /// Leaf text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Node {
    /// Creates an empty node.
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Adds an attribute and returns the node.
    pub fn with_attribute<N: Into<String>, V: Into<String>>(mut self, name: N, value: V) -> Self {
        self.push_attribute(name, value);
        self
    }

    /// Adds a child and returns the node.
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    /// Sets the leaf text and returns the node.
    pub fn with_text<S: Into<String>>(mut self, text: S) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Appends an attribute.
    pub fn push_attribute<N: Into<String>, V: Into<String>>(&mut self, name: N, value: V) {
        self.attributes.push(Attribute {
            name: name.into(),
            value: value.into(),
        });
    }

    /// Appends a child.
    pub fn push_child(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Value of the first attribute called `name`.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// First child called `name`.
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children called `name`.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Leaf text, if any.
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// True when the node has attributes or children.
    #[inline]
    pub fn is_container(&self) -> bool {
        !self.attributes.is_empty() || !self.children.is_empty()
    }

    /// Parses an XML document into its root node.
    ///
    /// Text and CDATA sections inside an element are concatenated into its
    /// leaf text. Text outside the root element is rejected.
    pub fn parse(xml: &str) -> Result<Node> {
        let mut reader = XmlReader::new(xml);
        let mut stack: Vec<Node> = Vec::new();
        let mut root: Option<Node> = None;

        loop {
            let position = reader.position();
            match reader.next_event()? {
                XmlEvent::Start { name, attributes } => {
                    if root.is_some() {
                        return Err(Error::syntax("multiple root elements").with_position(position));
                    }
                    stack.push(Node::from_tag(name, attributes));
                }
                XmlEvent::Empty { name, attributes } => {
                    let node = Node::from_tag(name, attributes);
                    attach(&mut stack, &mut root, node).map_err(|e| e.with_position(position))?;
                }
                XmlEvent::End { .. } => {
                    let node = stack
                        .pop()
                        .ok_or_else(|| Error::syntax("unexpected closing tag").with_position(position))?;
                    attach(&mut stack, &mut root, node).map_err(|e| e.with_position(position))?;
                }
                XmlEvent::Text(text) => append_text(&mut stack, &text, position)?,
                XmlEvent::CData(text) => append_text(&mut stack, text, position)?,
                XmlEvent::Eof => break,
            }
        }

        root.ok_or_else(|| Error::syntax("document has no root element"))
    }

    /// Renders the tree as compact XML.
    pub fn to_xml_string(&self) -> Result<String> {
        self.to_xml_string_with(None, false)
    }

    /// Renders the tree with optional indentation and XML declaration.
    pub fn to_xml_string_with(&self, indent: Option<IndentConfig>, declaration: bool) -> Result<String> {
        let mut buffer = Vec::with_capacity(256);
        self.write_to(&mut buffer, indent, declaration)?;
        String::from_utf8(buffer).map_err(|_| Error::new(crate::error::ErrorKind::InvalidUtf8))
    }

    /// Writes the tree to `writer`.
    pub fn write_to<W: Write>(
        &self,
        writer: W,
        indent: Option<IndentConfig>,
        declaration: bool,
    ) -> Result<()> {
        let mut xml = match indent {
            Some(indent) => XmlWriter::with_indent(writer, indent),
            None => XmlWriter::new(writer),
        };
        if declaration {
            xml.write_declaration()?;
        }
        xml.write_node(self)?;
        xml.flush()
    }

    fn from_tag(name: &str, attributes: Vec<(&str, Cow<'_, str>)>) -> Node {
        Node {
            name: name.to_string(),
            attributes: attributes
                .into_iter()
                .map(|(name, value)| Attribute {
                    name: name.to_string(),
                    value: value.into_owned(),
                })
                .collect(),
            children: Vec::new(),
            text: None,
        }
    }
}

fn attach(stack: &mut [Node], root: &mut Option<Node>, node: Node) -> Result<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(node),
        None if root.is_none() => *root = Some(node),
        None => return Err(Error::syntax("multiple root elements")),
    }
    Ok(())
}

fn append_text(stack: &mut [Node], text: &str, position: crate::error::Position) -> Result<()> {
    let node = stack
        .last_mut()
        .ok_or_else(|| Error::syntax("text outside of the root element").with_position(position))?;
    match node.text {
        Some(ref mut existing) => existing.push_str(text),
        None => node.text = Some(text.to_string()),
    }
    Ok(())
}

/// Returns true if `name` can be used as an element or attribute name.
pub fn is_valid_xml_name(name: &str) -> bool {
    crate::reader::is_valid_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_point() {
        let node = Node::parse(r#"<Point X="3"><Y>4</Y></Point>"#).unwrap();
        assert_eq!(node.name, "Point");
        assert_eq!(node.attribute("X"), Some("3"));
        assert_eq!(node.child("Y").and_then(Node::text), Some("4"));
        assert!(node.is_container());
        assert!(!node.child("Y").unwrap().is_container());
    }

    #[test]
    fn test_parse_concatenates_cdata() {
        let node = Node::parse("<a>x <![CDATA[<y>]]></a>").unwrap();
        assert_eq!(node.text(), Some("x <y>"));
    }

    #[test]
    fn test_parse_rejects_second_root() {
        assert!(Node::parse("<a/><b/>").is_err());
        assert!(Node::parse("<a></a><b></b>").is_err());
    }

    #[test]
    fn test_parse_rejects_stray_text() {
        assert!(Node::parse("hello<a/>").is_err());
        assert!(Node::parse("").is_err());
    }

    #[test]
    fn test_text_roundtrip() {
        let node = Node::new("Order")
            .with_attribute("id", "7")
            .with_child(
                Node::new("Lines")
                    .with_child(Node::new("i32").with_text("1"))
                    .with_child(Node::new("String").with_text("a & b")),
            );
        let xml = node.to_xml_string().unwrap();
        assert_eq!(Node::parse(&xml).unwrap(), node);

        let pretty = node.to_xml_string_with(Some(IndentConfig::default()), true).unwrap();
        assert!(pretty.starts_with("<?xml"));
        assert_eq!(Node::parse(&pretty).unwrap(), node);
    }

    #[test]
    fn test_children_named() {
        let node = Node::new("c")
            .with_child(Node::new("i32"))
            .with_child(Node::new("String"))
            .with_child(Node::new("i32"));
        assert_eq!(node.children_named("i32").count(), 2);
    }

    #[test]
    fn test_serde_json_exchange() {
        let node = Node::new("Point")
            .with_attribute("X", "3")
            .with_child(Node::new("Y").with_text("4"));
        let json = serde_json::to_string(&node).unwrap();
        assert!(!json.contains("\"text\":null"));
        let back: Node = serde_json::from_str(&json).unwrap();
        assert_eq!(back, node);
    }

    #[test]
    fn test_xml_name_validity() {
        assert!(is_valid_xml_name("Point"));
        assert!(!is_valid_xml_name("two words"));
    }
}
