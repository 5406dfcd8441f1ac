//! XML text writer for node trees.

use crate::error::{Error, Result};
use crate::escape::{escape_attr, escape_text};
use crate::node::Node;
use crate::reader::is_valid_name;
use std::io::Write;

/// Indentation configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndentConfig {
    /// Characters to use for each level of indentation.
    pub indent_str: String,
    /// Whether to break lines between elements.
    pub newlines: bool,
}

impl Default for IndentConfig {
    fn default() -> Self {
        Self {
            indent_str: "  ".to_string(),
            newlines: true,
        }
    }
}

/// Writes well-formed XML to an [`io::Write`](std::io::Write) sink.
///
/// Element and attribute names are checked before anything is written, so a
/// node tree with an invalid name fails without producing partial markup for
/// that element.
pub struct XmlWriter<W: Write> {
    writer: W,
    open: Vec<String>,
    in_tag: bool,
    after_text: bool,
    indent: Option<IndentConfig>,
}

impl<W: Write> XmlWriter<W> {
    /// Creates a compact writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            open: Vec::new(),
            in_tag: false,
            after_text: false,
            indent: None,
        }
    }

    /// Creates a writer that indents nested elements.
    pub fn with_indent(writer: W, indent: IndentConfig) -> Self {
        Self {
            indent: Some(indent),
            ..Self::new(writer)
        }
    }

    /// Returns the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    /// Returns the current nesting depth.
    #[inline]
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Writes `<?xml version="1.0" encoding="UTF-8"?>`.
    pub fn write_declaration(&mut self) -> Result<()> {
        self.writer
            .write_all(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>")?;
        if self.indent.as_ref().is_some_and(|i| i.newlines) {
            self.writer.write_all(b"\n")?;
        }
        Ok(())
    }

    /// Opens an element.
    pub fn start_element(&mut self, name: &str) -> Result<()> {
        if !is_valid_name(name) {
            return Err(Error::invalid_name(name));
        }
        self.close_tag_if_open()?;
        let level = self.open.len();
        self.write_indent(level, level > 0)?;
        write!(self.writer, "<{}", name)?;
        self.open.push(name.to_string());
        self.in_tag = true;
        self.after_text = false;
        Ok(())
    }

    /// Writes an attribute on the element opened last.
    pub fn write_attribute(&mut self, name: &str, value: &str) -> Result<()> {
        if !self.in_tag {
            return Err(Error::syntax("cannot write attribute outside of element tag"));
        }
        if !is_valid_name(name) {
            return Err(Error::invalid_name(name));
        }
        write!(self.writer, " {}=\"{}\"", name, escape_attr(value))?;
        Ok(())
    }

    /// Writes character data.
    pub fn write_text(&mut self, text: &str) -> Result<()> {
        self.close_tag_if_open()?;
        self.writer.write_all(escape_text(text).as_bytes())?;
        self.after_text = true;
        Ok(())
    }

    /// Closes the element opened last.
    pub fn end_element(&mut self) -> Result<()> {
        let name = self
            .open
            .pop()
            .ok_or_else(|| Error::syntax("no element to close"))?;

        if self.in_tag {
            self.writer.write_all(b"/>")?;
            self.in_tag = false;
        } else {
            if !self.after_text {
                self.write_indent(self.open.len(), true)?;
            }
            write!(self.writer, "</{}>", name)?;
        }
        self.after_text = false;
        Ok(())
    }

    /// Writes `node` and its subtree.
    pub fn write_node(&mut self, node: &Node) -> Result<()> {
        self.start_element(&node.name)?;
        for attribute in &node.attributes {
            self.write_attribute(&attribute.name, &attribute.value)?;
        }
        if node.children.is_empty() {
            if let Some(text) = node.text.as_deref().filter(|t| !t.is_empty()) {
                self.write_text(text)?;
            }
        } else {
            for child in &node.children {
                self.write_node(child)?;
            }
        }
        self.end_element()
    }

    /// Flushes the writer.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn close_tag_if_open(&mut self) -> Result<()> {
        if self.in_tag {
            self.writer.write_all(b">")?;
            self.in_tag = false;
        }
        Ok(())
    }

    fn write_indent(&mut self, level: usize, newline: bool) -> Result<()> {
        if let Some(ref indent) = self.indent {
            if indent.newlines && newline {
                self.writer.write_all(b"\n")?;
            }
            for _ in 0..level {
                self.writer.write_all(indent.indent_str.as_bytes())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn render(node: &Node, indent: Option<IndentConfig>) -> String {
        let mut writer = match indent {
            Some(indent) => XmlWriter::with_indent(Vec::new(), indent),
            None => XmlWriter::new(Vec::new()),
        };
        writer.write_node(node).unwrap();
        String::from_utf8(writer.into_inner()).unwrap()
    }

    #[test]
    fn test_empty_element_self_closes() {
        assert_eq!(render(&Node::new("Point"), None), "<Point/>");
    }

    #[test]
    fn test_attributes_and_text() {
        let node = Node::new("Point")
            .with_attribute("X", "3")
            .with_child(Node::new("Y").with_text("4"));
        assert_eq!(render(&node, None), r#"<Point X="3"><Y>4</Y></Point>"#);
    }

    #[test]
    fn test_escaping() {
        let node = Node::new("n").with_attribute("a", "\"<&>\"").with_text("<&>\"");
        assert_eq!(render(&node, None), r#"<n a="&quot;&lt;&amp;&gt;&quot;">&lt;&amp;&gt;"</n>"#);
    }

    #[test]
    fn test_indented_output() {
        let node = Node::new("root")
            .with_child(Node::new("a").with_text("1"))
            .with_child(Node::new("Collection").with_child(Node::new("i32").with_text("2")));
        let xml = render(&node, Some(IndentConfig::default()));
        assert_eq!(
            xml,
            "<root>\n  <a>1</a>\n  <Collection>\n    <i32>2</i32>\n  </Collection>\n</root>"
        );
    }

    #[test]
    fn test_invalid_name_rejected() {
        let mut writer = XmlWriter::new(Vec::new());
        let err = writer.start_element("not valid").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidName(_)));
    }

    #[test]
    fn test_attribute_outside_tag() {
        let mut writer = XmlWriter::new(Vec::new());
        writer.start_element("a").unwrap();
        writer.write_text("x").unwrap();
        assert!(writer.write_attribute("b", "c").is_err());
    }

    #[test]
    fn test_declaration() {
        let mut writer = XmlWriter::new(Vec::new());
        writer.write_declaration().unwrap();
        writer.write_node(&Node::new("r")).unwrap();
        let xml = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(xml, r#"<?xml version="1.0" encoding="UTF-8"?><r/>"#);
    }

    #[test]
    fn test_depth() {
        let mut writer = XmlWriter::new(Vec::new());
        writer.start_element("a").unwrap();
        writer.start_element("b").unwrap();
        assert_eq!(writer.depth(), 2);
        writer.end_element().unwrap();
        writer.end_element().unwrap();
        assert_eq!(writer.depth(), 0);
        assert!(writer.end_element().is_err());
    }
}
