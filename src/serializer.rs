//! High-level entry point pairing a model with XML text options.

use crate::de::Deserializer;
use crate::error::{Error, ErrorKind, Result};
use crate::model::ModelRegistry;
use crate::node::Node;
use crate::reflect::{ModelType, Reflect};
use crate::ser::Serializer;
use crate::writer::IndentConfig;
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use std::sync::Arc;

/// Serializes and deserializes values with a configured model.
///
/// The model is shared, so one registry can back any number of serializers
/// across threads. Every operation fails with a missing model error until a
/// model has been set.
///
/// ```rust
/// use xml_model::{member, ModelBuilder, XmlDataSerializer};
///
/// #[derive(Debug, Clone, PartialEq, Default)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// xml_model::entity_type!(Point);
///
/// let mut builder = ModelBuilder::new();
/// builder
///     .has_known_entity::<Point>()
///     .property(member!(Point, x))?
///     .is_mapped_as_attribute()
///     .property(member!(Point, y))?;
///
/// let serializer = XmlDataSerializer::new().with_model(builder.build());
/// let xml = serializer.serialize_to_string(&Point { x: 1, y: 2 })?;
/// assert_eq!(xml, r#"<Point x="1"><y>2</y></Point>"#);
///
/// let point: Point = serializer.deserialize_str(&xml)?;
/// assert_eq!(point, Point { x: 1, y: 2 });
/// # Ok::<(), xml_model::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct XmlDataSerializer {
    model: Option<Arc<ModelRegistry>>,
    indent: Option<IndentConfig>,
    declaration: bool,
}

impl XmlDataSerializer {
    /// Creates a serializer without a model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the model.
    pub fn with_model<M: Into<Arc<ModelRegistry>>>(mut self, model: M) -> Self {
        self.set_model(model);
        self
    }

    /// Replaces the model.
    pub fn set_model<M: Into<Arc<ModelRegistry>>>(&mut self, model: M) {
        self.model = Some(model.into());
    }

    /// The configured model.
    pub fn model(&self) -> Option<&ModelRegistry> {
        self.model.as_deref()
    }

    /// Indents text output.
    pub fn with_indent(mut self, indent: IndentConfig) -> Self {
        self.indent = Some(indent);
        self
    }

    /// Starts text output with an XML declaration.
    pub fn with_declaration(mut self, declaration: bool) -> Self {
        self.declaration = declaration;
        self
    }

    fn require_model(&self) -> Result<&ModelRegistry> {
        self.model().ok_or_else(Error::missing_model)
    }

    /// Serializes `value` into a node tree.
    pub fn serialize<T: ModelType>(&self, value: &T) -> Result<Node> {
        Serializer::new(self.require_model()?).serialize(value)
    }

    /// Deserializes a node tree into a `T`.
    pub fn deserialize<T: ModelType>(&self, node: &Node) -> Result<T> {
        Deserializer::new(self.require_model()?).deserialize_as::<T>(node)
    }

    /// Deserializes a node tree into the type its root name resolves to.
    pub fn deserialize_node(&self, node: &Node) -> Result<Box<dyn Reflect>> {
        Deserializer::new(self.require_model()?).deserialize(node, None)
    }

    /// Serializes `value` into XML text.
    pub fn serialize_to_string<T: ModelType>(&self, value: &T) -> Result<String> {
        self.serialize(value)?
            .to_xml_string_with(self.indent.clone(), self.declaration)
    }

    /// Serializes `value` as XML text into `writer`.
    pub fn serialize_to_writer<T: ModelType, W: Write>(&self, value: &T, writer: W) -> Result<()> {
        self.serialize(value)?
            .write_to(writer, self.indent.clone(), self.declaration)
    }

    /// Serializes `value` into the file at `path`, replacing its contents.
    pub fn serialize_to_file<T: ModelType, P: AsRef<Path>>(&self, value: &T, path: P) -> Result<()> {
        let node = self.serialize(value)?;
        let file = fs::File::create(path.as_ref())?;
        log::debug!("writing <{}> to {}", node.name, path.as_ref().display());
        node.write_to(std::io::BufWriter::new(file), self.indent.clone(), self.declaration)
    }

    /// Deserializes a `T` from XML text.
    pub fn deserialize_str<T: ModelType>(&self, xml: &str) -> Result<T> {
        let model = self.require_model()?;
        Deserializer::new(model).deserialize_as::<T>(&Node::parse(xml)?)
    }

    /// Deserializes a `T` from a reader of XML text.
    pub fn deserialize_reader<T: ModelType, R: Read>(&self, mut reader: R) -> Result<T> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        let xml = String::from_utf8(bytes).map_err(|_| Error::new(ErrorKind::InvalidUtf8))?;
        self.deserialize_str(&xml)
    }

    /// Deserializes a `T` from the XML file at `path`.
    pub fn deserialize_file<T: ModelType, P: AsRef<Path>>(&self, path: P) -> Result<T> {
        log::debug!("reading {}", path.as_ref().display());
        self.deserialize_reader(fs::File::open(path.as_ref())?)
    }
}
