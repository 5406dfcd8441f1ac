//! Object graph to node tree.
//!
//! The serializer walks a value through its [`TypeDescriptor`] and the
//! entity metadata of a [`ModelRegistry`]:
//!
//! - collections become a container node whose children are the elements in
//!   iteration order. A collection without elements produces no node, so an
//!   empty member is left out of its parent entirely;
//! - scalars become a leaf node holding their textual form;
//! - entities become a node named by their wire name, with one attribute or
//!   child per configured property in registration order.
//!
//! ```rust
//! use xml_model::{member, to_string, ModelBuilder};
//!
//! #[derive(Debug, Clone, PartialEq, Default)]
//! struct Point {
//!     x: i32,
//!     y: i32,
//! }
//!
//! xml_model::entity_type!(Point);
//!
//! let mut builder = ModelBuilder::new();
//! builder
//!     .has_known_entity::<Point>()
//!     .property(member!(Point, x))?
//!     .has_name("X")
//!     .is_mapped_as_attribute()
//!     .property(member!(Point, y))?
//!     .has_name("Y");
//! let model = builder.build();
//!
//! let xml = to_string(&model, &Point { x: 1, y: 2 })?;
//! assert_eq!(xml, r#"<Point X="1"><Y>2</Y></Point>"#);
//! # Ok::<(), xml_model::Error>(())
//! ```

use crate::convert;
use crate::error::{Error, Result};
use crate::model::ModelRegistry;
use crate::node::Node;
use crate::reflect::{ModelType, Object, Reflect, TypeKind};

/// Name of the container node of a collection without an explicit name.
pub const COLLECTION_NODE_NAME: &str = "Collection";

/// Serializes `value` into a node tree.
pub fn to_node<T: ModelType>(model: &ModelRegistry, value: &T) -> Result<Node> {
    Serializer::new(model).serialize(value)
}

/// Serializes `value` into compact XML text.
pub fn to_string<T: ModelType>(model: &ModelRegistry, value: &T) -> Result<String> {
    to_node(model, value)?.to_xml_string()
}

/// Serializer bound to a model.
#[derive(Debug, Clone, Copy)]
pub struct Serializer<'m> {
    model: &'m ModelRegistry,
}

impl<'m> Serializer<'m> {
    /// Creates a serializer over `model`.
    pub fn new(model: &'m ModelRegistry) -> Self {
        Self { model }
    }

    /// Serializes a root value.
    ///
    /// A null root fails. A root collection without elements yields an
    /// empty `Collection` node.
    pub fn serialize(&self, value: &dyn Reflect) -> Result<Node> {
        if is_null(value) {
            return Err(Error::null_value());
        }
        Ok(self
            .serialize_value(value, None)?
            .unwrap_or_else(|| Node::new(COLLECTION_NODE_NAME)))
    }

    /// Serializes `value` under `name`, or under its default node name.
    ///
    /// Returns `None` for a collection that produced no children.
    pub fn serialize_value(&self, value: &dyn Reflect, name: Option<&str>) -> Result<Option<Node>> {
        let descriptor = value.reflect_descriptor();
        log::trace!("serializing {} as <{}>", descriptor, name.unwrap_or("?"));

        match descriptor.kind() {
            TypeKind::Nullable(vt) => match (vt.get)(value) {
                Some(inner) => self.serialize_value(inner, name),
                None => Err(Error::null_value()),
            },
            TypeKind::Object => match value.downcast_ref::<Object>() {
                Some(object) => self.serialize_value(object.get(), name),
                None => Err(Error::unconvertible(descriptor.type_path())),
            },
            TypeKind::Collection(vt) => {
                let mut node = Node::new(name.unwrap_or(COLLECTION_NODE_NAME));
                for element in (vt.values)(value) {
                    if is_null(element) {
                        continue;
                    }
                    if let Some(child) = self.serialize_value(element, None)? {
                        node.push_child(child);
                    }
                }
                if node.children.is_empty() {
                    return Ok(None);
                }
                Ok(Some(node))
            }
            TypeKind::Scalar(vt) => {
                let name = name.unwrap_or_else(|| self.model.wire_name_for(&descriptor));
                Ok(Some(Node::new(name).with_text((vt.to_text)(value)?)))
            }
            TypeKind::Entity(_) => self.serialize_entity(value, name).map(Some),
            TypeKind::Contract => Err(Error::unknown_entity(descriptor.type_path())),
        }
    }

    fn serialize_entity(&self, value: &dyn Reflect, name: Option<&str>) -> Result<Node> {
        let descriptor = value.reflect_descriptor();
        let entity = self
            .model
            .entity(descriptor.type_id())
            .ok_or_else(|| Error::unknown_entity(descriptor.type_path()))?;

        let mut node = Node::new(name.unwrap_or_else(|| entity.wire_name()));
        for property in entity.properties() {
            let member = match property.accessor().get(value) {
                Some(member) if !is_null(member) => member,
                _ => continue,
            };
            if property.is_suppressed(member) {
                log::trace!("{}.{} holds its default, skipped", entity.wire_name(), property.name());
                continue;
            }
            if property.is_attribute() {
                node.push_attribute(property.wire_name(), convert::to_text(member)?);
            } else if let Some(child) = self.serialize_value(member, Some(property.wire_name()))? {
                node.push_child(child);
            }
        }
        Ok(node)
    }
}

/// True for `None` and for objects boxing `None`.
pub(crate) fn is_null(value: &dyn Reflect) -> bool {
    match value.reflect_descriptor().kind() {
        TypeKind::Nullable(vt) => match (vt.get)(value) {
            Some(inner) => is_null(inner),
            None => true,
        },
        TypeKind::Object => value
            .downcast_ref::<Object>()
            .is_some_and(|object| is_null(object.get())),
        _ => false,
    }
}
