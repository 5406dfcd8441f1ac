//! Node tree to object graph.
//!
//! The deserializer is driven by a target [`TypeDescriptor`]. When the caller
//! has none, the root node name is resolved through the wire-name index of
//! the model.
//!
//! Entities are built in three steps: constructor arguments are read from the
//! attributes and children backing the configured parameters, the instance
//! is created (registered constructor, else the type's no-arg
//! instantiation when no parameters are configured), then every remaining
//! property present in the node is assigned. Collection members that already
//! hold an instance are refilled in place when their shape allows it.
//!
//! ```rust
//! use xml_model::{from_str, member, ModelBuilder};
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
//! let point: Point = from_str(&model, r#"<Point X="1"><Y>2</Y></Point>"#)?;
//! assert_eq!(point, Point { x: 1, y: 2 });
//! # Ok::<(), xml_model::Error>(())
//! ```

use crate::convert;
use crate::error::{Error, Result};
use crate::model::{Arguments, EntityTypeInfo, ModelRegistry, PropertyTypeInfo};
use crate::node::Node;
use crate::reflect::{CollectionVTable, ModelType, Object, Reflect, TypeDescriptor, TypeKind};
use crate::ser::COLLECTION_NODE_NAME;
use std::any::TypeId;

/// Deserializes a `T` from a node tree.
pub fn from_node<T: ModelType>(model: &ModelRegistry, node: &Node) -> Result<T> {
    Deserializer::new(model).deserialize_as::<T>(node)
}

/// Deserializes a `T` from XML text.
pub fn from_str<T: ModelType>(model: &ModelRegistry, xml: &str) -> Result<T> {
    from_node(model, &Node::parse(xml)?)
}

/// Deserializer bound to a model.
#[derive(Debug, Clone, Copy)]
pub struct Deserializer<'m> {
    model: &'m ModelRegistry,
}

impl<'m> Deserializer<'m> {
    /// Creates a deserializer over `model`.
    pub fn new(model: &'m ModelRegistry) -> Self {
        Self { model }
    }

    /// Deserializes `node` as `expected`, or as the type its name resolves to.
    pub fn deserialize(&self, node: &Node, expected: Option<TypeDescriptor>) -> Result<Box<dyn Reflect>> {
        let target = match expected {
            Some(target) => target,
            None => self
                .resolve(&node.name)
                .ok_or_else(|| Error::unresolved_wire_name(node.name.as_str()))?,
        };
        self.deserialize_value(node, target)
    }

    /// Deserializes `node` as a `T`.
    pub fn deserialize_as<T: ModelType>(&self, node: &Node) -> Result<T> {
        self.deserialize(node, Some(T::type_descriptor()))?.take::<T>()
    }

    /// Deserializes `node` into a value of exactly the `target` type.
    pub fn deserialize_value(&self, node: &Node, target: TypeDescriptor) -> Result<Box<dyn Reflect>> {
        log::trace!("deserializing <{}> as {}", node.name, target);

        match target.kind() {
            TypeKind::Nullable(vt) => (vt.wrap)(self.deserialize_value(node, vt.inner())?),
            TypeKind::Object => self.deserialize_object(node),
            TypeKind::Collection(vt) => self.deserialize_collection(node, vt),
            TypeKind::Scalar(vt) => {
                if node.is_container() {
                    return Err(Error::type_mismatch(
                        target.type_path().to_string(),
                        format!("element <{}>", node.name),
                    ));
                }
                (vt.from_text)(node.text().unwrap_or(""))
            }
            TypeKind::Entity(_) => self.deserialize_entity(node, target),
            TypeKind::Contract => Err(Error::not_constructible(target.type_path())),
        }
    }

    /// Resolves a node name to a concrete type.
    ///
    /// Nullable entries resolve to their inner type; names bound to
    /// [`Object`] do not resolve.
    fn resolve(&self, name: &str) -> Option<TypeDescriptor> {
        let mut descriptor = self.model.resolve_wire_name(name)?;
        while let TypeKind::Nullable(vt) = descriptor.kind() {
            descriptor = vt.inner();
        }
        (!descriptor.is_object()).then_some(descriptor)
    }

    fn deserialize_object(&self, node: &Node) -> Result<Box<dyn Reflect>> {
        let value = if node.name == COLLECTION_NODE_NAME {
            self.deserialize_value(node, TypeDescriptor::of::<Vec<Object>>())?
        } else if let Some(target) = self.resolve(&node.name) {
            self.deserialize_value(node, target)?
        } else if !node.is_container() {
            Box::new(node.text().unwrap_or("").to_string())
        } else if node.attributes.is_empty() {
            self.deserialize_value(node, TypeDescriptor::of::<Vec<Object>>())?
        } else {
            return Err(Error::unresolved_wire_name(node.name.as_str()));
        };
        Ok(Box::new(Object::from_boxed(value)))
    }

    fn deserialize_collection(&self, node: &Node, vt: &CollectionVTable) -> Result<Box<dyn Reflect>> {
        let element = vt.element();
        let values = node
            .children
            .iter()
            .map(|child| self.deserialize_value(child, element))
            .collect::<Result<Vec<_>>>()?;
        (vt.create)(values)
    }

    fn deserialize_entity(&self, node: &Node, target: TypeDescriptor) -> Result<Box<dyn Reflect>> {
        let entity = self
            .model
            .entity(target.type_id())
            .ok_or_else(|| Error::unknown_entity(target.type_path()))?;

        let mut engine_values: Vec<(&str, Box<dyn Reflect>)> = Vec::new();
        let has_parameters = entity.constructor_parameters().next().is_some();
        let mut instance = match entity.constructor() {
            Some(constructor) => {
                let arguments = self.read_constructor_arguments(node, entity, &mut engine_values)?;
                constructor(&mut Arguments::new(target.type_path(), arguments))?
            }
            None if has_parameters => {
                // missing inputs are reported before the configuration itself
                self.read_constructor_arguments(node, entity, &mut engine_values)?;
                return Err(Error::invalid_configuration(format!(
                    "constructor parameters of {} are configured but no constructor is invoked",
                    target.type_path()
                )));
            }
            None => instantiate(target)?,
        };
        let constructed = entity.constructor().is_some();

        for property in entity.properties() {
            if constructed && entity.constructor_owns(property.name()) {
                continue;
            }
            if self.owned_by_base_constructor(property, target.type_id()) {
                log::trace!("{} is set by the constructor of its declaring type", property.name());
                continue;
            }

            let value = match engine_values.iter().position(|(name, _)| *name == property.name()) {
                Some(index) => Some(engine_values.swap_remove(index).1),
                None => self.read_property(node, property)?,
            };
            if let Some(value) = value {
                assign(&mut *instance, entity, property, value)?;
            }
        }
        Ok(instance)
    }

    /// Reads the values of all constructor parameters.
    ///
    /// Parameters must be numbered densely from zero and each must name a
    /// property of the entity. Arguments for parameters flagged as set by
    /// the engine are cloned into `engine_values`.
    fn read_constructor_arguments<'e>(
        &self,
        node: &Node,
        entity: &'e EntityTypeInfo,
        engine_values: &mut Vec<(&'e str, Box<dyn Reflect>)>,
    ) -> Result<Vec<Box<dyn Reflect>>> {
        let type_path = entity.descriptor().type_path();
        let mut arguments = Vec::new();

        for (position, parameter) in entity.constructor_parameters().enumerate() {
            if parameter.index() != position {
                return Err(Error::missing_constructor_parameter(type_path, position));
            }
            let property_name = parameter.associated_property_name().ok_or_else(|| {
                Error::invalid_configuration(format!(
                    "constructor parameter {} of {} has no associated property",
                    position, type_path
                ))
            })?;
            let property = entity.property(property_name).ok_or_else(|| {
                Error::invalid_configuration(format!(
                    "constructor parameter {} of {} refers to unknown property {}",
                    position, type_path, property_name
                ))
            })?;

            let value = self.read_property(node, property)?.ok_or_else(|| {
                Error::missing_required_member(type_path, position, property.name(), property.wire_name())
            })?;
            if parameter.value_set_by_engine() {
                engine_values.push((property.name(), value.clone_value()));
            }
            arguments.push(value);
        }
        Ok(arguments)
    }

    /// True when `property` is inherited from another entity whose own
    /// constructor consumes it.
    fn owned_by_base_constructor(&self, property: &PropertyTypeInfo, entity_type: TypeId) -> bool {
        let declared_by = property.declared_by();
        if declared_by == entity_type {
            return false;
        }
        self.model.entity(declared_by).is_some_and(|base| {
            base.constructor().is_some() && base.constructor_owns(property.name())
        })
    }

    /// Reads the attribute or child backing `property`; `None` when absent.
    fn read_property(&self, node: &Node, property: &PropertyTypeInfo) -> Result<Option<Box<dyn Reflect>>> {
        if property.is_attribute() {
            node.attribute(property.wire_name())
                .map(|text| convert::from_text(text, property.value_type()))
                .transpose()
        } else {
            node.child(property.wire_name())
                .map(|child| self.deserialize_value(child, property.value_type()))
                .transpose()
        }
    }
}

fn instantiate(target: TypeDescriptor) -> Result<Box<dyn Reflect>> {
    match target.kind() {
        TypeKind::Entity(vt) => {
            (vt.instantiate)().ok_or_else(|| Error::not_constructible(target.type_path()))
        }
        _ => Err(Error::not_constructible(target.type_path())),
    }
}

/// Stores `value` in the member described by `property`.
///
/// A collection member holding an instance is refilled in place when its
/// shape allows it; everything else goes through the setter.
fn assign(
    instance: &mut dyn Reflect,
    entity: &EntityTypeInfo,
    property: &PropertyTypeInfo,
    value: Box<dyn Reflect>,
) -> Result<()> {
    let accessor = property.accessor();
    let mut value = value;

    if let TypeKind::Collection(vt) = property.value_type().kind() {
        if let Some(current) = accessor.get_mut(instance) {
            match (vt.try_fill)(current, value)? {
                None => return Ok(()),
                Some(replacement) => value = replacement,
            }
        }
    }

    if !accessor.can_write() {
        return Err(Error::read_only_member(
            entity.descriptor().type_path(),
            property.name(),
        ));
    }
    accessor.set(instance, value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::Stack;
    use crate::error::ErrorKind;
    use crate::model::ModelBuilder;
    use std::collections::VecDeque;
    use std::sync::Arc;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Tag {
        key: String,
        value: Option<String>,
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Item {
        id: u32,
        tags: Vec<Tag>,
        history: Stack<u8>,
    }

    #[derive(Debug, Clone, PartialEq)]
    struct Frozen {
        names: Arc<[String]>,
        queue: VecDeque<i32>,
    }

    impl ModelType for Frozen {}

    crate::entity_type!(Tag, Item);

    fn model() -> ModelRegistry {
        let mut builder = ModelBuilder::new();
        builder
            .has_known_entity::<Tag>()
            .property(member!(Tag, key))
            .unwrap()
            .is_mapped_as_attribute()
            .property(member!(Tag, optional value))
            .unwrap()
            .is_mapped_as_attribute();
        builder
            .has_known_entity::<Item>()
            .property(member!(Item, id))
            .unwrap()
            .is_mapped_as_attribute()
            .property(member!(Item, tags))
            .unwrap()
            .property(member!(Item, history))
            .unwrap();
        builder.build()
    }

    #[test]
    fn test_entity_from_text() {
        let xml = r#"
            <Item id="4">
                <tags>
                    <Tag key="a" value="1"/>
                    <Tag key="b"/>
                </tags>
                <history><u8>1</u8><u8>2</u8></history>
            </Item>"#;
        let item: Item = from_str(&model(), xml).unwrap();
        assert_eq!(item.id, 4);
        assert_eq!(
            item.tags,
            vec![
                Tag {
                    key: "a".to_string(),
                    value: Some("1".to_string()),
                },
                Tag {
                    key: "b".to_string(),
                    value: None,
                },
            ]
        );
        assert_eq!(item.history.peek(), Some(&2));
    }

    #[test]
    fn test_root_type_from_wire_name() {
        let model = model();
        let node = Node::parse(r#"<Tag key="k"/>"#).unwrap();
        let value = Deserializer::new(&model).deserialize(&node, None).unwrap();
        assert_eq!(value.downcast_ref::<Tag>().map(|t| t.key.as_str()), Some("k"));

        let node = Node::parse("<Nope/>").unwrap();
        let err = Deserializer::new(&model).deserialize(&node, None).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnresolvedWireName(name) if name == "Nope"));
    }

    #[test]
    fn test_absent_members_keep_defaults() {
        let item: Item = from_str(&model(), r#"<Item id="1"/>"#).unwrap();
        assert_eq!(
            item,
            Item {
                id: 1,
                ..Item::default()
            }
        );
    }

    #[test]
    fn test_leaf_node_as_collection_is_empty() {
        let values: Vec<i32> = from_str(&ModelRegistry::new(), "<Collection/>").unwrap();
        assert!(values.is_empty());
    }

    #[test]
    fn test_scalar_target_rejects_container() {
        let err = from_str::<i32>(&ModelRegistry::new(), "<i32><x/></i32>").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::TypeMismatch { .. }));
        let err = from_str::<i32>(&ModelRegistry::new(), "<i32>x</i32>").unwrap_err();
        assert!(err.is_conversion());
    }

    #[test]
    fn test_objects() {
        let model = ModelRegistry::new();
        let node = Node::parse("<Collection><i32>1</i32><String>a</String><Collection><u8>3</u8></Collection></Collection>").unwrap();
        let value: Object = from_node(&model, &node).unwrap();
        let list = value.downcast_ref::<Vec<Object>>().unwrap();
        assert_eq!(list[0], Object::new(1i32));
        assert_eq!(list[1], Object::new("a".to_string()));
        assert_eq!(list[2], Object::new(vec![Object::new(3u8)]));

        let text: Object = from_str(&model, "<Whatever>hi</Whatever>").unwrap();
        assert_eq!(text, Object::new("hi".to_string()));

        let err = from_str::<Object>(&model, r#"<Whatever a="1"/>"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnresolvedWireName(_)));
    }

    #[test]
    fn test_read_only_collection_is_replaced_through_setter() {
        let mut builder = ModelBuilder::new();
        builder
            .has_known_entity::<Frozen>()
            .property(member!(Frozen, names))
            .unwrap()
            .property(member!(Frozen, readonly queue))
            .unwrap()
            .constructor()
            .invokes(|_| {
                Ok(Frozen {
                    names: Arc::from(Vec::new()),
                    queue: VecDeque::from(vec![9]),
                })
            });
        let model = builder.build();

        let frozen: Frozen = from_str(
            &model,
            "<Frozen><names><String>x</String></names><queue><i32>1</i32><i32>2</i32></queue></Frozen>",
        )
        .unwrap();
        assert_eq!(&*frozen.names, &["x".to_string()]);
        // no setter, but the queue is filled in place
        assert_eq!(frozen.queue, VecDeque::from(vec![1, 2]));
    }

    #[test]
    fn test_read_only_scalar_member_fails() {
        let mut builder = ModelBuilder::new();
        builder
            .has_known_entity::<Tag>()
            .property(member!(Tag, readonly key))
            .unwrap()
            .is_mapped_as_attribute();
        let model = builder.build();
        let err = from_str::<Tag>(&model, r#"<Tag key="a"/>"#).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::ReadOnlyMember { .. }));
    }

    #[test]
    fn test_entity_without_construction_path() {
        let mut builder = ModelBuilder::new();
        builder.has_known_entity::<Frozen>();
        let model = builder.build();
        let err = from_str::<Frozen>(&model, "<Frozen/>").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::NotConstructible(_)));
    }

    #[test]
    fn test_constructor_error_propagates() {
        let mut builder = ModelBuilder::new();
        builder
            .has_known_entity::<Tag>()
            .property(member!(Tag, key))
            .unwrap()
            .is_mapped_as_attribute()
            .constructor()
            .parameter(0)
            .has_associated_property(member!(Tag, key))
            .invokes(|args| {
                let key: String = args.take(0)?;
                if key.is_empty() {
                    return Err(Error::custom("tag key must not be empty"));
                }
                Ok(Tag { key, value: None })
            });
        let model = builder.build();

        let tag: Tag = from_str(&model, r#"<Tag key="a"/>"#).unwrap();
        assert_eq!(tag.key, "a");
        let err = from_str::<Tag>(&model, r#"<Tag key=""/>"#).unwrap_err();
        assert_eq!(err.to_string(), "tag key must not be empty");
    }

    #[test]
    fn test_parameters_without_constructor() {
        let mut builder = ModelBuilder::new();
        builder
            .has_known_entity::<Tag>()
            .property(member!(Tag, key))
            .unwrap()
            .constructor()
            .parameter(0)
            .has_associated_property(member!(Tag, key));
        let model = builder.build();

        let err = from_str::<Tag>(&model, "<Tag><value/></Tag>").unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::MissingRequiredMember { index: 0, .. }
        ));

        let err = from_str::<Tag>(&model, "<Tag><key>a</key></Tag>").unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::InvalidConfiguration(_)));
    }

    #[test]
    fn test_sparse_parameters_without_constructor() {
        let mut builder = ModelBuilder::new();
        builder
            .has_known_entity::<Tag>()
            .property(member!(Tag, key))
            .unwrap()
            .constructor()
            .parameter(1)
            .has_associated_property(member!(Tag, key));
        let model = builder.build();

        let err = from_str::<Tag>(&model, "<Tag><key>a</key></Tag>").unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::MissingConstructorParameter { index: 0, .. }
        ));
    }
}
