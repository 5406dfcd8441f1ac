//! Per-type metadata stored in a [`ModelRegistry`](super::ModelRegistry).

use super::member::MemberAccessor;
use crate::error::{Error, Result};
use crate::reflect::{ModelType, Reflect, TypeDescriptor};
use std::any::TypeId;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A registered constructor: builds an instance from deserialized arguments.
pub type Constructor = Arc<dyn Fn(&mut Arguments) -> Result<Box<dyn Reflect>> + Send + Sync>;

/// Metadata of one entity type.
#[derive(Clone)]
pub struct EntityTypeInfo {
    descriptor: TypeDescriptor,
    wire_name: Option<String>,
    properties: Vec<PropertyTypeInfo>,
    constructor_parameters: BTreeMap<usize, ConstructorParameterTypeInfo>,
    constructor: Option<Constructor>,
}

impl EntityTypeInfo {
    pub(crate) fn new(descriptor: TypeDescriptor) -> Self {
        Self {
            descriptor,
            wire_name: None,
            properties: Vec::new(),
            constructor_parameters: BTreeMap::new(),
            constructor: None,
        }
    }

    /// Descriptor of the entity type.
    pub fn descriptor(&self) -> TypeDescriptor {
        self.descriptor
    }

    /// Registry key of the entity.
    pub fn entity_type(&self) -> TypeId {
        self.descriptor.type_id()
    }

    /// Node name used on the wire.
    pub fn wire_name(&self) -> &str {
        self.wire_name
            .as_deref()
            .unwrap_or_else(|| self.descriptor.type_ident())
    }

    /// The explicit wire name, if one was configured.
    pub fn wire_name_override(&self) -> Option<&str> {
        self.wire_name.as_deref()
    }

    pub(crate) fn set_wire_name(&mut self, name: String) {
        self.wire_name = Some(name);
    }

    /// Properties in registration order.
    pub fn properties(&self) -> &[PropertyTypeInfo] {
        &self.properties
    }

    /// Looks up a property by member name.
    pub fn property(&self, name: &str) -> Option<&PropertyTypeInfo> {
        self.properties.iter().find(|p| p.name == name)
    }

    pub(crate) fn property_mut(&mut self, name: &str) -> Option<&mut PropertyTypeInfo> {
        self.properties.iter_mut().find(|p| p.name == name)
    }

    /// Returns the property called `name`, creating it from `accessor` when absent.
    pub fn get_or_create_property(
        &mut self,
        name: &str,
        value_type: TypeDescriptor,
        declared_by: TypeId,
        accessor: Arc<dyn MemberAccessor>,
    ) -> &mut PropertyTypeInfo {
        let index = match self.properties.iter().position(|p| p.name == name) {
            Some(index) => index,
            None => {
                self.properties.push(PropertyTypeInfo {
                    name: name.to_string(),
                    wire_name: None,
                    is_attribute: false,
                    suppress_if_default: false,
                    default_check: None,
                    value_type,
                    declared_by,
                    accessor,
                });
                self.properties.len() - 1
            }
        };
        &mut self.properties[index]
    }

    pub(crate) fn remove_property(&mut self, name: &str) -> Option<PropertyTypeInfo> {
        let index = self.properties.iter().position(|p| p.name == name)?;
        Some(self.properties.remove(index))
    }

    /// Constructor parameters ordered by index.
    pub fn constructor_parameters(&self) -> impl Iterator<Item = &ConstructorParameterTypeInfo> {
        self.constructor_parameters.values()
    }

    /// Parameter info for `index`.
    pub fn constructor_parameter(&self, index: usize) -> Option<&ConstructorParameterTypeInfo> {
        self.constructor_parameters.get(&index)
    }

    /// Returns the parameter info for `index`, creating it when absent.
    pub fn get_or_create_constructor_parameter(
        &mut self,
        index: usize,
    ) -> &mut ConstructorParameterTypeInfo {
        self.constructor_parameters
            .entry(index)
            .or_insert_with(|| ConstructorParameterTypeInfo {
                index,
                associated_property_name: None,
                value_set_by_engine: false,
            })
    }

    pub(crate) fn remove_constructor_parameter(&mut self, index: usize) {
        self.constructor_parameters.remove(&index);
    }

    pub(crate) fn clear_constructor(&mut self) {
        self.constructor_parameters.clear();
        self.constructor = None;
    }

    /// True if the constructor consumes `property` and owns its value.
    pub fn constructor_owns(&self, property: &str) -> bool {
        self.constructor_parameters.values().any(|p| {
            p.associated_property_name.as_deref() == Some(property) && !p.value_set_by_engine
        })
    }

    /// The registered constructor.
    pub fn constructor(&self) -> Option<&Constructor> {
        self.constructor.as_ref()
    }

    pub(crate) fn set_constructor(&mut self, constructor: Constructor) {
        self.constructor = Some(constructor);
    }
}

impl fmt::Debug for EntityTypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityTypeInfo")
            .field("type", &self.descriptor.type_path())
            .field("wire_name", &self.wire_name())
            .field("properties", &self.properties)
            .field("constructor_parameters", &self.constructor_parameters)
            .field("has_constructor", &self.constructor.is_some())
            .finish()
    }
}

/// Metadata of one configured member.
#[derive(Clone)]
pub struct PropertyTypeInfo {
    name: String,
    wire_name: Option<String>,
    is_attribute: bool,
    suppress_if_default: bool,
    default_check: Option<fn(&dyn Reflect) -> bool>,
    value_type: TypeDescriptor,
    declared_by: TypeId,
    accessor: Arc<dyn MemberAccessor>,
}

impl PropertyTypeInfo {
    /// Member name; also the name constructor parameters refer to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same as [`name`](Self::name).
    pub fn associated_property_name(&self) -> &str {
        &self.name
    }

    /// Attribute or element name used on the wire.
    pub fn wire_name(&self) -> &str {
        self.wire_name.as_deref().unwrap_or(&self.name)
    }

    /// The explicit wire name, if one was configured.
    pub fn wire_name_override(&self) -> Option<&str> {
        self.wire_name.as_deref()
    }

    pub(crate) fn set_wire_name(&mut self, name: String) {
        self.wire_name = Some(name);
    }

    /// True when mapped to an attribute.
    pub fn is_attribute(&self) -> bool {
        self.is_attribute
    }

    pub(crate) fn set_attribute(&mut self, is_attribute: bool) {
        self.is_attribute = is_attribute;
    }

    /// True when default values are left out of the output.
    pub fn suppress_if_default(&self) -> bool {
        self.suppress_if_default
    }

    pub(crate) fn set_suppress_if_default(&mut self, check: Option<fn(&dyn Reflect) -> bool>) {
        self.suppress_if_default = check.is_some();
        self.default_check = check;
    }

    /// True when `value` should be omitted as a default.
    pub fn is_suppressed(&self, value: &dyn Reflect) -> bool {
        self.suppress_if_default && self.default_check.is_some_and(|is_default| is_default(value))
    }

    /// Declared member type.
    pub fn value_type(&self) -> TypeDescriptor {
        self.value_type
    }

    /// Type that declares the member.
    pub fn declared_by(&self) -> TypeId {
        self.declared_by
    }

    /// Accessor used to read and write the member.
    pub fn accessor(&self) -> &dyn MemberAccessor {
        &*self.accessor
    }
}

impl fmt::Debug for PropertyTypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyTypeInfo")
            .field("name", &self.name)
            .field("wire_name", &self.wire_name())
            .field("is_attribute", &self.is_attribute)
            .field("suppress_if_default", &self.suppress_if_default)
            .field("value_type", &self.value_type.type_path())
            .finish()
    }
}

/// Metadata of one constructor parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorParameterTypeInfo {
    index: usize,
    associated_property_name: Option<String>,
    value_set_by_engine: bool,
}

impl ConstructorParameterTypeInfo {
    /// Zero-based parameter position.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Member supplying the argument.
    pub fn associated_property_name(&self) -> Option<&str> {
        self.associated_property_name.as_deref()
    }

    pub(crate) fn set_associated_property_name(&mut self, name: &str) {
        self.associated_property_name = Some(name.to_string());
    }

    /// True when the engine assigns the member again after construction.
    pub fn value_set_by_engine(&self) -> bool {
        self.value_set_by_engine
    }

    pub(crate) fn set_value_set_by_engine(&mut self, value: bool) {
        self.value_set_by_engine = value;
    }
}

/// Positional arguments handed to a registered constructor.
#[derive(Debug, Default)]
pub struct Arguments {
    entity: &'static str,
    values: Vec<Option<Box<dyn Reflect>>>,
}

impl Arguments {
    pub(crate) fn new(entity: &'static str, values: Vec<Box<dyn Reflect>>) -> Self {
        Self {
            entity,
            values: values.into_iter().map(Some).collect(),
        }
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when there are no arguments.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Moves argument `index` out as a `P`.
    pub fn take<P: ModelType>(&mut self, index: usize) -> Result<P> {
        self.take_value(index)?.take::<P>()
    }

    /// Moves argument `index` out without a type check.
    pub fn take_value(&mut self, index: usize) -> Result<Box<dyn Reflect>> {
        self.values
            .get_mut(index)
            .and_then(Option::take)
            .ok_or_else(|| Error::missing_constructor_parameter(self.entity, index))
    }
}

/// Wraps a typed constructor closure.
pub(crate) fn erase_constructor<T, F>(constructor: F) -> Constructor
where
    T: ModelType,
    F: Fn(&mut Arguments) -> Result<T> + Send + Sync + 'static,
{
    Arc::new(move |args: &mut Arguments| {
        constructor(args).map(|value| Box::new(value) as Box<dyn Reflect>)
    })
}

/// Default check for a member type `P`.
pub(crate) fn is_default_value<P: ModelType + Default>(value: &dyn Reflect) -> bool {
    value.downcast_ref::<P>().is_some_and(|value| *value == P::default())
}
