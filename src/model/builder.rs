//! Fluent configuration of a [`ModelRegistry`].
//!
//! ```rust
//! use xml_model::{member, ModelBuilder};
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
//! assert_eq!(model.resolve_wire_name("Point").unwrap().type_ident(), "Point");
//! # Ok::<(), xml_model::Error>(())
//! ```

use super::info::{erase_constructor, is_default_value, Arguments};
use super::member::Member;
use super::registry::ModelRegistry;
use crate::convert::Scalar;
use crate::error::{Error, Result};
use crate::reflect::{ModelType, Reflect, TypeKind};
use std::any::{type_name, TypeId};
use std::marker::PhantomData;
use std::sync::Arc;

/// Owns a registry under construction.
#[derive(Debug, Clone, Default)]
pub struct ModelBuilder {
    registry: ModelRegistry,
}

impl ModelBuilder {
    /// Starts from a registry holding only the built-in scalars.
    pub fn new() -> Self {
        Self::default()
    }

    /// Continues configuring an existing registry.
    pub fn from_registry(registry: ModelRegistry) -> Self {
        Self { registry }
    }

    /// Returns an independent builder over a deep copy of the registry.
    pub fn copy(&self) -> Self {
        log::debug!("copying model with {} entities", self.registry.entities().count());
        Self {
            registry: self.registry.deep_copy(),
        }
    }

    /// The registry built so far.
    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Finishes configuration.
    pub fn build(self) -> ModelRegistry {
        self.registry
    }

    /// Registers (or fetches) the entity `T`.
    pub fn has_known_entity<T: ModelType>(&mut self) -> EntityBuilder<'_, T> {
        let descriptor = T::type_descriptor();
        let entity = self.registry.get_or_create_entity(descriptor);
        if entity.wire_name_override().is_none() {
            self.registry
                .index_wire_name(descriptor.type_ident(), descriptor.type_id());
        }
        EntityBuilder {
            registry: &mut self.registry,
            _marker: PhantomData,
        }
    }

    /// Registers a custom scalar so its wire name resolves.
    pub fn has_known_scalar<T: Scalar>(&mut self) -> &mut Self {
        let descriptor = T::type_descriptor();
        self.registry.register_type(descriptor);
        self.registry
            .index_wire_name(descriptor.type_ident(), descriptor.type_id());
        self
    }
}

impl From<ModelBuilder> for ModelRegistry {
    fn from(builder: ModelBuilder) -> Self {
        builder.build()
    }
}

/// Configures one entity.
pub struct EntityBuilder<'a, T> {
    registry: &'a mut ModelRegistry,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: ModelType> EntityBuilder<'a, T> {
    fn type_id() -> TypeId {
        TypeId::of::<T>()
    }

    fn info(&mut self) -> &mut super::EntityTypeInfo {
        self.registry.get_or_create_entity(T::type_descriptor())
    }

    /// Sets the node name used for `T`.
    pub fn has_name<S: Into<String>>(mut self, name: S) -> Self {
        let name = name.into();
        let entity = self.info();
        let old = entity
            .wire_name_override()
            .unwrap_or_else(|| T::type_descriptor().type_ident())
            .to_string();
        entity.set_wire_name(name.clone());
        self.registry.swap_wire_name(Some(&old), &name, Self::type_id());
        self
    }

    /// Configures a member of `T`.
    ///
    /// Fails when the member type is an abstract contract type, also behind
    /// any number of `Option` layers.
    pub fn property<P: ModelType>(mut self, member: Member<T, P>) -> Result<PropertyBuilder<'a, T, P>> {
        let value_type = P::type_descriptor();
        let mut underlying = value_type;
        while let TypeKind::Nullable(vt) = underlying.kind() {
            underlying = vt.inner();
        }
        if underlying.is_contract() {
            return Err(Error::unsupported_member_type(
                type_name::<T>(),
                member.name(),
                value_type.type_path(),
            ));
        }

        self.registry.register_type(value_type);
        if value_type.is_entity() || value_type.is_scalar() {
            self.registry
                .index_wire_name_if_absent(value_type.type_ident(), value_type.type_id());
        }
        self.info().get_or_create_property(
            member.name(),
            value_type,
            member.declared_by(),
            Arc::new(member),
        );
        Ok(PropertyBuilder {
            entity: self,
            name: member.name(),
            _marker: PhantomData,
        })
    }

    /// Starts constructor configuration.
    pub fn constructor(self) -> ConstructorBuilder<'a, T> {
        ConstructorBuilder { entity: self }
    }

    /// Removes `T` from the model.
    pub fn ignore(self) {
        self.registry.remove_entity(Self::type_id());
    }

    /// The entity metadata configured so far.
    pub fn entity_info(&mut self) -> &super::EntityTypeInfo {
        self.info()
    }
}

/// Configures one member of an entity.
pub struct PropertyBuilder<'a, T, P> {
    entity: EntityBuilder<'a, T>,
    name: &'static str,
    _marker: PhantomData<fn() -> P>,
}

impl<'a, T: ModelType, P: ModelType> PropertyBuilder<'a, T, P> {
    fn update(&mut self, f: impl FnOnce(&mut super::PropertyTypeInfo)) {
        if let Some(property) = self.entity.info().property_mut(self.name) {
            f(property);
        }
    }

    /// Maps the member to an attribute.
    pub fn is_mapped_as_attribute(mut self) -> Self {
        self.update(|p| p.set_attribute(true));
        self
    }

    /// Maps the member to a child element (the default).
    pub fn is_mapped_as_element(mut self) -> Self {
        self.update(|p| p.set_attribute(false));
        self
    }

    /// Sets the attribute or element name of the member.
    ///
    /// For entity and scalar members the name also replaces the member type's
    /// entry in the wire-name index: the previous custom name, or the type's
    /// own name on the first rename.
    pub fn has_name<S: Into<String>>(mut self, name: S) -> Self {
        let name = name.into();
        let value_type = P::type_descriptor();
        let mut old = None;
        self.update(|p| {
            old = Some(
                p.wire_name_override()
                    .unwrap_or_else(|| value_type.type_ident())
                    .to_string(),
            );
            p.set_wire_name(name.clone());
        });
        if value_type.is_entity() || value_type.is_scalar() {
            self.entity
                .registry
                .swap_wire_name(old.as_deref(), &name, value_type.type_id());
        }
        self
    }

    /// Removes the member from the entity.
    pub fn ignore(mut self) -> EntityBuilder<'a, T> {
        log::debug!("ignoring {}::{}", type_name::<T>(), self.name);
        self.entity.info().remove_property(self.name);
        self.entity
    }

    /// Configures another member of the same entity.
    pub fn property<Q: ModelType>(self, member: Member<T, Q>) -> Result<PropertyBuilder<'a, T, Q>> {
        self.entity.property(member)
    }

    /// Starts constructor configuration of the entity.
    pub fn constructor(self) -> ConstructorBuilder<'a, T> {
        self.entity.constructor()
    }

    /// Returns to the entity.
    pub fn entity(self) -> EntityBuilder<'a, T> {
        self.entity
    }
}

impl<'a, T: ModelType, P: ModelType + Default> PropertyBuilder<'a, T, P> {
    /// Leaves the member out of the output while it equals `P::default()`.
    ///
    /// Any member type with a default can be suppressed, strings included:
    /// an empty `String` member is then written as nothing at all and reads
    /// back as the empty string.
    pub fn should_not_serialize_if_default(mut self) -> Self {
        let check: fn(&dyn Reflect) -> bool = is_default_value::<P>;
        self.update(|p| p.set_suppress_if_default(Some(check)));
        self
    }

    /// Always writes the member (the default).
    pub fn should_serialize_if_default(mut self) -> Self {
        self.update(|p| p.set_suppress_if_default(None));
        self
    }
}

/// Configures constructor-based creation of an entity.
pub struct ConstructorBuilder<'a, T> {
    entity: EntityBuilder<'a, T>,
}

impl<'a, T: ModelType> ConstructorBuilder<'a, T> {
    /// Configures parameter `index`.
    pub fn parameter(mut self, index: usize) -> ParameterBuilder<'a, T> {
        self.entity.info().get_or_create_constructor_parameter(index);
        ParameterBuilder {
            constructor: self,
            index,
        }
    }

    /// Registers the function that builds `T` from its arguments.
    pub fn invokes<F>(mut self, constructor: F) -> Self
    where
        F: Fn(&mut Arguments) -> Result<T> + Send + Sync + 'static,
    {
        self.entity.info().set_constructor(erase_constructor(constructor));
        self
    }

    /// Drops all constructor configuration; `T` is created without arguments.
    pub fn ignore(mut self) -> EntityBuilder<'a, T> {
        self.entity.info().clear_constructor();
        self.entity
    }

    /// Returns to the entity.
    pub fn entity(self) -> EntityBuilder<'a, T> {
        self.entity
    }
}

/// Configures one constructor parameter.
pub struct ParameterBuilder<'a, T> {
    constructor: ConstructorBuilder<'a, T>,
    index: usize,
}

impl<'a, T: ModelType> ParameterBuilder<'a, T> {
    fn update(&mut self, f: impl FnOnce(&mut super::ConstructorParameterTypeInfo)) {
        let index = self.index;
        f(self
            .constructor
            .entity
            .info()
            .get_or_create_constructor_parameter(index));
    }

    /// Supplies the argument from `member`.
    pub fn has_associated_property<P: ModelType>(mut self, member: Member<T, P>) -> Self {
        self.update(|p| p.set_associated_property_name(member.name()));
        self
    }

    /// The constructor alone sets the member (the default).
    pub fn value_is_set_by_constructor(mut self) -> Self {
        self.update(|p| p.set_value_set_by_engine(false));
        self
    }

    /// The engine assigns the member again after construction.
    pub fn value_is_set_by_engine(mut self) -> Self {
        self.update(|p| p.set_value_set_by_engine(true));
        self
    }

    /// Removes this parameter.
    pub fn ignore(mut self) -> ConstructorBuilder<'a, T> {
        let index = self.index;
        self.constructor.entity.info().remove_constructor_parameter(index);
        self.constructor
    }

    /// Configures another parameter.
    pub fn parameter(self, index: usize) -> ParameterBuilder<'a, T> {
        self.constructor.parameter(index)
    }

    /// Registers the constructor function.
    pub fn invokes<F>(self, constructor: F) -> ConstructorBuilder<'a, T>
    where
        F: Fn(&mut Arguments) -> Result<T> + Send + Sync + 'static,
    {
        self.constructor.invokes(constructor)
    }

    /// Configures a member of the entity.
    pub fn property<P: ModelType>(self, member: Member<T, P>) -> Result<PropertyBuilder<'a, T, P>> {
        self.constructor.entity.property(member)
    }

    /// Returns to the constructor.
    pub fn constructor(self) -> ConstructorBuilder<'a, T> {
        self.constructor
    }
}
