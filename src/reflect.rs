//! Runtime type identity for values flowing through the mapping engine.
//!
//! The engine never sees concrete Rust types. It works on `&dyn Reflect`
//! values and on [`TypeDescriptor`]s, which carry a [`TypeId`], the type path
//! and a [`TypeKind`] telling the engine how to treat the value: as a scalar
//! with a textual form, as a nullable wrapper, as a collection shape, as a
//! boxed [`Object`], or as a registered entity.
//!
//! Application types opt in by implementing [`ModelType`]; [`Reflect`] is then
//! provided by a blanket implementation.
//!
//! # Note
//!
//! `Box<dyn Reflect>` does not implement `Reflect` itself, so calling
//! [`Any::type_id`] on a box would report the box, not the value. Always ask
//! the value for [`Reflect::reflect_descriptor`] instead.

use crate::error::{Error, Result};
use std::any::{type_name, Any, TypeId};
use std::fmt;

/// Object-safe view of a model value.
pub trait Reflect: Any + fmt::Debug {
    /// Returns the value as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;

    /// Returns the value as `&mut dyn Any`.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Converts the boxed value into `Box<dyn Any>`.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Descriptor of the concrete runtime type.
    fn reflect_descriptor(&self) -> TypeDescriptor;

    /// Clones the value into a new box.
    fn clone_value(&self) -> Box<dyn Reflect>;

    /// Compares against another value of possibly different type.
    fn eq_value(&self, other: &dyn Reflect) -> bool;
}

/// A type that can take part in a model.
///
/// Entities usually only need an empty impl (or the [`entity_type!`] macro
/// when they implement `Default`); scalars, collections and `Option` get
/// their descriptor from this crate.
///
/// [`entity_type!`]: crate::entity_type
pub trait ModelType: Any + fmt::Debug + Clone + PartialEq + Sized {
    /// Describes how the engine treats this type.
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::entity::<Self>()
    }

    /// No-arg construction used when no constructor is registered.
    fn instantiate() -> Option<Self> {
        None
    }
}

impl<T: ModelType> Reflect for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    #[inline]
    fn reflect_descriptor(&self) -> TypeDescriptor {
        T::type_descriptor()
    }

    fn clone_value(&self) -> Box<dyn Reflect> {
        Box::new(self.clone())
    }

    fn eq_value(&self, other: &dyn Reflect) -> bool {
        other.downcast_ref::<T>().is_some_and(|other| self == other)
    }
}

impl dyn Reflect {
    /// Returns true if the value is a `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrows the value as a `T`.
    #[inline]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably borrows the value as a `T`.
    #[inline]
    pub fn downcast_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }

    /// Moves the value out as a `T`.
    pub fn take<T: Any>(self: Box<Self>) -> Result<T> {
        let found = self.reflect_descriptor().type_path();
        self.into_any()
            .downcast::<T>()
            .map(|value| *value)
            .map_err(|_| Error::type_mismatch(type_name::<T>(), found))
    }
}

/// How the engine treats values of a type.
#[derive(Clone, Copy)]
pub enum TypeKind {
    /// A value with a textual form.
    Scalar(ScalarVTable),
    /// `Option<T>`; `None` is treated as null.
    Nullable(NullableVTable),
    /// A supported collection shape.
    Collection(CollectionVTable),
    /// A boxed [`Object`] whose runtime type decides its treatment.
    Object,
    /// A structured type described by an entity in the model.
    Entity(EntityVTable),
    /// An abstract type that cannot be instantiated on deserialize.
    Contract,
}

impl fmt::Debug for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeKind::Scalar(_) => f.write_str("Scalar"),
            TypeKind::Nullable(vt) => f.debug_tuple("Nullable").field(&(vt.inner)()).finish(),
            TypeKind::Collection(vt) => f
                .debug_struct("Collection")
                .field("shape", &vt.shape)
                .field("element", &(vt.element)())
                .finish(),
            TypeKind::Object => f.write_str("Object"),
            TypeKind::Entity(_) => f.write_str("Entity"),
            TypeKind::Contract => f.write_str("Contract"),
        }
    }
}

/// Text conversion entry points of a scalar type.
#[derive(Clone, Copy)]
pub struct ScalarVTable {
    pub(crate) to_text: fn(&dyn Reflect) -> Result<String>,
    pub(crate) from_text: fn(&str) -> Result<Box<dyn Reflect>>,
}

/// Entry points of `Option<T>`.
#[derive(Clone, Copy)]
pub struct NullableVTable {
    pub(crate) inner: fn() -> TypeDescriptor,
    pub(crate) get: fn(&dyn Reflect) -> Option<&dyn Reflect>,
    pub(crate) wrap: fn(Box<dyn Reflect>) -> Result<Box<dyn Reflect>>,
}

impl NullableVTable {
    fn of<T: ModelType>() -> Self {
        Self {
            inner: T::type_descriptor,
            get: nullable_get::<T>,
            wrap: nullable_wrap::<T>,
        }
    }

    /// Descriptor of the wrapped type.
    pub fn inner(&self) -> TypeDescriptor {
        (self.inner)()
    }
}

fn nullable_get<T: ModelType>(value: &dyn Reflect) -> Option<&dyn Reflect> {
    value
        .downcast_ref::<Option<T>>()
        .and_then(Option::as_ref)
        .map(|inner| inner as &dyn Reflect)
}

fn nullable_wrap<T: ModelType>(value: Box<dyn Reflect>) -> Result<Box<dyn Reflect>> {
    Ok(Box::new(Some(value.take::<T>()?)))
}

/// Erased entry points of a collection shape.
#[derive(Clone, Copy)]
pub struct CollectionVTable {
    pub(crate) element: fn() -> TypeDescriptor,
    pub(crate) shape: crate::collection::ShapeKind,
    pub(crate) values: fn(&dyn Reflect) -> Vec<&dyn Reflect>,
    pub(crate) create: fn(Vec<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>>,
    pub(crate) try_fill: fn(&mut dyn Reflect, Box<dyn Reflect>) -> Result<Option<Box<dyn Reflect>>>,
}

impl CollectionVTable {
    /// Descriptor of the element type.
    pub fn element(&self) -> TypeDescriptor {
        (self.element)()
    }

    /// The shape family.
    pub fn shape(&self) -> crate::collection::ShapeKind {
        self.shape
    }
}

/// No-arg instantiation of an entity type.
#[derive(Clone, Copy)]
pub struct EntityVTable {
    pub(crate) instantiate: fn() -> Option<Box<dyn Reflect>>,
}

fn instantiate_erased<T: ModelType>() -> Option<Box<dyn Reflect>> {
    T::instantiate().map(|value| Box::new(value) as Box<dyn Reflect>)
}

/// Identity and treatment of a model type.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    type_id: TypeId,
    type_path: &'static str,
    kind: TypeKind,
}

impl TypeDescriptor {
    /// Creates a descriptor for `T` with an explicit kind.
    pub fn new<T: Any>(kind: TypeKind) -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_path: type_name::<T>(),
            kind,
        }
    }

    /// Descriptor of an entity type.
    pub fn entity<T: ModelType>() -> Self {
        Self::new::<T>(TypeKind::Entity(EntityVTable {
            instantiate: instantiate_erased::<T>,
        }))
    }

    /// Descriptor of an abstract type.
    pub fn contract<T: Any>() -> Self {
        Self::new::<T>(TypeKind::Contract)
    }

    /// Shorthand for `T::type_descriptor()`.
    #[inline]
    pub fn of<T: ModelType>() -> Self {
        T::type_descriptor()
    }

    /// The [`TypeId`] of the described type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Full type path, e.g. `alloc::vec::Vec<i32>`.
    #[inline]
    pub fn type_path(&self) -> &'static str {
        self.type_path
    }

    /// The type name without module path or generic arguments.
    ///
    /// This is the default wire name of entities and scalars.
    pub fn type_ident(&self) -> &'static str {
        let path = match self.type_path.find('<') {
            Some(generics) => &self.type_path[..generics],
            None => self.type_path,
        };
        path.rsplit("::").next().unwrap_or(path)
    }

    /// How the engine treats the type.
    #[inline]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// True for scalar types.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, TypeKind::Scalar(_))
    }

    /// True for [`Object`].
    #[inline]
    pub fn is_object(&self) -> bool {
        matches!(self.kind, TypeKind::Object)
    }

    /// True for entity types.
    #[inline]
    pub fn is_entity(&self) -> bool {
        matches!(self.kind, TypeKind::Entity(_))
    }

    /// True for abstract types.
    #[inline]
    pub fn is_contract(&self) -> bool {
        matches!(self.kind, TypeKind::Contract)
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for TypeDescriptor {}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("type_path", &self.type_path)
            .field("kind", &self.kind)
            .finish()
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_path)
    }
}

impl<T: ModelType> ModelType for Option<T> {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::new::<Self>(TypeKind::Nullable(NullableVTable::of::<T>()))
    }

    fn instantiate() -> Option<Self> {
        Some(None)
    }
}

/// A boxed value of any model type.
///
/// Members typed `Object` are serialized by the runtime type of the boxed
/// value, and deserialized by resolving the node name through the model's
/// wire-name index.
pub struct Object(Box<dyn Reflect>);

impl Object {
    /// Boxes `value`.
    pub fn new<T: ModelType>(value: T) -> Self {
        Self::from_boxed(Box::new(value))
    }

    /// Wraps an already boxed value, flattening nested objects.
    pub fn from_boxed(value: Box<dyn Reflect>) -> Self {
        if let Some(object) = value.downcast_ref::<Object>() {
            return object.clone();
        }
        Object(value)
    }

    /// Borrows the boxed value.
    #[inline]
    pub fn get(&self) -> &dyn Reflect {
        &*self.0
    }

    /// Borrows the boxed value as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.downcast_ref::<T>()
    }

    /// Returns the boxed value.
    pub fn into_inner(self) -> Box<dyn Reflect> {
        self.0
    }
}

impl Clone for Object {
    fn clone(&self) -> Self {
        Object(self.0.clone_value())
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_value(other.get())
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

impl ModelType for Object {
    fn type_descriptor() -> TypeDescriptor {
        TypeDescriptor::new::<Object>(TypeKind::Object)
    }
}
