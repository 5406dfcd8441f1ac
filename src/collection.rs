//! Collection shapes understood by the mapping engine.
//!
//! A shape converts between a native collection and an ordered sequence of
//! element values. Every shape can be built from a sequence; growable shapes
//! can also be refilled in place, which lets the engine populate a member
//! that has a getter but no setter.
//!
//! | Shape | Types | Filled in place |
//! |-------|-------|-----------------|
//! | [`ShapeKind::List`] | `Vec<T>` | yes |
//! | [`ShapeKind::MutableCollection`] | `LinkedList<T>` | yes |
//! | [`ShapeKind::Queue`] | `VecDeque<T>` | yes |
//! | [`ShapeKind::Stack`] | [`Stack<T>`] | yes |
//! | [`ShapeKind::Set`] | `HashSet<T>`, `BTreeSet<T>` | yes |
//! | [`ShapeKind::Array`] | `Box<[T]>`, `[T; N]` | no |
//! | [`ShapeKind::ReadOnly`] | `Rc<[T]>`, `Arc<[T]>` | no |

use crate::error::{Error, Result};
use crate::reflect::{CollectionVTable, ModelType, Reflect, TypeDescriptor, TypeKind};
use std::any::type_name;
use std::collections::{BTreeSet, HashSet, LinkedList, VecDeque};
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;

/// Family of a collection shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    /// Growable list.
    List,
    /// Linked list.
    MutableCollection,
    /// First-in first-out queue, iterated in enqueue order.
    Queue,
    /// Last-in first-out stack, iterated in push order.
    Stack,
    /// Membership set.
    Set,
    /// Fixed-size array.
    Array,
    /// Shared read-only slice.
    ReadOnly,
}

impl ShapeKind {
    /// True when an existing instance can be repopulated.
    pub fn fills_in_place(self) -> bool {
        !matches!(self, ShapeKind::Array | ShapeKind::ReadOnly)
    }
}

/// A collection type with a fixed element type.
pub trait CollectionShape: ModelType {
    /// Element type.
    type Element: ModelType;

    /// Shape family.
    fn shape_kind() -> ShapeKind;

    /// Elements in output order.
    fn values(&self) -> Box<dyn Iterator<Item = &Self::Element> + '_>;

    /// Consumes the collection into its elements, in output order.
    fn into_values(self) -> Vec<Self::Element>;

    /// Replaces the contents with `values`.
    ///
    /// Shapes that cannot be mutated hand the values back unchanged.
    fn try_fill(&mut self, values: Vec<Self::Element>) -> std::result::Result<(), Vec<Self::Element>>;

    /// Builds a new collection holding `values` in order.
    fn create_from_values(values: Vec<Self::Element>) -> Result<Self>;
}

/// Descriptor of a collection type.
pub fn collection_descriptor<C: CollectionShape>() -> TypeDescriptor {
    TypeDescriptor::new::<C>(TypeKind::Collection(CollectionVTable {
        element: <C::Element as ModelType>::type_descriptor,
        shape: C::shape_kind(),
        values: erased_values::<C>,
        create: erased_create::<C>,
        try_fill: erased_try_fill::<C>,
    }))
}

/// True when `descriptor` names a supported collection shape.
///
/// Scalars, including `String`, and entities never qualify.
pub fn is_supported_collection_shape(descriptor: &TypeDescriptor) -> bool {
    matches!(descriptor.kind(), TypeKind::Collection(_))
}

fn downcast_collection<C: CollectionShape>(value: &dyn Reflect) -> Result<&C> {
    value.downcast_ref::<C>().ok_or_else(|| {
        Error::type_mismatch(type_name::<C>(), value.reflect_descriptor().type_path())
    })
}

fn erased_values<C: CollectionShape>(value: &dyn Reflect) -> Vec<&dyn Reflect> {
    match downcast_collection::<C>(value) {
        Ok(collection) => collection
            .values()
            .map(|element| element as &dyn Reflect)
            .collect(),
        Err(_) => Vec::new(),
    }
}

fn take_elements<C: CollectionShape>(values: Vec<Box<dyn Reflect>>) -> Result<Vec<C::Element>> {
    values
        .into_iter()
        .map(|value| value.take::<C::Element>())
        .collect()
}

fn erased_create<C: CollectionShape>(values: Vec<Box<dyn Reflect>>) -> Result<Box<dyn Reflect>> {
    let collection = C::create_from_values(take_elements::<C>(values)?)?;
    Ok(Box::new(collection))
}

/// Moves the contents of `source` (a `C`) into `target`.
///
/// Returns `None` when `target` was filled in place, otherwise a new
/// collection the caller has to assign.
fn erased_try_fill<C: CollectionShape>(
    target: &mut dyn Reflect,
    source: Box<dyn Reflect>,
) -> Result<Option<Box<dyn Reflect>>> {
    let values = source.take::<C>()?.into_values();
    let found = target.reflect_descriptor().type_path();
    let target = target
        .downcast_mut::<C>()
        .ok_or_else(|| Error::type_mismatch(type_name::<C>(), found))?;
    match target.try_fill(values) {
        Ok(()) => Ok(None),
        Err(values) => Ok(Some(Box::new(C::create_from_values(values)?))),
    }
}

/// A last-in first-out stack.
///
/// Iteration runs from the bottom to the top, so the element pushed last is
/// yielded last and popped first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Stack<T> {
    items: Vec<T>,
}

impl<T> Stack<T> {
    /// Creates an empty stack.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Pushes onto the top.
    pub fn push(&mut self, value: T) {
        self.items.push(value);
    }

    /// Removes the top element.
    pub fn pop(&mut self) -> Option<T> {
        self.items.pop()
    }

    /// The top element.
    pub fn peek(&self) -> Option<&T> {
        self.items.last()
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the stack holds no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Removes all elements.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Iterates from bottom to top.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }
}

impl<T> Default for Stack<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for Stack<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> Extend<T> for Stack<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<'a, T> IntoIterator for &'a Stack<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Implements `ModelType` and `CollectionShape` for growable shapes that
/// support `clear` and `Extend`.
macro_rules! growable_shapes {
    ($($shape:ident => $ty:ident<T $(: $($bound:ident),+)?>),* $(,)?) => {
        $(
            impl<T: ModelType $($(+ $bound)+)?> ModelType for $ty<T> {
                fn type_descriptor() -> TypeDescriptor {
                    collection_descriptor::<Self>()
                }

                fn instantiate() -> Option<Self> {
                    Some($ty::new())
                }
            }

            impl<T: ModelType $($(+ $bound)+)?> CollectionShape for $ty<T> {
                type Element = T;

                fn shape_kind() -> ShapeKind {
                    ShapeKind::$shape
                }

                fn values(&self) -> Box<dyn Iterator<Item = &T> + '_> {
                    Box::new(self.iter())
                }

                fn into_values(self) -> Vec<T> {
                    self.into_iter().collect()
                }

                fn try_fill(&mut self, values: Vec<T>) -> std::result::Result<(), Vec<T>> {
                    self.clear();
                    self.extend(values);
                    Ok(())
                }

                fn create_from_values(values: Vec<T>) -> Result<Self> {
                    Ok(values.into_iter().collect())
                }
            }
        )*
    };
}

growable_shapes! {
    List => Vec<T>,
    MutableCollection => LinkedList<T>,
    Queue => VecDeque<T>,
    Set => HashSet<T: Eq, Hash>,
    Set => BTreeSet<T: Ord>,
}

impl<T: ModelType> ModelType for Stack<T> {
    fn type_descriptor() -> TypeDescriptor {
        collection_descriptor::<Self>()
    }

    fn instantiate() -> Option<Self> {
        Some(Stack::new())
    }
}

impl<T: ModelType> CollectionShape for Stack<T> {
    type Element = T;

    fn shape_kind() -> ShapeKind {
        ShapeKind::Stack
    }

    fn values(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }

    fn into_values(self) -> Vec<T> {
        self.items
    }

    fn try_fill(&mut self, values: Vec<T>) -> std::result::Result<(), Vec<T>> {
        self.clear();
        for value in values {
            self.push(value);
        }
        Ok(())
    }

    fn create_from_values(values: Vec<T>) -> Result<Self> {
        Ok(values.into_iter().collect())
    }
}

impl<T: ModelType> ModelType for Box<[T]> {
    fn type_descriptor() -> TypeDescriptor {
        collection_descriptor::<Self>()
    }
}

impl<T: ModelType> CollectionShape for Box<[T]> {
    type Element = T;

    fn shape_kind() -> ShapeKind {
        ShapeKind::Array
    }

    fn values(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }

    fn into_values(self) -> Vec<T> {
        self.into_vec()
    }

    fn try_fill(&mut self, values: Vec<T>) -> std::result::Result<(), Vec<T>> {
        Err(values)
    }

    fn create_from_values(values: Vec<T>) -> Result<Self> {
        Ok(values.into_boxed_slice())
    }
}

impl<T: ModelType, const N: usize> ModelType for [T; N] {
    fn type_descriptor() -> TypeDescriptor {
        collection_descriptor::<Self>()
    }
}

impl<T: ModelType, const N: usize> CollectionShape for [T; N] {
    type Element = T;

    fn shape_kind() -> ShapeKind {
        ShapeKind::Array
    }

    fn values(&self) -> Box<dyn Iterator<Item = &T> + '_> {
        Box::new(self.iter())
    }

    fn into_values(self) -> Vec<T> {
        Vec::from(self)
    }

    fn try_fill(&mut self, values: Vec<T>) -> std::result::Result<(), Vec<T>> {
        Err(values)
    }

    fn create_from_values(values: Vec<T>) -> Result<Self> {
        let found = values.len();
        <[T; N]>::try_from(values).map_err(|_| {
            Error::type_mismatch(
                format!("{} elements for {}", N, type_name::<Self>()),
                format!("{} elements", found),
            )
        })
    }
}

macro_rules! shared_slice_shapes {
    ($($ptr:ident),*) => {
        $(
            impl<T: ModelType> ModelType for $ptr<[T]> {
                fn type_descriptor() -> TypeDescriptor {
                    collection_descriptor::<Self>()
                }
            }

            impl<T: ModelType> CollectionShape for $ptr<[T]> {
                type Element = T;

                fn shape_kind() -> ShapeKind {
                    ShapeKind::ReadOnly
                }

                fn values(&self) -> Box<dyn Iterator<Item = &T> + '_> {
                    Box::new(self.iter())
                }

                fn into_values(self) -> Vec<T> {
                    self.iter().cloned().collect()
                }

                fn try_fill(&mut self, values: Vec<T>) -> std::result::Result<(), Vec<T>> {
                    Err(values)
                }

                fn create_from_values(values: Vec<T>) -> Result<Self> {
                    Ok(values.into())
                }
            }
        )*
    };
}

shared_slice_shapes!(Rc, Arc);
