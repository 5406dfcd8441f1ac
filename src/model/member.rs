//! Typed member accessors and their erased form.

use crate::error::{Error, Result};
use crate::reflect::{ModelType, Reflect};
use std::any::{type_name, TypeId};
use std::fmt;

/// A reference to one member of `T` holding a `P`.
///
/// Usually built with the [`member!`](crate::member) macro. The getter
/// returns `None` when the member currently holds no value; the optional
/// mutable getter lets the engine fill an existing collection in place.
pub struct Member<T, P> {
    name: &'static str,
    get: fn(&T) -> Option<&P>,
    get_mut: Option<fn(&mut T) -> Option<&mut P>>,
    set: Option<fn(&mut T, P)>,
    declared_by: Option<TypeId>,
}

impl<T: ModelType, P: ModelType> Member<T, P> {
    /// A readable and writable member.
    pub fn new(name: &'static str, get: fn(&T) -> Option<&P>, set: fn(&mut T, P)) -> Self {
        Self {
            name,
            get,
            get_mut: None,
            set: Some(set),
            declared_by: None,
        }
    }

    /// A member without a setter.
    pub fn read_only(name: &'static str, get: fn(&T) -> Option<&P>) -> Self {
        Self {
            name,
            get,
            get_mut: None,
            set: None,
            declared_by: None,
        }
    }

    /// Adds mutable access used for in-place collection population.
    pub fn with_mut(mut self, get_mut: fn(&mut T) -> Option<&mut P>) -> Self {
        self.get_mut = Some(get_mut);
        self
    }

    /// Marks the member as inherited from the entity `B`.
    ///
    /// Deserialization of `T` leaves such a member alone when `B` feeds it
    /// to its own constructor.
    pub fn declared_in<B: ModelType>(mut self) -> Self {
        self.declared_by = Some(TypeId::of::<B>());
        self
    }

    /// Member name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Type that declares the member.
    pub fn declared_by(&self) -> TypeId {
        self.declared_by.unwrap_or_else(TypeId::of::<T>)
    }
}

impl<T, P> Clone for Member<T, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, P> Copy for Member<T, P> {}

impl<T, P> fmt::Debug for Member<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Member")
            .field("owner", &type_name::<T>())
            .field("name", &self.name)
            .field("type", &type_name::<P>())
            .field("writable", &self.set.is_some())
            .finish()
    }
}

/// Type-erased access to one member of an entity instance.
pub trait MemberAccessor: Send + Sync {
    /// Member name.
    fn name(&self) -> &str;

    /// Reads the member; `None` when the target is not the owner type or the
    /// member holds no value.
    fn get<'a>(&self, target: &'a dyn Reflect) -> Option<&'a dyn Reflect>;

    /// Mutable access to the current member value.
    fn get_mut<'a>(&self, target: &'a mut dyn Reflect) -> Option<&'a mut dyn Reflect>;

    /// True when the member has a setter.
    fn can_write(&self) -> bool;

    /// Assigns `value` to the member.
    fn set(&self, target: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<()>;
}

impl<T: ModelType, P: ModelType> MemberAccessor for Member<T, P> {
    fn name(&self) -> &str {
        self.name
    }

    fn get<'a>(&self, target: &'a dyn Reflect) -> Option<&'a dyn Reflect> {
        let owner = target.downcast_ref::<T>()?;
        (self.get)(owner).map(|value| value as &dyn Reflect)
    }

    fn get_mut<'a>(&self, target: &'a mut dyn Reflect) -> Option<&'a mut dyn Reflect> {
        let get_mut = self.get_mut?;
        let owner = target.downcast_mut::<T>()?;
        get_mut(owner).map(|value| value as &mut dyn Reflect)
    }

    fn can_write(&self) -> bool {
        self.set.is_some()
    }

    fn set(&self, target: &mut dyn Reflect, value: Box<dyn Reflect>) -> Result<()> {
        let set = self
            .set
            .ok_or_else(|| Error::read_only_member(type_name::<T>(), self.name))?;
        let found = target.reflect_descriptor().type_path();
        let owner = target
            .downcast_mut::<T>()
            .ok_or_else(|| Error::type_mismatch(type_name::<T>(), found))?;
        set(owner, value.take::<P>()?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Base {
        id: u32,
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Order {
        base: Base,
        label: Option<String>,
        lines: Vec<i32>,
    }

    crate::entity_type!(Base, Order);

    #[test]
    fn test_plain_member() {
        let member = crate::member!(Order, lines);
        let mut order = Order::default();
        member.set(&mut order, Box::new(vec![1, 2])).unwrap();
        let value = MemberAccessor::get(&member, &order).unwrap();
        assert_eq!(value.downcast_ref::<Vec<i32>>(), Some(&vec![1, 2]));

        let current = MemberAccessor::get_mut(&member, &mut order).unwrap();
        current.downcast_mut::<Vec<i32>>().unwrap().push(3);
        assert_eq!(order.lines, vec![1, 2, 3]);
    }

    #[test]
    fn test_optional_member() {
        let member = crate::member!(Order, optional label);
        let mut order = Order::default();
        assert!(MemberAccessor::get(&member, &order).is_none());
        member.set(&mut order, Box::new("x".to_string())).unwrap();
        assert_eq!(order.label.as_deref(), Some("x"));
    }

    #[test]
    fn test_path_member_declared_in_base() {
        let member = crate::member!(Order, "id" => base.id).declared_in::<Base>();
        assert_eq!(member.name(), "id");
        assert_eq!(member.declared_by(), TypeId::of::<Base>());

        let mut order = Order::default();
        member.set(&mut order, Box::new(9u32)).unwrap();
        assert_eq!(order.base.id, 9);
    }

    #[test]
    fn test_read_only_member() {
        let member = crate::member!(Order, readonly lines);
        assert!(!member.can_write());
        let err = member.set(&mut Order::default(), Box::new(vec![1])).unwrap_err();
        assert!(err.to_string().contains("no setter"));
    }

    #[test]
    fn test_wrong_value_type() {
        let member = crate::member!(Order, lines);
        assert!(member.set(&mut Order::default(), Box::new(1i32)).is_err());
        assert!(MemberAccessor::get(&member, &Base::default()).is_none());
    }
}
