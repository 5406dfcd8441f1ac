//! The type model registry.

use super::info::EntityTypeInfo;
use crate::convert::builtin_scalars;
use crate::reflect::{Object, TypeDescriptor, TypeKind};
use std::any::TypeId;
use std::collections::HashMap;

/// Configuration consumed by the serializer and deserializer.
///
/// Holds the descriptor of every type the model has seen, the entity
/// metadata, and the wire-name index used to resolve a node name to a type.
/// A registry is mutated only through the model builder; once built it can
/// be shared read-only between threads.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    descriptors: HashMap<TypeId, TypeDescriptor>,
    entities: HashMap<TypeId, EntityTypeInfo>,
    wire_names: HashMap<String, TypeId>,
}

impl ModelRegistry {
    /// Creates a registry seeded with the built-in scalars and [`Object`].
    pub fn new() -> Self {
        let mut registry = Self {
            descriptors: HashMap::new(),
            entities: HashMap::new(),
            wire_names: HashMap::new(),
        };
        for descriptor in builtin_scalars() {
            registry.register_type(descriptor);
            registry
                .wire_names
                .insert(descriptor.type_ident().to_string(), descriptor.type_id());
        }
        registry.register_type(TypeDescriptor::of::<Object>());
        registry
    }

    /// Returns an independent copy of the registry.
    ///
    /// Entity, property and parameter infos are copied by value. Member
    /// accessors and constructors are immutable and shared.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }

    /// Records `descriptor` and, recursively, the types it wraps.
    pub fn register_type(&mut self, descriptor: TypeDescriptor) {
        if self
            .descriptors
            .insert(descriptor.type_id(), descriptor)
            .is_some()
        {
            return;
        }
        match descriptor.kind() {
            TypeKind::Nullable(vt) => self.register_type(vt.inner()),
            TypeKind::Collection(vt) => self.register_type(vt.element()),
            _ => {}
        }
    }

    /// Descriptor of a known type.
    pub fn descriptor(&self, type_id: TypeId) -> Option<&TypeDescriptor> {
        self.descriptors.get(&type_id)
    }

    /// True when `type_id` has been registered in any form.
    pub fn is_known(&self, type_id: TypeId) -> bool {
        self.descriptors.contains_key(&type_id)
    }

    /// Entity metadata of `type_id`.
    pub fn entity(&self, type_id: TypeId) -> Option<&EntityTypeInfo> {
        self.entities.get(&type_id)
    }

    #[cfg(test)]
    pub(crate) fn entity_mut(&mut self, type_id: TypeId) -> Option<&mut EntityTypeInfo> {
        self.entities.get_mut(&type_id)
    }

    /// All registered entities, in no particular order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityTypeInfo> {
        self.entities.values()
    }

    /// Returns the entity info of `descriptor`, inserting an empty one when absent.
    pub fn get_or_create_entity(&mut self, descriptor: TypeDescriptor) -> &mut EntityTypeInfo {
        self.register_type(descriptor);
        self.entities
            .entry(descriptor.type_id())
            .or_insert_with(|| {
                log::debug!("registering entity {}", descriptor.type_path());
                EntityTypeInfo::new(descriptor)
            })
    }

    /// Removes an entity together with every wire name pointing at it.
    pub fn remove_entity(&mut self, type_id: TypeId) -> Option<EntityTypeInfo> {
        let removed = self.entities.remove(&type_id)?;
        self.wire_names.retain(|_, target| *target != type_id);
        log::debug!("removed entity {}", removed.descriptor().type_path());
        Some(removed)
    }

    /// Resolves a node name to a type.
    pub fn resolve_wire_name(&self, name: &str) -> Option<TypeDescriptor> {
        self.wire_names
            .get(name)
            .and_then(|type_id| self.descriptors.get(type_id))
            .copied()
    }

    /// Wire names currently mapped to `type_id`.
    pub fn wire_names_of(&self, type_id: TypeId) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .wire_names
            .iter()
            .filter(|(_, target)| **target == type_id)
            .map(|(name, _)| name.as_str())
            .collect();
        names.sort_unstable();
        names
    }

    /// Node name used for a value of `descriptor`'s type.
    pub fn wire_name_for<'a>(&'a self, descriptor: &TypeDescriptor) -> &'a str {
        match self.entities.get(&descriptor.type_id()) {
            Some(entity) => entity.wire_name(),
            None => descriptor.type_ident(),
        }
    }

    /// Maps `name` to `type_id`, replacing any previous mapping of `name`.
    pub(crate) fn index_wire_name(&mut self, name: &str, type_id: TypeId) {
        self.wire_names.insert(name.to_string(), type_id);
    }

    /// Maps `name` to `type_id` unless `name` is already taken.
    pub(crate) fn index_wire_name_if_absent(&mut self, name: &str, type_id: TypeId) {
        self.wire_names
            .entry(name.to_string())
            .or_insert(type_id);
    }

    /// Replaces `old` with `new` for `type_id`.
    ///
    /// `old` is removed only while it still points at `type_id`, so a name
    /// that has since been claimed by another type is left intact.
    pub(crate) fn swap_wire_name(&mut self, old: Option<&str>, new: &str, type_id: TypeId) {
        if let Some(old) = old {
            if self.wire_names.get(old) == Some(&type_id) {
                self.wire_names.remove(old);
            }
        }
        log::debug!("wire name {:?} -> {}", old, new);
        self.index_wire_name(new, type_id);
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::new()
    }
}
