//! The type model: registry, per-type metadata and the fluent builder.

mod builder;
mod info;
mod member;
mod registry;

pub use builder::{ConstructorBuilder, EntityBuilder, ModelBuilder, ParameterBuilder, PropertyBuilder};
pub use info::{Arguments, Constructor, ConstructorParameterTypeInfo, EntityTypeInfo, PropertyTypeInfo};
pub use member::{Member, MemberAccessor};
pub use registry::ModelRegistry;
