//! Intermediate representation of the compiled model universe and the
//! passes that build, canonicalize and order it.

pub mod builder;
pub mod dedupe;
pub mod resolver;
pub mod types;

pub use builder::ModelBuilder;
pub use types::{
    EnumDef, EnumLiteral, FieldDefinition, ModelDefinition, Primitive, RootKind, TypeDescriptor,
};
