#![forbid(unsafe_code)]

mod composed_schema;
mod error;
mod type_ext;

pub use composed_schema::{
    AppliedDirective,
    ComposedSchema,
    Deprecation,
    Extensions,
    MetaDirective,
    MetaEnumValue,
    MetaField,
    MetaInputValue,
    MetaType,
    TypeKind,
};
pub use error::SchemaError;
pub use type_ext::TypeExt;
