use thiserror::Error;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Failed to parse schema: {0}")]
    Parse(#[from] parser::Error),

    #[error("Type '{type_name}' is defined more than once.")]
    DuplicateType { type_name: String },

    #[error("Field '{type_name}.{field_name}' is defined more than once.")]
    DuplicateField { type_name: String, field_name: String },

    #[error("Type '{type_name}' extends a type that has not been defined.")]
    ExtendUndefinedType { type_name: String },

    #[error("Type '{type_name}' is extended with a different kind.")]
    ExtendKindConflicted { type_name: String },

    #[error("Unknown type '{type_name}' referenced by '{referenced_by}'.")]
    UnknownType { type_name: String, referenced_by: String },

    #[error("Type '{type_name}' lists '{member}', which is not an {expected} type.")]
    InvalidMember {
        type_name: String,
        member: String,
        expected: &'static str,
    },

    #[error("The query root type '{type_name}' is not defined.")]
    MissingQueryRoot { type_name: String },
}
