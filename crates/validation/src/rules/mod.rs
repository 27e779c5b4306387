mod fields_on_correct_type;
mod known_argument_names;
mod known_fragment_names;

pub use fields_on_correct_type::FieldsOnCorrectType;
pub use known_argument_names::KnownArgumentNames;
pub use known_fragment_names::KnownFragmentNames;
