use parser::types::{BaseType, Type};

pub trait TypeExt {
    /// Name of the named type after unwrapping every list and non-null modifier.
    fn concrete_typename(&self) -> &str;

    fn is_list(&self) -> bool;
}

impl TypeExt for Type {
    fn concrete_typename(&self) -> &str {
        match &self.base {
            BaseType::Named(name) => name.as_str(),
            BaseType::List(ty) => ty.concrete_typename(),
        }
    }

    #[inline]
    fn is_list(&self) -> bool {
        matches!(self.base, BaseType::List(_))
    }
}
