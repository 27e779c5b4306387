use publicgate_schema::{AppliedDirective, Extensions, MetaEnumValue, MetaField, MetaInputValue, MetaType};
use value::Name;

pub const PRIVATE_DIRECTIVE: &str = "private";

/// A type-system declaration that can carry the private marker.
pub trait Declaration {
    fn name(&self) -> &Name;

    fn directives(&self) -> &[AppliedDirective];

    fn extensions(&self) -> &Extensions;
}

/// A declaration is private when it has the `isPrivate` extension flag or an applied `@private` directive.
pub fn is_marked_private<D: Declaration + ?Sized>(declaration: &D) -> bool {
    declaration.extensions().is_private
        || declaration
            .directives()
            .iter()
            .any(|directive| directive.name.as_str() == PRIVATE_DIRECTIVE)
}

macro_rules! impl_declaration {
    ($ty:ty, $name:ident) => {
        impl Declaration for $ty {
            #[inline]
            fn name(&self) -> &Name {
                &self.$name
            }

            #[inline]
            fn directives(&self) -> &[AppliedDirective] {
                &self.directives
            }

            #[inline]
            fn extensions(&self) -> &Extensions {
                &self.extensions
            }
        }
    };
}

impl_declaration!(MetaType, name);
impl_declaration!(MetaField, name);
impl_declaration!(MetaInputValue, name);
impl_declaration!(MetaEnumValue, value);
