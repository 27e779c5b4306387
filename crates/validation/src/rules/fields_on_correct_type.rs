use parser::{types::Field, Positioned};
use publicgate_schema::TypeKind;

use crate::{Visitor, VisitorContext};

#[derive(Default)]
pub struct FieldsOnCorrectType;

impl<'a> Visitor<'a> for FieldsOnCorrectType {
    fn enter_field(&mut self, ctx: &mut VisitorContext<'a>, field: &'a Positioned<Field>) {
        let parent_type = match ctx.parent_type() {
            Some(parent_type) => parent_type,
            None => return,
        };
        let name = &field.node.name.node;
        if name.as_str() == "__typename" {
            return;
        }

        let known = match parent_type.kind {
            TypeKind::Object | TypeKind::Interface => parent_type.field_by_name(name).is_some(),
            TypeKind::Union | TypeKind::Scalar | TypeKind::Enum | TypeKind::InputObject => false,
        };
        if !known {
            ctx.report_error(
                vec![field.pos],
                format!("Unknown field \"{}\" on type \"{}\".", name, parent_type.name),
            );
        }
    }
}
