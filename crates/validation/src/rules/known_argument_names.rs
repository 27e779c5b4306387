use parser::{
    types::{Directive, Field},
    Positioned,
};
use value::{Name, Value};

use crate::{Visitor, VisitorContext};

enum ArgsOwner<'a> {
    Directive(&'a Name),
    Field { name: &'a Name, type_name: &'a str },
}

/// Reports arguments that are not declared by the field or directive they are passed to.
#[derive(Default)]
pub struct KnownArgumentNames<'a> {
    owner: Vec<Option<ArgsOwner<'a>>>,
}

impl<'a> Visitor<'a> for KnownArgumentNames<'a> {
    fn enter_directive(&mut self, ctx: &mut VisitorContext<'a>, directive: &'a Positioned<Directive>) {
        let known = ctx.schema.directives.contains_key(directive.node.name.node.as_str());
        self.owner
            .push(known.then_some(ArgsOwner::Directive(&directive.node.name.node)));
    }

    fn exit_directive(&mut self, _ctx: &mut VisitorContext<'a>, _directive: &'a Positioned<Directive>) {
        self.owner.pop();
    }

    fn enter_field(&mut self, ctx: &mut VisitorContext<'a>, field: &'a Positioned<Field>) {
        let owner = ctx
            .parent_type()
            .filter(|ty| ty.field_by_name(&field.node.name.node).is_some())
            .map(|ty| ArgsOwner::Field {
                name: &field.node.name.node,
                type_name: ty.name.as_str(),
            });
        self.owner.push(owner);
    }

    fn exit_field(&mut self, _ctx: &mut VisitorContext<'a>, _field: &'a Positioned<Field>) {
        self.owner.pop();
    }

    fn enter_argument(&mut self, ctx: &mut VisitorContext<'a>, name: &'a Positioned<Name>, _value: &'a Positioned<Value>) {
        if ctx.argument().is_some() {
            return;
        }
        match self.owner.last() {
            Some(Some(ArgsOwner::Directive(directive))) => ctx.report_error(
                vec![name.pos],
                format!("Unknown argument \"{}\" on directive \"@{}\".", name.node, directive),
            ),
            Some(Some(ArgsOwner::Field { name: field_name, type_name })) => ctx.report_error(
                vec![name.pos],
                format!(
                    "Unknown argument \"{}\" on field \"{}.{}\".",
                    name.node, type_name, field_name
                ),
            ),
            _ => {},
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn factory<'a>() -> KnownArgumentNames<'a> {
        KnownArgumentNames::default()
    }

    #[test]
    fn known_field_arguments() {
        expect_passes_rule!(
            factory,
            r#"
            {
              dog { doesKnowCommand(dogCommand: SIT) }
            }
            "#,
        );
    }

    #[test]
    fn known_directive_arguments() {
        expect_passes_rule!(
            factory,
            r#"
            {
              dog { name @include(if: true) }
            }
            "#,
        );
    }

    #[test]
    fn unknown_field_argument() {
        expect_fails_rule!(
            factory,
            r#"
            {
              dog { doesKnowCommand(command: SIT) }
            }
            "#,
        );
    }

    #[test]
    fn unknown_directive_argument() {
        expect_fails_rule!(
            factory,
            r#"
            {
              dog { name @skip(unless: true) }
            }
            "#,
        );
    }

    #[test]
    fn arguments_of_unknown_fields_are_ignored() {
        expect_passes_rule!(
            factory,
            r#"
            {
              dog { unknownField(whatever: 1) }
            }
            "#,
        );
    }
}
