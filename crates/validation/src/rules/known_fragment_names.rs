use parser::{types::FragmentSpread, Positioned};

use crate::{Visitor, VisitorContext};

#[derive(Default)]
pub struct KnownFragmentNames;

impl<'a> Visitor<'a> for KnownFragmentNames {
    fn enter_fragment_spread(&mut self, ctx: &mut VisitorContext<'a>, fragment_spread: &'a Positioned<FragmentSpread>) {
        let name = &fragment_spread.node.fragment_name.node;
        if !ctx.is_known_fragment(name) {
            ctx.report_error(
                vec![fragment_spread.pos],
                format!("Unknown fragment: \"{}\".", name),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    pub fn factory() -> KnownFragmentNames {
        KnownFragmentNames
    }

    #[test]
    fn known_fragment() {
        expect_passes_rule!(
            factory,
            r#"
            {
              dog { ...DogFields }
            }

            fragment DogFields on Dog {
              name
            }
            "#,
        );
    }

    #[test]
    fn unknown_fragment() {
        expect_fails_rule!(
            factory,
            r#"
            {
              dog { ...Missing }
            }
            "#,
        );
    }
}
