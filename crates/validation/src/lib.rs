#![forbid(unsafe_code)]

#[cfg(test)]
#[macro_use]
mod test_harness;

mod error;
mod rules;
mod visitor;

pub use error::RuleError;
use parser::types::ExecutableDocument;
use publicgate_schema::ComposedSchema;
use tracing::instrument;
use value::Variables;
pub use visitor::{visit, Visitor, VisitorContext};

/// Produces a fresh rule visitor for every validated operation.
///
/// Rules contributed from outside this crate (for example by a gateway plugin) are
/// registered as factories so each operation gets its own rule state.
pub trait RuleFactory: Send + Sync {
    fn create<'a>(&self) -> Box<dyn Visitor<'a> + 'a>;
}

macro_rules! rules {
    ($visitor:ident; $($rule:ident),*) => {
        $($visitor.push(Box::new(rules::$rule::default()));)*
    };
}

pub fn check_rules(
    composed_schema: &ComposedSchema,
    document: &ExecutableDocument,
    variables: &Variables,
) -> Vec<RuleError> {
    check_rules_with(composed_schema, document, variables, &[])
}

pub fn check_rules_with<'a>(
    composed_schema: &'a ComposedSchema,
    document: &'a ExecutableDocument,
    variables: &'a Variables,
    factories: &[&dyn RuleFactory],
) -> Vec<RuleError> {
    check_operation_rules(composed_schema, document, None, variables, factories)
}

/// Like [`check_rules_with`], for a request that selected `operation_name`.
///
/// Every operation is still validated; rules use the name to decide which operation the
/// request variables are bound to.
#[instrument(skip_all, fields(operation = ?operation_name), level = "trace")]
pub fn check_operation_rules<'a>(
    composed_schema: &'a ComposedSchema,
    document: &'a ExecutableDocument,
    operation_name: Option<&'a str>,
    variables: &'a Variables,
    factories: &[&dyn RuleFactory],
) -> Vec<RuleError> {
    let mut ctx = VisitorContext::new(composed_schema, document, Some(variables));
    ctx.operation_name = operation_name;
    let mut visitor: Vec<Box<dyn Visitor<'a> + 'a>> = Vec::new();
    rules!(visitor; FieldsOnCorrectType, KnownArgumentNames, KnownFragmentNames);
    visitor.extend(factories.iter().map(|factory| factory.create()));
    visit(&mut visitor, &mut ctx, document);
    if !ctx.errors.is_empty() {
        tracing::debug!(errors = ctx.errors.len(), "Operation failed validation.");
    }
    ctx.errors
}
