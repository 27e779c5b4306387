use std::{collections::HashMap, sync::Arc};

use parser::{
    types::{BaseType, Directive, DocumentOperations, ExecutableDocument, Field, OperationDefinition, Type},
    Pos, Positioned,
};
use publicgate_schema::{ComposedSchema, MetaType, TypeKind};
use publicgate_validation::{RuleFactory, Visitor, VisitorContext};
use value::{ConstValue, Name, Value};

use crate::registry::{SharedRegistry, VisibilityRegistry};

/// Rejects operations that select private fields, pass private arguments, set private input
/// fields or use private enum values, whether in literals or in variable values.
///
/// A field is private for a selection when it is registered on the parent object or on one of
/// its interfaces. For an abstract parent the check is repeated for each possible object type.
/// Selections whose parent or result type is an introspection type are never checked.
///
/// Variable values bound by the request are only checked inside the operation the request
/// selected. Default values are checked inside the operation that declares them.
pub struct PrivateAccess<'a> {
    registry: Arc<VisibilityRegistry>,
    fields: Vec<&'a Name>,
    directive_depth: usize,
    variable_defaults: HashMap<&'a str, &'a ConstValue>,
    bound_by_request: bool,
}

impl<'a> PrivateAccess<'a> {
    pub fn new(registry: Arc<VisibilityRegistry>) -> Self {
        Self {
            registry,
            fields: Vec::new(),
            directive_depth: 0,
            variable_defaults: HashMap::new(),
            bound_by_request: true,
        }
    }

    fn in_argument(&self, ctx: &VisitorContext<'a>) -> bool {
        self.directive_depth == 0 && ctx.argument().is_some()
    }

    fn collect_defaults(&mut self, operation: &'a Positioned<OperationDefinition>) {
        self.variable_defaults.clear();
        for variable_definition in &operation.node.variable_definitions {
            if let Some(default_value) = &variable_definition.node.default_value {
                self.variable_defaults
                    .insert(variable_definition.node.name.node.as_str(), &default_value.node);
            }
        }
    }

    /// The first type that makes `field_name` private when selected on `parent_type`.
    fn private_owner(&self, schema: &'a ComposedSchema, field_name: &str, parent_type: &'a MetaType) -> Option<&'a Name> {
        match parent_type.kind {
            TypeKind::Object => self.object_owner(schema, field_name, parent_type),
            TypeKind::Interface if self.registry.is_private(&parent_type.name, field_name) => Some(&parent_type.name),
            TypeKind::Interface | TypeKind::Union => schema
                .possible_objects(parent_type)
                .find_map(|object| self.object_owner(schema, field_name, object)),
            TypeKind::Scalar | TypeKind::Enum | TypeKind::InputObject => None,
        }
    }

    fn object_owner(&self, schema: &'a ComposedSchema, field_name: &str, object: &'a MetaType) -> Option<&'a Name> {
        if self.registry.is_private(&object.name, field_name) {
            return Some(&object.name);
        }
        object
            .implements
            .iter()
            .filter_map(|name| schema.types.get(name))
            .find(|interface| self.registry.is_private(&interface.name, field_name))
            .map(|interface| &interface.name)
    }

    /// Reports `member` when it is private on `owner`, an input object or an enum.
    fn check_member(&self, ctx: &mut VisitorContext<'a>, pos: Pos, owner: &MetaType, member: &str) {
        if self.registry.is_private(&owner.name, member) {
            ctx.report_error(
                vec![pos],
                format!("Cannot field \"{}\" on type \"{}\".", member, owner.name),
            );
        }
    }

    /// Walks a variable value against the type it is bound to.
    fn check_variable_value(
        &self,
        ctx: &mut VisitorContext<'a>,
        pos: Pos,
        expected_type: Option<&'a Type>,
        value: &ConstValue,
    ) {
        let schema = ctx.schema;
        match value {
            ConstValue::List(values) => {
                let element_type = expected_type.map(|ty| match &ty.base {
                    BaseType::List(element_type) => element_type.as_ref(),
                    BaseType::Named(_) => ty,
                });
                for value in values {
                    self.check_variable_value(ctx, pos, element_type, value);
                }
            },
            ConstValue::Object(fields) => {
                let Some(input_type) = expected_type
                    .and_then(|ty| schema.get_type(ty))
                    .filter(|ty| ty.kind == TypeKind::InputObject)
                else {
                    return;
                };
                for (name, value) in fields {
                    self.check_member(ctx, pos, input_type, name);
                    let field_type = input_type.input_fields.get(name).map(|field| &field.ty);
                    self.check_variable_value(ctx, pos, field_type, value);
                }
            },
            ConstValue::String(enum_value) => self.check_enum_value(ctx, pos, expected_type, enum_value),
            ConstValue::Enum(enum_value) => self.check_enum_value(ctx, pos, expected_type, enum_value),
            _ => {},
        }
    }

    fn check_enum_value(&self, ctx: &mut VisitorContext<'a>, pos: Pos, expected_type: Option<&'a Type>, enum_value: &str) {
        let schema = ctx.schema;
        if let Some(enum_type) = expected_type
            .and_then(|ty| schema.get_type(ty))
            .filter(|ty| ty.kind == TypeKind::Enum)
        {
            self.check_member(ctx, pos, enum_type, enum_value);
        }
    }
}

impl<'a> Visitor<'a> for PrivateAccess<'a> {
    fn enter_document(&mut self, ctx: &mut VisitorContext<'a>, doc: &'a ExecutableDocument) {
        // Fragments are visited before any operation; they see the selected operation's defaults.
        let selected = match (&doc.operations, ctx.operation_name) {
            (DocumentOperations::Single(operation), _) => Some(operation),
            (DocumentOperations::Multiple(operations), Some(name)) => operations.get(name),
            (DocumentOperations::Multiple(operations), None) if operations.len() == 1 => operations.values().next(),
            (DocumentOperations::Multiple(_), None) => None,
        };
        if let Some(operation) = selected {
            self.collect_defaults(operation);
        }
    }

    fn enter_operation_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        name: Option<&'a Name>,
        operation_definition: &'a Positioned<OperationDefinition>,
    ) {
        self.collect_defaults(operation_definition);
        self.bound_by_request = match ctx.operation_name {
            Some(selected) => name.map(Name::as_str) == Some(selected),
            None => true,
        };
    }

    fn exit_operation_definition(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _name: Option<&'a Name>,
        _operation_definition: &'a Positioned<OperationDefinition>,
    ) {
        self.variable_defaults.clear();
        self.bound_by_request = true;
    }

    fn enter_directive(&mut self, _ctx: &mut VisitorContext<'a>, _directive: &'a Positioned<Directive>) {
        self.directive_depth += 1;
    }

    fn exit_directive(&mut self, _ctx: &mut VisitorContext<'a>, _directive: &'a Positioned<Directive>) {
        self.directive_depth -= 1;
    }

    fn enter_field(&mut self, ctx: &mut VisitorContext<'a>, field: &'a Positioned<Field>) {
        let field_name = &field.node.name.node;
        self.fields.push(field_name);

        if ctx.current_type().map_or(false, MetaType::is_introspection) {
            return;
        }
        let Some(parent_type) = ctx.parent_type().filter(|ty| !ty.is_introspection()) else {
            return;
        };

        if let Some(owner) = self.private_owner(ctx.schema, field_name, parent_type) {
            ctx.report_error(
                vec![field.pos],
                format!("Cannot field \"{}\" on type \"{}\".", field_name, owner),
            );
        }
    }

    fn exit_field(&mut self, _ctx: &mut VisitorContext<'a>, _field: &'a Positioned<Field>) {
        self.fields.pop();
    }

    fn enter_argument(&mut self, ctx: &mut VisitorContext<'a>, name: &'a Positioned<Name>, _value: &'a Positioned<Value>) {
        if !self.in_argument(ctx) {
            return;
        }
        let Some(field_name) = self.fields.last() else {
            return;
        };
        if self.registry.is_private(field_name, &name.node) {
            ctx.report_error(
                vec![name.pos],
                format!("Cannot argument \"{}\" on field \"{}\".", name.node, field_name),
            );
        }
    }

    fn enter_input_value(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        pos: Pos,
        expected_type: &Option<&'a Type>,
        value: &'a Value,
    ) {
        if !self.in_argument(ctx) {
            return;
        }
        match value {
            Value::Variable(variable) => {
                let bound = ctx
                    .variables
                    .filter(|_| self.bound_by_request)
                    .and_then(|variables| variables.get(variable))
                    .or_else(|| self.variable_defaults.get(variable.as_str()).copied());
                if let Some(bound) = bound {
                    self.check_variable_value(ctx, pos, *expected_type, bound);
                }
            },
            Value::Enum(enum_value) => self.check_enum_value(ctx, pos, *expected_type, enum_value),
            _ => {},
        }
    }

    fn enter_input_object_field(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        pos: Pos,
        parent_type: Option<&'a MetaType>,
        name: &'a Name,
        _value: &'a Value,
    ) {
        if !self.in_argument(ctx) {
            return;
        }
        if let Some(parent_type) = parent_type {
            self.check_member(ctx, pos, parent_type, name);
        }
    }
}

/// Creates a [`PrivateAccess`] rule bound to the registry snapshot current at validation time.
#[derive(Clone)]
pub struct PrivateAccessFactory {
    registry: SharedRegistry,
}

impl PrivateAccessFactory {
    pub fn new(registry: SharedRegistry) -> Self {
        Self { registry }
    }
}

impl RuleFactory for PrivateAccessFactory {
    fn create<'a>(&self) -> Box<dyn Visitor<'a> + 'a> {
        Box::new(PrivateAccess::new(self.registry.snapshot()))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use publicgate_validation::{check_operation_rules, check_rules_with};
    use value::Variables;

    use super::*;
    use crate::scanner::scan;

    const SDL: &str = r#"
        type Query {
            me: User
            node(id: ID!): Node
            search(term: String!): [SearchResult!]!
            users(filter: UserFilter, first: Int, debug: Boolean @private, role: Role, roles: [Role!]): [User!]!
        }

        interface Node {
            id: ID!
            internalId: ID @private
            legacyId: ID
        }

        type User implements Node {
            id: ID!
            internalId: ID
            legacyId: ID @private
            name: String
            ssn: String @private
        }

        type Post implements Node {
            id: ID!
            internalId: ID
            legacyId: ID @private
            title: String
        }

        union SearchResult = User | Post

        enum Role {
            ADMIN @private
            USER
        }

        input UserFilter {
            name: String
            score: Int @private
            nested: UserFilter
            tags: [UserFilter!]
        }
    "#;

    fn messages(query: &str, variables: serde_json::Value) -> Vec<String> {
        messages_for(query, None, variables)
    }

    fn messages_for(query: &str, operation_name: Option<&str>, variables: serde_json::Value) -> Vec<String> {
        let schema = ComposedSchema::parse(SDL).unwrap();
        let registry = SharedRegistry::default();
        registry.replace(scan(&schema));
        let factory = PrivateAccessFactory::new(registry);

        let document = parser::parse_query(query).unwrap();
        let variables = Variables::from_json(variables);
        check_operation_rules(&schema, &document, operation_name, &variables, &[&factory])
            .into_iter()
            .map(|err| err.message)
            .collect()
    }

    fn no_variables() -> serde_json::Value {
        serde_json::json!({})
    }

    #[test]
    fn public_selections_pass() {
        assert!(messages("{ me { id name } users(first: 1) { id } }", no_variables()).is_empty());
    }

    #[test]
    fn private_object_field() {
        assert_eq!(messages("{ me { id ssn } }", no_variables()), vec![
            "Cannot field \"ssn\" on type \"User\".".to_string()
        ]);
    }

    #[test]
    fn interface_field_is_private_on_implementers() {
        assert_eq!(messages("{ me { internalId } }", no_variables()), vec![
            "Cannot field \"internalId\" on type \"Node\".".to_string()
        ]);
        assert_eq!(messages("{ node(id: 1) { internalId } }", no_variables()), vec![
            "Cannot field \"internalId\" on type \"Node\".".to_string()
        ]);
    }

    #[test]
    fn one_error_per_selection_on_abstract_parent() {
        let errors = messages("{ node(id: 1) { legacyId } }", no_variables());
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Cannot field \"legacyId\" on type "), "{errors:?}");
        assert!(messages("{ node(id: 1) { id } }", no_variables()).is_empty());
    }

    #[test]
    fn abstract_parent_checks_possible_objects() {
        assert_eq!(
            messages("{ search(term: \"a\") { ... on User { name } __typename } }", no_variables()),
            Vec::<String>::new()
        );
        assert_eq!(messages("{ node(id: 1) { ... on User { ssn } } }", no_variables()), vec![
            "Cannot field \"ssn\" on type \"User\".".to_string()
        ]);
    }

    #[test]
    fn fragments_are_checked() {
        assert_eq!(
            messages("{ me { ...UserFields } } fragment UserFields on User { id ssn }", no_variables()),
            vec!["Cannot field \"ssn\" on type \"User\".".to_string()]
        );
    }

    #[test]
    fn private_argument() {
        assert_eq!(messages("{ users(debug: true) { id } }", no_variables()), vec![
            "Cannot argument \"debug\" on field \"users\".".to_string()
        ]);
    }

    #[test]
    fn private_input_field_in_literal() {
        assert_eq!(
            messages(
                "{ users(filter: { name: \"a\", nested: { score: 1 }, tags: [{ score: 2 }] }) { id } }",
                no_variables()
            ),
            vec![
                "Cannot field \"score\" on type \"UserFilter\".".to_string(),
                "Cannot field \"score\" on type \"UserFilter\".".to_string(),
            ]
        );
    }

    #[test]
    fn private_input_field_in_variables() {
        let query = "query Q($filter: UserFilter) { users(filter: $filter) { id } }";
        assert_eq!(
            messages(query, serde_json::json!({ "filter": { "nested": { "score": 3 } } })),
            vec!["Cannot field \"score\" on type \"UserFilter\".".to_string()]
        );
        assert!(messages(query, serde_json::json!({ "filter": { "name": "a" } })).is_empty());
    }

    #[test]
    fn private_input_field_in_variable_default() {
        assert_eq!(
            messages(
                "query Q($filter: UserFilter = { score: 1 }) { users(filter: $filter) { id } }",
                no_variables()
            ),
            vec!["Cannot field \"score\" on type \"UserFilter\".".to_string()]
        );
    }

    #[test]
    fn private_input_field_in_variable_nested_in_literal() {
        let query = "query Q($inner: UserFilter) { users(filter: { name: \"a\", nested: $inner }) { id } }";
        assert_eq!(
            messages(query, serde_json::json!({ "inner": { "score": 1 } })),
            vec!["Cannot field \"score\" on type \"UserFilter\".".to_string()]
        );
        assert!(messages(query, serde_json::json!({ "inner": { "name": "b" } })).is_empty());
    }

    #[test]
    fn variable_defaults_belong_to_their_operation() {
        let query = "query A($f: UserFilter = { score: 1 }) { me { id } } query B($f: UserFilter) { users(filter: $f) { id } }";
        assert!(messages_for(query, Some("B"), no_variables()).is_empty());
        assert!(messages(query, no_variables()).is_empty());

        let query = "query A($f: UserFilter) { me { id } } query B($f: UserFilter = { score: 1 }) { users(filter: $f) { id } }";
        assert_eq!(messages_for(query, Some("A"), no_variables()), vec![
            "Cannot field \"score\" on type \"UserFilter\".".to_string()
        ]);
    }

    #[test]
    fn request_variables_bind_to_selected_operation() {
        let query = "query A($f: UserFilter) { users(filter: $f) { id } } query B($f: String) { me { name } }";
        let variables = serde_json::json!({ "f": { "score": 1 } });
        assert!(messages_for(query, Some("B"), variables.clone()).is_empty());
        assert_eq!(messages_for(query, Some("A"), variables), vec![
            "Cannot field \"score\" on type \"UserFilter\".".to_string()
        ]);
    }

    #[test]
    fn fragments_see_selected_operation_defaults() {
        let query = "query Q($f: UserFilter = { score: 1 }) { ...Users } fragment Users on Query { users(filter: $f) { id } }";
        assert_eq!(messages(query, no_variables()), vec![
            "Cannot field \"score\" on type \"UserFilter\".".to_string()
        ]);
    }

    #[test]
    fn private_enum_value_in_literal() {
        assert_eq!(messages("{ users(role: ADMIN) { id } }", no_variables()), vec![
            "Cannot field \"ADMIN\" on type \"Role\".".to_string()
        ]);
        assert_eq!(messages("{ users(role: USER, roles: [USER, ADMIN]) { id } }", no_variables()), vec![
            "Cannot field \"ADMIN\" on type \"Role\".".to_string()
        ]);
    }

    #[test]
    fn private_enum_value_in_variables() {
        let query = "query Q($roles: [Role!], $role: Role) { users(roles: $roles, role: $role) { id } }";
        assert_eq!(
            messages(query, serde_json::json!({ "roles": ["USER", "ADMIN"], "role": "USER" })),
            vec!["Cannot field \"ADMIN\" on type \"Role\".".to_string()]
        );
        assert!(messages(query, serde_json::json!({ "roles": ["USER"] })).is_empty());
    }

    #[test]
    fn introspection_is_exempt() {
        assert!(messages(
            "{ __schema { types { name fields { name args { name } } } } __type(name: \"User\") { name } }",
            no_variables()
        )
        .is_empty());
    }

    #[test]
    fn empty_registry_rejects_nothing() {
        let schema = ComposedSchema::parse(SDL).unwrap();
        let factory = PrivateAccessFactory::new(SharedRegistry::default());
        let document = parser::parse_query("{ me { ssn } users(debug: true) { id } }").unwrap();
        assert!(check_rules_with(&schema, &document, &Variables::default(), &[&factory]).is_empty());
    }
}
