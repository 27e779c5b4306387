use std::collections::HashMap;

use indexmap::IndexMap;
use parser::{
    types::{
        BaseType,
        Directive,
        ExecutableDocument,
        Field,
        FragmentDefinition,
        FragmentSpread,
        InlineFragment,
        OperationDefinition,
        OperationType,
        Selection,
        SelectionSet,
        Type,
        TypeCondition,
        VariableDefinition,
    },
    Pos,
    Positioned,
};
use publicgate_schema::{ComposedSchema, MetaInputValue, MetaType, TypeKind};
use value::{Name, Value, Variables};

use crate::RuleError;

pub struct VisitorContext<'a> {
    pub schema: &'a ComposedSchema,
    pub variables: Option<&'a Variables>,
    /// Operation the request selected; `None` when the document is checked as a whole.
    pub operation_name: Option<&'a str>,
    pub errors: Vec<RuleError>,
    type_stack: Vec<Option<&'a MetaType>>,
    input_type: Vec<Option<&'a Type>>,
    argument: Vec<Option<&'a MetaInputValue>>,
    fragments: &'a HashMap<Name, Positioned<FragmentDefinition>>,
}

impl<'a> VisitorContext<'a> {
    pub fn new(schema: &'a ComposedSchema, document: &'a ExecutableDocument, variables: Option<&'a Variables>) -> Self {
        Self {
            schema,
            variables,
            operation_name: None,
            errors: Default::default(),
            type_stack: Default::default(),
            input_type: Default::default(),
            argument: Default::default(),
            fragments: &document.fragments,
        }
    }

    pub fn report_error<T: Into<String>>(&mut self, locations: Vec<Pos>, msg: T) {
        self.errors.push(RuleError {
            locations,
            message: msg.into(),
        })
    }

    pub fn append_errors(&mut self, errors: Vec<RuleError>) {
        self.errors.extend(errors);
    }

    pub fn with_type<F: FnMut(&mut VisitorContext<'a>)>(&mut self, ty: Option<&'a MetaType>, mut f: F) {
        self.type_stack.push(ty);
        f(self);
        self.type_stack.pop();
    }

    pub fn with_input_type<F: FnMut(&mut VisitorContext<'a>)>(&mut self, ty: Option<&'a Type>, mut f: F) {
        self.input_type.push(ty);
        f(self);
        self.input_type.pop();
    }

    pub fn with_argument<F: FnMut(&mut VisitorContext<'a>)>(&mut self, argument: Option<&'a MetaInputValue>, mut f: F) {
        self.argument.push(argument);
        f(self);
        self.argument.pop();
    }

    pub fn parent_type(&self) -> Option<&'a MetaType> {
        if self.type_stack.len() >= 2 {
            self.type_stack[self.type_stack.len() - 2]
        } else {
            None
        }
    }

    pub fn current_type(&self) -> Option<&'a MetaType> {
        self.type_stack.last().copied().flatten()
    }

    pub fn current_input_type(&self) -> Option<&'a Type> {
        self.input_type.last().copied().flatten()
    }

    /// Definition of the argument whose value is being visited, if it is known to the schema.
    pub fn argument(&self) -> Option<&'a MetaInputValue> {
        self.argument.last().copied().flatten()
    }

    pub fn is_known_fragment(&self, name: &str) -> bool {
        self.fragments.contains_key(name)
    }

    pub fn fragment(&self, name: &str) -> Option<&'a Positioned<FragmentDefinition>> {
        self.fragments.get(name)
    }
}

pub trait Visitor<'a> {
    fn enter_document(&mut self, _ctx: &mut VisitorContext<'a>, _doc: &'a ExecutableDocument) {}
    fn exit_document(&mut self, _ctx: &mut VisitorContext<'a>, _doc: &'a ExecutableDocument) {}

    fn enter_operation_definition(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _name: Option<&'a Name>,
        _operation_definition: &'a Positioned<OperationDefinition>,
    ) {
    }
    fn exit_operation_definition(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _name: Option<&'a Name>,
        _operation_definition: &'a Positioned<OperationDefinition>,
    ) {
    }

    fn enter_fragment_definition(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _name: &'a Name,
        _fragment_definition: &'a Positioned<FragmentDefinition>,
    ) {
    }
    fn exit_fragment_definition(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _name: &'a Name,
        _fragment_definition: &'a Positioned<FragmentDefinition>,
    ) {
    }

    fn enter_variable_definition(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _variable_definition: &'a Positioned<VariableDefinition>,
    ) {
    }
    fn exit_variable_definition(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _variable_definition: &'a Positioned<VariableDefinition>,
    ) {
    }

    fn enter_directive(&mut self, _ctx: &mut VisitorContext<'a>, _directive: &'a Positioned<Directive>) {}
    fn exit_directive(&mut self, _ctx: &mut VisitorContext<'a>, _directive: &'a Positioned<Directive>) {}

    fn enter_argument(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _name: &'a Positioned<Name>,
        _value: &'a Positioned<Value>,
    ) {
    }
    fn exit_argument(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _name: &'a Positioned<Name>,
        _value: &'a Positioned<Value>,
    ) {
    }

    fn enter_selection_set(&mut self, _ctx: &mut VisitorContext<'a>, _selection_set: &'a Positioned<SelectionSet>) {}
    fn exit_selection_set(&mut self, _ctx: &mut VisitorContext<'a>, _selection_set: &'a Positioned<SelectionSet>) {}

    fn enter_selection(&mut self, _ctx: &mut VisitorContext<'a>, _selection: &'a Positioned<Selection>) {}
    fn exit_selection(&mut self, _ctx: &mut VisitorContext<'a>, _selection: &'a Positioned<Selection>) {}

    fn enter_field(&mut self, _ctx: &mut VisitorContext<'a>, _field: &'a Positioned<Field>) {}
    fn exit_field(&mut self, _ctx: &mut VisitorContext<'a>, _field: &'a Positioned<Field>) {}

    fn enter_fragment_spread(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _fragment_spread: &'a Positioned<FragmentSpread>,
    ) {
    }
    fn exit_fragment_spread(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _fragment_spread: &'a Positioned<FragmentSpread>,
    ) {
    }

    fn enter_inline_fragment(&mut self, _ctx: &mut VisitorContext<'a>, _inline_fragment: &'a Positioned<InlineFragment>) {}
    fn exit_inline_fragment(&mut self, _ctx: &mut VisitorContext<'a>, _inline_fragment: &'a Positioned<InlineFragment>) {}

    fn enter_input_value(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _pos: Pos,
        _expected_type: &Option<&'a Type>,
        _value: &'a Value,
    ) {
    }
    fn exit_input_value(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _pos: Pos,
        _expected_type: &Option<&'a Type>,
        _value: &'a Value,
    ) {
    }

    /// Called for every field of an input object literal. `parent_type` is the input object
    /// type that is expected to declare the field, when it can be resolved.
    fn enter_input_object_field(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _pos: Pos,
        _parent_type: Option<&'a MetaType>,
        _name: &'a Name,
        _value: &'a Value,
    ) {
    }
    fn exit_input_object_field(
        &mut self,
        _ctx: &mut VisitorContext<'a>,
        _pos: Pos,
        _parent_type: Option<&'a MetaType>,
        _name: &'a Name,
        _value: &'a Value,
    ) {
    }
}

macro_rules! dispatch {
    ($self:ident, $method:ident, $ctx:ident $(, $arg:expr)*) => {
        for visitor in $self.iter_mut() {
            visitor.$method($ctx $(, $arg)*);
        }
    };
}

impl<'a> Visitor<'a> for Vec<Box<dyn Visitor<'a> + 'a>> {
    fn enter_document(&mut self, ctx: &mut VisitorContext<'a>, doc: &'a ExecutableDocument) {
        dispatch!(self, enter_document, ctx, doc);
    }

    fn exit_document(&mut self, ctx: &mut VisitorContext<'a>, doc: &'a ExecutableDocument) {
        dispatch!(self, exit_document, ctx, doc);
    }

    fn enter_operation_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        name: Option<&'a Name>,
        operation_definition: &'a Positioned<OperationDefinition>,
    ) {
        dispatch!(self, enter_operation_definition, ctx, name, operation_definition);
    }

    fn exit_operation_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        name: Option<&'a Name>,
        operation_definition: &'a Positioned<OperationDefinition>,
    ) {
        dispatch!(self, exit_operation_definition, ctx, name, operation_definition);
    }

    fn enter_fragment_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        name: &'a Name,
        fragment_definition: &'a Positioned<FragmentDefinition>,
    ) {
        dispatch!(self, enter_fragment_definition, ctx, name, fragment_definition);
    }

    fn exit_fragment_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        name: &'a Name,
        fragment_definition: &'a Positioned<FragmentDefinition>,
    ) {
        dispatch!(self, exit_fragment_definition, ctx, name, fragment_definition);
    }

    fn enter_variable_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        variable_definition: &'a Positioned<VariableDefinition>,
    ) {
        dispatch!(self, enter_variable_definition, ctx, variable_definition);
    }

    fn exit_variable_definition(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        variable_definition: &'a Positioned<VariableDefinition>,
    ) {
        dispatch!(self, exit_variable_definition, ctx, variable_definition);
    }

    fn enter_directive(&mut self, ctx: &mut VisitorContext<'a>, directive: &'a Positioned<Directive>) {
        dispatch!(self, enter_directive, ctx, directive);
    }

    fn exit_directive(&mut self, ctx: &mut VisitorContext<'a>, directive: &'a Positioned<Directive>) {
        dispatch!(self, exit_directive, ctx, directive);
    }

    fn enter_argument(&mut self, ctx: &mut VisitorContext<'a>, name: &'a Positioned<Name>, value: &'a Positioned<Value>) {
        dispatch!(self, enter_argument, ctx, name, value);
    }

    fn exit_argument(&mut self, ctx: &mut VisitorContext<'a>, name: &'a Positioned<Name>, value: &'a Positioned<Value>) {
        dispatch!(self, exit_argument, ctx, name, value);
    }

    fn enter_selection_set(&mut self, ctx: &mut VisitorContext<'a>, selection_set: &'a Positioned<SelectionSet>) {
        dispatch!(self, enter_selection_set, ctx, selection_set);
    }

    fn exit_selection_set(&mut self, ctx: &mut VisitorContext<'a>, selection_set: &'a Positioned<SelectionSet>) {
        dispatch!(self, exit_selection_set, ctx, selection_set);
    }

    fn enter_selection(&mut self, ctx: &mut VisitorContext<'a>, selection: &'a Positioned<Selection>) {
        dispatch!(self, enter_selection, ctx, selection);
    }

    fn exit_selection(&mut self, ctx: &mut VisitorContext<'a>, selection: &'a Positioned<Selection>) {
        dispatch!(self, exit_selection, ctx, selection);
    }

    fn enter_field(&mut self, ctx: &mut VisitorContext<'a>, field: &'a Positioned<Field>) {
        dispatch!(self, enter_field, ctx, field);
    }

    fn exit_field(&mut self, ctx: &mut VisitorContext<'a>, field: &'a Positioned<Field>) {
        dispatch!(self, exit_field, ctx, field);
    }

    fn enter_fragment_spread(&mut self, ctx: &mut VisitorContext<'a>, fragment_spread: &'a Positioned<FragmentSpread>) {
        dispatch!(self, enter_fragment_spread, ctx, fragment_spread);
    }

    fn exit_fragment_spread(&mut self, ctx: &mut VisitorContext<'a>, fragment_spread: &'a Positioned<FragmentSpread>) {
        dispatch!(self, exit_fragment_spread, ctx, fragment_spread);
    }

    fn enter_inline_fragment(&mut self, ctx: &mut VisitorContext<'a>, inline_fragment: &'a Positioned<InlineFragment>) {
        dispatch!(self, enter_inline_fragment, ctx, inline_fragment);
    }

    fn exit_inline_fragment(&mut self, ctx: &mut VisitorContext<'a>, inline_fragment: &'a Positioned<InlineFragment>) {
        dispatch!(self, exit_inline_fragment, ctx, inline_fragment);
    }

    fn enter_input_value(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        pos: Pos,
        expected_type: &Option<&'a Type>,
        value: &'a Value,
    ) {
        dispatch!(self, enter_input_value, ctx, pos, expected_type, value);
    }

    fn exit_input_value(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        pos: Pos,
        expected_type: &Option<&'a Type>,
        value: &'a Value,
    ) {
        dispatch!(self, exit_input_value, ctx, pos, expected_type, value);
    }

    fn enter_input_object_field(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        pos: Pos,
        parent_type: Option<&'a MetaType>,
        name: &'a Name,
        value: &'a Value,
    ) {
        dispatch!(self, enter_input_object_field, ctx, pos, parent_type, name, value);
    }

    fn exit_input_object_field(
        &mut self,
        ctx: &mut VisitorContext<'a>,
        pos: Pos,
        parent_type: Option<&'a MetaType>,
        name: &'a Name,
        value: &'a Value,
    ) {
        dispatch!(self, exit_input_object_field, ctx, pos, parent_type, name, value);
    }
}

pub fn visit<'a, V: Visitor<'a>>(v: &mut V, ctx: &mut VisitorContext<'a>, doc: &'a ExecutableDocument) {
    v.enter_document(ctx, doc);

    for (name, fragment) in &doc.fragments {
        let ty = type_condition(ctx.schema, &fragment.node.type_condition);
        ctx.with_type(ty, |ctx| visit_fragment_definition(v, ctx, name, fragment));
    }

    for (name, operation) in doc.operations.iter() {
        visit_operation_definition(v, ctx, name, operation);
    }

    v.exit_document(ctx, doc);
}

fn type_condition<'a>(schema: &'a ComposedSchema, type_condition: &'a Positioned<TypeCondition>) -> Option<&'a MetaType> {
    schema.types.get(type_condition.node.on.node.as_str())
}

fn visit_operation_definition<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    name: Option<&'a Name>,
    operation: &'a Positioned<OperationDefinition>,
) {
    v.enter_operation_definition(ctx, name, operation);
    let schema = ctx.schema;
    let root_name = match &operation.node.ty {
        OperationType::Query => Some(schema.query_type()),
        OperationType::Mutation => schema.mutation_type(),
        OperationType::Subscription => schema.subscription_type(),
    };
    if let Some(root_name) = root_name {
        ctx.with_type(schema.types.get(root_name), |ctx| {
            visit_variable_definitions(v, ctx, &operation.node.variable_definitions);
            visit_directives(v, ctx, &operation.node.directives);
            visit_selection_set(v, ctx, &operation.node.selection_set);
        });
    } else {
        let kind = match operation.node.ty {
            OperationType::Query => "queries",
            OperationType::Mutation => "mutations",
            OperationType::Subscription => "subscriptions",
        };
        ctx.report_error(vec![operation.pos], format!("Schema is not configured for {}.", kind));
    }
    v.exit_operation_definition(ctx, name, operation);
}

fn visit_selection_set<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    selection_set: &'a Positioned<SelectionSet>,
) {
    if !selection_set.node.items.is_empty() {
        v.enter_selection_set(ctx, selection_set);
        for selection in &selection_set.node.items {
            visit_selection(v, ctx, selection);
        }
        v.exit_selection_set(ctx, selection_set);
    }
}

fn visit_selection<'a, V: Visitor<'a>>(v: &mut V, ctx: &mut VisitorContext<'a>, selection: &'a Positioned<Selection>) {
    v.enter_selection(ctx, selection);
    let schema = ctx.schema;
    match &selection.node {
        Selection::Field(field) => {
            if field.node.name.node == "__typename" {
                ctx.with_type(schema.types.get("String"), |ctx| visit_field(v, ctx, field));
            } else {
                let ty = ctx
                    .current_type()
                    .and_then(|ty| ty.field_by_name(&field.node.name.node))
                    .and_then(|field| schema.get_type(&field.ty));
                ctx.with_type(ty, |ctx| visit_field(v, ctx, field));
            }
        },
        Selection::FragmentSpread(fragment_spread) => visit_fragment_spread(v, ctx, fragment_spread),
        Selection::InlineFragment(inline_fragment) => match &inline_fragment.node.type_condition {
            Some(condition) => {
                let ty = type_condition(schema, condition);
                ctx.with_type(ty, |ctx| visit_inline_fragment(v, ctx, inline_fragment));
            },
            None => visit_inline_fragment(v, ctx, inline_fragment),
        },
    }
    v.exit_selection(ctx, selection);
}

fn visit_field<'a, V: Visitor<'a>>(v: &mut V, ctx: &mut VisitorContext<'a>, field: &'a Positioned<Field>) {
    v.enter_field(ctx, field);

    let definitions = ctx
        .parent_type()
        .and_then(|ty| ty.field_by_name(&field.node.name.node))
        .map(|field| &field.arguments);
    visit_arguments(v, ctx, &field.node.arguments, definitions);
    visit_directives(v, ctx, &field.node.directives);
    visit_selection_set(v, ctx, &field.node.selection_set);

    v.exit_field(ctx, field);
}

fn visit_arguments<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    arguments: &'a [(Positioned<Name>, Positioned<Value>)],
    definitions: Option<&'a IndexMap<Name, MetaInputValue>>,
) {
    for (name, value) in arguments {
        let definition = definitions.and_then(|definitions| definitions.get(&name.node));
        let expected_type = definition.map(|definition| &definition.ty);
        ctx.with_argument(definition, |ctx| {
            v.enter_argument(ctx, name, value);
            ctx.with_input_type(expected_type, |ctx| {
                visit_input_value(v, ctx, value.pos, expected_type, &value.node)
            });
            v.exit_argument(ctx, name, value);
        });
    }
}

fn visit_input_value<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    pos: Pos,
    expected_type: Option<&'a Type>,
    value: &'a Value,
) {
    v.enter_input_value(ctx, pos, &expected_type, value);

    match value {
        Value::List(values) => {
            let element_type = expected_type.and_then(|ty| match &ty.base {
                BaseType::List(element_type) => Some(element_type.as_ref()),
                BaseType::Named(_) => None,
            });
            for value in values {
                ctx.with_input_type(element_type, |ctx| visit_input_value(v, ctx, pos, element_type, value));
            }
        },
        Value::Object(values) => {
            let schema = ctx.schema;
            let parent_type = expected_type
                .and_then(|ty| schema.get_type(ty))
                .filter(|ty| ty.kind == TypeKind::InputObject);
            for (name, value) in values {
                let field_type = parent_type
                    .and_then(|ty| ty.input_fields.get(name))
                    .map(|field| &field.ty);
                v.enter_input_object_field(ctx, pos, parent_type, name, value);
                ctx.with_input_type(field_type, |ctx| visit_input_value(v, ctx, pos, field_type, value));
                v.exit_input_object_field(ctx, pos, parent_type, name, value);
            }
        },
        _ => {},
    }

    v.exit_input_value(ctx, pos, &expected_type, value);
}

fn visit_variable_definitions<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    variable_definitions: &'a [Positioned<VariableDefinition>],
) {
    for variable_definition in variable_definitions {
        v.enter_variable_definition(ctx, variable_definition);
        visit_directives(v, ctx, &variable_definition.node.directives);
        v.exit_variable_definition(ctx, variable_definition);
    }
}

fn visit_directives<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    directives: &'a [Positioned<Directive>],
) {
    let schema = ctx.schema;
    for directive in directives {
        v.enter_directive(ctx, directive);
        let definitions = schema
            .directives
            .get(directive.node.name.node.as_str())
            .map(|directive| &directive.arguments);
        visit_arguments(v, ctx, &directive.node.arguments, definitions);
        v.exit_directive(ctx, directive);
    }
}

fn visit_fragment_definition<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    name: &'a Name,
    fragment: &'a Positioned<FragmentDefinition>,
) {
    v.enter_fragment_definition(ctx, name, fragment);
    visit_directives(v, ctx, &fragment.node.directives);
    visit_selection_set(v, ctx, &fragment.node.selection_set);
    v.exit_fragment_definition(ctx, name, fragment);
}

fn visit_fragment_spread<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    fragment_spread: &'a Positioned<FragmentSpread>,
) {
    v.enter_fragment_spread(ctx, fragment_spread);
    visit_directives(v, ctx, &fragment_spread.node.directives);
    v.exit_fragment_spread(ctx, fragment_spread);
}

fn visit_inline_fragment<'a, V: Visitor<'a>>(
    v: &mut V,
    ctx: &mut VisitorContext<'a>,
    inline_fragment: &'a Positioned<InlineFragment>,
) {
    v.enter_inline_fragment(ctx, inline_fragment);
    visit_directives(v, ctx, &inline_fragment.node.directives);
    visit_selection_set(v, ctx, &inline_fragment.node.selection_set);
    v.exit_inline_fragment(ctx, inline_fragment);
}
