use std::collections::HashSet;

use indexmap::IndexMap;
use parser::{
    types::{
        BaseType,
        Directive,
        DirectiveLocation,
        ExecutableDocument,
        Field,
        Selection,
        SelectionSet,
        Type,
    },
    Positioned,
};
use publicgate_schema::{ComposedSchema, Deprecation, MetaDirective, MetaEnumValue, MetaField, MetaInputValue, MetaType, TypeKind};
use value::{ConstValue, Name, Value, Variables};

use crate::{operation::select_operation, Request, Response, ServerError};

type Result<T> = std::result::Result<T, ServerError>;

/// Resolves an operation made only of `__schema`, `__type` and `__typename` against `schema`.
#[tracing::instrument(skip_all, level = "trace")]
pub fn execute(schema: &ComposedSchema, document: &ExecutableDocument, request: &Request) -> Response {
    let operation = match select_operation(document, request.operation_name.as_deref()) {
        Ok(operation) => operation,
        Err(err) => return Response::from_errors(vec![err]),
    };

    let mut variables = request.variables.clone();
    for variable_definition in &operation.node.variable_definitions {
        if let Some(default_value) = &variable_definition.node.default_value {
            variables
                .entry(variable_definition.node.name.node.clone())
                .or_insert_with(|| default_value.node.clone());
        }
    }

    let Some(query_type) = schema.types.get(schema.query_type()) else {
        return Response::from_errors(vec![ServerError::new("Schema is not configured for queries.")]);
    };

    let resolver = Resolver {
        schema,
        document,
        variables: &variables,
    };
    match resolver.resolve_object(Node::Query(query_type), &[&operation.node.selection_set.node]) {
        Ok(data) => Response::new(data),
        Err(err) => Response::from_errors(vec![err]),
    }
}

/// A `__Type` value: a named type or one wrapping level of a field type.
#[derive(Clone, Copy)]
enum TypeRef<'a> {
    Named(&'a MetaType),
    NonNull(&'a Type),
    List(&'a Type),
}

#[derive(Clone, Copy)]
enum Node<'a> {
    Query(&'a MetaType),
    Schema,
    Type(TypeRef<'a>),
    Field(&'a MetaField),
    InputValue(&'a MetaInputValue),
    EnumValue(&'a MetaEnumValue),
    Directive(&'a MetaDirective),
}

impl<'a> Node<'a> {
    fn typename(&self) -> &'a str {
        match self {
            Node::Query(ty) => ty.name.as_str(),
            Node::Schema => "__Schema",
            Node::Type(_) => "__Type",
            Node::Field(_) => "__Field",
            Node::InputValue(_) => "__InputValue",
            Node::EnumValue(_) => "__EnumValue",
            Node::Directive(_) => "__Directive",
        }
    }
}

struct Resolver<'a> {
    schema: &'a ComposedSchema,
    document: &'a ExecutableDocument,
    variables: &'a Variables,
}

impl<'a> Resolver<'a> {
    fn resolve_object(&self, node: Node<'a>, selection_sets: &[&'a SelectionSet]) -> Result<ConstValue> {
        let mut fields: IndexMap<&'a Name, Vec<&'a Positioned<Field>>> = IndexMap::new();
        for selection_set in selection_sets {
            self.collect_fields(node.typename(), selection_set, &mut fields, &mut HashSet::new())?;
        }

        let mut object = IndexMap::with_capacity(fields.len());
        for (response_key, fields) in fields {
            object.insert(response_key.clone(), self.resolve_field(node, &fields)?);
        }
        Ok(ConstValue::Object(object))
    }

    fn collect_fields(
        &self,
        typename: &str,
        selection_set: &'a SelectionSet,
        fields: &mut IndexMap<&'a Name, Vec<&'a Positioned<Field>>>,
        visited: &mut HashSet<&'a str>,
    ) -> Result<()> {
        for selection in &selection_set.items {
            match &selection.node {
                Selection::Field(field) => {
                    if self.is_included(&field.node.directives)? {
                        fields.entry(&field.node.response_key().node).or_default().push(field);
                    }
                },
                Selection::FragmentSpread(fragment_spread) => {
                    let name = fragment_spread.node.fragment_name.node.as_str();
                    if !self.is_included(&fragment_spread.node.directives)? || !visited.insert(name) {
                        continue;
                    }
                    let fragment = self.document.fragments.get(name).ok_or_else(|| {
                        ServerError::new(format!("Unknown fragment: \"{}\".", name)).at(fragment_spread.pos)
                    })?;
                    if fragment.node.type_condition.node.on.node.as_str() == typename {
                        self.collect_fields(typename, &fragment.node.selection_set.node, fields, visited)?;
                    }
                },
                Selection::InlineFragment(inline_fragment) => {
                    if !self.is_included(&inline_fragment.node.directives)? {
                        continue;
                    }
                    let applies = inline_fragment
                        .node
                        .type_condition
                        .as_ref()
                        .map_or(true, |condition| condition.node.on.node.as_str() == typename);
                    if applies {
                        self.collect_fields(typename, &inline_fragment.node.selection_set.node, fields, visited)?;
                    }
                },
            }
        }
        Ok(())
    }

    fn is_included(&self, directives: &'a [Positioned<Directive>]) -> Result<bool> {
        for directive in directives {
            let skip_if = match directive.node.name.node.as_str() {
                "skip" => true,
                "include" => false,
                _ => continue,
            };
            let condition = match directive.node.get_argument("if") {
                Some(value) => matches!(self.const_value(&value.node), ConstValue::Boolean(true)),
                None => {
                    return Err(ServerError::new(format!(
                        "Directive \"@{}\" requires the \"if\" argument.",
                        directive.node.name.node
                    ))
                    .at(directive.pos))
                },
            };
            if condition == skip_if {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn const_value(&self, value: &Value) -> ConstValue {
        value
            .clone()
            .into_const_with(|name| Ok::<_, std::convert::Infallible>(self.variables.get(&name).cloned().unwrap_or_default()))
            .unwrap_or_default()
    }

    fn argument(&self, field: &'a Positioned<Field>, name: &str) -> ConstValue {
        field
            .node
            .get_argument(name)
            .map(|value| self.const_value(&value.node))
            .unwrap_or_default()
    }

    fn include_deprecated(&self, field: &'a Positioned<Field>) -> bool {
        matches!(self.argument(field, "includeDeprecated"), ConstValue::Boolean(true))
    }

    fn resolve_field(&self, node: Node<'a>, fields: &[&'a Positioned<Field>]) -> Result<ConstValue> {
        let field = fields[0];
        let name = field.node.name.node.as_str();
        if name == "__typename" {
            return Ok(ConstValue::String(node.typename().to_string()));
        }

        let selection_sets = fields
            .iter()
            .map(|field| &field.node.selection_set.node)
            .collect::<Vec<_>>();
        let object = |node: Node<'a>| self.resolve_object(node, &selection_sets);
        let optional = |node: Option<Node<'a>>| node.map_or(Ok(ConstValue::Null), object);
        let list = |nodes: Vec<Node<'a>>| -> Result<ConstValue> {
            nodes.into_iter().map(object).collect::<Result<Vec<_>>>().map(ConstValue::List)
        };
        let unknown = || {
            Err(ServerError::new(format!(
                "Unknown field \"{}\" on type \"{}\".",
                name,
                node.typename()
            ))
            .at(field.pos))
        };

        match node {
            Node::Query(_) => match name {
                "__schema" => object(Node::Schema),
                "__type" => {
                    let ty = match self.argument(field, "name") {
                        ConstValue::String(type_name) => self.schema.types.get(type_name.as_str()),
                        _ => None,
                    };
                    optional(ty.map(|ty| Node::Type(TypeRef::Named(ty))))
                },
                _ => unknown(),
            },
            Node::Schema => match name {
                "description" => Ok(string(self.schema.description.as_deref())),
                "types" => list(
                    self.schema
                        .types
                        .values()
                        .map(|ty| Node::Type(TypeRef::Named(ty)))
                        .collect(),
                ),
                "queryType" => optional(self.named(Some(self.schema.query_type()))),
                "mutationType" => optional(self.named(self.schema.mutation_type())),
                "subscriptionType" => optional(self.named(self.schema.subscription_type())),
                "directives" => list(self.schema.directives.values().map(Node::Directive).collect()),
                _ => unknown(),
            },
            Node::Type(TypeRef::Named(ty)) => match name {
                "kind" => Ok(enum_value(kind_name(ty.kind))),
                "name" => Ok(ConstValue::String(ty.name.to_string())),
                "description" => Ok(string(ty.description.as_deref())),
                "specifiedByURL" => Ok(string(ty.specified_by_url.as_deref())),
                "fields" if matches!(ty.kind, TypeKind::Object | TypeKind::Interface) => {
                    let include_deprecated = self.include_deprecated(field);
                    list(
                        ty.fields
                            .values()
                            .filter(|field| !field.name.starts_with("__"))
                            .filter(|field| include_deprecated || !field.deprecation.is_deprecated())
                            .map(Node::Field)
                            .collect(),
                    )
                },
                "interfaces" if matches!(ty.kind, TypeKind::Object | TypeKind::Interface) => list(
                    ty.implements
                        .iter()
                        .filter_map(|name| self.named(Some(name)))
                        .collect(),
                ),
                "possibleTypes" if ty.is_abstract() => list(
                    ty.possible_types
                        .iter()
                        .filter_map(|name| self.named(Some(name)))
                        .collect(),
                ),
                "enumValues" if ty.kind == TypeKind::Enum => {
                    let include_deprecated = self.include_deprecated(field);
                    list(
                        ty.enum_values
                            .values()
                            .filter(|value| include_deprecated || !value.deprecation.is_deprecated())
                            .map(Node::EnumValue)
                            .collect(),
                    )
                },
                "inputFields" if ty.kind == TypeKind::InputObject => {
                    list(ty.input_fields.values().map(Node::InputValue).collect())
                },
                "fields" | "interfaces" | "possibleTypes" | "enumValues" | "inputFields" | "ofType" => Ok(ConstValue::Null),
                _ => unknown(),
            },
            Node::Type(TypeRef::NonNull(ty)) => match name {
                "kind" => Ok(enum_value("NON_NULL")),
                "ofType" => optional(self.base_type(ty)),
                _ => wrapper_field(name, unknown),
            },
            Node::Type(TypeRef::List(ty)) => match name {
                "kind" => Ok(enum_value("LIST")),
                "ofType" => match &ty.base {
                    BaseType::List(element_type) => optional(self.type_ref(element_type)),
                    BaseType::Named(_) => Ok(ConstValue::Null),
                },
                _ => wrapper_field(name, unknown),
            },
            Node::Field(meta_field) => match name {
                "name" => Ok(ConstValue::String(meta_field.name.to_string())),
                "description" => Ok(string(meta_field.description.as_deref())),
                "args" => {
                    let include_deprecated = self.include_deprecated(field);
                    list(
                        meta_field
                            .arguments
                            .values()
                            .filter(|arg| include_deprecated || !arg.deprecation.is_deprecated())
                            .map(Node::InputValue)
                            .collect(),
                    )
                },
                "type" => optional(self.type_ref(&meta_field.ty)),
                "isDeprecated" => Ok(ConstValue::Boolean(meta_field.deprecation.is_deprecated())),
                "deprecationReason" => Ok(deprecation_reason(&meta_field.deprecation)),
                _ => unknown(),
            },
            Node::InputValue(input_value) => match name {
                "name" => Ok(ConstValue::String(input_value.name.to_string())),
                "description" => Ok(string(input_value.description.as_deref())),
                "type" => optional(self.type_ref(&input_value.ty)),
                "defaultValue" => Ok(input_value
                    .default_value
                    .as_ref()
                    .map_or(ConstValue::Null, |value| ConstValue::String(value.to_string()))),
                "isDeprecated" => Ok(ConstValue::Boolean(input_value.deprecation.is_deprecated())),
                "deprecationReason" => Ok(deprecation_reason(&input_value.deprecation)),
                _ => unknown(),
            },
            Node::EnumValue(meta_value) => match name {
                "name" => Ok(ConstValue::String(meta_value.value.to_string())),
                "description" => Ok(string(meta_value.description.as_deref())),
                "isDeprecated" => Ok(ConstValue::Boolean(meta_value.deprecation.is_deprecated())),
                "deprecationReason" => Ok(deprecation_reason(&meta_value.deprecation)),
                _ => unknown(),
            },
            Node::Directive(directive) => match name {
                "name" => Ok(ConstValue::String(directive.name.to_string())),
                "description" => Ok(string(directive.description.as_deref())),
                "locations" => Ok(ConstValue::List(
                    directive
                        .locations
                        .iter()
                        .map(|location| enum_value(location_name(location)))
                        .collect(),
                )),
                "args" => list(directive.arguments.values().map(Node::InputValue).collect()),
                "isRepeatable" => Ok(ConstValue::Boolean(directive.is_repeatable)),
                _ => unknown(),
            },
        }
    }

    fn named(&self, name: Option<&str>) -> Option<Node<'a>> {
        name.and_then(|name| self.schema.types.get(name))
            .map(|ty| Node::Type(TypeRef::Named(ty)))
    }

    fn type_ref(&self, ty: &'a Type) -> Option<Node<'a>> {
        if ty.nullable {
            self.base_type(ty)
        } else {
            Some(Node::Type(TypeRef::NonNull(ty)))
        }
    }

    fn base_type(&self, ty: &'a Type) -> Option<Node<'a>> {
        match &ty.base {
            BaseType::Named(name) => self.named(Some(name)),
            BaseType::List(_) => Some(Node::Type(TypeRef::List(ty))),
        }
    }
}

/// Fields of a `__Type` that are always `null` on `LIST` and `NON_NULL` wrappers.
fn wrapper_field(name: &str, unknown: impl FnOnce() -> Result<ConstValue>) -> Result<ConstValue> {
    match name {
        "name" | "description" | "specifiedByURL" | "fields" | "interfaces" | "possibleTypes" | "enumValues"
        | "inputFields" => Ok(ConstValue::Null),
        _ => unknown(),
    }
}

fn string(value: Option<&str>) -> ConstValue {
    value.map_or(ConstValue::Null, |value| ConstValue::String(value.to_string()))
}

fn enum_value(name: &str) -> ConstValue {
    ConstValue::Enum(Name::new(name))
}

fn deprecation_reason(deprecation: &Deprecation) -> ConstValue {
    string(deprecation.reason())
}

fn kind_name(kind: TypeKind) -> &'static str {
    match kind {
        TypeKind::Scalar => "SCALAR",
        TypeKind::Object => "OBJECT",
        TypeKind::Interface => "INTERFACE",
        TypeKind::Union => "UNION",
        TypeKind::Enum => "ENUM",
        TypeKind::InputObject => "INPUT_OBJECT",
    }
}

fn location_name(location: &DirectiveLocation) -> &'static str {
    match location {
        DirectiveLocation::Query => "QUERY",
        DirectiveLocation::Mutation => "MUTATION",
        DirectiveLocation::Subscription => "SUBSCRIPTION",
        DirectiveLocation::Field => "FIELD",
        DirectiveLocation::FragmentDefinition => "FRAGMENT_DEFINITION",
        DirectiveLocation::FragmentSpread => "FRAGMENT_SPREAD",
        DirectiveLocation::InlineFragment => "INLINE_FRAGMENT",
        DirectiveLocation::VariableDefinition => "VARIABLE_DEFINITION",
        DirectiveLocation::Schema => "SCHEMA",
        DirectiveLocation::Scalar => "SCALAR",
        DirectiveLocation::Object => "OBJECT",
        DirectiveLocation::FieldDefinition => "FIELD_DEFINITION",
        DirectiveLocation::ArgumentDefinition => "ARGUMENT_DEFINITION",
        DirectiveLocation::Interface => "INTERFACE",
        DirectiveLocation::Union => "UNION",
        DirectiveLocation::Enum => "ENUM",
        DirectiveLocation::EnumValue => "ENUM_VALUE",
        DirectiveLocation::InputObject => "INPUT_OBJECT",
        DirectiveLocation::InputFieldDefinition => "INPUT_FIELD_DEFINITION",
    }
}
