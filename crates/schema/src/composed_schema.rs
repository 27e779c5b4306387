use indexmap::{IndexMap, IndexSet};
use parser::{
    types::{
        self,
        ConstDirective,
        DirectiveDefinition,
        DirectiveLocation,
        EnumType,
        InputObjectType,
        InterfaceType,
        ObjectType,
        SchemaDefinition,
        ServiceDocument,
        Type,
        TypeDefinition,
        TypeSystemDefinition,
        UnionType,
    },
    Positioned,
};
use tracing::instrument;
use value::{ConstValue, Name};

use crate::{type_ext::TypeExt, SchemaError};

#[derive(Debug, Eq, PartialEq)]
pub enum Deprecation {
    NoDeprecated,
    Deprecated { reason: Option<String> },
}

impl Deprecation {
    #[inline]
    pub fn is_deprecated(&self) -> bool {
        matches!(self, Deprecation::Deprecated { .. })
    }

    #[inline]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Deprecation::NoDeprecated => None,
            Deprecation::Deprecated { reason } => reason.as_deref(),
        }
    }
}

/// Flags attached to a declaration programmatically rather than through SDL.
///
/// Schemas assembled in code have no directives to carry metadata, so the
/// same information can be set here instead.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct Extensions {
    pub is_private: bool,
}

/// A directive applied to a type-system declaration, e.g. `@private` or `@deprecated(reason: "...")`.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct AppliedDirective {
    pub name: Name,
    pub arguments: IndexMap<Name, ConstValue>,
}

#[derive(Debug, Eq, PartialEq)]
pub struct MetaField {
    pub description: Option<String>,
    pub name: Name,
    pub arguments: IndexMap<Name, MetaInputValue>,
    pub ty: Type,
    pub deprecation: Deprecation,
    pub directives: Vec<AppliedDirective>,
    pub extensions: Extensions,
}

#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub enum TypeKind {
    Scalar,
    Object,
    Interface,
    Union,
    Enum,
    InputObject,
}

#[derive(Debug, Eq, PartialEq)]
pub struct MetaEnumValue {
    pub description: Option<String>,
    pub value: Name,
    pub deprecation: Deprecation,
    pub directives: Vec<AppliedDirective>,
    pub extensions: Extensions,
}

#[derive(Debug, Eq, PartialEq)]
pub struct MetaInputValue {
    pub description: Option<String>,
    pub name: Name,
    pub ty: Type,
    pub default_value: Option<ConstValue>,
    pub deprecation: Deprecation,
    pub directives: Vec<AppliedDirective>,
    pub extensions: Extensions,
}

#[derive(Debug, Eq, PartialEq)]
pub struct MetaType {
    pub description: Option<String>,
    pub name: Name,
    pub kind: TypeKind,
    pub specified_by_url: Option<String>,

    pub implements: IndexSet<Name>,
    pub fields: IndexMap<Name, MetaField>,
    pub possible_types: IndexSet<Name>,
    pub enum_values: IndexMap<Name, MetaEnumValue>,
    pub input_fields: IndexMap<Name, MetaInputValue>,

    pub directives: Vec<AppliedDirective>,
    pub extensions: Extensions,
}

impl MetaType {
    fn new(name: Name, kind: TypeKind) -> MetaType {
        MetaType {
            description: None,
            name,
            kind,
            specified_by_url: None,
            implements: Default::default(),
            fields: Default::default(),
            possible_types: Default::default(),
            enum_values: Default::default(),
            input_fields: Default::default(),
            directives: Default::default(),
            extensions: Default::default(),
        }
    }

    #[inline]
    pub fn field_by_name(&self, name: &str) -> Option<&MetaField> {
        self.fields.get(name)
    }

    #[inline]
    pub fn is_composite(&self) -> bool {
        matches!(self.kind, TypeKind::Object | TypeKind::Interface | TypeKind::Union)
    }

    #[inline]
    pub fn is_abstract(&self) -> bool {
        matches!(self.kind, TypeKind::Interface | TypeKind::Union)
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        matches!(self.kind, TypeKind::Enum | TypeKind::Scalar)
    }

    #[inline]
    pub fn is_input(&self) -> bool {
        matches!(self.kind, TypeKind::Enum | TypeKind::Scalar | TypeKind::InputObject)
    }

    /// Introspection meta-types (`__Schema`, `__Type`, ...) are reserved by the `__` prefix.
    #[inline]
    pub fn is_introspection(&self) -> bool {
        self.name.starts_with("__")
    }

    #[inline]
    pub fn is_possible_type(&self, type_name: &str) -> bool {
        match self.kind {
            TypeKind::Interface | TypeKind::Union => self.possible_types.contains(type_name),
            TypeKind::Object => self.name == type_name,
            _ => false,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct MetaDirective {
    pub name: Name,
    pub description: Option<String>,
    pub locations: Vec<DirectiveLocation>,
    pub arguments: IndexMap<Name, MetaInputValue>,
    pub is_repeatable: bool,
}

#[derive(Debug, Default)]
pub struct ComposedSchema {
    pub description: Option<String>,
    pub query_type: Option<Name>,
    pub mutation_type: Option<Name>,
    pub subscription_type: Option<Name>,
    pub types: IndexMap<Name, MetaType>,
    pub directives: IndexMap<Name, MetaDirective>,
}

impl ComposedSchema {
    #[instrument(err(Debug), skip(document), level = "trace")]
    pub fn parse(document: &str) -> Result<ComposedSchema, SchemaError> {
        Self::new(parser::parse_schema(document)?)
    }

    pub fn new(document: ServiceDocument) -> Result<ComposedSchema, SchemaError> {
        let mut composed_schema = ComposedSchema::default();
        let mut type_extensions = Vec::new();

        for definition in document.definitions {
            match definition {
                TypeSystemDefinition::Schema(schema) => {
                    convert_schema_definition(&mut composed_schema, schema.node);
                },
                TypeSystemDefinition::Type(type_definition) if type_definition.node.extend => {
                    // Applied once every base definition is known, wherever it appears in the document.
                    type_extensions.push(type_definition.node);
                },
                TypeSystemDefinition::Type(type_definition) => {
                    let meta_type = convert_type_definition(type_definition.node)?;
                    if composed_schema.types.contains_key(&meta_type.name) {
                        return Err(SchemaError::DuplicateType {
                            type_name: meta_type.name.to_string(),
                        });
                    }
                    composed_schema.types.insert(meta_type.name.clone(), meta_type);
                },
                TypeSystemDefinition::Directive(directive_definition) => {
                    composed_schema.directives.insert(
                        directive_definition.node.name.node.clone(),
                        convert_directive_definition(directive_definition.node),
                    );
                },
            }
        }

        for type_extension in type_extensions {
            extend_type(&mut composed_schema, type_extension)?;
        }

        finish_schema(&mut composed_schema)?;
        check_references(&composed_schema)?;
        tracing::debug!(types = composed_schema.types.len(), "Schema composed.");
        Ok(composed_schema)
    }

    #[inline]
    pub fn query_type(&self) -> &str {
        self.query_type.as_ref().map(|name| name.as_str()).unwrap_or("Query")
    }

    #[inline]
    pub fn mutation_type(&self) -> Option<&str> {
        self.mutation_type.as_ref().map(|name| name.as_str())
    }

    #[inline]
    pub fn subscription_type(&self) -> Option<&str> {
        self.subscription_type.as_ref().map(|name| name.as_str())
    }

    #[inline]
    pub fn get_type(&self, ty: &Type) -> Option<&MetaType> {
        self.types.get(ty.concrete_typename())
    }

    /// Object types an abstract type can resolve to. An object resolves to itself.
    pub fn possible_objects<'a>(&'a self, ty: &'a MetaType) -> impl Iterator<Item = &'a MetaType> + 'a {
        let names: Box<dyn Iterator<Item = &'a Name> + 'a> = match ty.kind {
            TypeKind::Interface | TypeKind::Union => Box::new(ty.possible_types.iter()),
            TypeKind::Object => Box::new(std::iter::once(&ty.name)),
            TypeKind::Scalar | TypeKind::Enum | TypeKind::InputObject => Box::new(std::iter::empty()),
        };
        names
            .filter_map(|name| self.types.get(name))
            .filter(|ty| ty.kind == TypeKind::Object)
    }
}

fn convert_schema_definition(composed_schema: &mut ComposedSchema, schema_definition: SchemaDefinition) {
    if let Some(query) = schema_definition.query {
        composed_schema.query_type = Some(query.node);
    }
    if let Some(mutation) = schema_definition.mutation {
        composed_schema.mutation_type = Some(mutation.node);
    }
    if let Some(subscription) = schema_definition.subscription {
        composed_schema.subscription_type = Some(subscription.node);
    }
}

fn convert_type_definition(definition: TypeDefinition) -> Result<MetaType, SchemaError> {
    let type_name = definition.name.node.clone();
    let mut type_definition = MetaType::new(definition.name.node, TypeKind::Scalar);
    type_definition.description = definition.description.map(|description| description.node);

    match definition.kind {
        types::TypeKind::Scalar => type_definition.kind = TypeKind::Scalar,
        types::TypeKind::Object(ObjectType { implements, fields }) => {
            type_definition.kind = TypeKind::Object;
            type_definition.implements = implements.into_iter().map(|implement| implement.node).collect();
            for field in fields {
                insert_unique(
                    &type_name,
                    &mut type_definition.fields,
                    field.node.name.node.clone(),
                    convert_field_definition(field.node),
                )?;
            }
        },
        types::TypeKind::Interface(InterfaceType { implements, fields }) => {
            type_definition.kind = TypeKind::Interface;
            type_definition.implements = implements.into_iter().map(|name| name.node).collect();
            for field in fields {
                insert_unique(
                    &type_name,
                    &mut type_definition.fields,
                    field.node.name.node.clone(),
                    convert_field_definition(field.node),
                )?;
            }
        },
        types::TypeKind::Union(UnionType { members }) => {
            type_definition.kind = TypeKind::Union;
            type_definition.possible_types = members.into_iter().map(|name| name.node).collect();
        },
        types::TypeKind::Enum(EnumType { values }) => {
            type_definition.kind = TypeKind::Enum;
            for value in values {
                let name = value.node.value.node.clone();
                insert_unique(&type_name, &mut type_definition.enum_values, name, MetaEnumValue {
                    description: value.node.description.map(|description| description.node),
                    value: value.node.value.node,
                    deprecation: get_deprecated(&value.node.directives),
                    directives: convert_directives(value.node.directives),
                    extensions: Default::default(),
                })?;
            }
        },
        types::TypeKind::InputObject(InputObjectType { fields }) => {
            type_definition.kind = TypeKind::InputObject;
            for field in fields {
                insert_unique(
                    &type_name,
                    &mut type_definition.input_fields,
                    field.node.name.node.clone(),
                    convert_input_value_definition(field.node),
                )?;
            }
        },
    }

    type_definition.specified_by_url = definition
        .directives
        .iter()
        .find(|directive| directive.node.name.node.as_str() == "specifiedBy")
        .and_then(|directive| get_argument_str(&directive.node, "url"))
        .map(ToString::to_string);
    type_definition.directives = convert_directives(definition.directives);
    Ok(type_definition)
}

fn extend_type(composed_schema: &mut ComposedSchema, definition: TypeDefinition) -> Result<(), SchemaError> {
    let extension = convert_type_definition(definition)?;
    let meta_type = composed_schema
        .types
        .get_mut(&extension.name)
        .ok_or_else(|| SchemaError::ExtendUndefinedType {
            type_name: extension.name.to_string(),
        })?;
    if meta_type.kind != extension.kind {
        return Err(SchemaError::ExtendKindConflicted {
            type_name: extension.name.to_string(),
        });
    }

    meta_type.implements.extend(extension.implements);
    meta_type.possible_types.extend(extension.possible_types);
    meta_type.directives.extend(extension.directives);
    for (name, field) in extension.fields {
        insert_unique(&extension.name, &mut meta_type.fields, name, field)?;
    }
    for (name, value) in extension.enum_values {
        insert_unique(&extension.name, &mut meta_type.enum_values, name, value)?;
    }
    for (name, field) in extension.input_fields {
        insert_unique(&extension.name, &mut meta_type.input_fields, name, field)?;
    }
    Ok(())
}

fn insert_unique<T>(type_name: &str, map: &mut IndexMap<Name, T>, name: Name, value: T) -> Result<(), SchemaError> {
    if map.contains_key(&name) {
        return Err(SchemaError::DuplicateField {
            type_name: type_name.to_string(),
            field_name: name.to_string(),
        });
    }
    map.insert(name, value);
    Ok(())
}

fn convert_field_definition(definition: types::FieldDefinition) -> MetaField {
    MetaField {
        description: definition.description.map(|description| description.node),
        name: definition.name.node,
        arguments: definition
            .arguments
            .into_iter()
            .map(|arg| (arg.node.name.node.clone(), convert_input_value_definition(arg.node)))
            .collect(),
        ty: definition.ty.node,
        deprecation: get_deprecated(&definition.directives),
        directives: convert_directives(definition.directives),
        extensions: Default::default(),
    }
}

fn convert_input_value_definition(arg: types::InputValueDefinition) -> MetaInputValue {
    MetaInputValue {
        description: arg.description.map(|description| description.node),
        name: arg.name.node,
        ty: arg.ty.node,
        default_value: arg.default_value.map(|default_value| default_value.node),
        deprecation: get_deprecated(&arg.directives),
        directives: convert_directives(arg.directives),
        extensions: Default::default(),
    }
}

fn convert_directive_definition(directive_definition: DirectiveDefinition) -> MetaDirective {
    MetaDirective {
        name: directive_definition.name.node,
        description: directive_definition
            .description
            .map(|directive_definition| directive_definition.node),
        locations: directive_definition
            .locations
            .into_iter()
            .map(|location| location.node)
            .collect(),
        arguments: directive_definition
            .arguments
            .into_iter()
            .map(|arg| (arg.node.name.node.clone(), convert_input_value_definition(arg.node)))
            .collect(),
        is_repeatable: directive_definition.is_repeatable,
    }
}

fn convert_directives(directives: Vec<Positioned<ConstDirective>>) -> Vec<AppliedDirective> {
    directives
        .into_iter()
        .map(|directive| AppliedDirective {
            name: directive.node.name.node,
            arguments: directive
                .node
                .arguments
                .into_iter()
                .map(|(name, value)| (name.node, value.node))
                .collect(),
        })
        .collect()
}

fn get_argument_str<'a>(directive: &'a ConstDirective, name: &str) -> Option<&'a str> {
    directive
        .get_argument(name)
        .and_then(|value| match &value.node {
            ConstValue::String(s) => Some(s.as_str()),
            _ => None,
        })
}

fn get_deprecated(directives: &[Positioned<ConstDirective>]) -> Deprecation {
    directives
        .iter()
        .find(|directive| directive.node.name.node.as_str() == "deprecated")
        .map(|directive| Deprecation::Deprecated {
            reason: get_argument_str(&directive.node, "reason").map(ToString::to_string),
        })
        .unwrap_or(Deprecation::NoDeprecated)
}

fn finish_schema(composed_schema: &mut ComposedSchema) -> Result<(), SchemaError> {
    for definition in parser::parse_schema(include_str!("builtin.graphql"))?.definitions {
        match definition {
            TypeSystemDefinition::Type(type_definition) => {
                let type_definition = convert_type_definition(type_definition.node)?;
                composed_schema
                    .types
                    .entry(type_definition.name.clone())
                    .or_insert(type_definition);
            },
            TypeSystemDefinition::Directive(directive_definition) => {
                composed_schema
                    .directives
                    .entry(directive_definition.node.name.node.clone())
                    .or_insert_with(|| convert_directive_definition(directive_definition.node));
            },
            TypeSystemDefinition::Schema(_) => {},
        }
    }

    if composed_schema.query_type.is_none() {
        composed_schema.query_type = Some(Name::new("Query"));
    }
    if composed_schema.mutation_type.is_none() && composed_schema.types.contains_key("Mutation") {
        composed_schema.mutation_type = Some(Name::new("Mutation"));
    }
    if composed_schema.subscription_type.is_none() && composed_schema.types.contains_key("Subscription") {
        composed_schema.subscription_type = Some(Name::new("Subscription"));
    }

    let query_type_name = composed_schema.query_type().to_string();
    let query_type = composed_schema
        .types
        .get_mut(query_type_name.as_str())
        .filter(|ty| ty.kind == TypeKind::Object)
        .ok_or(SchemaError::MissingQueryRoot {
            type_name: query_type_name.clone(),
        })?;

    let name = Name::new("__type");
    query_type.fields.insert(name.clone(), MetaField {
        description: None,
        name,
        arguments: {
            let mut arguments = IndexMap::new();
            let name = Name::new("name");
            arguments.insert(name.clone(), MetaInputValue {
                description: None,
                name,
                ty: Type::new("String!").expect("valid type literal"),
                default_value: None,
                deprecation: Deprecation::NoDeprecated,
                directives: Vec::new(),
                extensions: Default::default(),
            });
            arguments
        },
        ty: Type::new("__Type").expect("valid type literal"),
        deprecation: Deprecation::NoDeprecated,
        directives: Vec::new(),
        extensions: Default::default(),
    });

    let name = Name::new("__schema");
    query_type.fields.insert(name.clone(), MetaField {
        description: None,
        name,
        arguments: Default::default(),
        ty: Type::new("__Schema!").expect("valid type literal"),
        deprecation: Deprecation::NoDeprecated,
        directives: Vec::new(),
        extensions: Default::default(),
    });

    let mut possible_types: IndexMap<Name, IndexSet<Name>> = Default::default();
    for ty in composed_schema.types.values() {
        if ty.kind == TypeKind::Object {
            for implement in &ty.implements {
                possible_types
                    .entry(implement.clone())
                    .or_default()
                    .insert(ty.name.clone());
            }
        }
    }
    for (name, types) in possible_types {
        if let Some(ty) = composed_schema.types.get_mut(&name) {
            if ty.kind == TypeKind::Interface {
                ty.possible_types = types;
            }
        }
    }

    Ok(())
}

fn check_references(composed_schema: &ComposedSchema) -> Result<(), SchemaError> {
    let ensure_defined = |ty: &Type, referenced_by: String| {
        if composed_schema.get_type(ty).is_none() {
            return Err(SchemaError::UnknownType {
                type_name: ty.concrete_typename().to_string(),
                referenced_by,
            });
        }
        Ok(())
    };
    let ensure_kind = |owner: &Name, member: &Name, kind: TypeKind, expected: &'static str| {
        match composed_schema.types.get(member) {
            Some(ty) if ty.kind == kind => Ok(()),
            _ => Err(SchemaError::InvalidMember {
                type_name: owner.to_string(),
                member: member.to_string(),
                expected,
            }),
        }
    };

    for ty in composed_schema.types.values() {
        for field in ty.fields.values() {
            ensure_defined(&field.ty, format!("{}.{}", ty.name, field.name))?;
            for arg in field.arguments.values() {
                ensure_defined(&arg.ty, format!("{}.{}({}:)", ty.name, field.name, arg.name))?;
            }
        }
        for field in ty.input_fields.values() {
            ensure_defined(&field.ty, format!("{}.{}", ty.name, field.name))?;
        }
        for implement in &ty.implements {
            ensure_kind(&ty.name, implement, TypeKind::Interface, "interface")?;
        }
        if ty.kind == TypeKind::Union {
            for member in &ty.possible_types {
                ensure_kind(&ty.name, member, TypeKind::Object, "object")?;
            }
        }
    }

    for directive in composed_schema.directives.values() {
        for arg in directive.arguments.values() {
            ensure_defined(&arg.ty, format!("@{}({}:)", directive.name, arg.name))?;
        }
    }

    Ok(())
}
