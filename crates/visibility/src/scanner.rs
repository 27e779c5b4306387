use publicgate_schema::{ComposedSchema, TypeKind};
use value::Name;

use crate::{
    marker::{is_marked_private, Declaration},
    registry::{VisibilityRegistry, UNOWNED},
};

/// Builds the registry of private declarations for `schema`.
///
/// Introspection types are never scanned. Arguments are recorded under the name of the field
/// declaring them.
#[tracing::instrument(skip_all, level = "debug")]
pub fn scan(schema: &ComposedSchema) -> VisibilityRegistry {
    let mut registry = VisibilityRegistry::default();

    for ty in schema.types.values() {
        if ty.is_introspection() {
            continue;
        }

        register(&mut registry, ty, None);

        match ty.kind {
            TypeKind::Object | TypeKind::Interface => {
                for field in ty.fields.values() {
                    register(&mut registry, field, Some(&ty.name));
                    for arg in field.arguments.values() {
                        register(&mut registry, arg, Some(&field.name));
                    }
                }
            },
            TypeKind::InputObject => {
                for field in ty.input_fields.values() {
                    register(&mut registry, field, Some(&ty.name));
                }
            },
            TypeKind::Enum => {
                for enum_value in ty.enum_values.values() {
                    register(&mut registry, enum_value, Some(&ty.name));
                }
            },
            TypeKind::Scalar | TypeKind::Union => {},
        }
    }

    tracing::debug!(private = registry.len(), "Schema scanned.");
    registry
}

fn register<D: Declaration>(registry: &mut VisibilityRegistry, declaration: &D, owner: Option<&Name>) {
    if is_marked_private(declaration) {
        let owner = owner.cloned().unwrap_or_else(|| Name::new(UNOWNED));
        registry.push(owner, declaration.name().clone());
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::registry::PrivateFieldRecord;

    fn records(sdl: &str) -> Vec<(String, String)> {
        let schema = ComposedSchema::parse(sdl).unwrap();
        scan(&schema)
            .records()
            .iter()
            .map(|PrivateFieldRecord { type_name, field_name }| (type_name.to_string(), field_name.to_string()))
            .collect()
    }

    fn pair(type_name: &str, field_name: &str) -> (String, String) {
        (type_name.to_string(), field_name.to_string())
    }

    #[test]
    fn every_declaration_kind_is_scanned() {
        let found = records(
            r#"
            directive @private on OBJECT | FIELD_DEFINITION | ARGUMENT_DEFINITION | INPUT_FIELD_DEFINITION | ENUM_VALUE | SCALAR | UNION | ENUM | INTERFACE | INPUT_OBJECT

            type Query {
                user(id: ID!, debug: Boolean @private): User
                node: Node
            }

            interface Node {
                id: ID!
                internalId: ID @private
            }

            type User implements Node {
                id: ID!
                internalId: ID
                ssn: String @private
            }

            type Audit @private {
                id: ID!
            }

            union Entity @private = User | Audit

            enum Role {
                ADMIN @private
                USER
            }

            input UserFilter {
                name: String
                score: Int @private
            }

            scalar Secret @private
            "#,
        );

        assert_eq!(found, vec![
            pair("user", "debug"),
            pair("Node", "internalId"),
            pair("User", "ssn"),
            pair(UNOWNED, "Audit"),
            pair(UNOWNED, "Entity"),
            pair("Role", "ADMIN"),
            pair("UserFilter", "score"),
            pair(UNOWNED, "Secret"),
        ]);
    }

    #[test]
    fn unmarked_schema_yields_empty_registry() {
        let found = records(
            r#"
            type Query {
                user: User
            }

            type User {
                id: ID! @deprecated
            }
            "#,
        );
        assert!(found.is_empty());
    }

    #[test]
    fn extension_flag_is_honored() {
        let mut schema = ComposedSchema::parse("type Query { a: Int b: Int }").unwrap();
        schema.types["Query"].fields["b"].extensions.is_private = true;

        let registry = scan(&schema);
        assert!(registry.is_private("Query", "b"));
        assert!(!registry.is_private("Query", "a"));
        assert_eq!(registry.len(), 1);
    }
}
