use std::collections::HashSet;

use parser::{
    types::{DocumentOperations, ExecutableDocument, OperationDefinition, Selection, SelectionSet},
    Positioned,
};

use crate::ServerError;

/// Picks the operation a request asks for.
pub fn select_operation<'a>(
    document: &'a ExecutableDocument,
    operation_name: Option<&str>,
) -> Result<&'a Positioned<OperationDefinition>, ServerError> {
    match (&document.operations, operation_name) {
        (DocumentOperations::Single(operation), _) => Ok(operation),
        (DocumentOperations::Multiple(operations), Some(name)) => operations
            .get(name)
            .ok_or_else(|| ServerError::new(format!("Unknown operation named \"{}\".", name))),
        (DocumentOperations::Multiple(operations), None) if operations.len() == 1 => operations
            .values()
            .next()
            .ok_or_else(|| ServerError::new("Operation name required in request.")),
        (DocumentOperations::Multiple(_), None) => Err(ServerError::new("Operation name required in request.")),
    }
}

/// Whether every root selection of the requested operation, fragments included, is `__schema`,
/// `__type` or `__typename`.
pub fn is_introspection_operation(document: &ExecutableDocument, operation_name: Option<&str>) -> bool {
    match select_operation(document, operation_name) {
        Ok(operation) => {
            is_introspection_selection_set(document, &operation.node.selection_set.node, &mut HashSet::new())
        },
        Err(_) => false,
    }
}

/// Response keys of the root `__schema` and `__type` selections of the requested operation,
/// fragments included. Data fields selected next to them are not listed.
pub fn introspection_response_keys<'a>(document: &'a ExecutableDocument, operation_name: Option<&str>) -> Vec<&'a str> {
    let mut keys = Vec::new();
    if let Ok(operation) = select_operation(document, operation_name) {
        collect_introspection_keys(document, &operation.node.selection_set.node, &mut HashSet::new(), &mut keys);
    }
    keys
}

fn collect_introspection_keys<'a>(
    document: &'a ExecutableDocument,
    selection_set: &'a SelectionSet,
    visited: &mut HashSet<&'a str>,
    keys: &mut Vec<&'a str>,
) {
    for selection in &selection_set.items {
        match &selection.node {
            Selection::Field(field) => {
                if matches!(field.node.name.node.as_str(), "__schema" | "__type") {
                    let key = field.node.response_key().node.as_str();
                    if !keys.contains(&key) {
                        keys.push(key);
                    }
                }
            },
            Selection::FragmentSpread(fragment_spread) => {
                let name = fragment_spread.node.fragment_name.node.as_str();
                if !visited.insert(name) {
                    continue;
                }
                if let Some(fragment) = document.fragments.get(name) {
                    collect_introspection_keys(document, &fragment.node.selection_set.node, visited, keys);
                }
            },
            Selection::InlineFragment(inline_fragment) => {
                collect_introspection_keys(document, &inline_fragment.node.selection_set.node, visited, keys)
            },
        }
    }
}

fn is_introspection_selection_set<'a>(
    document: &'a ExecutableDocument,
    selection_set: &'a SelectionSet,
    visited: &mut HashSet<&'a str>,
) -> bool {
    selection_set.items.iter().all(|selection| match &selection.node {
        Selection::Field(field) => matches!(field.node.name.node.as_str(), "__schema" | "__type" | "__typename"),
        Selection::FragmentSpread(fragment_spread) => {
            let name = fragment_spread.node.fragment_name.node.as_str();
            if !visited.insert(name) {
                return true;
            }
            match document.fragments.get(name) {
                Some(fragment) => is_introspection_selection_set(document, &fragment.node.selection_set.node, visited),
                None => false,
            }
        },
        Selection::InlineFragment(inline_fragment) => {
            is_introspection_selection_set(document, &inline_fragment.node.selection_set.node, visited)
        },
    })
}
