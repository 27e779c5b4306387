use indexmap::IndexMap;
use value::{ConstValue, Name};

use crate::registry::VisibilityRegistry;

/// Member lists of a `__Type` descriptor, filtered by `(member name, type name)`.
const MEMBER_LISTS: [&str; 3] = ["fields", "inputFields", "enumValues"];

/// Removes private members from an introspection result.
///
/// Every object carrying a string `name` is treated as a type descriptor, wherever it appears in
/// the tree (`__schema.types`, `__type`, `ofType`, `interfaces`, ...). Its `fields`, `inputFields`
/// and `enumValues` lose the entries registered under that type, and the `args` of each kept
/// field lose the entries registered under the field. Applying it twice is the same as once.
///
/// Returns the number of entries removed.
pub fn redact(registry: &VisibilityRegistry, data: &mut ConstValue) -> usize {
    if registry.is_empty() {
        return 0;
    }
    redact_value(registry, data)
}

fn redact_value(registry: &VisibilityRegistry, value: &mut ConstValue) -> usize {
    match value {
        ConstValue::Object(object) => {
            let mut removed = redact_descriptor(registry, object);
            for value in object.values_mut() {
                removed += redact_value(registry, value);
            }
            removed
        },
        ConstValue::List(values) => values.iter_mut().map(|value| redact_value(registry, value)).sum(),
        _ => 0,
    }
}

fn redact_descriptor(registry: &VisibilityRegistry, descriptor: &mut IndexMap<Name, ConstValue>) -> usize {
    let type_name = match descriptor.get("name") {
        Some(ConstValue::String(name)) => name.clone(),
        _ => return 0,
    };

    let mut removed = 0;
    for key in MEMBER_LISTS {
        if let Some(ConstValue::List(members)) = descriptor.get_mut(key) {
            removed += retain_public(members, |member| registry.is_private(&type_name, member));
        }
    }

    if let Some(ConstValue::List(fields)) = descriptor.get_mut("fields") {
        for field in fields {
            let ConstValue::Object(field) = field else { continue };
            let Some(ConstValue::String(field_name)) = field.get("name").cloned() else {
                continue;
            };
            if let Some(ConstValue::List(args)) = field.get_mut("args") {
                removed += retain_public(args, |arg| registry.is_private(&field_name, arg));
            }
        }
    }

    removed
}

fn retain_public(members: &mut Vec<ConstValue>, is_private: impl Fn(&str) -> bool) -> usize {
    let before = members.len();
    members.retain(|member| match member {
        ConstValue::Object(member) => match member.get("name") {
            Some(ConstValue::String(name)) => !is_private(name),
            _ => true,
        },
        _ => true,
    });
    before - members.len()
}
