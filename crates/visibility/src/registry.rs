use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, PoisonError, RwLock},
};

use value::Name;

/// Owner recorded for a whole type marked private; such a type has no enclosing declaration.
pub const UNOWNED: &str = "undefined";

/// One private declaration.
///
/// `type_name` is the owning object, interface or input type for fields and input fields,
/// the enum for enum values, the *field* for arguments and [`UNOWNED`] for whole types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrivateFieldRecord {
    pub type_name: Name,
    pub field_name: Name,
}

#[derive(Debug, Default)]
pub struct VisibilityRegistry {
    records: Vec<PrivateFieldRecord>,
    by_owner: HashMap<Name, HashSet<Name>>,
}

impl VisibilityRegistry {
    pub fn push(&mut self, type_name: Name, field_name: Name) {
        self.by_owner
            .entry(type_name.clone())
            .or_default()
            .insert(field_name.clone());
        self.records.push(PrivateFieldRecord { type_name, field_name });
    }

    /// Whether `member` is registered under `type_name`, in the same order as
    /// [`PrivateFieldRecord`].
    #[inline]
    pub fn is_private(&self, type_name: &str, member: &str) -> bool {
        self.by_owner
            .get(type_name)
            .map_or(false, |members| members.contains(member))
    }

    /// Private members registered under `type_name`, if any.
    #[inline]
    pub fn members_of(&self, type_name: &str) -> Option<&HashSet<Name>> {
        self.by_owner.get(type_name)
    }

    /// Records in scan order.
    pub fn records(&self) -> &[PrivateFieldRecord] {
        &self.records
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Handle to the registry of the current schema version.
///
/// Readers take an immutable snapshot; a rescan swaps in a complete new registry, so a
/// partially built registry is never observed.
#[derive(Debug, Clone, Default)]
pub struct SharedRegistry(Arc<RwLock<Arc<VisibilityRegistry>>>);

impl SharedRegistry {
    pub fn snapshot(&self) -> Arc<VisibilityRegistry> {
        self.0.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn replace(&self, registry: VisibilityRegistry) {
        *self.0.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(registry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_by_pair() {
        let mut registry = VisibilityRegistry::default();
        registry.push(Name::new("User"), Name::new("ssn"));
        registry.push(Name::new("User"), Name::new("ssn"));

        assert!(registry.is_private("User", "ssn"));
        assert!(!registry.is_private("Post", "ssn"));
        assert!(!registry.is_private("User", "id"));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.members_of("User").map(HashSet::len), Some(1));
    }

    #[test]
    fn replace_swaps_whole_snapshot() {
        let shared = SharedRegistry::default();
        let before = shared.snapshot();

        let mut registry = VisibilityRegistry::default();
        registry.push(Name::new("User"), Name::new("ssn"));
        shared.replace(registry);

        assert!(before.is_empty());
        assert!(shared.snapshot().is_private("User", "ssn"));

        shared.replace(VisibilityRegistry::default());
        assert!(shared.snapshot().is_empty());
    }
}
