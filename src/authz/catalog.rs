use std::collections::{HashMap, HashSet};

/// Role → permission-set mapping. The single source of truth for what each
/// role can do; built once by the loader and immutable afterwards.
#[derive(Debug, Default)]
pub struct PermissionCatalog {
    grants: HashMap<String, HashSet<String>>,
    empty: HashSet<String>,
}

impl PermissionCatalog {
    pub fn new(grants: HashMap<String, HashSet<String>>) -> Self {
        Self {
            grants,
            empty: HashSet::new(),
        }
    }

    /// Permissions held by `role`. Never fails: an unknown role yields the
    /// empty set, so lookups always fail closed.
    pub fn permissions_for(&self, role: &str) -> &HashSet<String> {
        self.grants.get(role).unwrap_or(&self.empty)
    }

    /// Whether any role grants `permission`. Used by the loader to warn
    /// about route requirements no role can ever satisfy.
    pub fn grants_permission(&self, permission: &str) -> bool {
        self.grants.values().any(|set| set.contains(permission))
    }

    pub fn role_count(&self) -> usize {
        self.grants.len()
    }
}
