use std::collections::{HashMap, HashSet};
use std::path::Path;

use crate::authz::catalog::PermissionCatalog;
use crate::authz::errors::AuthzError;
use crate::authz::policy::parse_kdl_document;
use crate::authz::table::RouteTable;
use crate::authz::types::ParsedPolicy;
use crate::authz::AccessControl;

/// Load all `.kdl` policy files from the given directory and compile them
/// into a single immutable `AccessControl`.
pub fn load_policies(dir: &Path) -> Result<AccessControl, AuthzError> {
    if !dir.is_dir() {
        return Err(AuthzError::InvalidPolicy(format!(
            "policies directory `{}` does not exist or is not a directory",
            dir.display()
        )));
    }

    let mut all_parsed = Vec::new();
    let mut file_count = 0;

    let mut entries: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .map(|ext| ext == "kdl")
                .unwrap_or(false)
        })
        .collect();
    entries.sort_by_key(|e| e.path());

    for entry in entries {
        let path = entry.path();
        let contents =
            std::fs::read_to_string(&path).map_err(|source| AuthzError::PolicyLoadError {
                path: path.display().to_string(),
                source,
            })?;
        let parsed = parse_kdl_document(&contents)?;
        all_parsed.push(parsed);
        file_count += 1;
    }

    let state = compile_policies(all_parsed)?;

    tracing::info!(
        files = file_count,
        roles = state.catalog.role_count(),
        routes = state.routes.len(),
        "Loaded authorization policies"
    );

    Ok(state)
}

/// Merge and compile all parsed policies into a single `AccessControl`.
pub fn compile_policies(parsed: Vec<ParsedPolicy>) -> Result<AccessControl, AuthzError> {
    let mut grants: HashMap<String, HashSet<String>> = HashMap::new();
    let mut routes = Vec::new();

    // Merge: a role declared in several files gets the union of its
    // permission lists, so the result is independent of file ordering.
    for p in parsed {
        for role in p.roles {
            grants
                .entry(role.name)
                .or_default()
                .extend(role.permissions);
        }
        routes.extend(p.routes);
    }

    let catalog = PermissionCatalog::new(grants);
    let table = RouteTable::build(routes)?;

    warn_unknown_permissions(&catalog, &table);

    Ok(AccessControl {
        catalog,
        routes: table,
    })
}

/// A route requiring a permission that no role grants can never be
/// satisfied. Not fatal (the route simply denies everyone), but worth an
/// operator-visible warning.
fn warn_unknown_permissions(catalog: &PermissionCatalog, table: &RouteTable) {
    for entry in table.entries() {
        for permission in &entry.permissions {
            if !catalog.grants_permission(permission) {
                let route = format!("{} {}", entry.method, entry.template);
                tracing::warn!(
                    permission = permission.as_str(),
                    route = route.as_str(),
                    "route requires a permission no role grants"
                );
            }
        }
    }
}
