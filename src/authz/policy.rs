use crate::authz::errors::AuthzError;
use crate::authz::types::*;
use kdl::KdlDocument;

/// Parse a KDL policy document into typed role and route declarations.
pub fn parse_kdl_document(source: &str) -> Result<ParsedPolicy, AuthzError> {
    let doc: KdlDocument = source
        .parse()
        .map_err(|e: kdl::KdlError| AuthzError::KdlParse(e.to_string()))?;

    let mut policy = ParsedPolicy::default();

    for node in doc.nodes() {
        match node.name().value() {
            "role" => {
                let name = first_string_arg(node).ok_or_else(|| {
                    AuthzError::InvalidPolicy(
                        "role node requires a string argument (e.g. role \"controller\")".into(),
                    )
                })?;

                let mut permissions = Vec::new();

                if let Some(children) = node.children() {
                    for child in children.nodes() {
                        match child.name().value() {
                            "permissions" => {
                                permissions = dash_list(child);
                            }
                            other => {
                                return Err(AuthzError::InvalidPolicy(format!(
                                    "unexpected child `{other}` in role `{name}` (expected `permissions`)"
                                )));
                            }
                        }
                    }
                }

                policy.roles.push(RoleDef { name, permissions });
            }
            "route" => {
                let args = string_args(node);
                let [method, template] = args.as_slice() else {
                    return Err(AuthzError::InvalidPolicy(
                        "route node requires method and template arguments (e.g. route \"GET\" \"/api/orders\")"
                            .into(),
                    ));
                };

                let mut permissions = Vec::new();

                if let Some(children) = node.children() {
                    for child in children.nodes() {
                        match child.name().value() {
                            "permissions" => {
                                permissions = dash_list(child);
                            }
                            other => {
                                return Err(AuthzError::InvalidPolicy(format!(
                                    "unexpected child `{other}` in route `{method} {template}` (expected `permissions`)"
                                )));
                            }
                        }
                    }
                }

                policy.routes.push(RouteSpec {
                    method: method.clone(),
                    template: template.clone(),
                    permissions,
                });
            }
            other => {
                // Ignore comments and unknown top-level nodes with a warning
                tracing::warn!("ignoring unknown top-level KDL node `{other}`");
            }
        }
    }

    Ok(policy)
}

/// Extract the first string argument from a KDL node.
fn first_string_arg(node: &kdl::KdlNode) -> Option<String> {
    node.entries()
        .iter()
        .find(|e| e.name().is_none())
        .and_then(|e| e.value().as_string())
        .map(|s| s.to_string())
}

/// Extract all positional string arguments from a KDL node.
fn string_args(node: &kdl::KdlNode) -> Vec<String> {
    node.entries()
        .iter()
        .filter(|e| e.name().is_none())
        .filter_map(|e| e.value().as_string())
        .map(|s| s.to_string())
        .collect()
}

/// Extract dash-list children: nodes named "-" whose first argument is a string.
/// Example KDL:
/// ```kdl
/// permissions {
///     - "ai.view"
///     - "ai.admin"
/// }
/// ```
fn dash_list(node: &kdl::KdlNode) -> Vec<String> {
    let Some(children) = node.children() else {
        return Vec::new();
    };
    children
        .nodes()
        .iter()
        .filter(|n| n.name().value() == "-")
        .filter_map(first_string_arg)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_role() {
        let kdl = r#"
role "controller" {
    permissions {
        - "ai.view"
        - "reports.view"
    }
}
"#;
        let policy = parse_kdl_document(kdl).unwrap();
        assert_eq!(policy.roles.len(), 1);
        let role = &policy.roles[0];
        assert_eq!(role.name, "controller");
        assert_eq!(role.permissions, vec!["ai.view", "reports.view"]);
    }

    #[test]
    fn test_parse_role_without_permissions() {
        let kdl = r#"role "guest""#;
        let policy = parse_kdl_document(kdl).unwrap();
        assert_eq!(policy.roles.len(), 1);
        assert!(policy.roles[0].permissions.is_empty());
    }

    #[test]
    fn test_parse_route() {
        let kdl = r#"
route "GET" "/api/ai/reports" {
    permissions {
        - "ai.view"
        - "ai.admin"
    }
}
"#;
        let policy = parse_kdl_document(kdl).unwrap();
        assert_eq!(policy.routes.len(), 1);
        let route = &policy.routes[0];
        assert_eq!(route.method, "GET");
        assert_eq!(route.template, "/api/ai/reports");
        assert_eq!(route.permissions, vec!["ai.view", "ai.admin"]);
    }

    #[test]
    fn test_parse_public_route() {
        let kdl = r#"route "GET" "/api/health""#;
        let policy = parse_kdl_document(kdl).unwrap();
        assert_eq!(policy.routes.len(), 1);
        assert!(policy.routes[0].permissions.is_empty());
    }

    #[test]
    fn test_parse_full_policy() {
        let kdl = r#"
role "controller" {
    permissions {
        - "ai.view"
    }
}

role "admin" {
    permissions {
        - "ai.view"
        - "ai.admin"
    }
}

route "GET" "/api/health"
route "GET" "/api/ai/reports" {
    permissions {
        - "ai.view"
    }
}
route "GET" "/api/ai/*" {
    permissions {
        - "ai.admin"
    }
}
"#;
        let policy = parse_kdl_document(kdl).unwrap();
        assert_eq!(policy.roles.len(), 2);
        assert_eq!(policy.routes.len(), 3);
    }

    #[test]
    fn test_parse_route_missing_template() {
        let kdl = r#"route "GET""#;
        let err = parse_kdl_document(kdl).unwrap_err();
        assert!(matches!(err, AuthzError::InvalidPolicy(_)));
    }

    #[test]
    fn test_parse_role_missing_name() {
        let kdl = "role";
        let err = parse_kdl_document(kdl).unwrap_err();
        assert!(matches!(err, AuthzError::InvalidPolicy(_)));
    }

    #[test]
    fn test_parse_unexpected_child_rejected() {
        let kdl = r#"
role "controller" {
    grants {
        - "ai.view"
    }
}
"#;
        let err = parse_kdl_document(kdl).unwrap_err();
        assert!(matches!(err, AuthzError::InvalidPolicy(_)));
    }

    #[test]
    fn test_parse_invalid_kdl() {
        let err = parse_kdl_document("role \"unclosed").unwrap_err();
        assert!(matches!(err, AuthzError::KdlParse(_)));
    }
}
