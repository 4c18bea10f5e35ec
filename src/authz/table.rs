use std::collections::{HashMap, HashSet};

use axum::http::Method;

use crate::authz::errors::AuthzError;
use crate::authz::pattern::Pattern;
use crate::authz::types::RouteSpec;

/// A single compiled entry of the route table.
#[derive(Debug, Clone)]
pub struct RouteEntry {
    pub method: Method,
    pub template: String,
    pub pattern: Pattern,
    /// ANY-of permission requirement; empty means explicitly public.
    pub permissions: Vec<String>,
}

/// Immutable, process-wide collection of route patterns.
///
/// Exact templates live in a hash map keyed by the literal `"METHOD /path"`
/// string so the common case resolves in O(1). Parameterized and wildcard
/// templates are kept in a vector sorted most-specific-first at build time,
/// which makes resolution independent of declaration order.
#[derive(Debug, Default)]
pub struct RouteTable {
    exact: HashMap<String, RouteEntry>,
    dynamic: Vec<RouteEntry>,
}

impl RouteTable {
    /// Compile and validate route declarations. Duplicate (method, template)
    /// pairs are a configuration error and fail fast.
    pub fn build(specs: Vec<RouteSpec>) -> Result<RouteTable, AuthzError> {
        let mut seen: HashSet<(Method, String)> = HashSet::new();
        let mut exact = HashMap::new();
        let mut dynamic = Vec::new();

        for spec in specs {
            let method = parse_method(&spec.method)?;
            let pattern = Pattern::compile(&spec.template)?;

            if !seen.insert((method.clone(), spec.template.clone())) {
                return Err(AuthzError::DuplicateRoute {
                    method: method.to_string(),
                    template: spec.template,
                });
            }

            let entry = RouteEntry {
                method,
                template: spec.template,
                pattern,
                permissions: spec.permissions,
            };

            if entry.pattern.is_exact() {
                exact.insert(exact_key(&entry.method, &entry.template), entry);
            } else {
                dynamic.push(entry);
            }
        }

        // Most-specific-first: more literal segments, then non-wildcard over
        // wildcard, then more total segments. Template order is the final
        // deterministic tie-break.
        dynamic.sort_by(|a, b| {
            let ka = (
                a.pattern.literal_segments(),
                !a.pattern.has_wildcard(),
                a.pattern.segment_count(),
            );
            let kb = (
                b.pattern.literal_segments(),
                !b.pattern.has_wildcard(),
                b.pattern.segment_count(),
            );
            kb.cmp(&ka).then_with(|| a.template.cmp(&b.template))
        });

        Ok(RouteTable { exact, dynamic })
    }

    /// Find the entry governing `method` + `path`, or `None` if no route is
    /// declared for it. Exact matches always win; dynamic entries are tested
    /// in specificity order.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<&RouteEntry> {
        if let Some(entry) = self.exact.get(&exact_key(method, path)) {
            return Some(entry);
        }
        self.dynamic
            .iter()
            .find(|entry| entry.method == *method && entry.pattern.matches(path))
    }

    /// All entries, exact and dynamic, in no particular order.
    pub fn entries(&self) -> impl Iterator<Item = &RouteEntry> {
        self.exact.values().chain(self.dynamic.iter())
    }

    pub fn len(&self) -> usize {
        self.exact.len() + self.dynamic.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exact.is_empty() && self.dynamic.is_empty()
    }
}

fn exact_key(method: &Method, path: &str) -> String {
    format!("{method} {path}")
}

/// Parse a method name from configuration or an API request. Restricted to
/// the standard set; `http::Method::from_str` would accept arbitrary
/// extension tokens.
pub fn parse_method(raw: &str) -> Result<Method, AuthzError> {
    match raw.to_uppercase().as_str() {
        "GET" => Ok(Method::GET),
        "POST" => Ok(Method::POST),
        "PUT" => Ok(Method::PUT),
        "PATCH" => Ok(Method::PATCH),
        "DELETE" => Ok(Method::DELETE),
        "HEAD" => Ok(Method::HEAD),
        "OPTIONS" => Ok(Method::OPTIONS),
        _ => Err(AuthzError::InvalidMethod(raw.to_string())),
    }
}
