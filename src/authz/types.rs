use serde::{Deserialize, Serialize};

/// Outcome of evaluating a single request against the loaded policies.
/// Produced per request, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Why a request was denied. Exactly these four kinds exist; every failure
/// path in the engine resolves to one of them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    Unauthenticated,
    RouteNotFound,
    InsufficientPermission,
    InternalError,
}

impl DenyReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            DenyReason::Unauthenticated => "unauthenticated",
            DenyReason::RouteNotFound => "route_not_found",
            DenyReason::InsufficientPermission => "insufficient_permission",
            DenyReason::InternalError => "internal_error",
        }
    }
}

// ---------- API request/response types ----------

#[derive(Debug, Deserialize)]
pub struct AuthorizeRequest {
    /// Caller identity as resolved by the authenticating proxy; absent for
    /// anonymous requests.
    #[serde(default)]
    pub identity: Option<IdentityPayload>,
    /// e.g. "GET"
    pub method: String,
    /// e.g. "/api/ai/reports"
    pub path: String,
}

#[derive(Debug, Deserialize)]
pub struct IdentityPayload {
    pub subject: String,
    pub role: String,
}

#[derive(Debug, Serialize)]
pub struct AuthorizeResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
}

impl From<Decision> for AuthorizeResponse {
    fn from(decision: Decision) -> Self {
        match decision {
            Decision::Allow => Self {
                allowed: true,
                reason: None,
            },
            Decision::Deny(reason) => Self {
                allowed: false,
                reason: Some(reason.as_str()),
            },
        }
    }
}

// ---------- Policy domain types ----------

/// A role definition parsed from a policy file: role name plus the
/// permissions it grants.
#[derive(Debug, Clone)]
pub struct RoleDef {
    pub name: String,
    /// Permission tokens like "ai.view"
    pub permissions: Vec<String>,
}

/// A route declaration parsed from a policy file. The method and template
/// are still raw strings at this stage; validation happens at compile time.
#[derive(Debug, Clone)]
pub struct RouteSpec {
    pub method: String,
    pub template: String,
    /// ANY-of: holding a single listed permission suffices. Empty means the
    /// route is explicitly public.
    pub permissions: Vec<String>,
}

/// Intermediate result from parsing a single KDL policy file.
#[derive(Debug, Clone, Default)]
pub struct ParsedPolicy {
    pub roles: Vec<RoleDef>,
    pub routes: Vec<RouteSpec>,
}
