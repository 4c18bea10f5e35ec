use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use miette::Diagnostic;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AuthzError {
    #[error("Failed to load policy file `{path}`")]
    #[diagnostic(
        code(palisade::authz::policy_load),
        help("Check that the file exists and contains valid KDL syntax")
    )]
    PolicyLoadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid policy: {0}")]
    #[diagnostic(
        code(palisade::authz::invalid_policy),
        help("Each policy file must contain valid `role` or `route` KDL nodes")
    )]
    InvalidPolicy(String),

    #[error("Invalid route template `{template}`: {reason}")]
    #[diagnostic(
        code(palisade::authz::invalid_template),
        help("Templates start with `/`; segments are literals, `:name` parameters, or a trailing `*` wildcard")
    )]
    InvalidTemplate { template: String, reason: String },

    #[error("Invalid HTTP method `{0}`")]
    #[diagnostic(
        code(palisade::authz::invalid_method),
        help("Use a standard HTTP method name such as GET, POST, PUT, PATCH, or DELETE")
    )]
    InvalidMethod(String),

    #[error("Duplicate route `{method} {template}`")]
    #[diagnostic(
        code(palisade::authz::duplicate_route),
        help("Each (method, template) pair may be declared only once across all policy files")
    )]
    DuplicateRoute { method: String, template: String },

    #[error("KDL parse error: {0}")]
    #[diagnostic(
        code(palisade::authz::kdl_parse),
        help("Check your KDL file syntax — see https://kdl.dev for the specification")
    )]
    KdlParse(String),

    #[error("I/O error: {0}")]
    #[diagnostic(code(palisade::authz::io))]
    Io(#[from] std::io::Error),
}

impl IntoResponse for AuthzError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthzError::InvalidPolicy(_)
            | AuthzError::InvalidTemplate { .. }
            | AuthzError::InvalidMethod(_) => (StatusCode::BAD_REQUEST, self.to_string()),
            // Internal faults must not leak detail to callers.
            _ => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Authorization error".to_string(),
            ),
        };
        let body = json!({ "error": message });
        (status, Json(body)).into_response()
    }
}
