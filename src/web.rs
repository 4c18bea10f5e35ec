use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use miette::IntoDiagnostic;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::authz::engine;
use crate::authz::table::parse_method;
use crate::authz::types::{AuthorizeRequest, AuthorizeResponse, Decision, DenyReason};
use crate::authz::AccessControl;
use crate::identity::Identity;
use crate::settings::Settings;

#[derive(Clone)]
pub struct AppState {
    pub authz: Arc<AccessControl>,
}

pub fn router(authz: Arc<AccessControl>) -> Router {
    Router::new()
        .route("/v1/authorize", post(handle_authorize))
        .route("/healthz", get(health))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { authz })
}

pub async fn serve(settings: Settings, authz: Arc<AccessControl>) -> miette::Result<()> {
    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .map_err(|e| miette::miette!("bad listen addr: {e}"))?;

    let listener = tokio::net::TcpListener::bind(addr).await.into_diagnostic()?;
    tracing::info!(%addr, "Authorization API listening");
    axum::serve(listener, router(authz)).await.into_diagnostic()?;
    Ok(())
}

/// Map a deny reason to its transport-level response.
pub fn deny_response(reason: DenyReason) -> Response {
    let (status, message) = match reason {
        DenyReason::Unauthenticated => (StatusCode::UNAUTHORIZED, "Unauthorized"),
        DenyReason::RouteNotFound => (StatusCode::NOT_FOUND, "Route not found"),
        DenyReason::InsufficientPermission => {
            (StatusCode::FORBIDDEN, "Insufficient permissions")
        }
        DenyReason::InternalError => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Authorization error")
        }
    };
    (status, Json(json!({ "error": message }))).into_response()
}

/// Guard middleware for embedding in an application router: recovers the
/// identity attached by the authenticating proxy, authorizes the request,
/// and either short-circuits with the mapped deny response or forwards to
/// the inner handler with the identity available as a request extension.
pub async fn require_authorization(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = Identity::from_headers(request.headers());
    let decision = engine::authorize(
        &state.authz,
        identity.as_ref(),
        request.method(),
        request.uri().path(),
    );

    match decision {
        Decision::Allow => {
            if let Some(identity) = identity {
                request.extensions_mut().insert(identity);
            }
            next.run(request).await
        }
        Decision::Deny(reason) => deny_response(reason),
    }
}

async fn handle_authorize(
    State(state): State<AppState>,
    Json(req): Json<AuthorizeRequest>,
) -> impl IntoResponse {
    let method = match parse_method(&req.method) {
        Ok(method) => method,
        Err(e) => return e.into_response(),
    };
    let identity = req
        .identity
        .map(|payload| Identity::new(payload.subject, payload.role));

    let decision = engine::authorize(&state.authz, identity.as_ref(), &method, &req.path);
    Json(AuthorizeResponse::from(decision)).into_response()
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authz::loader::compile_policies;
    use crate::authz::types::{ParsedPolicy, RoleDef, RouteSpec};
    use crate::identity::{ROLE_HEADER, SUBJECT_HEADER};
    use axum::body::Body;
    use axum::http;
    use axum::middleware;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn make_state() -> AppState {
        let parsed = ParsedPolicy {
            roles: vec![
                RoleDef {
                    name: "controller".into(),
                    permissions: vec!["ai.view".into()],
                },
                RoleDef {
                    name: "admin".into(),
                    permissions: vec!["ai.view".into(), "ai.admin".into()],
                },
            ],
            routes: vec![
                RouteSpec {
                    method: "GET".into(),
                    template: "/api/health".into(),
                    permissions: vec![],
                },
                RouteSpec {
                    method: "GET".into(),
                    template: "/api/ai/reports".into(),
                    permissions: vec!["ai.view".into()],
                },
                RouteSpec {
                    method: "GET".into(),
                    template: "/api/ai/*".into(),
                    permissions: vec!["ai.admin".into()],
                },
            ],
        };
        AppState {
            authz: Arc::new(compile_policies(vec![parsed]).unwrap()),
        }
    }

    fn guarded_app(state: AppState) -> Router {
        Router::new()
            .route("/api/ai/reports", get(|| async { "reports" }))
            .route("/api/health", get(|| async { "healthy" }))
            .layer(middleware::from_fn_with_state(state, require_authorization))
    }

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_guard_unauthenticated_is_401() {
        let app = guarded_app(make_state());
        let response = app
            .oneshot(
                http::Request::builder()
                    .uri("/api/ai/reports")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn test_guard_allows_permitted_role() {
        let app = guarded_app(make_state());
        let response = app
            .oneshot(
                http::Request::builder()
                    .uri("/api/ai/reports")
                    .header(SUBJECT_HEADER, "user-7")
                    .header(ROLE_HEADER, "controller")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"reports");
    }

    #[tokio::test]
    async fn test_guard_insufficient_permission_is_403() {
        let state = make_state();
        let app = Router::new()
            .route("/api/ai/models", get(|| async { "models" }))
            .layer(middleware::from_fn_with_state(state, require_authorization));

        let response = app
            .oneshot(
                http::Request::builder()
                    .uri("/api/ai/models")
                    .header(SUBJECT_HEADER, "user-7")
                    .header(ROLE_HEADER, "controller")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Insufficient permissions");
    }

    #[tokio::test]
    async fn test_guard_undeclared_route_is_404() {
        let state = make_state();
        let app = Router::new()
            .route("/api/unlisted", get(|| async { "unlisted" }))
            .layer(middleware::from_fn_with_state(state, require_authorization));

        let response = app
            .oneshot(
                http::Request::builder()
                    .uri("/api/unlisted")
                    .header(SUBJECT_HEADER, "user-7")
                    .header(ROLE_HEADER, "controller")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Route not found");
    }

    #[tokio::test]
    async fn test_guard_public_route_needs_identity() {
        // Public routes skip the permission check, not the identity check.
        let app = guarded_app(make_state());
        let response = app
            .oneshot(
                http::Request::builder()
                    .uri("/api/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_authorize_endpoint_allow() {
        let app = router(make_state().authz);
        let payload = json!({
            "identity": { "subject": "user-7", "role": "controller" },
            "method": "GET",
            "path": "/api/ai/reports",
        });

        let response = app
            .oneshot(
                http::Request::builder()
                    .method(http::Method::POST)
                    .uri("/v1/authorize")
                    .header(http::header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&payload).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["allowed"], true);
        assert!(body.get("reason").is_none());
    }

    #[tokio::test]
    async fn test_authorize_endpoint_deny_anonymous() {
        let app = router(make_state().authz);
        let payload = json!({
            "method": "GET",
            "path": "/api/ai/reports",
        });

        let response = app
            .oneshot(
                http::Request::builder()
                    .method(http::Method::POST)
                    .uri("/v1/authorize")
                    .header(http::header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&payload).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["allowed"], false);
        assert_eq!(body["reason"], "unauthenticated");
    }

    #[tokio::test]
    async fn test_authorize_endpoint_rejects_bad_method() {
        let app = router(make_state().authz);
        let payload = json!({
            "method": "FETCH",
            "path": "/api/ai/reports",
        });

        let response = app
            .oneshot(
                http::Request::builder()
                    .method(http::Method::POST)
                    .uri("/v1/authorize")
                    .header(http::header::CONTENT_TYPE, "application/json")
                    .body(Body::from(serde_json::to_vec(&payload).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = router(make_state().authz);
        let response = app
            .oneshot(
                http::Request::builder()
                    .uri("/healthz")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
