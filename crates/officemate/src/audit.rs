//! Request audit trail.
//!
//! Mutating requests and failed requests are written to the `audit` tracing
//! target with the acting user, the action, the outcome and the latency.
//! Reads that succeed stay at debug. Entity-level changes are persisted
//! separately by `services::AuditTrail`.

use std::time::Instant;

use axum::{
    extract::{MatchedPath, Request},
    http::Method,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub async fn audit_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    // The matched route keeps ids out of the log line.
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());
    let user = path_user_id(request.uri().path()).map(|id| id.to_string());
    let action = action(&method);
    let started = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let latency_ms = started.elapsed().as_millis() as u64;
    let user_id = user.as_deref();

    if status.is_server_error() {
        tracing::error!(target: "audit", user_id, action, %method, route = %route, status = status.as_u16(), latency_ms, "Request failed");
    } else if status.is_client_error() {
        tracing::warn!(target: "audit", user_id, action, %method, route = %route, status = status.as_u16(), latency_ms, "Request rejected");
    } else if is_mutation(&method) {
        tracing::info!(target: "audit", user_id, action, %method, route = %route, status = status.as_u16(), latency_ms, "Request completed");
    } else {
        tracing::debug!(target: "audit", user_id, action, %method, route = %route, status = status.as_u16(), latency_ms, "Request completed");
    }

    response
}

/// The `{user_id}` of `/api/users/{user_id}/...` routes.
fn path_user_id(path: &str) -> Option<Uuid> {
    let mut segments = path.split('/');
    segments.find(|segment| *segment == "users")?;
    segments.next().and_then(|id| Uuid::parse_str(id).ok())
}

fn action(method: &Method) -> &'static str {
    match *method {
        Method::POST => "CREATE",
        Method::PUT | Method::PATCH => "UPDATE",
        Method::DELETE => "DELETE",
        _ => "READ",
    }
}

fn is_mutation(method: &Method) -> bool {
    matches!(
        *method,
        Method::POST | Method::PUT | Method::PATCH | Method::DELETE
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, middleware::from_fn, routing::get, Router};
    use tower::ServiceExt;

    #[test]
    fn test_mutations() {
        assert!(is_mutation(&Method::POST));
        assert!(is_mutation(&Method::DELETE));
        assert!(!is_mutation(&Method::GET));
        assert!(!is_mutation(&Method::OPTIONS));
    }

    #[test]
    fn test_user_id_from_path() {
        let id = Uuid::new_v4();
        assert_eq!(
            path_user_id(&format!("/api/users/{id}/wallet/add-funds")),
            Some(id)
        );
        assert_eq!(path_user_id("/api/users/not-a-uuid/wallet"), None);
        assert_eq!(path_user_id("/auth/login"), None);
    }

    #[test]
    fn test_action_by_method() {
        assert_eq!(action(&Method::POST), "CREATE");
        assert_eq!(action(&Method::PATCH), "UPDATE");
        assert_eq!(action(&Method::DELETE), "DELETE");
        assert_eq!(action(&Method::GET), "READ");
    }

    #[tokio::test]
    async fn test_passes_response_through() {
        let app = Router::new()
            .route("/teapot", get(|| async { StatusCode::IM_A_TEAPOT }))
            .layer(from_fn(audit_middleware));

        let response = app
            .oneshot(
                axum::http::Request::builder()
                    .uri("/teapot")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    }
}
