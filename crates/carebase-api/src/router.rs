//! Route table and middleware stack.
//!
//! Layers, outermost first:
//! 1. CORS (when origins are configured)
//! 2. Access log
//! 3. `Extension<ApiContext>` then bearer auth (protected routes only)
//!
//! Handlers take `State<ApiContext>`; middleware reads the context from the
//! request extensions. Path params use `:param` syntax (axum 0.7).

use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tracing::warn;

use crate::context::ApiContext;
use crate::endpoints;
use crate::middleware;

/// Room for multipart framing on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Build the full application router: `/api/...` plus `/files/...`.
pub fn api_router(ctx: ApiContext) -> Router {
    let protected = Router::new()
        .route("/users/me", get(endpoints::users::me).put(endpoints::users::update_me))
        .route("/users/me/avatar", post(endpoints::users::upload_avatar))
        .route("/users", get(endpoints::users::list))
        .route(
            "/users/:id",
            get(endpoints::users::read)
                .put(endpoints::users::update)
                .delete(endpoints::users::delete),
        )
        .route(
            "/patients",
            get(endpoints::patients::list).post(endpoints::patients::create),
        )
        .route(
            "/patients/:id",
            get(endpoints::patients::read)
                .put(endpoints::patients::update)
                .delete(endpoints::patients::delete),
        )
        .route(
            "/appointments",
            get(endpoints::appointments::list).post(endpoints::appointments::create),
        )
        .route(
            "/appointments/:id",
            get(endpoints::appointments::read)
                .put(endpoints::appointments::update)
                .delete(endpoints::appointments::delete),
        )
        .route(
            "/prescriptions",
            get(endpoints::prescriptions::list).post(endpoints::prescriptions::create),
        )
        .route(
            "/prescriptions/:id",
            get(endpoints::prescriptions::read)
                .put(endpoints::prescriptions::update)
                .delete(endpoints::prescriptions::delete),
        )
        .route("/prescriptions/:id/upload", post(endpoints::prescriptions::upload))
        .route(
            "/prescriptions/:id/interactions",
            get(endpoints::prescriptions::interactions),
        )
        .route("/advisor/symptoms", post(endpoints::advisor::analyze))
        .route("/advisor/tests", post(endpoints::advisor::tests))
        .route("/advisor/interactions", post(endpoints::advisor::interactions))
        .route("/advisor/alternatives", post(endpoints::advisor::alternatives))
        .with_state(ctx.clone())
        .layer(DefaultBodyLimit::max(
            ctx.settings.max_upload_bytes + MULTIPART_OVERHEAD,
        ))
        // Matched routes only, so unknown paths stay 404.
        .route_layer(axum::middleware::from_fn(middleware::auth::require_auth))
        // Outermost so require_auth can extract ApiContext.
        .layer(axum::Extension(ctx.clone()));

    let public = Router::new()
        .route("/health", get(endpoints::health::check))
        .route("/auth/register", post(endpoints::auth::register))
        .route("/auth/login", post(endpoints::auth::login))
        .route("/auth/refresh", post(endpoints::auth::refresh))
        .route("/auth/logout", post(endpoints::auth::logout))
        .with_state(ctx.clone());

    let app = Router::new()
        .nest("/api", public.merge(protected))
        .nest_service("/files", ServeDir::new(&ctx.settings.upload_dir))
        .layer(axum::middleware::from_fn(middleware::access_log::log_access));

    match cors_layer(&ctx.settings.cors_origins) {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

/// CORS for the configured origins, `None` when the list is empty.
///
/// `*` mirrors the caller's origin since credentials are allowed.
fn cors_layer(origins: &[String]) -> Option<CorsLayer> {
    if origins.is_empty() {
        return None;
    }

    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::mirror_request()
    } else {
        let values: Vec<HeaderValue> = origins
            .iter()
            .filter_map(|origin| match HeaderValue::from_str(origin) {
                Ok(value) => Some(value),
                Err(_) => {
                    warn!(origin = %origin, "ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();
        AllowOrigin::list(values)
    };

    Some(
        CorsLayer::new()
            .allow_origin(allow_origin)
            .allow_methods(AllowMethods::mirror_request())
            .allow_headers(AllowHeaders::mirror_request())
            .allow_credentials(true),
    )
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};

    use super::*;
    use crate::testing::{body_json, empty_request, send, test_context, test_context_with};

    #[tokio::test]
    async fn health_is_public() {
        let (ctx, _dir) = test_context();
        let resp = send(&ctx, empty_request("GET", "/api/health", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await["status"], "healthy");
    }

    #[tokio::test]
    async fn unknown_route_is_404() {
        let (ctx, _dir) = test_context();
        let resp = send(&ctx, empty_request("GET", "/api/nowhere", None)).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn uploaded_files_are_served() {
        let (ctx, _dir) = test_context();
        let dir = ctx.settings.upload_dir.join("avatars");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("u-1_x.png"), b"png-bytes").unwrap();

        let resp = send(&ctx, empty_request("GET", "/files/avatars/u-1_x.png", None)).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"png-bytes");
    }

    #[tokio::test]
    async fn cors_echoes_allowed_origin() {
        let (ctx, _dir) = test_context_with(|s| {
            s.cors_origins = vec!["http://localhost:3000".to_string()];
        });

        let req = Request::builder()
            .method("OPTIONS")
            .uri("/api/patients")
            .header(header::ORIGIN, "http://localhost:3000")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Body::empty())
            .unwrap();
        let resp = send(&ctx, req).await;
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            resp.headers().get(header::ACCESS_CONTROL_ALLOW_CREDENTIALS).unwrap(),
            "true"
        );
    }

    #[tokio::test]
    async fn cors_ignores_other_origins() {
        let (ctx, _dir) = test_context_with(|s| {
            s.cors_origins = vec!["http://localhost:3000".to_string()];
        });

        let req = Request::builder()
            .uri("/api/health")
            .header(header::ORIGIN, "http://evil.test")
            .body(Body::empty())
            .unwrap();
        let resp = send(&ctx, req).await;
        assert!(resp.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN).is_none());
    }

    #[test]
    fn no_origins_means_no_cors_layer() {
        assert!(cors_layer(&[]).is_none());
        assert!(cors_layer(&["*".to_string()]).is_some());
    }
}
