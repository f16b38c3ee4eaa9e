//! Application setup and router configuration.

use std::sync::Arc;

use axum::{
    extract::Extension,
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::kernel::ServerDeps;
use crate::server::auth::JwtService;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    add_comment_handler, attach_photo_handler, create_issue_handler, get_issue_handler,
    health_handler, list_comments_handler, list_departments_handler, list_issues_handler,
    list_notifications_handler, mark_all_read_handler, mark_read_handler,
    public_analytics_handler, stream_handler, toggle_upvote_handler, unread_count_handler,
    update_issue_handler,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: ServerDeps,
    pub jwt_service: Arc<JwtService>,
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin = %origin, "Ignoring unparseable CORS origin");
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PATCH])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE]);

    if origins.is_empty() {
        cors.allow_origin(Any)
    } else {
        cors.allow_origin(AllowOrigin::list(origins))
    }
}

/// Build the Axum application router.
///
/// An empty `allowed_origins` allows any origin.
pub fn build_app(
    deps: ServerDeps,
    jwt_service: Arc<JwtService>,
    allowed_origins: &[String],
) -> Router {
    let app_state = AppState {
        deps,
        jwt_service: jwt_service.clone(),
    };

    Router::new()
        .route(
            "/api/issues",
            post(create_issue_handler).get(list_issues_handler),
        )
        .route(
            "/api/issues/:id",
            get(get_issue_handler).patch(update_issue_handler),
        )
        .route(
            "/api/issues/:id/comments",
            get(list_comments_handler).post(add_comment_handler),
        )
        .route("/api/issues/:id/upvote", post(toggle_upvote_handler))
        .route("/api/issues/:id/photos", post(attach_photo_handler))
        .route("/api/notifications", get(list_notifications_handler))
        .route(
            "/api/notifications/unread-count",
            get(unread_count_handler),
        )
        .route("/api/notifications/read-all", post(mark_all_read_handler))
        .route("/api/notifications/:id/read", post(mark_read_handler))
        .route("/api/analytics/public", get(public_analytics_handler))
        .route("/api/departments", get(list_departments_handler))
        .route("/api/streams/:topic", get(stream_handler))
        .route("/health", get(health_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req, next| {
            jwt_auth_middleware(jwt_service.clone(), req, next)
        }))
        .layer(Extension(app_state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}
