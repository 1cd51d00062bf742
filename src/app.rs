use crate::{
    handlers::{auth as auth_handlers, meta},
    middleware::{cors_layer, request_id_layer, trace_layer},
    AppState,
};
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;

/// Build the application router
pub fn create_app(state: AppState) -> Router {
    let meta_routes = Router::new()
        .route("/", get(meta::index))
        .route("/health", get(meta::health_check))
        .route("/info", get(meta::info));

    let auth_routes = Router::new()
        .route("/login", post(auth_handlers::login))
        .route(
            "/verify_token",
            get(auth_handlers::verify_token).post(auth_handlers::verify_token),
        )
        .route(
            "/verify_jwt",
            get(auth_handlers::verify_token).post(auth_handlers::verify_token),
        )
        .route(
            "/user_from_token",
            get(auth_handlers::user_from_token).post(auth_handlers::user_from_token),
        )
        .route(
            "/user_from_jwt",
            get(auth_handlers::user_from_token).post(auth_handlers::user_from_token),
        )
        .route("/whoami", get(auth_handlers::whoami));

    Router::new()
        .merge(meta_routes)
        .merge(auth_routes)
        .layer(
            ServiceBuilder::new()
                // Request tracing
                .layer(trace_layer())
                // Request ID
                .layer(request_id_layer())
                // CORS
                .layer(cors_layer(&state.config))
                // Body size limit
                .layer(DefaultBodyLimit::max(state.config.server.body_limit_bytes)),
        )
        .with_state(state)
}
