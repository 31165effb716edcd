use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware,
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, ImageService, RecipeService, SeaOrmAuthService, SeaOrmRecipeService,
};

pub mod auth;
mod error;
mod labels;
mod observability;
mod recipes;
mod system;
mod types;
mod users;
mod validation;

pub use error::{ApiError, AppJson, AppPath, AppQuery};
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub store: Store,

    pub config: Config,

    pub auth_service: Arc<dyn AuthService>,

    pub recipe_service: Arc<dyn RecipeService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

pub fn create_app_state(
    store: Store,
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    let images = ImageService::new(&config.media.media_root);

    let auth_service: Arc<dyn AuthService> = Arc::new(SeaOrmAuthService::new(
        store.clone(),
        config.security.clone(),
    ));
    let recipe_service: Arc<dyn RecipeService> =
        Arc::new(SeaOrmRecipeService::new(store.clone(), images));

    Arc::new(AppState {
        store,
        config,
        auth_service,
        recipe_service,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    Ok(create_app_state(store, config, prometheus_handle))
}

pub fn router(state: Arc<AppState>) -> Router {
    let media_root = state.config.media.media_root.clone();
    let cors_origins = state.config.server.cors_allowed_origins.clone();

    let protected_routes = create_protected_router(state.clone());

    let app_router = Router::new()
        .merge(protected_routes)
        .route("/user/create", post(users::create_user))
        .route("/user/token", post(users::create_token))
        .route("/health", get(system::health))
        .with_state(state);

    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .merge(app_router)
        .nest_service("/media", ServeDir::new(media_root))
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(middleware::from_fn(observability::security_headers_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    let max_upload_bytes = state.config.media.max_upload_bytes;

    Router::new()
        .route(
            "/user/me",
            get(users::get_me).patch(users::patch_me).put(users::put_me),
        )
        .route(
            "/recipe/tags",
            get(labels::list_tags).post(labels::create_tag),
        )
        .route(
            "/recipe/ingredients",
            get(labels::list_ingredients).post(labels::create_ingredient),
        )
        .route(
            "/recipe/recipes",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/recipe/recipes/{id}",
            get(recipes::get_recipe)
                .patch(recipes::patch_recipe)
                .put(recipes::put_recipe)
                .delete(recipes::delete_recipe),
        )
        .route(
            "/recipe/recipes/{id}/upload-image",
            post(recipes::upload_image).layer(DefaultBodyLimit::max(max_upload_bytes)),
        )
        .route("/metrics", get(observability::get_metrics))
        .route_layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
