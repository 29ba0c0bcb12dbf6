use axum::{
    extract::{DefaultBodyLimit, State},
    http::HeaderValue,
    middleware::from_fn_with_state,
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::{json, Value};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::error::ApiError;
use crate::handlers::{protected, public};
use crate::middleware::bearer_auth_middleware;
use crate::state::AppState;

pub fn app(state: AppState) -> Router {
    let mut router = Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .merge(public_routes())
        // Bearer token required
        .merge(protected_routes(state.clone()))
        // Global middleware
        .layer(DefaultBodyLimit::max(state.config.api.max_request_size_bytes))
        .layer(cors_layer(&state.config.security.cors_origins));

    if state.config.api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }

    router.with_state(state)
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(public::register))
        .route("/login", post(public::login))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::customers;

    Router::new()
        .route("/logout", post(protected::logout))
        .route("/me", get(protected::me))
        .route(
            "/customers",
            get(customers::customer_list).post(customers::customer_create),
        )
        .route(
            "/customers/:id",
            get(customers::record_get)
                .put(customers::record_put)
                .delete(customers::record_delete),
        )
        .route("/customers/process/import", post(customers::customer_import))
        .route("/customers/process/export", get(customers::customer_export))
        .route("/customers/dashboard/summary", get(customers::customer_summary))
        .route_layer(from_fn_with_state(state, bearer_auth_middleware))
}

/// `*` anywhere in the list allows any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();

    base.allow_origin(allowed)
}

async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "success": true,
        "message": "Customer Desk API",
        "data": {
            "name": "customer-desk-api",
            "version": version,
            "endpoints": {
                "public": ["/", "/health", "/register", "/login"],
                "auth": ["/logout", "/me"],
                "customers": [
                    "/customers",
                    "/customers/:id",
                    "/customers/process/import",
                    "/customers/process/export",
                    "/customers/dashboard/summary"
                ]
            }
        }
    }))
}

async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    if let Err(e) = state.store.ping().await {
        tracing::error!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("Database unavailable"));
    }

    Ok(Json(json!({
        "success": true,
        "message": "ok",
        "data": {
            "status": "ok",
            "timestamp": chrono::Utc::now(),
            "database": "ok"
        }
    })))
}
