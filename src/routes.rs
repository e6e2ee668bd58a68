use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::analytics::Aggregator;
use crate::config::{ApiConfig, SecurityConfig};
use crate::handlers::{protected, public};
use crate::middleware::jwt_auth_middleware;
use crate::store::ResearchStore;

/// Shared handler state. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub aggregator: Arc<Aggregator>,
    pub store: Arc<dyn ResearchStore>,
    pub security: Arc<SecurityConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn ResearchStore>, aggregator: Aggregator, security: SecurityConfig) -> Self {
        Self {
            aggregator: Arc::new(aggregator),
            store,
            security: Arc::new(security),
        }
    }
}

pub fn app(state: AppState, api: &ApiConfig) -> Router {
    let protected_routes = Router::new()
        .merge(analytics_routes())
        .merge(report_routes())
        .merge(funding_routes())
        .route_layer(from_fn_with_state(state.clone(), jwt_auth_middleware));

    let mut router = Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Protected API
        .merge(protected_routes)
        // Global middleware
        .layer(ServiceBuilder::new().layer(TimeoutLayer::new(Duration::from_secs(api.request_timeout_secs))));

    if api.enable_request_logging {
        router = router.layer(TraceLayer::new_for_http());
    }
    if state.security.enable_cors {
        router = router.layer(cors_layer(&state.security.cors_origins));
    }

    router.with_state(state)
}

fn analytics_routes() -> Router<AppState> {
    use protected::analytics;

    Router::new()
        .route("/api/analytics/dashboard", get(analytics::dashboard))
        .route("/api/analytics/department/:dept_id", get(analytics::department))
        .route("/api/analytics/publications-by-department", get(analytics::publications_by_department))
        .route("/api/analytics/funding-trends", get(analytics::funding_trends))
}

fn report_routes() -> Router<AppState> {
    use protected::reports;

    Router::new()
        .route("/api/reports/publications", get(reports::publications))
        .route("/api/reports/faculty", get(reports::faculty))
        .route("/api/reports/projects", get(reports::projects))
}

fn funding_routes() -> Router<AppState> {
    use protected::funding;

    Router::new()
        .route("/api/funding-sources/summary", get(funding::summary))
        .route("/api/funding-sources/:funding_id", get(funding::source))
}

/// `*` anywhere in the list allows any origin.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}
