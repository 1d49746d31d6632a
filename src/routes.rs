use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tracing::info;

use crate::handlers::api::{get_catalog, get_task_status, trigger_scrape, AppState};
use crate::handlers::test::health_check;

pub fn create_router(app_state: Arc<AppState>, is_production: bool) -> Router {
    let mut router = Router::new();

    // Health check is always available
    let health_route = Router::new().route("/health", get(health_check));
    router = router.merge(health_route);

    // Scrape trigger and task polling are always available
    let scrape_routes = Router::new()
        .route("/scrape", post(trigger_scrape))
        .route("/tasks/:task_id", get(get_task_status));
    router = router.merge(scrape_routes);

    // Only expose the catalog browsing route if not in production mode
    if !is_production {
        let catalog_route = Router::new().route("/catalog", get(get_catalog));
        router = router.merge(catalog_route);

        info!("Catalog route enabled - server running in development mode");
    } else {
        info!("Running in production mode - only scrape, task and health endpoints exposed");
    }

    router.with_state(app_state)
}
