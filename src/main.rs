use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{error_handling::HandleErrorLayer, http::StatusCode};
use tower::{BoxError, ServiceBuilder};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn, Level};

use fbs_availability_service::services::jobs::Dispatcher;
use fbs_availability_service::services::store::FileCredentialStore;
use fbs_availability_service::{create_router, AppState, PortalClientFactory};

// Error handler
async fn handle_error(error: BoxError) -> (StatusCode, String) {
    if error.is::<tokio::time::error::Elapsed>() {
        (
            StatusCode::REQUEST_TIMEOUT,
            "Request took too long".to_string(),
        )
    } else {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Unhandled internal error: {}", error),
        )
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .init();

    // Load environment variables from .env if present
    dotenv::dotenv().ok();

    let portal_url = env::var("PORTAL_URL")
        .unwrap_or_else(|_| "https://fbs.intranet.smu.edu.sg/home".to_string());

    // Without a WebDriver endpoint the service still serves the catalog and
    // health routes, but scrape requests are refused up front.
    let dispatcher = match env::var("WEBDRIVER_URL") {
        Ok(webdriver_url) => {
            info!("Using WebDriver backend at {}", webdriver_url);
            let factory = PortalClientFactory::new(&webdriver_url, &portal_url);
            Some(Arc::new(Dispatcher::new(Arc::new(factory))))
        }
        Err(_) => {
            warn!("WEBDRIVER_URL not set - scrape requests will be rejected");
            None
        }
    };

    let credentials_path =
        env::var("CREDENTIALS_DB_PATH").unwrap_or_else(|_| "credentials.json".to_string());
    let credential_store = Arc::new(FileCredentialStore::new(&credentials_path));
    info!("Credential store initialized at {}", credentials_path);

    // Optional shared secret for the scrape endpoint
    let api_key = env::var("SCRAPER_API_KEY").ok();
    if api_key.is_some() {
        info!("Scrape endpoint authentication enabled with provided key");
    } else {
        info!("No API key provided - scrape endpoint authentication disabled");
    }

    let email_domain =
        env::var("INSTITUTION_EMAIL_DOMAIN").unwrap_or_else(|_| "@smu.edu.sg".to_string());

    let strict_filter_labels = env::var("STRICT_FILTER_LABELS")
        .map(|val| val.to_lowercase() == "true")
        .unwrap_or(false);

    if strict_filter_labels {
        info!("Strict filter labels enabled: unmatched filter values fail the job");
    }

    // Check if running in production mode
    let is_production = env::var("ENVIRONMENT")
        .map(|val| val.to_lowercase() == "production")
        .unwrap_or(false);

    if is_production {
        info!("Running in PRODUCTION mode - restricting available endpoints");
    } else {
        info!("Running in DEVELOPMENT mode - all endpoints will be available");
    }

    // Create shared application state
    let app_state = Arc::new(AppState {
        dispatcher,
        credential_store,
        api_key,
        email_domain,
        strict_filter_labels,
    });

    // Create router with appropriate routes based on environment
    let app = create_router(app_state, is_production).layer(
        ServiceBuilder::new()
            .layer(HandleErrorLayer::new(handle_error))
            .load_shed()
            .concurrency_limit(64)
            .timeout(Duration::from_secs(10))
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::new().allow_origin(Any)),
    );

    // Bind to port 3000
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    info!("Server listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    // Set up signal handler for graceful shutdown
    let shutdown = async {
        let ctrl_c = async {
            tokio::signal::ctrl_c()
                .await
                .expect("Failed to install Ctrl+C handler");
        };

        #[cfg(unix)]
        let terminate = async {
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
                .expect("Failed to install SIGTERM handler")
                .recv()
                .await;
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                info!("Received interrupt signal, starting graceful shutdown");
            },
            _ = terminate => {
                info!("Received terminate signal, starting graceful shutdown");
            },
        }
    };

    // Start server with graceful shutdown
    info!("Server is ready to accept connections");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .expect("Failed to start server");

    info!("Server has been gracefully shut down");
}
