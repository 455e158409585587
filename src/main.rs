// Echoed Server - comments and social graph over HTTP

use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use echoed::{app_state::AppState, config::Config, echoed_interface::create_echoed_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = Config::from_env()?;

    // Initialize application state
    let app_state = AppState::new(config.clone()).await?;

    // Build main application router
    let app = Router::new()
        .nest("/api/v1", create_echoed_router(app_state))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    let addr = config.server_address();
    info!(address = %addr, database = %redacted(&config.database.url), "Echoed server starting");
    info!("  GET    /api/v1/health                         - Health check");
    info!("  POST   /api/v1/users                          - Create user");
    info!("  GET    /api/v1/users/{{id}}                     - Get profile");
    info!("  POST   /api/v1/users/{{id}}/follow              - Follow");
    info!("  DELETE /api/v1/users/{{id}}/follow              - Unfollow");
    info!("  POST   /api/v1/users/{{id}}/follow/toggle       - Toggle follow");
    info!("  GET    /api/v1/users/{{id}}/followers           - List followers");
    info!("  GET    /api/v1/users/{{id}}/following           - List following");
    info!("  POST   /api/v1/echoes                         - Create echo");
    info!("  POST   /api/v1/echoes/{{id}}/comments           - Post comment");
    info!("  GET    /api/v1/echoes/{{id}}/comments           - Comment tree");
    info!("  GET    /api/v1/comments/{{id}}/thread           - Comment thread");

    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Database URL with any password masked
fn redacted(url: &str) -> String {
    match (url.find("://"), url.rfind('@')) {
        (Some(scheme_end), Some(at)) if at > scheme_end => {
            let credentials = &url[scheme_end + 3..at];
            match credentials.split_once(':') {
                Some((user, _)) => format!("{}{}:***{}", &url[..scheme_end + 3], user, &url[at..]),
                None => url.to_string(),
            }
        }
        _ => url.to_string(),
    }
}
