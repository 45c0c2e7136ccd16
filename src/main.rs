use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use matching_backend::services::automation_service::AutomationService;
use matching_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    events::EventBus,
    routes, AppState,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let events = EventBus::new(config.event_bus_capacity);
    let app_state = AppState::new(pool, events.clone());

    let shutdown = CancellationToken::new();

    {
        let automation = Arc::new(AutomationService::new(
            events.clone(),
            app_state.match_service.clone(),
            Duration::from_secs(config.automation_poll_secs),
            config.automation_batch_size,
        ));
        let token = shutdown.clone();
        tokio::spawn(async move {
            automation.run(token).await;
        });
    }

    {
        let token = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Shutdown signal received");
                token.cancel();
            }
        });
    }

    let app = routes::build_router(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;

    let token = shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { token.cancelled().await })
        .await?;

    Ok(())
}
