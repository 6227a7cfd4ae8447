mod api;
mod auth;
mod config;
mod scan;
mod search;
mod state;
mod utils;
mod watch;

use std::sync::Arc;
use std::time::Duration;

use api::api_router;
use auth::{AllowAll, Authorizer, SessionDirAuthorizer};
use axum::Router;
use config::{config_path_from_env, load_or_create_config, resolve_music_root, resolve_path};
use scan::{set_library_missing, start_index, start_periodic_rebuild};
use state::AppState;
use tower_http::request_id::{MakeRequestUuid, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config_path = config_path_from_env();
    let (config, created) = load_or_create_config(&config_path)?;
    if created {
        info!("Created default config at {:?}", config_path);
    } else {
        info!("Loaded config from {:?}", config_path);
    }

    let authorizer: Arc<dyn Authorizer> = if config.require_auth {
        let sessions = resolve_path(&config_path, &config.sessions_path);
        std::fs::create_dir_all(&sessions)?;
        info!("Sessions are read from {:?}", sessions);
        Arc::new(SessionDirAuthorizer::new(sessions))
    } else {
        warn!("Authentication disabled (require_auth=false)");
        Arc::new(AllowAll)
    };

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let state = AppState::new(config_path.clone(), config.clone(), authorizer);

    match resolve_music_root(&config_path, &config.music_root) {
        Some(music_root) if music_root.is_dir() => start_index(state.clone(), music_root),
        Some(music_root) => {
            warn!("Music directory not found: {:?}", music_root);
            set_library_missing(&state, music_root);
        }
        None => info!("Music directory not configured; set music_root in {:?}", config_path),
    }
    start_periodic_rebuild(
        state.clone(),
        Duration::from_secs(config.rebuild_interval_secs),
    );

    let app = Router::new()
        .nest("/api/v1", api_router(state))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("Listening on {}", bind_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = match signal(SignalKind::terminate()) {
            Ok(signal) => signal,
            Err(err) => {
                warn!("Failed to install terminate signal handler: {}", err);
                return;
            }
        };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {},
            _ = term.recv() => {},
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for ctrl-c: {}", err);
        }
    }

    info!("Shutdown signal received.");
}
