use std::{process::ExitCode, sync::Arc};

use marketplace_access::{
    AppState, SupabaseIdentityStore, TokenService,
    config::{AppConfig, Env},
    create_router,
    identity::IdentityState,
};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Boots configuration, logging, the Token Service, the identity store client and the
/// HTTP server. Any configuration problem stops the process before it binds a port.
#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "marketplace_access=debug,tower_http=info,axum=info".into());

    // The config is needed to pick the log format, so a load failure is reported on stderr.
    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("FATAL: invalid configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    match config.env {
        Env::Local => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init(),
        Env::Production => tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
    }

    tracing::info!("Application starting in {:?} mode", config.env);

    let tokens = match TokenService::from_config(&config) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            tracing::error!(error = %e, "FATAL: token service cannot start");
            return ExitCode::FAILURE;
        }
    };

    let identities =
        Arc::new(SupabaseIdentityStore::new(&config.supabase_url, &config.supabase_key))
            as IdentityState;

    let bind_addr = config.bind_addr.clone();
    let app = create_router(AppState {
        tokens,
        identities,
        config,
    });

    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!(error = %e, addr = %bind_addr, "FATAL: cannot bind listener");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!("Listening on {}", bind_addr);
    tracing::info!("API Documentation (Swagger UI) available at /swagger-ui");

    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!(error = %e, "server terminated");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
