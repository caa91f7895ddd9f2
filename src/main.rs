use anyhow::Context;
use film_service::app::{AppContext, build_router};
use film_service::config::{Config, StoreKind};
use film_service::limiter;
use film_service::store::{FilmStore, MemoryStore, PgFilmStore};
use film_service::telemetry;
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("film-service");

    let mut config = Config::from_env()?;
    if let Err(e) = config.apply_args(args.get(1..).unwrap_or(&[])) {
        eprintln!("{}", e);
        eprintln!(
            "Usage: {} [--bind <addr:port>] [--store memory|postgres] [--database-url <url>] [--log-format text|json]",
            program
        );
        eprintln!("Example: {} --bind 127.0.0.1:3000", program);
        eprintln!(
            "Example: {} --store postgres --database-url postgres://postgres@localhost:5432/filmdb",
            program
        );
        std::process::exit(1);
    }
    config.validate()?;

    telemetry::init(config.log_format);

    // 1. Record store:
    let mut pg_store: Option<PgFilmStore> = None;
    let store: Arc<dyn FilmStore> = match config.store {
        StoreKind::Memory => {
            let store = if config.seed {
                MemoryStore::with_seed()
            } else {
                MemoryStore::new()
            };
            tracing::info!("Using in-memory store with {} films", store.len().await);
            Arc::new(store)
        }
        StoreKind::Postgres => {
            let url = config
                .database_url
                .as_deref()
                .context("FILMS_DATABASE_URL is required for the postgres store")?;
            let store = PgFilmStore::connect(url, config.db_max_connections, config.db_timeout)
                .await
                .context("Unable to connect to database")?;
            tracing::info!("Connected to database");

            if config.db_init_schema {
                store
                    .ensure_schema()
                    .await
                    .context("Unable to prepare films table")?;
            }
            pg_store = Some(store.clone());
            Arc::new(store)
        }
    };

    // 2. Rate limiter:
    let limiter = limiter::build(
        config.rate_limit_strategy,
        config.rate_limit_max,
        config.rate_limit_window,
    );
    tracing::info!(
        "Rate limit: {} requests per {:?} ({:?})",
        config.rate_limit_max,
        config.rate_limit_window,
        config.rate_limit_strategy
    );

    // 3. HTTP Router:
    let backend = store.backend();
    let app = build_router(AppContext::new(store), limiter);

    // 4. Start HTTP server:
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Unable to bind {}", config.bind_addr))?;

    tracing::info!("Starting server on {} ({} store)", config.bind_addr, backend);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    if let Some(store) = pg_store {
        store.close().await;
    }
    tracing::info!("Server stopped");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
