use actix_web::{middleware::Logger, web, App, HttpServer};
use anyhow::Context as _;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use yatube_service::admin::AdminCommand;
use yatube_service::config::{Config, StorageBackend};
use yatube_service::db::{create_pool, run_migrations, BlogStore, MemoryStore, PgStore};
use yatube_service::middleware::MetricsMiddleware;
use yatube_service::AppState;

fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn build_store(config: &Config) -> anyhow::Result<Arc<dyn BlogStore>> {
    match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = create_pool(&config.database)
                .await
                .context("Failed to create database pool")?;

            if config.database.run_migrations {
                run_migrations(&pool)
                    .await
                    .context("Failed to run database migrations")?;
            }

            Ok(Arc::new(PgStore::new(pool)))
        }
        StorageBackend::Memory => {
            warn!("Using in-memory storage; all data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn healthcheck(port: u16) -> anyhow::Result<()> {
    let url = format!("http://127.0.0.1:{}/api/v1/health", port);
    let resp = reqwest::Client::new()
        .get(&url)
        .send()
        .await
        .context("healthcheck HTTP error")?;

    if !resp.status().is_success() {
        anyhow::bail!("healthcheck HTTP status: {}", resp.status());
    }
    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {},
                    _ = terminate.recv() => {},
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}

/// Yatube Service
///
/// # Commands
///
/// - `serve` (default): run the HTTP server
/// - `healthcheck`: probe `/api/v1/health` of a local instance (container use)
/// - `create-group`, `delete-group`, `delete-user`: maintenance commands
#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = Config::from_env().map_err(anyhow::Error::msg)?;

    if args.first().map(String::as_str) == Some("healthcheck") {
        return healthcheck(config.app.port).await;
    }

    init_tracing(config.logging.json);

    if let Some(command) = AdminCommand::parse(&args) {
        let command = command.map_err(anyhow::Error::msg)?;
        let store = build_store(&config).await?;
        let report = command.run(store.as_ref()).await?;
        println!("{}", report);
        return Ok(());
    }

    match args.first().map(String::as_str) {
        None | Some("serve") => {}
        Some(other) => anyhow::bail!(
            "unknown command '{}'; expected serve, healthcheck, create-group, delete-group or delete-user",
            other
        ),
    }

    info!(
        env = %config.app.env,
        storage = ?config.storage.backend,
        "Starting yatube-service"
    );

    let store = build_store(&config).await?;
    let state = web::Data::new(AppState::new(store, &config));

    let bind_address = (config.app.host.clone(), config.app.port);
    info!("Listening on {}:{}", bind_address.0, bind_address.1);

    let server = HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(MetricsMiddleware)
            .wrap(Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .configure(yatube_service::configure)
    })
    .workers(config.app.workers.max(1))
    .bind(bind_address)
    .context("Failed to bind HTTP server")?
    .run();

    let handle = server.handle();
    tokio::pin!(server);

    tokio::select! {
        res = &mut server => {
            res.context("HTTP server error")?;
        }
        _ = shutdown_signal() => {
            info!("Shutdown signal received, stopping HTTP server");
            handle.stop(true).await;
        }
    }

    info!("yatube-service stopped");
    Ok(())
}
