mod cli;

use crate::cli::{StorageBackendArg, CLI};
use aliases_core::{KvStore, RandLimits};
use aliases_engine::{AliasStore, Registry};
use aliases_gateway::{App, AppState};
use aliases_storage::{InMemoryKv, RedisConfig, RedisKv};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CLI::parse();
    init_tracing(config.log_json);

    info!(
        listen_addr = %config.listen_addr,
        storage_backend = %config.storage,
        max_attempts = config.max_attempts,
        "starting alias gateway"
    );

    let limits = RandLimits::builder()
        .min_len(config.rand_min_len)
        .min_chars(config.rand_min_chars)
        .build();

    match config.storage {
        StorageBackendArg::InMemory => {
            warn!("in-memory storage selected; aliases are lost on exit");
            run_server(
                config.listen_addr,
                Arc::new(InMemoryKv::new()),
                limits,
                config.max_attempts,
            )
            .await?;
        }
        StorageBackendArg::Redis => {
            let redis_config = RedisConfig::builder()
                .url(config.redis_url.clone())
                .pool_size(config.redis_pool_size)
                .idle_timeout(Duration::from_secs(config.redis_idle_timeout_secs))
                .command_timeout(config.redis_command_timeout_ms.map(Duration::from_millis))
                .build();

            let kv = RedisKv::connect(&redis_config)?;
            if let Err(e) = kv.ping().await {
                warn!(error = %e, "Redis is not reachable yet");
            }
            let reaper = kv.spawn_idle_reaper(redis_config.idle_timeout);

            let served = run_server(config.listen_addr, Arc::new(kv), limits, config.max_attempts).await;
            reaper.abort();
            served?;
        }
    }

    info!("alias gateway stopped");
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

async fn run_server<S: KvStore>(
    listen_addr: SocketAddr,
    kv: Arc<S>,
    limits: RandLimits,
    max_attempts: usize,
) -> std::io::Result<()> {
    let registry = Registry::new(Arc::clone(&kv)).with_limits(limits);
    let store = AliasStore::new(kv).with_max_attempts(max_attempts);
    let router = App::router(AppState::new(registry, store));

    let listener = tokio::net::TcpListener::bind(listen_addr).await?;
    info!(listen_addr = %listener.local_addr()?, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
