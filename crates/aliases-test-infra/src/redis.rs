use crate::{Result, TestInfraError};
use std::time::Duration;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const READY_PROBES: usize = 20;

/// Settings for a disposable Redis server.
#[derive(Debug, Clone, TypedBuilder)]
pub struct RedisConfig {
    #[builder(default = "8.6.0".to_string(), setter(into))]
    pub tag: String,
    /// Logical database the URL points at.
    #[builder(default = 0)]
    pub db: u8,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

/// A Redis container that lives as long as this value.
pub struct RedisServer {
    container: ContainerAsync<GenericImage>,
    config: RedisConfig,
}

impl RedisServer {
    /// Starts a Redis container with the default settings.
    pub async fn new() -> Result<Self> {
        Self::with_config(RedisConfig::default()).await
    }

    pub async fn with_config(config: RedisConfig) -> Result<Self> {
        let container = GenericImage::new("redis", config.tag.as_str())
            .with_exposed_port(6379_u16.tcp())
            .with_wait_for(WaitFor::message_on_stdout("Ready to accept connections"))
            .start()
            .await?;

        Ok(Self { container, config })
    }

    pub async fn host(&self) -> Result<String> {
        let host = self.container.get_host().await?.to_string();

        Ok(match host.as_str() {
            "localhost" => String::from("127.0.0.1"),
            _ => host,
        })
    }

    pub async fn port(&self) -> Result<u16> {
        Ok(self.container.get_host_port_ipv4(6379).await?)
    }

    /// Redis URL including the configured database.
    pub async fn url(&self) -> Result<String> {
        let host = self.host().await?;
        let port = self.port().await?;
        Ok(format!("redis://{}:{}/{}", host, port, self.config.db))
    }

    /// Waits until the server answers `PING`.
    pub async fn wait_ready(&self) -> Result<()> {
        let client = redis::Client::open(self.url().await?)?;
        let mut last_error = None;

        for _ in 0..READY_PROBES {
            match client.get_multiplexed_async_connection().await {
                Ok(mut conn) => {
                    let pong: redis::RedisResult<String> =
                        redis::cmd("PING").query_async(&mut conn).await;
                    match pong {
                        Ok(_) => return Ok(()),
                        Err(err) => last_error = Some(err),
                    }
                }
                Err(err) => last_error = Some(err),
            }
            tokio::time::sleep(Duration::from_millis(250)).await;
        }

        match last_error {
            Some(err) => Err(err.into()),
            None => Err(TestInfraError::NotReady {
                attempts: READY_PROBES,
            }),
        }
    }
}
