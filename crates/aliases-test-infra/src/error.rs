use thiserror::Error;

/// Failures while starting or probing a disposable backend.
#[derive(Debug, Error)]
pub enum TestInfraError {
    #[error("failed to start container: {0}")]
    Container(#[from] testcontainers::TestcontainersError),

    #[error("redis probe failed: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("backend not ready after {attempts} probes")]
    NotReady { attempts: usize },
}

pub type Result<T> = std::result::Result<T, TestInfraError>;
