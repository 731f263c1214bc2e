//! Session errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("transport error: {0}")]
    Transport(#[from] multipeer_transport::TransportError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
