use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("speech provider credential is not configured")]
    MissingCredential,

    #[error("provider connection failed: {0}")]
    Connect(#[from] tungstenite::Error),

    #[error("invalid provider header value: {0}")]
    InvalidHeader(#[from] tungstenite::http::header::InvalidHeaderValue),
}
