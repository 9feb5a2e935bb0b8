use thiserror::Error;

pub type Result<T> = std::result::Result<T, VisionError>;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("vision request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("vision API returned {status}: {body}")]
    Api { status: u16, body: String },
    #[error("vision endpoint or key not configured")]
    MissingCredentials,
    #[error("failed to read frame: {0}")]
    Io(#[from] std::io::Error),
    #[error("no camera frame available")]
    NoFrame,
}
