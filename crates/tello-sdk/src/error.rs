use std::time::Duration;

use tello_core::{CommandError, RestrictionError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SdkError>;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("UDP socket error: {0}")]
    Io(#[from] std::io::Error),
    #[error("no response to '{command}' within {timeout:?}")]
    Timeout { command: String, timeout: Duration },
    #[error("{0}")]
    Restricted(#[from] RestrictionError),
    #[error("drone rejected '{command}': {reply}")]
    Rejected { command: String, reply: String },
    #[error("unexpected reply to '{command}': {reply}")]
    UnexpectedResponse { command: String, reply: String },
    #[error("invalid command: {0}")]
    InvalidCommand(#[from] CommandError),
}
