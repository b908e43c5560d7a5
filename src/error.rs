//! Error kinds surfaced by a passtty run.

use std::time::Duration;
use thiserror::Error;

/// Every way a run can end without reaching passthrough.
///
/// None of these are retried: a run makes exactly one attempt per secret and
/// reports the first terminal condition it hits.
#[derive(Debug, Error)]
pub enum Error {
    // Causes are folded into the message so a report is a single line.
    #[error("failed to start {shell} in a pty: {cause:#}")]
    Spawn { shell: String, cause: anyhow::Error },

    #[error("host authenticity confirmation required, but it was disabled")]
    HostConfirmationRequired,

    #[error("authentication failure")]
    AuthenticationFailure,

    #[error("timed out waiting for prompt after {0:?}")]
    Timeout(Duration),

    #[error("pty output closed before a prompt was answered")]
    StreamClosed,

    #[error("IO error: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

pub type Result<T> = std::result::Result<T, Error>;
