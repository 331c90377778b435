//! Top-level error type for everything the core crate can fail at.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SynergyError {
    #[error("Unknown model '{0}'")]
    UnknownModel(String),

    #[error("Index {0} out of range")]
    IndexOutOfRange(usize),

    #[error("Missing API key for provider '{0}'")]
    MissingApiKey(String),

    #[error("HTTP error: status {status}, body: {body_preview}")]
    HttpError { status: u16, body_preview: String },

    #[error("Transport error (exit {exit_code}): {stderr}")]
    TransportError { exit_code: i32, stderr: String },

    #[error("Failed to parse JSON response: {0}")]
    JsonParseError(String),

    #[error("Unexpected response schema from provider '{0}'")]
    SchemaError(String),

    #[error("{0}")]
    SessionError(String),

    #[error(transparent)]
    Patch(#[from] synergy_apply_patch::PatchError),

    #[error(transparent)]
    Exec(#[from] synergy_exec::ExecError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
