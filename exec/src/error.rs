use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("No command provided to ,exec")]
    NoCommand,

    #[error("Command '{0}' not allowed in ,exec mode")]
    Disallowed(String),

    #[error("Shell metacharacters not allowed")]
    Metacharacter,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
