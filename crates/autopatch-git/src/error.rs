use thiserror::Error;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("command not found: {0}")]
    CommandNotFound(String),
    #[error("`{command}` failed with status {status}: {output}")]
    CommandFailed {
        command: String,
        status: i32,
        output: String,
    },
    #[error("unexpected output from `{command}`: {output}")]
    UnexpectedOutput { command: String, output: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
