use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid commit key: {0}")]
    InvalidKey(String),
    #[error("unknown status: {0}")]
    UnknownStatus(String),
    #[error("not a patch artifact name: {0}")]
    InvalidArtifactName(String),
}
