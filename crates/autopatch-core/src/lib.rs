pub mod artifact;
pub mod error;
pub mod key;
pub mod record;
pub mod subject;

pub use error::CoreError;
pub use key::CommitKey;
pub use record::{now_ms, CommitRecord, Status};
