pub mod cover;
pub mod error;
pub mod machine;
pub mod maintenance;
pub mod prompt;
pub mod restore;
pub mod send;
pub mod state;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::FlowError;
pub use machine::{Gateways, Machine};
pub use prompt::{Choice, Prompt, PromptError, Reply};
pub use state::{FlowOptions, Outcome, Payload, State, Template, Transition};
