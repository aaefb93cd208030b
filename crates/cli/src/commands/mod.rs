//! Command implementations for card-injector
//!
//! Each command is a separate module that implements its own CLI args and execution logic.

mod baselines;
mod inject;
mod validate;

pub use baselines::Baselines;
pub use inject::Inject;
pub use validate::Validate;
