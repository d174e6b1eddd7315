//! Recovery domain logic

pub mod diagnostics;
pub mod error;
pub mod invitation;
pub mod orchestrator;
pub mod outcome;
pub mod session;
pub mod stage;
