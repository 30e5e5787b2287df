//! Module discovery and rule execution

pub mod executor;
pub mod module_walker;

pub use executor::{ExecutionEngine, ExecutionResult, RunError, RunErrorKind};
pub use module_walker::ModuleWalker;
