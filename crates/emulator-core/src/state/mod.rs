//! CPU state model: register file and run state.

/// Register names and the register file.
pub mod registers;
/// Running / halted state machine.
pub mod run_state;

pub use registers::{Register, RegisterError, RegisterFile, STACK_POINTER_RESET};
pub use run_state::{HaltReason, RunState};
