//! Core simulator for the SMPU 8-bit stored-program computer.

/// Bus-attached devices and the device contract.
pub mod memory;
pub use memory::{
    AddressPrefix, ConfigError, Device, Memory, RangeLimiter, MAX_ADDRESS_BITS, STACK_PAGE,
};

/// Structured runtime diagnostics.
pub mod diag;
pub use diag::{Diagnostic, Event, Severity};

/// Host-facing machine context and configuration.
pub mod api;
pub use api::{Machine, MachineConfig, MemoryConfig, RunOutcome, StepReport};

/// CPU state model primitives.
pub mod state;
pub use state::{
    HaltReason, Register, RegisterError, RegisterFile, RunState, STACK_POINTER_RESET,
};

/// Opcode id table.
pub mod encoding;
pub use encoding::{Opcode, OPCODE_TABLE};

/// Fatal runtime conditions.
pub mod fault;
pub use fault::{Access, Fault};

/// Device arbitration.
pub mod bus;
pub use bus::{Bus, DeviceId};

/// Fetch/execute engine.
pub mod execute;

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
