//! Bus-attached devices: the device contract, plain memory, and the range limiter.

use std::fmt;

use thiserror::Error;

/// Plain read/write memory.
pub mod ram;
/// Address-prefix filtering decorator.
pub mod range_limiter;

pub use ram::{Memory, MAX_ADDRESS_BITS};
pub use range_limiter::{AddressPrefix, RangeLimiter};

/// Base of the stack page; pushes and pops address `STACK_PAGE + s`.
pub const STACK_PAGE: u16 = 0xFF00;

/// Capability contract for anything mounted on the bus.
///
/// Devices that do not decode an address report it by returning `None` from
/// [`Device::read`] or `false` from [`Device::write`]; the bus treats them as
/// absent for that transfer.
pub trait Device: fmt::Debug {
    /// Reads one byte, or `None` when the device does not answer `address`.
    fn read(&mut self, address: u16) -> Option<u8>;

    /// Writes one byte and reports whether the device accepted it.
    fn write(&mut self, address: u16, value: u8) -> bool;

    /// Returns the device to its power-on contents.
    fn reset(&mut self);
}

/// Invalid device or machine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum ConfigError {
    /// Memory sizes are `2^n` bytes with `n` in `1..=16`.
    #[error("memory address width must be between 1 and 16 bits, got {0}")]
    AddressBits(u8),
    /// Range prefixes are strings of `0`/`1`.
    #[error("range prefix `{0}` must contain only the digits 0 and 1")]
    PrefixDigits(String),
    /// Range prefixes cannot be longer than an address.
    #[error("range prefix `{0}` is longer than 16 bits")]
    PrefixLength(String),
}
