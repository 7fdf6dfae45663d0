use std::fmt;
use std::str::FromStr;

use super::{ConfigError, Device};

const ADDRESS_WIDTH: u8 = 16;

/// Most-significant-bit pattern an address must start with.
///
/// The empty prefix matches every address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AddressPrefix {
    bits: u16,
    len: u8,
}

impl AddressPrefix {
    /// Prefix matching every address.
    pub const ANY: Self = Self { bits: 0, len: 0 };

    /// Parses a string of `0`/`1` digits, most significant first.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PrefixDigits`] for any other character and
    /// [`ConfigError::PrefixLength`] for more than 16 digits.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        if text.len() > usize::from(ADDRESS_WIDTH) {
            return Err(ConfigError::PrefixLength(text.to_owned()));
        }
        let mut bits = 0_u16;
        let mut len = 0_u8;
        for digit in text.chars() {
            let bit = match digit {
                '0' => 0,
                '1' => 1,
                _ => return Err(ConfigError::PrefixDigits(text.to_owned())),
            };
            bits = (bits << 1) | bit;
            len += 1;
        }
        Ok(Self { bits, len })
    }

    /// Number of prefix bits.
    #[must_use]
    pub const fn len(self) -> u8 {
        self.len
    }

    /// Returns `true` for the match-everything prefix.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// Returns `true` when the top `len` bits of `address` equal the prefix.
    #[must_use]
    pub const fn matches(self, address: u16) -> bool {
        if self.len == 0 {
            return true;
        }
        address >> (ADDRESS_WIDTH - self.len) == self.bits
    }
}

impl FromStr for AddressPrefix {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for AddressPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len == 0 {
            return Ok(());
        }
        write!(f, "{:0width$b}", self.bits, width = usize::from(self.len))
    }
}

/// Decorator that hides its device outside one address prefix.
///
/// While enabled, transfers whose address does not start with the prefix are
/// answered as "not responding" and never reach the wrapped device.
#[derive(Debug)]
pub struct RangeLimiter {
    device: Box<dyn Device>,
    enabled: bool,
    prefix: AddressPrefix,
}

impl RangeLimiter {
    /// Wraps `device` with range limiting disabled.
    #[must_use]
    pub fn new(device: Box<dyn Device>) -> Self {
        Self {
            device,
            enabled: false,
            prefix: AddressPrefix::ANY,
        }
    }

    /// Wraps `device` and limits it to `prefix`.
    #[must_use]
    pub fn with_prefix(device: Box<dyn Device>, prefix: AddressPrefix) -> Self {
        Self {
            device,
            enabled: true,
            prefix,
        }
    }

    /// Returns `true` while the prefix is enforced.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Current prefix, enforced only while enabled.
    #[must_use]
    pub const fn prefix(&self) -> AddressPrefix {
        self.prefix
    }

    /// Turns prefix enforcement on or off.
    pub const fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Replaces the prefix without changing whether it is enforced.
    pub const fn set_prefix(&mut self, prefix: AddressPrefix) {
        self.prefix = prefix;
    }

    /// Swaps the wrapped device, returning the previous one.
    pub fn replace_device(&mut self, device: Box<dyn Device>) -> Box<dyn Device> {
        std::mem::replace(&mut self.device, device)
    }

    /// The wrapped device.
    #[must_use]
    pub fn device(&self) -> &dyn Device {
        self.device.as_ref()
    }

    fn passes(&self, address: u16) -> bool {
        !self.enabled || self.prefix.matches(address)
    }
}

impl Device for RangeLimiter {
    fn read(&mut self, address: u16) -> Option<u8> {
        if self.passes(address) {
            self.device.read(address)
        } else {
            None
        }
    }

    fn write(&mut self, address: u16, value: u8) -> bool {
        self.passes(address) && self.device.write(address, value)
    }

    fn reset(&mut self) {
        self.device.reset();
    }
}
