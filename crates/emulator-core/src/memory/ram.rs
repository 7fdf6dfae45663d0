use super::{ConfigError, Device};

/// Widest supported memory, covering the whole 64 KiB address space.
pub const MAX_ADDRESS_BITS: u8 = 16;

/// Byte-addressed read/write memory of `2^n` bytes. Addresses wrap modulo the
/// size, so a small memory is mirrored across the whole bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Memory {
    address_bits: u8,
    bytes: Box<[u8]>,
}

impl Memory {
    /// Allocates a zeroed memory of `2^address_bits` bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AddressBits`] unless `address_bits` is in `1..=16`.
    pub fn new(address_bits: u8) -> Result<Self, ConfigError> {
        Ok(Self {
            address_bits,
            bytes: zeroed(address_bits)?,
        })
    }

    /// Full-range 64 KiB memory.
    #[must_use]
    pub fn full_range() -> Self {
        Self {
            address_bits: MAX_ADDRESS_BITS,
            bytes: vec![0; 1 << MAX_ADDRESS_BITS].into_boxed_slice(),
        }
    }

    /// Address width in bits.
    #[must_use]
    pub const fn address_bits(&self) -> u8 {
        self.address_bits
    }

    /// Size in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always `false`; the smallest memory holds two bytes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Current contents.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Resizes the memory, keeping the bytes both sizes have in common.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::AddressBits`] unless `address_bits` is in `1..=16`;
    /// the memory is left untouched in that case.
    pub fn set_address_bits(&mut self, address_bits: u8) -> Result<(), ConfigError> {
        if address_bits == self.address_bits {
            return Ok(());
        }
        let mut resized = zeroed(address_bits)?;
        let shared = resized.len().min(self.bytes.len());
        resized[..shared].copy_from_slice(&self.bytes[..shared]);
        self.bytes = resized;
        self.address_bits = address_bits;
        Ok(())
    }

    fn index(&self, address: u16) -> usize {
        usize::from(address) % self.bytes.len()
    }
}

fn zeroed(address_bits: u8) -> Result<Box<[u8]>, ConfigError> {
    if !(1..=MAX_ADDRESS_BITS).contains(&address_bits) {
        return Err(ConfigError::AddressBits(address_bits));
    }
    Ok(vec![0; 1 << address_bits].into_boxed_slice())
}

impl Device for Memory {
    fn read(&mut self, address: u16) -> Option<u8> {
        Some(self.bytes[self.index(address)])
    }

    fn write(&mut self, address: u16, value: u8) -> bool {
        let index = self.index(address);
        self.bytes[index] = value;
        true
    }

    fn reset(&mut self) {
        self.bytes.fill(0);
    }
}
