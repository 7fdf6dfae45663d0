use thiserror::Error;

/// Direction of a bus transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Access {
    /// Device-to-CPU transfer.
    Read,
    /// CPU-to-device transfer.
    Write,
}

impl Access {
    /// Lowercase verb used in diagnostic text.
    #[must_use]
    pub const fn verb(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

/// Fatal runtime conditions. Raising any of these halts the machine until restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Fault {
    /// No mounted device answered a bus transfer; real hardware would hang.
    #[error("no device responded to {} at address {address}", access.verb())]
    NoDeviceResponded {
        /// Transfer direction.
        access: Access,
        /// Bus address that went unanswered.
        address: u16,
    },
    /// The fetched byte is not an assigned opcode id.
    #[error("invalid instruction {0}")]
    InvalidOpcode(u8),
}

impl Fault {
    /// Address involved in the fault, when it was a bus fault.
    #[must_use]
    pub const fn address(self) -> Option<u16> {
        match self {
            Self::NoDeviceResponded { address, .. } => Some(address),
            Self::InvalidOpcode(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Access, Fault};

    #[test]
    fn bus_fault_message_names_direction_and_address() {
        let fault = Fault::NoDeviceResponded {
            access: Access::Write,
            address: 0xFF00,
        };
        assert_eq!(
            fault.to_string(),
            "no device responded to write at address 65280"
        );
        assert_eq!(fault.address(), Some(0xFF00));
    }

    #[test]
    fn invalid_opcode_message_names_value() {
        let fault = Fault::InvalidOpcode(17);
        assert_eq!(fault.to_string(), "invalid instruction 17");
        assert_eq!(fault.address(), None);
    }
}
