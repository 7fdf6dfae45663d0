//! Address-space arbitration between the CPU and mounted devices.
//!
//! Every transfer is offered to every mounted device in mount order. Reads OR
//! together the bytes of all responders, modeling simultaneous output on a
//! shared data bus.

use tracing::warn;

use crate::{Access, Device, Diagnostic, Event, Fault};

/// Handle returned by [`Bus::mount`]; stable for the lifetime of the mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct DeviceId(u32);

impl DeviceId {
    /// Raw handle value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

/// Ordered arena of mounted devices.
#[derive(Debug, Default)]
pub struct Bus {
    devices: Vec<(DeviceId, Box<dyn Device>)>,
    next_id: u32,
}

impl Bus {
    /// Empty bus; every transfer faults until a device is mounted.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a device, returning its handle.
    pub fn mount(&mut self, device: Box<dyn Device>) -> DeviceId {
        let id = DeviceId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.devices.push((id, device));
        id
    }

    /// Removes and returns a device; `None` when `id` is not mounted.
    pub fn unmount(&mut self, id: DeviceId) -> Option<Box<dyn Device>> {
        let index = self.devices.iter().position(|(mounted, _)| *mounted == id)?;
        Some(self.devices.remove(index).1)
    }

    /// Number of mounted devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.devices.len()
    }

    /// Returns `true` when nothing is mounted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }

    /// Mounted devices in mount order.
    pub fn devices(&self) -> impl Iterator<Item = (DeviceId, &dyn Device)> + '_ {
        self.devices
            .iter()
            .map(|(id, device)| (*id, device.as_ref() as &dyn Device))
    }

    /// Looks up a mounted device.
    #[must_use]
    pub fn device(&self, id: DeviceId) -> Option<&dyn Device> {
        self.devices
            .iter()
            .find(|(mounted, _)| *mounted == id)
            .map(|(_, device)| device.as_ref() as &dyn Device)
    }

    /// Looks up a mounted device for reconfiguration.
    #[must_use]
    pub fn device_mut(&mut self, id: DeviceId) -> Option<&mut dyn Device> {
        match self.devices.iter_mut().find(|(mounted, _)| *mounted == id) {
            Some((_, device)) => Some(device.as_mut()),
            None => None,
        }
    }

    /// Resets every mounted device.
    pub fn reset_devices(&mut self) {
        for (_, device) in &mut self.devices {
            device.reset();
        }
    }

    /// Reads `address` from every device and ORs the responses.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::NoDeviceResponded`] when no device answers. More than
    /// one responder is reported as a warning in `diagnostics`.
    pub fn read(&mut self, address: u16, diagnostics: &mut Vec<Diagnostic>) -> Result<u8, Fault> {
        let mut value = 0_u8;
        let mut responders = 0_usize;
        for (_, device) in &mut self.devices {
            if let Some(byte) = device.read(address) {
                value |= byte;
                responders += 1;
            }
        }
        Self::arbitrate(Access::Read, address, responders, diagnostics)?;
        Ok(value)
    }

    /// Offers a write to every device.
    ///
    /// # Errors
    ///
    /// Returns [`Fault::NoDeviceResponded`] when no device accepts the byte.
    /// More than one accepter is reported as a warning in `diagnostics`.
    pub fn write(
        &mut self,
        address: u16,
        value: u8,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), Fault> {
        let mut accepters = 0_usize;
        for (_, device) in &mut self.devices {
            if device.write(address, value) {
                accepters += 1;
            }
        }
        Self::arbitrate(Access::Write, address, accepters, diagnostics)
    }

    fn arbitrate(
        access: Access,
        address: u16,
        count: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), Fault> {
        match count {
            0 => Err(Fault::NoDeviceResponded { access, address }),
            1 => Ok(()),
            _ => {
                warn!(access = access.verb(), address, count, "bus conflict");
                diagnostics.push(Diagnostic::new(Event::MultipleResponders {
                    access,
                    address,
                    count,
                }));
                Ok(())
            }
        }
    }
}
