//! Host-facing machine context, configuration, and step reporting.
//!
//! A [`Machine`] owns its register file, bus, and run state; nothing is
//! global, so any number of machines can coexist in one process.

use tracing::{debug, info};

use crate::{
    AddressPrefix, Bus, ConfigError, Device, DeviceId, Diagnostic, Fault, HaltReason, Memory,
    RangeLimiter, Register, RegisterError, RegisterFile, RunState, MAX_ADDRESS_BITS,
};

/// One memory entry of a [`MachineConfig`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct MemoryConfig {
    /// Memory holds `2^address_bits` bytes; `1..=16`.
    pub address_bits: u8,
    /// When present, the memory only answers addresses starting with these bits.
    pub range_prefix: Option<String>,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            address_bits: MAX_ADDRESS_BITS,
            range_prefix: None,
        }
    }
}

impl MemoryConfig {
    /// Builds the configured device: a memory wrapped in a range limiter.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for an out-of-range width or a malformed prefix.
    pub fn build(&self) -> Result<RangeLimiter, ConfigError> {
        let memory = Box::new(Memory::new(self.address_bits)?);
        Ok(match &self.range_prefix {
            Some(prefix) => RangeLimiter::with_prefix(memory, AddressPrefix::parse(prefix)?),
            None => RangeLimiter::new(memory),
        })
    }
}

/// Devices mounted by [`Machine::with_config`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(default)
)]
pub struct MachineConfig {
    /// Memories in mount order.
    pub memories: Vec<MemoryConfig>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            memories: vec![MemoryConfig::default()],
        }
    }
}

/// Result of a single [`Machine::clock`] or [`Machine::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct StepReport {
    /// Program counter when the step began.
    pub pc: u16,
    /// Diagnostics in the order they were raised.
    pub diagnostics: Vec<Diagnostic>,
    /// `false` once the machine has halted.
    pub running: bool,
}

/// Aggregated result of [`Machine::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RunOutcome {
    /// Clocks that fetched an instruction.
    pub clocks: u32,
    /// Every diagnostic raised, paired with the program counter of its step.
    pub diagnostics: Vec<(u16, Diagnostic)>,
    /// `false` when the run stopped on a halt rather than the clock budget.
    pub running: bool,
}

/// CPU plus bus: the simulator's session state.
#[derive(Debug, Default)]
pub struct Machine {
    pub(crate) registers: RegisterFile,
    pub(crate) bus: Bus,
    pub(crate) run_state: RunState,
}

impl Machine {
    /// Powered-on machine with an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Machine with one range-limited memory mounted per config entry.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found; nothing is mounted in that case.
    pub fn with_config(config: &MachineConfig) -> Result<Self, ConfigError> {
        let devices = config
            .memories
            .iter()
            .map(MemoryConfig::build)
            .collect::<Result<Vec<_>, _>>()?;
        let mut machine = Self::new();
        for device in devices {
            machine.mount(Box::new(device));
        }
        debug!(devices = machine.bus.len(), "machine configured");
        Ok(machine)
    }

    /// Mounts a device at the end of the bus.
    pub fn mount(&mut self, device: Box<dyn Device>) -> DeviceId {
        self.bus.mount(device)
    }

    /// Unmounts a device, handing it back to the caller.
    pub fn unmount(&mut self, id: DeviceId) -> Option<Box<dyn Device>> {
        self.bus.unmount(id)
    }

    /// The bus and its mounted devices.
    #[must_use]
    pub const fn bus(&self) -> &Bus {
        &self.bus
    }

    /// Mutable bus access for device reconfiguration.
    pub const fn bus_mut(&mut self) -> &mut Bus {
        &mut self.bus
    }

    /// Current register file.
    #[must_use]
    pub const fn registers(&self) -> &RegisterFile {
        &self.registers
    }

    /// Reads any register, including the derived `r` and `z`.
    #[must_use]
    pub fn get_value(&self, register: Register) -> u16 {
        self.registers.get(register)
    }

    /// Writes a register with its modulo wrap.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::ReadOnly`] for `r` and `z`.
    pub fn set_value(&mut self, register: Register, value: u32) -> Result<(), RegisterError> {
        self.registers.set(register, value)
    }

    /// Current run state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Returns `true` once `HLT` or a fault stopped the machine.
    #[must_use]
    pub const fn is_halted(&self) -> bool {
        !self.run_state.is_running()
    }

    /// Rebuilds the register file, clears the halt, and resets every device.
    pub fn restart(&mut self) {
        self.registers = RegisterFile::default();
        self.run_state = RunState::Running;
        self.bus.reset_devices();
        info!("machine restarted");
    }

    /// Writes an assembled image through the bus.
    ///
    /// A byte that no device accepts halts the machine with a fatal
    /// diagnostic and stops loading.
    pub fn load<I>(&mut self, image: I) -> StepReport
    where
        I: IntoIterator<Item = (u16, u8)>,
    {
        let mut diagnostics = Vec::new();
        let mut written = 0_usize;
        for (address, byte) in image {
            if let Err(fault) = self.bus.write(address, byte, &mut diagnostics) {
                self.halt_on_fault(fault, &mut diagnostics);
                break;
            }
            written += 1;
        }
        debug!(written, "image loaded");
        StepReport {
            pc: self.registers.p(),
            diagnostics,
            running: self.run_state.is_running(),
        }
    }

    /// Clocks until the machine halts or `max_clocks` clocks have run.
    pub fn run(&mut self, max_clocks: u32) -> RunOutcome {
        let mut outcome = RunOutcome {
            clocks: 0,
            diagnostics: Vec::new(),
            running: self.run_state.is_running(),
        };
        while outcome.running && outcome.clocks < max_clocks {
            let report = self.clock();
            let pc = report.pc;
            outcome.clocks += 1;
            outcome
                .diagnostics
                .extend(report.diagnostics.into_iter().map(|d| (pc, d)));
            outcome.running = report.running;
        }
        outcome
    }

    pub(crate) fn halt_on_fault(&mut self, fault: Fault, diagnostics: &mut Vec<Diagnostic>) {
        tracing::error!(%fault, pc = self.registers.p(), "machine halted");
        diagnostics.push(Diagnostic::from(fault));
        self.run_state = RunState::Halted(HaltReason::Fault(fault));
    }
}
