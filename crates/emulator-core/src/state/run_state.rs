use crate::Fault;

/// Why the machine stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum HaltReason {
    /// `HLT` retired.
    Instruction,
    /// A fatal runtime condition stopped execution.
    Fault(Fault),
}

/// Execution state of the CPU. `Halted` is terminal until restart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to fetch the next instruction.
    #[default]
    Running,
    /// Stopped; clocking is a no-op.
    Halted(HaltReason),
}

impl RunState {
    /// Returns `true` while instructions are still being fetched.
    #[must_use]
    pub const fn is_running(self) -> bool {
        matches!(self, Self::Running)
    }

    /// Returns the fault that halted the machine, if any.
    #[must_use]
    pub const fn fault(self) -> Option<Fault> {
        match self {
            Self::Halted(HaltReason::Fault(fault)) => Some(fault),
            Self::Running | Self::Halted(HaltReason::Instruction) => None,
        }
    }
}
