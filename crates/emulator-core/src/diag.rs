//! Structured runtime diagnostics returned by clocking and loading.
//!
//! Every diagnostic carries a [`Severity`], so drivers can filter warnings from
//! fatal conditions without inspecting message text. The `Display` form keeps
//! the `INFO:` / `WARN:` / `FATAL:` prefixes used by console output.

use std::fmt;

use crate::{Access, Fault};

/// How serious a runtime diagnostic is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Severity {
    /// Informational; execution state is as expected.
    Info,
    /// Modeled hazard or wraparound; execution continues.
    Warn,
    /// The machine halted and will not resume without a restart.
    Fatal,
}

impl Severity {
    /// Console prefix for this severity.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Fatal => "FATAL",
        }
    }
}

/// Something observable that happened while the machine ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Event {
    /// `HLT` retired.
    Halting,
    /// More than one device answered the same transfer.
    MultipleResponders {
        /// Transfer direction.
        access: Access,
        /// Contested bus address.
        address: u16,
        /// Number of devices that answered.
        count: usize,
    },
    /// `p` wrapped from `0xFFFF` to `0x0000`.
    ProgramCounterWrapped,
    /// `s` wrapped from `0` to `255` while pushing.
    StackPointerUnderflow,
    /// `s` wrapped from `255` to `0` while popping.
    StackPointerOverflow,
    /// A fatal condition halted the machine.
    Fault(Fault),
}

impl Event {
    /// Severity implied by the event.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::Halting => Severity::Info,
            Self::MultipleResponders { .. }
            | Self::ProgramCounterWrapped
            | Self::StackPointerUnderflow
            | Self::StackPointerOverflow => Severity::Warn,
            Self::Fault(_) => Severity::Fatal,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Halting => write!(f, "halting"),
            Self::MultipleResponders {
                access,
                address,
                count,
            } => write!(
                f,
                "{count} devices responded to {} at address {address}; assuming simultaneous output",
                access.verb()
            ),
            Self::ProgramCounterWrapped => write!(f, "program counter overflowed"),
            Self::StackPointerUnderflow => write!(f, "stack pointer underflowed"),
            Self::StackPointerOverflow => write!(f, "stack pointer overflowed"),
            Self::Fault(fault) => write!(f, "{fault}; the machine would hang here"),
        }
    }
}

/// One runtime diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Diagnostic {
    /// Severity, derived from the event when constructed via [`Diagnostic::new`].
    pub severity: Severity,
    /// What happened.
    pub event: Event,
}

impl Diagnostic {
    /// Wraps an event with its implied severity.
    #[must_use]
    pub const fn new(event: Event) -> Self {
        Self {
            severity: event.severity(),
            event,
        }
    }

    /// Returns `true` for fatal diagnostics.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }
}

impl From<Event> for Diagnostic {
    fn from(event: Event) -> Self {
        Self::new(event)
    }
}

impl From<Fault> for Diagnostic {
    fn from(fault: Fault) -> Self {
        Self::new(Event::Fault(fault))
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.severity.label(), self.event)
    }
}
