//! Stack discipline: `s` indexes page `0xFF00`, pushes write then decrement,
//! pops increment then read.

use crate::{Diagnostic, Event, Fault, Machine, STACK_PAGE};

impl Machine {
    pub(super) fn push(&mut self, value: u8, diagnostics: &mut Vec<Diagnostic>) -> Result<(), Fault> {
        let s = self.registers.s();
        self.bus.write(STACK_PAGE + u16::from(s), value, diagnostics)?;
        let s = s.wrapping_sub(1);
        self.registers.set_s(s);
        if s == u8::MAX {
            tracing::warn!("stack pointer underflowed");
            diagnostics.push(Diagnostic::new(Event::StackPointerUnderflow));
        }
        Ok(())
    }

    pub(super) fn pop(&mut self, diagnostics: &mut Vec<Diagnostic>) -> Result<u8, Fault> {
        let s = self.registers.s().wrapping_add(1);
        self.registers.set_s(s);
        if s == 0 {
            tracing::warn!("stack pointer overflowed");
            diagnostics.push(Diagnostic::new(Event::StackPointerOverflow));
        }
        self.bus.read(STACK_PAGE + u16::from(s), diagnostics)
    }
}
