//! Bus arbitration and device reconfiguration through the public machine API.

use proptest::prelude::*;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use smpu_emulator::{
    Access, AddressPrefix, Device, Event, Fault, Machine, MachineConfig, Memory, MemoryConfig,
    RangeLimiter, Register, Severity,
};
use thiserror as _;
use tracing as _;

#[derive(Debug)]
struct Latch {
    value: u8,
    answers: bool,
}

impl Device for Latch {
    fn read(&mut self, _address: u16) -> Option<u8> {
        self.answers.then_some(self.value)
    }

    fn write(&mut self, _address: u16, value: u8) -> bool {
        if self.answers {
            self.value = value;
        }
        self.answers
    }

    fn reset(&mut self) {
        self.value = 0;
    }
}

fn lda_machine() -> Machine {
    // ADR 0x40 0x00; LDA
    let mut machine = Machine::new();
    let mut program = Memory::new(2).expect("valid width");
    for (address, byte) in [(0, 2), (1, 0x40), (2, 0x00), (3, 3)] {
        program.write(address, byte);
    }
    let prefix = AddressPrefix::parse("0000000000000").expect("valid prefix");
    machine.mount(Box::new(RangeLimiter::with_prefix(Box::new(program), prefix)));
    machine
}

#[test]
fn zero_responders_halt_the_machine() {
    let mut machine = lda_machine();
    machine.clock();
    let report = machine.clock();
    assert!(!report.running);
    let last = report.diagnostics.last().expect("fatal diagnostic");
    assert_eq!(last.severity, Severity::Fatal);
    assert_eq!(
        last.event,
        Event::Fault(Fault::NoDeviceResponded {
            access: Access::Read,
            address: 0x4000
        })
    );
}

#[test]
fn one_responder_supplies_the_byte() {
    let mut machine = lda_machine();
    let prefix = AddressPrefix::parse("01").expect("valid prefix");
    machine.mount(Box::new(RangeLimiter::with_prefix(
        Box::new(Latch {
            value: 0x3C,
            answers: true,
        }),
        prefix,
    )));
    machine.clock();
    let report = machine.clock();
    assert!(report.running);
    assert!(report.diagnostics.is_empty());
    assert_eq!(machine.get_value(Register::A), 0x3C);
}

#[test]
fn overlapping_devices_warn_and_or() {
    let mut machine = lda_machine();
    machine.mount(Box::new(Latch {
        value: 0,
        answers: true,
    }));
    // The latch answers the fetch too, but ORing zero leaves the opcode intact.
    let report = machine.clock();
    assert!(report.running);
    assert_eq!(report.diagnostics.len(), 3);
    assert!(report
        .diagnostics
        .iter()
        .all(|d| matches!(d.event, Event::MultipleResponders { access: Access::Read, count: 2, .. })));
}

#[test]
fn unmounted_device_stops_answering() {
    let mut machine = Machine::new();
    let id = machine.mount(Box::new(Latch {
        value: 1,
        answers: true,
    }));
    assert!(machine.clock().running);
    let device = machine.unmount(id).expect("device was mounted");
    assert!(format!("{device:?}").contains("Latch"));
    let report = machine.clock();
    assert!(!report.running);
}

#[test]
fn restart_resets_every_device() {
    let mut machine = Machine::new();
    machine.mount(Box::new(Latch {
        value: 9,
        answers: true,
    }));
    machine.restart();
    // The latch now reads 0, which is HLT.
    let report = machine.clock();
    assert!(!report.running);
    assert_eq!(report.diagnostics[0].severity, Severity::Info);
}

#[test]
fn split_address_space_keeps_halves_apart() {
    let config = MachineConfig {
        memories: vec![
            MemoryConfig {
                address_bits: 16,
                range_prefix: Some("0".to_owned()),
            },
            MemoryConfig {
                address_bits: 16,
                range_prefix: Some("1".to_owned()),
            },
        ],
    };
    let mut machine = Machine::with_config(&config).expect("valid config");
    // CLA 5; PSH; HLT: the push lands in the upper memory.
    let report = machine.load([(0, 13), (1, 5), (2, 42), (3, 0)]);
    assert!(report.running);
    let outcome = machine.run(10);
    assert!(!outcome.running);
    assert_eq!(outcome.clocks, 3);
    assert_eq!(outcome.diagnostics.len(), 1);
    assert_eq!(machine.get_value(Register::S), 254);
}

#[test]
fn bus_devices_can_be_inspected() {
    let machine = Machine::with_config(&MachineConfig::default()).expect("valid config");
    let listed: Vec<_> = machine.bus().devices().collect();
    assert_eq!(listed.len(), 1);
    assert!(format!("{:?}", listed[0].1).contains("RangeLimiter"));
}

proptest! {
    #[test]
    fn reads_or_every_responder(values in proptest::collection::vec(any::<u8>(), 1..6), address in any::<u16>()) {
        let mut machine = Machine::new();
        for value in &values {
            machine.mount(Box::new(Latch { value: *value, answers: true }));
        }
        machine.mount(Box::new(Latch { value: 0xFF, answers: false }));
        let mut diagnostics = Vec::new();
        let read = machine.bus_mut().read(address, &mut diagnostics);
        let expected = values.iter().fold(0, |acc, value| acc | value);
        prop_assert_eq!(read, Ok(expected));
        prop_assert_eq!(diagnostics.len(), usize::from(values.len() > 1));
    }

    #[test]
    fn range_prefix_routes_by_top_bits(bits in "[01]{1,16}", address in any::<u16>()) {
        let prefix = AddressPrefix::parse(&bits).expect("generated prefix is valid");
        let mut limiter = RangeLimiter::with_prefix(Box::new(Memory::full_range()), prefix);
        let top = format!("{address:016b}");
        prop_assert_eq!(limiter.read(address).is_some(), top.starts_with(bits.as_str()));
    }
}
