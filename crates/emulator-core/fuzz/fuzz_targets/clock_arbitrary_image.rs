#![no_main]

use libfuzzer_sys::fuzz_target;
use smpu_emulator::{Machine, MachineConfig, MemoryConfig, Register};

const MAX_CLOCKS: u32 = 4096;

fuzz_target!(|data: &[u8]| {
    let Some((&shape, image)) = data.split_first() else {
        return;
    };

    // Low nibble picks the memory width, the high bit splits the bus in two.
    let address_bits = (shape % 16) + 1;
    let memories = if shape & 0x80 == 0 {
        vec![MemoryConfig {
            address_bits,
            range_prefix: None,
        }]
    } else {
        vec![
            MemoryConfig {
                address_bits,
                range_prefix: Some("0".to_owned()),
            },
            MemoryConfig {
                address_bits,
                range_prefix: Some("1".to_owned()),
            },
        ]
    };
    let Ok(mut machine) = Machine::with_config(&MachineConfig { memories }) else {
        return;
    };

    machine.load((0..=u16::MAX).zip(image.iter().copied()));
    let outcome = machine.run(MAX_CLOCKS);
    assert!(outcome.clocks <= MAX_CLOCKS);
    assert_eq!(outcome.running, !machine.is_halted());
    assert_eq!(
        machine.get_value(Register::R),
        machine.get_value(Register::H) * 256 + machine.get_value(Register::L)
    );

    machine.restart();
    assert!(!machine.is_halted());
    assert_eq!(machine.get_value(Register::S), 255);
});
