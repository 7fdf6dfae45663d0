//! Mnemonic table keyed to the emulator's opcode ids.

use std::fmt;

use smpu_emulator::Opcode;

/// Token kind an instruction operand must have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandKind {
    /// A numeric byte such as `0x05`.
    ByteLiteral,
    /// One half of a label address (`@name.h` / `@name.l`, or a split `@name`).
    AddressByte,
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ByteLiteral => "byte",
            Self::AddressByte => "address byte",
        })
    }
}

/// One assembler instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InstructionDef {
    /// Uppercase mnemonic.
    pub mnemonic: &'static str,
    /// Opcode emitted for the mnemonic.
    pub opcode: Opcode,
    /// Operands that must follow on the same line, in order.
    pub operands: &'static [OperandKind],
}

const NONE: &[OperandKind] = &[];
const BYTE: &[OperandKind] = &[OperandKind::ByteLiteral];
const ADDRESS: &[OperandKind] = &[OperandKind::AddressByte, OperandKind::AddressByte];

const fn def(
    mnemonic: &'static str,
    opcode: Opcode,
    operands: &'static [OperandKind],
) -> InstructionDef {
    InstructionDef {
        mnemonic,
        opcode,
        operands,
    }
}

/// Every mnemonic, in opcode order.
pub const INSTRUCTION_TABLE: &[InstructionDef] = &[
    def("HLT", Opcode::Hlt, NONE),
    def("NOP", Opcode::Nop, NONE),
    def("ADR", Opcode::Adr, ADDRESS),
    def("LDA", Opcode::Lda, NONE),
    def("STA", Opcode::Sta, NONE),
    def("LDB", Opcode::Ldb, NONE),
    def("SWP", Opcode::Swp, NONE),
    def("LDH", Opcode::Ldh, NONE),
    def("LDL", Opcode::Ldl, NONE),
    def("STH", Opcode::Sth, NONE),
    def("STL", Opcode::Stl, NONE),
    def("LDQ", Opcode::Ldq, NONE),
    def("STQ", Opcode::Stq, NONE),
    def("CLA", Opcode::Cla, BYTE),
    def("CLB", Opcode::Clb, BYTE),
    def("CLQ", Opcode::Clq, BYTE),
    def("ADD", Opcode::Add, NONE),
    def("ADDC", Opcode::Addc, NONE),
    def("SUB", Opcode::Sub, NONE),
    def("SUBC", Opcode::Subc, NONE),
    def("SHL", Opcode::Shl, NONE),
    def("SHLC", Opcode::Shlc, NONE),
    def("SHR", Opcode::Shr, NONE),
    def("SHRC", Opcode::Shrc, NONE),
    def("AND", Opcode::And, NONE),
    def("OR", Opcode::Or, NONE),
    def("XOR", Opcode::Xor, NONE),
    def("NAND", Opcode::Nand, NONE),
    def("NOR", Opcode::Nor, NONE),
    def("XNOR", Opcode::Xnor, NONE),
    def("CKSM", Opcode::Cksm, NONE),
    def("CKSMC", Opcode::Cksmc, NONE),
    def("INCR", Opcode::Incr, NONE),
    def("DECR", Opcode::Decr, NONE),
    def("JMP", Opcode::Jmp, NONE),
    def("JMPC", Opcode::Jmpc, NONE),
    def("JMPZ", Opcode::Jmpz, NONE),
    def("JMPQ", Opcode::Jmpq, NONE),
    def("PSH", Opcode::Psh, NONE),
    def("POP", Opcode::Pop, NONE),
    def("SUBR", Opcode::Subr, NONE),
    def("RET", Opcode::Ret, NONE),
];

/// Finds an instruction by exact (case-sensitive) mnemonic.
#[must_use]
pub fn lookup(mnemonic: &str) -> Option<&'static InstructionDef> {
    INSTRUCTION_TABLE
        .iter()
        .find(|instruction| instruction.mnemonic == mnemonic)
}
