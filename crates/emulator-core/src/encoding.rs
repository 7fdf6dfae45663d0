/// Assigned opcode ids. Ids `16..=19` are unassigned and, like every value
/// above `45`, fault when executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
#[allow(missing_docs)]
pub enum Opcode {
    Hlt = 0,
    Nop = 1,
    Adr = 2,
    Lda = 3,
    Sta = 4,
    Ldb = 5,
    Swp = 6,
    Ldh = 7,
    Ldl = 8,
    Sth = 9,
    Stl = 10,
    Ldq = 11,
    Stq = 12,
    Cla = 13,
    Clb = 14,
    Clq = 15,
    Add = 20,
    Addc = 21,
    Sub = 22,
    Subc = 23,
    Shl = 24,
    Shlc = 25,
    Shr = 26,
    Shrc = 27,
    And = 28,
    Or = 29,
    Xor = 30,
    Nand = 31,
    Nor = 32,
    Xnor = 33,
    Cksm = 34,
    Cksmc = 35,
    Incr = 36,
    Decr = 37,
    Jmp = 38,
    Jmpc = 39,
    Jmpz = 40,
    Jmpq = 41,
    Psh = 42,
    Pop = 43,
    Subr = 44,
    Ret = 45,
}

/// Every assigned opcode in ascending id order.
pub const OPCODE_TABLE: [Opcode; 42] = [
    Opcode::Hlt,
    Opcode::Nop,
    Opcode::Adr,
    Opcode::Lda,
    Opcode::Sta,
    Opcode::Ldb,
    Opcode::Swp,
    Opcode::Ldh,
    Opcode::Ldl,
    Opcode::Sth,
    Opcode::Stl,
    Opcode::Ldq,
    Opcode::Stq,
    Opcode::Cla,
    Opcode::Clb,
    Opcode::Clq,
    Opcode::Add,
    Opcode::Addc,
    Opcode::Sub,
    Opcode::Subc,
    Opcode::Shl,
    Opcode::Shlc,
    Opcode::Shr,
    Opcode::Shrc,
    Opcode::And,
    Opcode::Or,
    Opcode::Xor,
    Opcode::Nand,
    Opcode::Nor,
    Opcode::Xnor,
    Opcode::Cksm,
    Opcode::Cksmc,
    Opcode::Incr,
    Opcode::Decr,
    Opcode::Jmp,
    Opcode::Jmpc,
    Opcode::Jmpz,
    Opcode::Jmpq,
    Opcode::Psh,
    Opcode::Pop,
    Opcode::Subr,
    Opcode::Ret,
];

impl Opcode {
    /// Raw id as stored in memory.
    #[must_use]
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Decodes a fetched byte.
    #[must_use]
    pub const fn from_u8(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Hlt),
            1 => Some(Self::Nop),
            2 => Some(Self::Adr),
            3 => Some(Self::Lda),
            4 => Some(Self::Sta),
            5 => Some(Self::Ldb),
            6 => Some(Self::Swp),
            7 => Some(Self::Ldh),
            8 => Some(Self::Ldl),
            9 => Some(Self::Sth),
            10 => Some(Self::Stl),
            11 => Some(Self::Ldq),
            12 => Some(Self::Stq),
            13 => Some(Self::Cla),
            14 => Some(Self::Clb),
            15 => Some(Self::Clq),
            20 => Some(Self::Add),
            21 => Some(Self::Addc),
            22 => Some(Self::Sub),
            23 => Some(Self::Subc),
            24 => Some(Self::Shl),
            25 => Some(Self::Shlc),
            26 => Some(Self::Shr),
            27 => Some(Self::Shrc),
            28 => Some(Self::And),
            29 => Some(Self::Or),
            30 => Some(Self::Xor),
            31 => Some(Self::Nand),
            32 => Some(Self::Nor),
            33 => Some(Self::Xnor),
            34 => Some(Self::Cksm),
            35 => Some(Self::Cksmc),
            36 => Some(Self::Incr),
            37 => Some(Self::Decr),
            38 => Some(Self::Jmp),
            39 => Some(Self::Jmpc),
            40 => Some(Self::Jmpz),
            41 => Some(Self::Jmpq),
            42 => Some(Self::Psh),
            43 => Some(Self::Pop),
            44 => Some(Self::Subr),
            45 => Some(Self::Ret),
            _ => None,
        }
    }

    /// Number of immediate bytes pulled at `p` after the opcode.
    #[must_use]
    pub const fn immediate_bytes(self) -> u8 {
        match self {
            Self::Adr => 2,
            Self::Cla | Self::Clb | Self::Clq => 1,
            _ => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Opcode, OPCODE_TABLE};

    #[test]
    fn table_is_sorted_and_round_trips_ids() {
        for pair in OPCODE_TABLE.windows(2) {
            assert!(pair[0].id() < pair[1].id());
        }
        for opcode in OPCODE_TABLE {
            assert_eq!(Opcode::from_u8(opcode.id()), Some(opcode));
        }
    }

    #[test]
    fn unassigned_ids_do_not_decode() {
        for id in 16..=19 {
            assert_eq!(Opcode::from_u8(id), None);
        }
        for id in 46..=u8::MAX {
            assert_eq!(Opcode::from_u8(id), None);
        }
    }

    #[test]
    fn decoded_count_matches_table() {
        let decoded = (0..=u8::MAX).filter_map(Opcode::from_u8).count();
        assert_eq!(decoded, OPCODE_TABLE.len());
    }

    #[test]
    fn immediates_cover_address_and_constant_loads() {
        assert_eq!(Opcode::Adr.immediate_bytes(), 2);
        assert_eq!(Opcode::Cla.immediate_bytes(), 1);
        assert_eq!(Opcode::Clq.immediate_bytes(), 1);
        assert_eq!(Opcode::Add.immediate_bytes(), 0);
    }
}
