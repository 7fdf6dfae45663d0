use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Power-on value of the stack pointer; the first push lands at `0xFFFF`.
pub const STACK_POINTER_RESET: u8 = 0xFF;

/// Register names accepted by [`RegisterFile::get`] and [`RegisterFile::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Register {
    /// Accumulator.
    A,
    /// Second ALU operand.
    B,
    /// Counter, source of the zero flag.
    Q,
    /// High byte of the address register `r`.
    H,
    /// Low byte of the address register `r`.
    L,
    /// 16-bit program counter.
    P,
    /// Stack pointer into page `0xFF00`.
    S,
    /// One-bit carry.
    C,
    /// Derived `h * 256 + l`; read-only.
    R,
    /// Derived `1` when `q == 0`; read-only.
    Z,
}

impl Register {
    /// Every register in display order.
    pub const ALL: [Self; 10] = [
        Self::A,
        Self::B,
        Self::Q,
        Self::H,
        Self::L,
        Self::P,
        Self::S,
        Self::C,
        Self::R,
        Self::Z,
    ];

    /// Decodes a single-letter register name (case-insensitive).
    #[must_use]
    pub const fn from_char(name: char) -> Option<Self> {
        match name.to_ascii_lowercase() {
            'a' => Some(Self::A),
            'b' => Some(Self::B),
            'q' => Some(Self::Q),
            'h' => Some(Self::H),
            'l' => Some(Self::L),
            'p' => Some(Self::P),
            's' => Some(Self::S),
            'c' => Some(Self::C),
            'r' => Some(Self::R),
            'z' => Some(Self::Z),
            _ => None,
        }
    }

    /// Lowercase register letter.
    #[must_use]
    pub const fn name(self) -> char {
        match self {
            Self::A => 'a',
            Self::B => 'b',
            Self::Q => 'q',
            Self::H => 'h',
            Self::L => 'l',
            Self::P => 'p',
            Self::S => 's',
            Self::C => 'c',
            Self::R => 'r',
            Self::Z => 'z',
        }
    }

    /// Returns `true` for registers computed from others.
    #[must_use]
    pub const fn is_derived(self) -> bool {
        matches!(self, Self::R | Self::Z)
    }

    /// Exclusive upper bound of the register's value range.
    #[must_use]
    pub const fn modulus(self) -> u32 {
        match self {
            Self::C | Self::Z => 2,
            Self::P | Self::R => 1 << 16,
            Self::A | Self::B | Self::Q | Self::H | Self::L | Self::S => 1 << 8,
        }
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Register name or write errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// The name is not one of `a b q h l p s c r z`.
    #[error("unknown register `{0}`")]
    Unknown(String),
    /// `r` and `z` are computed and cannot be written.
    #[error("register `{0}` is derived and read-only")]
    ReadOnly(Register),
}

impl FromStr for Register {
    type Err = RegisterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(name), None) => {
                Self::from_char(name).ok_or_else(|| RegisterError::Unknown(s.to_owned()))
            }
            _ => Err(RegisterError::Unknown(s.to_owned())),
        }
    }
}

/// CPU register file.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    a: u8,
    b: u8,
    q: u8,
    h: u8,
    l: u8,
    s: u8,
    p: u16,
    c: bool,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self {
            a: 0,
            b: 0,
            q: 0,
            h: 0,
            l: 0,
            s: STACK_POINTER_RESET,
            p: 0,
            c: false,
        }
    }
}

impl RegisterFile {
    /// Reads `a`.
    #[must_use]
    pub const fn a(&self) -> u8 {
        self.a
    }

    /// Writes `a`.
    pub const fn set_a(&mut self, value: u8) {
        self.a = value;
    }

    /// Reads `b`.
    #[must_use]
    pub const fn b(&self) -> u8 {
        self.b
    }

    /// Writes `b`.
    pub const fn set_b(&mut self, value: u8) {
        self.b = value;
    }

    /// Reads `q`.
    #[must_use]
    pub const fn q(&self) -> u8 {
        self.q
    }

    /// Writes `q`.
    pub const fn set_q(&mut self, value: u8) {
        self.q = value;
    }

    /// Reads `h`.
    #[must_use]
    pub const fn h(&self) -> u8 {
        self.h
    }

    /// Writes `h`.
    pub const fn set_h(&mut self, value: u8) {
        self.h = value;
    }

    /// Reads `l`.
    #[must_use]
    pub const fn l(&self) -> u8 {
        self.l
    }

    /// Writes `l`.
    pub const fn set_l(&mut self, value: u8) {
        self.l = value;
    }

    /// Reads `s`.
    #[must_use]
    pub const fn s(&self) -> u8 {
        self.s
    }

    /// Writes `s`.
    pub const fn set_s(&mut self, value: u8) {
        self.s = value;
    }

    /// Reads `p`.
    #[must_use]
    pub const fn p(&self) -> u16 {
        self.p
    }

    /// Writes `p`.
    pub const fn set_p(&mut self, value: u16) {
        self.p = value;
    }

    /// Reads the carry flag.
    #[must_use]
    pub const fn c(&self) -> bool {
        self.c
    }

    /// Writes the carry flag.
    pub const fn set_c(&mut self, value: bool) {
        self.c = value;
    }

    /// Stores an ALU result in `a` and its carry in `c`.
    pub const fn set_a_with_carry(&mut self, (value, carry): (u8, bool)) {
        self.a = value;
        self.c = carry;
    }

    /// Derived address register `h * 256 + l`.
    #[must_use]
    pub const fn r(&self) -> u16 {
        u16::from_be_bytes([self.h, self.l])
    }

    /// Derived zero flag, set while `q == 0`.
    #[must_use]
    pub const fn z(&self) -> bool {
        self.q == 0
    }

    /// Reads any register, widened to `u16`.
    #[must_use]
    pub fn get(&self, register: Register) -> u16 {
        match register {
            Register::A => u16::from(self.a),
            Register::B => u16::from(self.b),
            Register::Q => u16::from(self.q),
            Register::H => u16::from(self.h),
            Register::L => u16::from(self.l),
            Register::P => self.p,
            Register::S => u16::from(self.s),
            Register::C => u16::from(self.c),
            Register::R => self.r(),
            Register::Z => u16::from(self.z()),
        }
    }

    /// Writes a register, reducing `value` modulo the register's width.
    ///
    /// # Errors
    ///
    /// Returns [`RegisterError::ReadOnly`] for the derived registers `r` and `z`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn set(&mut self, register: Register, value: u32) -> Result<(), RegisterError> {
        let wrapped = value % register.modulus();
        match register {
            Register::A => self.a = wrapped as u8,
            Register::B => self.b = wrapped as u8,
            Register::Q => self.q = wrapped as u8,
            Register::H => self.h = wrapped as u8,
            Register::L => self.l = wrapped as u8,
            Register::S => self.s = wrapped as u8,
            Register::P => self.p = wrapped as u16,
            Register::C => self.c = wrapped == 1,
            Register::R | Register::Z => return Err(RegisterError::ReadOnly(register)),
        }
        Ok(())
    }
}

impl fmt::Display for RegisterFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for register in Register::ALL {
            if !first {
                f.write_str(" ")?;
            }
            first = false;
            write!(f, "{register}={}", self.get(register))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Register, RegisterError, RegisterFile, STACK_POINTER_RESET};

    #[test]
    fn power_on_values() {
        let regs = RegisterFile::default();
        for register in Register::ALL {
            let expected = match register {
                Register::S => u16::from(STACK_POINTER_RESET),
                Register::Z => 1,
                _ => 0,
            };
            assert_eq!(regs.get(register), expected, "register {register}");
        }
    }

    #[test]
    fn derived_registers_follow_sources() {
        let mut regs = RegisterFile::default();
        regs.set_h(0x12);
        regs.set_l(0x34);
        regs.set_q(3);
        assert_eq!(regs.r(), 0x1234);
        assert!(!regs.z());
        regs.set_q(0);
        assert!(regs.z());
    }

    #[test]
    fn set_wraps_per_register_width() {
        let mut regs = RegisterFile::default();
        regs.set(Register::A, 300).expect("a is writable");
        regs.set(Register::P, 65_537).expect("p is writable");
        regs.set(Register::C, 3).expect("c is writable");
        assert_eq!(regs.a(), 44);
        assert_eq!(regs.p(), 1);
        assert!(regs.c());
    }

    #[test]
    fn derived_registers_reject_writes() {
        let mut regs = RegisterFile::default();
        assert_eq!(
            regs.set(Register::R, 1),
            Err(RegisterError::ReadOnly(Register::R))
        );
        assert_eq!(
            regs.set(Register::Z, 0),
            Err(RegisterError::ReadOnly(Register::Z))
        );
    }

    #[test]
    fn names_parse_case_insensitively() {
        assert_eq!("a".parse::<Register>(), Ok(Register::A));
        assert_eq!("Z".parse::<Register>(), Ok(Register::Z));
        assert_eq!(
            "ab".parse::<Register>(),
            Err(RegisterError::Unknown("ab".to_owned()))
        );
        assert_eq!(
            "x".parse::<Register>(),
            Err(RegisterError::Unknown("x".to_owned()))
        );
    }

    #[test]
    fn display_lists_every_register() {
        let text = RegisterFile::default().to_string();
        assert_eq!(text, "a=0 b=0 q=0 h=0 l=0 p=0 s=255 c=0 r=0 z=1");
    }
}
