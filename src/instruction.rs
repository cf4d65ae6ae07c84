//! Types for representing instructions and their parts, and the bit layout of
//! instruction words.
//!
//! ```text
//!  31      26 25    21 20  17 16  13 12   9 8        0
//! +----------+--------+------+------+------+----------+
//! |  opcode  |  mode  |  rd  | rs1  | rs2  | reserved |
//! +----------+--------+------+------+------+----------+
//! ```
//!
//! Some (opcode, mode) pairs are followed by an extension word holding an
//! immediate value, an absolute address, a port number or a stack offset. See
//! [Mode::has_extension_word].

use std::convert::TryFrom;
use std::fmt;

const OPCODE_SHIFT: u32 = 26;
const MODE_SHIFT: u32 = 21;
const RD_SHIFT: u32 = 17;
const RS1_SHIFT: u32 = 13;
const RS2_SHIFT: u32 = 9;

const OPCODE_MASK: u32 = 0x3F;
const MODE_MASK: u32 = 0x1F;
const REGISTER_MASK: u32 = 0xF;

/// Field value of a register operand that the instruction does not use.
pub const ABSENT_REGISTER: u8 = 0xF;

/// Number of register slots in the register file.
pub const REGISTER_COUNT: usize = 16;

/// Register slot of the stack pointer. It has no encoding of its own and is
/// only used implicitly by the stack instructions and the [StackOffset](Mode::StackOffset)
/// addressing mode.
pub const SP_INDEX: usize = 15;

/// Describes the predicate of a (un)conditional jump instruction.
/// The conditions read the flags left by the latest `CMP` or arithmetic instruction
/// and compare as signed integers.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum JumpCondition {
    /// Unconditional jump. (`JMP`)
    Always,
    /// Jump if the zero flag is set. (`JEQ`)
    Equal,
    /// (`JNE`)
    NotEqual,
    /// (`JLT`)
    Less,
    /// (`JLE`)
    LessEqual,
    /// (`JGT`)
    Greater,
    /// (`JGE`)
    GreaterEqual,
}

/// Instructions of the machine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum OpCode {
    /// Does nothing.
    NoOperation,

    /// Stops the execution.
    Halt,

    /// Copies a register or an immediate into a register.
    Move,

    /// Loads a word from data memory into a register.
    Load,

    /// Loads a single byte from data memory into a register.
    LoadByte,

    /// Stores a register into a data memory word.
    Store,

    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,

    /// Subtracts the second operand from the first and only updates the flags.
    Compare,

    Jump { condition: JumpCondition },

    Push,
    Pop,

    /// Reads the latched input byte of a port.
    In,

    /// Writes the low byte of a register to a port.
    Out,

    /// Writes a whole register to a port, low half first.
    OutLong,

    EnableInterrupts,
    DisableInterrupts,
    ReturnFromInterrupt,

    /// Adds a signed immediate to the stack pointer.
    AddStackPointer,
}

impl OpCode {
    pub fn as_byte(&self) -> u8 {
        match self {
            OpCode::NoOperation => 0x00,
            OpCode::Halt => 0x01,
            OpCode::Move => 0x02,
            OpCode::Load => 0x03,
            OpCode::LoadByte => 0x04,
            OpCode::Store => 0x05,

            OpCode::Add => 0x06,
            OpCode::Subtract => 0x07,
            OpCode::Multiply => 0x08,
            OpCode::Divide => 0x09,
            OpCode::Modulo => 0x0A,
            OpCode::Compare => 0x0B,

            OpCode::Jump { condition: JumpCondition::Always } => 0x0C,
            OpCode::Jump { condition: JumpCondition::Equal } => 0x0D,
            OpCode::Jump { condition: JumpCondition::NotEqual } => 0x0E,
            OpCode::Jump { condition: JumpCondition::Less } => 0x0F,
            OpCode::Jump { condition: JumpCondition::LessEqual } => 0x10,
            OpCode::Jump { condition: JumpCondition::Greater } => 0x11,
            OpCode::Jump { condition: JumpCondition::GreaterEqual } => 0x12,

            OpCode::Push => 0x13,
            OpCode::Pop => 0x14,
            OpCode::In => 0x15,
            OpCode::Out => 0x16,
            OpCode::OutLong => 0x17,

            OpCode::EnableInterrupts => 0x18,
            OpCode::DisableInterrupts => 0x19,
            OpCode::ReturnFromInterrupt => 0x1A,
            OpCode::AddStackPointer => 0x1B,
        }
    }

    pub fn from_byte(byte: u8) -> Option<OpCode> {
        let opcode = match byte {
            0x00 => OpCode::NoOperation,
            0x01 => OpCode::Halt,
            0x02 => OpCode::Move,
            0x03 => OpCode::Load,
            0x04 => OpCode::LoadByte,
            0x05 => OpCode::Store,

            0x06 => OpCode::Add,
            0x07 => OpCode::Subtract,
            0x08 => OpCode::Multiply,
            0x09 => OpCode::Divide,
            0x0A => OpCode::Modulo,
            0x0B => OpCode::Compare,

            0x0C => OpCode::Jump { condition: JumpCondition::Always },
            0x0D => OpCode::Jump { condition: JumpCondition::Equal },
            0x0E => OpCode::Jump { condition: JumpCondition::NotEqual },
            0x0F => OpCode::Jump { condition: JumpCondition::Less },
            0x10 => OpCode::Jump { condition: JumpCondition::LessEqual },
            0x11 => OpCode::Jump { condition: JumpCondition::Greater },
            0x12 => OpCode::Jump { condition: JumpCondition::GreaterEqual },

            0x13 => OpCode::Push,
            0x14 => OpCode::Pop,
            0x15 => OpCode::In,
            0x16 => OpCode::Out,
            0x17 => OpCode::OutLong,

            0x18 => OpCode::EnableInterrupts,
            0x19 => OpCode::DisableInterrupts,
            0x1A => OpCode::ReturnFromInterrupt,
            0x1B => OpCode::AddStackPointer,

            _ => return None,
        };

        Some(opcode)
    }

    /// Every opcode, in encoding order.
    pub fn all() -> impl Iterator<Item = OpCode> {
        (0..=0x1B).filter_map(OpCode::from_byte)
    }
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", match self {
            OpCode::NoOperation => "NOP",
            OpCode::Halt => "HALT",
            OpCode::Move => "MOV",
            OpCode::Load => "LD",
            OpCode::LoadByte => "LDB",
            OpCode::Store => "ST",

            OpCode::Add => "ADD",
            OpCode::Subtract => "SUB",
            OpCode::Multiply => "MUL",
            OpCode::Divide => "DIV",
            OpCode::Modulo => "MOD",
            OpCode::Compare => "CMP",

            OpCode::Jump { condition } => match condition {
                JumpCondition::Always => "JMP",
                JumpCondition::Equal => "JEQ",
                JumpCondition::NotEqual => "JNE",
                JumpCondition::Less => "JLT",
                JumpCondition::LessEqual => "JLE",
                JumpCondition::Greater => "JGT",
                JumpCondition::GreaterEqual => "JGE",
            },

            OpCode::Push => "PUSH",
            OpCode::Pop => "POP",
            OpCode::In => "IN",
            OpCode::Out => "OUT",
            OpCode::OutLong => "OUTL",

            OpCode::EnableInterrupts => "EI",
            OpCode::DisableInterrupts => "DI",
            OpCode::ReturnFromInterrupt => "IRET",
            OpCode::AddStackPointer => "ADDSP",
        })
    }
}

/// Address mode of an instruction. Selects how the register fields and the
/// extension word are interpreted.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Mode {
    /// No operands.
    None,
    /// A single register.
    Register,
    /// Registers only.
    RegisterRegister,
    /// Registers and an immediate extension word.
    RegisterImmediate,
    /// An immediate extension word (value or port number).
    Immediate,
    /// An absolute data or code address in the extension word.
    Absolute,
    /// A data address held in a register.
    RegisterIndirect,
    /// A data address relative to the stack pointer, offset in the extension word.
    StackOffset,
}

impl Mode {
    pub fn from_byte(byte: u8) -> Option<Mode> {
        let mode = match byte {
            0 => Mode::None,
            1 => Mode::Register,
            2 => Mode::RegisterRegister,
            3 => Mode::RegisterImmediate,
            4 => Mode::Immediate,
            5 => Mode::Absolute,
            6 => Mode::RegisterIndirect,
            7 => Mode::StackOffset,
            _ => return None,
        };

        Some(mode)
    }

    pub fn as_byte(&self) -> u8 {
        match self {
            Mode::None => 0,
            Mode::Register => 1,
            Mode::RegisterRegister => 2,
            Mode::RegisterImmediate => 3,
            Mode::Immediate => 4,
            Mode::Absolute => 5,
            Mode::RegisterIndirect => 6,
            Mode::StackOffset => 7,
        }
    }

    /// True if the instruction word is followed by an extension word.
    pub fn has_extension_word(&self) -> bool {
        match self {
            Mode::RegisterImmediate | Mode::Immediate | Mode::Absolute | Mode::StackOffset => true,
            _ => false,
        }
    }

    pub fn all() -> impl Iterator<Item = Mode> {
        (0..8).filter_map(Mode::from_byte)
    }
}

/// An encodable general purpose register, `R0` to `R14`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Register(u8);

impl Register {
    pub const R0: Register = Register(0);
    pub const R1: Register = Register(1);
    pub const R2: Register = Register(2);
    pub const R3: Register = Register(3);
    pub const R4: Register = Register(4);
    pub const R5: Register = Register(5);
    pub const R6: Register = Register(6);
    pub const R7: Register = Register(7);

    /// Returns `None` for ids that cannot be encoded in a register field.
    pub fn new(id: u8) -> Option<Register> {
        if id < ABSENT_REGISTER {
            Some(Register(id))
        } else {
            None
        }
    }

    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "R{}", self.0)
    }
}

impl std::str::FromStr for Register {
    type Err = ();

    fn from_str(s: &str) -> Result<Register, ()> {
        let id = s
            .strip_prefix('R')
            .or_else(|| s.strip_prefix('r'))
            .ok_or(())?
            .parse::<u8>()
            .map_err(|_| ())?;

        Register::new(id).ok_or(())
    }
}

/// A decoded instruction word.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Instruction {
    pub opcode: OpCode,
    pub mode: Mode,
    pub rd: Option<Register>,
    pub rs1: Option<Register>,
    pub rs2: Option<Register>,
}

impl Instruction {
    /// An instruction with all register fields absent.
    pub fn new(opcode: OpCode, mode: Mode) -> Instruction {
        Instruction {
            opcode,
            mode,
            rd: None,
            rs1: None,
            rs2: None,
        }
    }

    pub fn rd(mut self, register: Register) -> Instruction {
        self.rd = Some(register);
        self
    }

    pub fn rs1(mut self, register: Register) -> Instruction {
        self.rs1 = Some(register);
        self
    }

    pub fn rs2(mut self, register: Register) -> Instruction {
        self.rs2 = Some(register);
        self
    }

    /// Number of words the instruction occupies in the instruction image.
    pub fn len(&self) -> u32 {
        if self.mode.has_extension_word() {
            2
        } else {
            1
        }
    }

    /// Renders the instruction in assembly syntax. `extension` is the word
    /// following the instruction, if the mode uses one.
    pub fn disassemble(&self, extension: Option<u32>) -> String {
        let reg = |r: Option<Register>| match r {
            Some(r) => r.to_string(),
            None => "-".to_string(),
        };

        let ext = match extension {
            Some(word) => format!("0x{:04x}", word),
            None => "?".to_string(),
        };

        let imm = match extension {
            Some(word) => format!("#{}", word as i32),
            None => "#?".to_string(),
        };

        let operands = match (self.opcode, self.mode) {
            (_, Mode::None) => String::new(),
            (OpCode::Push, Mode::Register) => reg(self.rs1),
            (_, Mode::Register) => reg(self.rd),
            (OpCode::Compare, Mode::RegisterRegister) => format!("{}, {}", reg(self.rs1), reg(self.rs2)),
            (OpCode::Compare, Mode::RegisterImmediate) => format!("{}, {}", reg(self.rs1), imm),
            (OpCode::Move, Mode::RegisterRegister) => format!("{}, {}", reg(self.rd), reg(self.rs1)),
            (_, Mode::RegisterRegister) => {
                format!("{}, {}, {}", reg(self.rd), reg(self.rs1), reg(self.rs2))
            }
            (_, Mode::RegisterImmediate) => format!("{}, {}, {}", reg(self.rd), reg(self.rs1), imm),
            (OpCode::In, Mode::Immediate) => format!("{}, port {}", reg(self.rd), ext),
            (OpCode::Out, Mode::Immediate) | (OpCode::OutLong, Mode::Immediate) => {
                format!("port {}, {}", ext, reg(self.rs1))
            }
            (OpCode::AddStackPointer, Mode::Immediate) => imm,
            (_, Mode::Immediate) => format!("{}, {}", reg(self.rd), imm),
            (OpCode::Jump { .. }, Mode::Absolute) => ext,
            (OpCode::Store, Mode::Absolute) => format!("[{}], {}", ext, reg(self.rs1)),
            (OpCode::Store, Mode::RegisterIndirect) => format!("[{}], {}", reg(self.rs2), reg(self.rs1)),
            (OpCode::Store, Mode::StackOffset) => format!("[SP{:+}], {}", extension.unwrap_or(0) as i32, reg(self.rs1)),
            (_, Mode::Absolute) => format!("{}, [{}]", reg(self.rd), ext),
            (_, Mode::RegisterIndirect) => format!("{}, [{}]", reg(self.rd), reg(self.rs1)),
            (_, Mode::StackOffset) => format!("{}, [SP{:+}]", reg(self.rd), extension.unwrap_or(0) as i32),
        };

        if operands.is_empty() {
            self.opcode.to_string()
        } else {
            format!("{} {}", self.opcode, operands)
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.disassemble(None))
    }
}

fn register_field(register: Option<Register>) -> u32 {
    register.map(|r| r.0).unwrap_or(ABSENT_REGISTER) as u32
}

fn register_from_field(field: u32) -> Option<Register> {
    Register::new((field & REGISTER_MASK) as u8)
}

/// Packs the fields into an instruction word. The reserved bits are zero.
pub fn encode(
    opcode: OpCode,
    mode: Mode,
    rd: Option<Register>,
    rs1: Option<Register>,
    rs2: Option<Register>,
) -> u32 {
    (opcode.as_byte() as u32 & OPCODE_MASK) << OPCODE_SHIFT
        | (mode.as_byte() as u32 & MODE_MASK) << MODE_SHIFT
        | register_field(rd) << RD_SHIFT
        | register_field(rs1) << RS1_SHIFT
        | register_field(rs2) << RS2_SHIFT
}

/// Error returned when an instruction word cannot be decoded.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeError {
    UnknownOpCode(u8),
    UnknownMode { opcode: OpCode, mode: u8 },
}

impl fmt::Display for DecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DecodeError::UnknownOpCode(byte) => write!(f, "unknown opcode 0x{:02x}", byte),
            DecodeError::UnknownMode { opcode, mode } => {
                write!(f, "unknown address mode {} for {}", mode, opcode)
            }
        }
    }
}

/// Unpacks an instruction word. The reserved bits are ignored.
pub fn decode(word: u32) -> Result<Instruction, DecodeError> {
    let opcode_bits = ((word >> OPCODE_SHIFT) & OPCODE_MASK) as u8;
    let mode_bits = ((word >> MODE_SHIFT) & MODE_MASK) as u8;

    let opcode = OpCode::from_byte(opcode_bits).ok_or(DecodeError::UnknownOpCode(opcode_bits))?;

    let mode = Mode::from_byte(mode_bits).ok_or(DecodeError::UnknownMode {
        opcode,
        mode: mode_bits,
    })?;

    Ok(Instruction {
        opcode,
        mode,
        rd: register_from_field(word >> RD_SHIFT),
        rs1: register_from_field(word >> RS1_SHIFT),
        rs2: register_from_field(word >> RS2_SHIFT),
    })
}

impl From<Instruction> for u32 {
    fn from(ins: Instruction) -> u32 {
        encode(ins.opcode, ins.mode, ins.rd, ins.rs1, ins.rs2)
    }
}

impl TryFrom<u32> for Instruction {
    type Error = DecodeError;

    fn try_from(word: u32) -> Result<Instruction, DecodeError> {
        decode(word)
    }
}

/// Disassembles a whole instruction image, one line per instruction.
/// Words that do not decode are shown as data.
pub fn disassemble(code: &[u32]) -> Vec<String> {
    let mut lines = Vec::new();
    let mut addr = 0;

    while addr < code.len() {
        let word = code[addr];

        match decode(word) {
            Ok(ins) => {
                let ext = match ins.mode.has_extension_word() {
                    true => code.get(addr + 1).copied(),
                    false => None,
                };

                lines.push(format!("{:04x}: {}", addr, ins.disassemble(ext)));
                addr += ins.len() as usize;
            }
            Err(_) => {
                lines.push(format!("{:04x}: .word 0x{:08x}", addr, word));
                addr += 1;
            }
        }
    }

    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registers() -> Vec<Option<Register>> {
        std::iter::once(None)
            .chain((0..15).map(|id| Register::new(id)))
            .collect()
    }

    #[test]
    fn test_round_trip() {
        let registers = registers();

        for opcode in OpCode::all() {
            for mode in Mode::all() {
                for (i, rd) in registers.iter().enumerate() {
                    let rs1 = registers[(i + 3) % registers.len()];
                    let rs2 = registers[(i + 7) % registers.len()];

                    let word = encode(opcode, mode, *rd, rs1, rs2);
                    let ins = decode(word).expect("could not decode");

                    assert_eq!(ins, Instruction { opcode, mode, rd: *rd, rs1, rs2 });
                    assert_eq!(word & 0x1FF, 0, "reserved bits must stay clear");
                }
            }
        }
    }

    #[test]
    fn test_field_layout() {
        let word = encode(
            OpCode::Add,
            Mode::RegisterRegister,
            Register::new(1),
            Register::new(2),
            Register::new(3),
        );

        assert_eq!(word >> 26, 0x06);
        assert_eq!((word >> 21) & 0x1F, 2);
        assert_eq!((word >> 17) & 0xF, 1);
        assert_eq!((word >> 13) & 0xF, 2);
        assert_eq!((word >> 9) & 0xF, 3);

        let halt: u32 = Instruction::new(OpCode::Halt, Mode::None).into();
        assert_eq!(halt, 0x0400_0000 | 0xF << 17 | 0xF << 13 | 0xF << 9);
    }

    #[test]
    fn test_reserved_bits_ignored() {
        let word = encode(OpCode::Push, Mode::Register, None, Register::new(4), None);
        assert_eq!(decode(word | 0x1FF), decode(word));
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode(0x3F << 26), Err(DecodeError::UnknownOpCode(0x3F)));
        assert_eq!(
            decode(0x06 << 26 | 0x1F << 21),
            Err(DecodeError::UnknownMode { opcode: OpCode::Add, mode: 0x1F }),
        );
    }

    #[test]
    fn test_register_range() {
        assert!(Register::new(14).is_some());
        assert!(Register::new(15).is_none());
        assert_eq!("R7".parse::<Register>(), Ok(Register::R7));
        assert!("R15".parse::<Register>().is_err());
        assert!("SP".parse::<Register>().is_err());
    }

    #[test]
    fn test_disassemble() {
        let code = vec![
            Instruction::new(OpCode::Move, Mode::Immediate).rd(Register::R1).into(),
            5,
            Instruction::new(OpCode::Load, Mode::StackOffset).rd(Register::R2).into(),
            8,
            Instruction::new(OpCode::Store, Mode::RegisterIndirect)
                .rs1(Register::R1)
                .rs2(Register::R3)
                .into(),
            Instruction::new(OpCode::Jump { condition: JumpCondition::LessEqual }, Mode::Absolute).into(),
            0x12,
            0xFFFF_FFFF,
        ];

        assert_eq!(disassemble(&code), vec![
            "0000: MOV R1, #5",
            "0002: LD R2, [SP+8]",
            "0004: ST [R3], R1",
            "0005: JLE 0x0012",
            "0007: .word 0xffffffff",
        ]);
    }
}
