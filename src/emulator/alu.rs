//! Arithmetic and the condition flags.

use std::fmt;

use crate::instruction::{JumpCondition, OpCode};

/// The condition flags. Every arithmetic instruction and `CMP` recomputes all four.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Flags {
    /// Bit 31 of the result.
    pub negative: bool,
    pub zero: bool,
    /// Signed overflow.
    pub overflow: bool,
    /// Unsigned carry out of bit 31, or "no borrow" for subtraction.
    pub carry: bool,
}

impl Flags {
    /// Flags of a result without carry or overflow.
    fn of(result: u32) -> Flags {
        Flags {
            negative: result >> 31 != 0,
            zero: result == 0,
            overflow: false,
            carry: false,
        }
    }

    /// Evaluates a jump condition. The ordered conditions compare as signed integers.
    pub fn satisfies(&self, condition: JumpCondition) -> bool {
        let less = self.negative != self.overflow;

        match condition {
            JumpCondition::Always => true,
            JumpCondition::Equal => self.zero,
            JumpCondition::NotEqual => !self.zero,
            JumpCondition::Less => less,
            JumpCondition::GreaterEqual => !less,
            JumpCondition::Greater => !self.zero && !less,
            JumpCondition::LessEqual => self.zero || less,
        }
    }
}

impl fmt::Display for Flags {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let flag = |set: bool, name: char| if set { name } else { '-' };

        write!(
            f,
            "{}{}{}{}",
            flag(self.negative, 'N'),
            flag(self.zero, 'Z'),
            flag(self.overflow, 'V'),
            flag(self.carry, 'C'),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Compare,
}

impl AluOp {
    pub fn from_opcode(opcode: OpCode) -> Option<AluOp> {
        let op = match opcode {
            OpCode::Add => AluOp::Add,
            OpCode::Subtract => AluOp::Subtract,
            OpCode::Multiply => AluOp::Multiply,
            OpCode::Divide => AluOp::Divide,
            OpCode::Modulo => AluOp::Modulo,
            OpCode::Compare => AluOp::Compare,
            _ => return None,
        };

        Some(op)
    }
}

/// Result of an ALU operation. `value` is `None` when the destination
/// register must be left unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Output {
    pub value: Option<u32>,
    pub flags: Flags,
}

fn subtract(a: u32, b: u32) -> (u32, Flags) {
    let result = a.wrapping_sub(b);

    let mut flags = Flags::of(result);
    flags.carry = a >= b;
    flags.overflow = ((a ^ b) & (a ^ result)) >> 31 != 0;

    (result, flags)
}

/// Computes `a op b`.
pub fn execute(op: AluOp, a: u32, b: u32) -> Output {
    match op {
        AluOp::Add => {
            let result = a.wrapping_add(b);

            let mut flags = Flags::of(result);
            flags.carry = a as u64 + b as u64 > u32::MAX as u64;
            flags.overflow = ((a ^ result) & (b ^ result)) >> 31 != 0;

            Output { value: Some(result), flags }
        }

        AluOp::Subtract => {
            let (result, flags) = subtract(a, b);
            Output { value: Some(result), flags }
        }

        AluOp::Compare => {
            let (_, flags) = subtract(a, b);
            Output { value: None, flags }
        }

        AluOp::Multiply => {
            let product = a as i32 as i64 * b as i32 as i64;
            let result = product as u32;

            let mut flags = Flags::of(result);
            flags.overflow = product < i32::MIN as i64 || product > i32::MAX as i64;

            Output { value: Some(result), flags }
        }

        AluOp::Divide | AluOp::Modulo if b == 0 => Output {
            value: None,
            flags: Flags {
                overflow: true,
                ..Flags::default()
            },
        },

        AluOp::Divide | AluOp::Modulo => {
            let (a, b) = (a as i32, b as i32);

            let (result, overflow) = match op {
                AluOp::Divide => a.overflowing_div(b),
                _ => a.overflowing_rem(b),
            };

            let mut flags = Flags::of(result as u32);
            flags.overflow = overflow;

            Output { value: Some(result as u32), flags }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(n: bool, z: bool, v: bool, c: bool) -> Flags {
        Flags {
            negative: n,
            zero: z,
            overflow: v,
            carry: c,
        }
    }

    #[test]
    fn test_add_overflow() {
        let out = execute(AluOp::Add, 0x7FFF_FFFF, 1);

        assert_eq!(out.value, Some(0x8000_0000));
        assert_eq!(out.flags, flags(true, false, true, false));
    }

    #[test]
    fn test_add_carry() {
        let out = execute(AluOp::Add, 0xFFFF_FFFF, 1);

        assert_eq!(out.value, Some(0));
        assert_eq!(out.flags, flags(false, true, false, true));
    }

    #[test]
    fn test_subtract() {
        let out = execute(AluOp::Subtract, 3, 5);
        assert_eq!(out.value, Some(-2i32 as u32));
        assert_eq!(out.flags, flags(true, false, false, false));

        let out = execute(AluOp::Subtract, 5, 5);
        assert_eq!(out.flags, flags(false, true, false, true));

        let out = execute(AluOp::Subtract, 0x8000_0000, 1);
        assert_eq!(out.value, Some(0x7FFF_FFFF));
        assert!(out.flags.overflow);
    }

    #[test]
    fn test_compare_leaves_destination() {
        let out = execute(AluOp::Compare, 1, 2);

        assert_eq!(out.value, None);
        assert!(!out.flags.carry);
        assert!(out.flags.satisfies(JumpCondition::Less));
    }

    #[test]
    fn test_multiply() {
        let out = execute(AluOp::Multiply, -3i32 as u32, 4);
        assert_eq!(out.value, Some(-12i32 as u32));
        assert_eq!(out.flags, flags(true, false, false, false));

        let out = execute(AluOp::Multiply, 0x10000, 0x10000);
        assert_eq!(out.value, Some(0));
        assert!(out.flags.overflow);
        assert!(!out.flags.carry);
    }

    #[test]
    fn test_division() {
        assert_eq!(execute(AluOp::Divide, -7i32 as u32, 2).value, Some(-3i32 as u32));
        assert_eq!(execute(AluOp::Modulo, -7i32 as u32, 2).value, Some(-1i32 as u32));

        let out = execute(AluOp::Divide, 42, 0);
        assert_eq!(out.value, None);
        assert_eq!(out.flags, flags(false, false, true, false));

        let out = execute(AluOp::Divide, i32::MIN as u32, -1i32 as u32);
        assert_eq!(out.value, Some(i32::MIN as u32));
        assert!(out.flags.overflow);
    }

    #[test]
    fn test_conditions() {
        let pairs: &[(i32, i32)] = &[(1, 2), (2, 2), (3, 2), (i32::MIN, 1), (i32::MAX, -1), (-1, 0)];

        for &(a, b) in pairs {
            let f = execute(AluOp::Compare, a as u32, b as u32).flags;

            assert_eq!(f.satisfies(JumpCondition::Equal), a == b, "{} == {}", a, b);
            assert_eq!(f.satisfies(JumpCondition::NotEqual), a != b);
            assert_eq!(f.satisfies(JumpCondition::Less), a < b, "{} < {}", a, b);
            assert_eq!(f.satisfies(JumpCondition::LessEqual), a <= b);
            assert_eq!(f.satisfies(JumpCondition::Greater), a > b, "{} > {}", a, b);
            assert_eq!(f.satisfies(JumpCondition::GreaterEqual), a >= b);
        }
    }

    #[test]
    fn test_flags_display() {
        assert_eq!(flags(true, false, true, false).to_string(), "N-V-");
        assert_eq!(flags(false, true, false, true).to_string(), "-Z-C");
    }
}
