//! The microcode table.
//!
//! Every valid (opcode, mode) pair maps to a builder of a [MicroProgram]. The
//! CPU steps the program of the instruction in flight once per tick until it
//! reports [Progress::Done]. Most instructions finish in a single step. Word
//! transfers between registers and data memory move one byte per step, and a
//! long output writes one 16-bit half per step.

use lazy_static::lazy_static;

use std::collections::HashMap;
use std::fmt;

use super::alu::{self, AluOp};
use super::Cpu;
use crate::event::Event;
use crate::instruction::{Instruction, JumpCondition, Mode, OpCode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    /// The instruction needs more ticks.
    Continue,
    /// The instruction is complete; the next tick fetches.
    Done,
}

/// The remaining work of one macro-instruction.
pub trait MicroProgram: fmt::Debug {
    /// Executes one stage.
    fn step(&mut self, cpu: &mut Cpu) -> Progress;
}

/// An instruction that completes in one stage.
struct Single {
    ins: Instruction,
    op: fn(&mut Cpu, Instruction),
}

impl fmt::Debug for Single {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Single({})", self.ins)
    }
}

impl MicroProgram for Single {
    fn step(&mut self, cpu: &mut Cpu) -> Progress {
        (self.op)(cpu, self.ins);
        Progress::Done
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transfer {
    Load,
    Store,
    Push,
    Pop,
}

/// Moves a word between a register and data memory, one byte per stage.
/// Scratch register 0 holds the address and scratch register 1 the data.
#[derive(Debug)]
struct WordTransfer {
    ins: Instruction,
    kind: Transfer,
    stage: u32,
}

impl WordTransfer {
    fn address(&self, cpu: &mut Cpu) -> u32 {
        match (self.kind, self.ins.mode) {
            (Transfer::Push, _) => {
                let sp = cpu.sp().wrapping_sub(4);
                cpu.set_sp(sp);
                sp
            }
            (Transfer::Pop, _) => cpu.sp(),
            (_, Mode::Absolute) => cpu.fetch_extension(),
            (_, Mode::StackOffset) => cpu.sp().wrapping_add(cpu.fetch_extension()),
            (Transfer::Store, Mode::RegisterIndirect) => cpu.register(self.ins.rs2),
            (_, _) => cpu.register(self.ins.rs1),
        }
    }

    fn first_stage(&self, cpu: &mut Cpu) {
        let address = self.address(cpu);
        cpu.check_access(address, 4);

        cpu.scratch[0] = address;
        cpu.scratch[1] = match self.kind {
            Transfer::Store | Transfer::Push => cpu.register(self.ins.rs1),
            Transfer::Load | Transfer::Pop => 0,
        };
    }

    fn last_stage(&self, cpu: &mut Cpu) {
        let (address, data) = (cpu.scratch[0], cpu.scratch[1]);

        match self.kind {
            Transfer::Load => cpu.set_register(self.ins.rd, data),
            Transfer::Pop => {
                cpu.set_register(self.ins.rd, data);
                cpu.set_sp(address.wrapping_add(4));
            }
            Transfer::Store | Transfer::Push => {
                cpu.events.dispatch(Event::MemoryChange { address, data });
            }
        }
    }
}

impl MicroProgram for WordTransfer {
    fn step(&mut self, cpu: &mut Cpu) -> Progress {
        if self.stage == 0 {
            self.first_stage(cpu);
        }

        let address = cpu.scratch[0].wrapping_add(self.stage);
        let shift = self.stage * 8;

        match self.kind {
            Transfer::Load | Transfer::Pop => {
                let byte = cpu.read_byte(address).unwrap_or(0);
                cpu.scratch[1] |= (byte as u32) << shift;
            }
            Transfer::Store | Transfer::Push => {
                cpu.write_byte(address, (cpu.scratch[1] >> shift) as u8);
            }
        }

        self.stage += 1;

        if self.stage < 4 {
            return Progress::Continue;
        }

        self.last_stage(cpu);
        Progress::Done
    }
}

/// Writes a register to a port as two 16-bit halves, low half first.
#[derive(Debug)]
struct OutLong {
    ins: Instruction,
    stage: u32,
}

impl MicroProgram for OutLong {
    fn step(&mut self, cpu: &mut Cpu) -> Progress {
        if self.stage == 0 {
            cpu.scratch[0] = cpu.fetch_extension();
            cpu.scratch[1] = cpu.register(self.ins.rs1);
        }

        let port = cpu.scratch[0] as u8;
        let half = (cpu.scratch[1] >> (self.stage * 16)) as u16;

        for byte in half.to_le_bytes().iter() {
            cpu.events.dispatch(Event::Output { port, byte: *byte });
        }

        cpu.io.output_half(port, half);

        self.stage += 1;

        match self.stage {
            1 => Progress::Continue,
            _ => Progress::Done,
        }
    }
}

#[derive(Clone, Copy)]
enum Entry {
    Single(fn(&mut Cpu, Instruction)),
    Transfer(Transfer),
    OutLong,
}

fn no_operation(_cpu: &mut Cpu, _ins: Instruction) {}

fn halt(cpu: &mut Cpu, _ins: Instruction) {
    cpu.halt();
}

fn move_register(cpu: &mut Cpu, ins: Instruction) {
    let value = cpu.register(ins.rs1);
    cpu.set_register(ins.rd, value);
}

fn move_immediate(cpu: &mut Cpu, ins: Instruction) {
    let value = cpu.fetch_extension();
    cpu.set_register(ins.rd, value);
}

fn load_byte(cpu: &mut Cpu, ins: Instruction) {
    let address = match ins.mode {
        Mode::Absolute => cpu.fetch_extension(),
        _ => cpu.register(ins.rs1),
    };

    cpu.check_access(address, 1);

    let byte = cpu.read_byte(address).unwrap_or(0);
    cpu.set_register(ins.rd, byte as u32);
}

fn arithmetic(cpu: &mut Cpu, ins: Instruction) {
    let op = match AluOp::from_opcode(ins.opcode) {
        Some(op) => op,
        None => return,
    };

    let a = cpu.register(ins.rs1);
    let b = match ins.mode {
        Mode::RegisterImmediate => cpu.fetch_extension(),
        _ => cpu.register(ins.rs2),
    };

    let output = alu::execute(op, a, b);
    cpu.context.flags = output.flags;

    if let Some(value) = output.value {
        cpu.set_register(ins.rd, value);
    }
}

fn jump(cpu: &mut Cpu, ins: Instruction) {
    let target = cpu.fetch_extension();

    let condition = match ins.opcode {
        OpCode::Jump { condition } => condition,
        _ => JumpCondition::Always,
    };

    if cpu.context.flags.satisfies(condition) {
        cpu.context.pc = target;
    }
}

fn input(cpu: &mut Cpu, ins: Instruction) {
    let port = cpu.fetch_extension() as u8;
    let value = cpu.io.input(port);
    cpu.set_register(ins.rd, value as u32);
}

fn output(cpu: &mut Cpu, ins: Instruction) {
    let port = cpu.fetch_extension() as u8;
    let byte = cpu.register(ins.rs1) as u8;

    cpu.io.output(port, byte);
    cpu.events.dispatch(Event::Output { port, byte });
}

fn enable_interrupts(cpu: &mut Cpu, _ins: Instruction) {
    cpu.interrupts_enabled = true;
}

fn disable_interrupts(cpu: &mut Cpu, _ins: Instruction) {
    cpu.interrupts_enabled = false;
}

fn return_from_interrupt(cpu: &mut Cpu, _ins: Instruction) {
    cpu.return_from_interrupt();
}

fn add_stack_pointer(cpu: &mut Cpu, _ins: Instruction) {
    let sp = cpu.sp().wrapping_add(cpu.fetch_extension());
    cpu.set_sp(sp);
}

lazy_static! {
    static ref TABLE: HashMap<(OpCode, Mode), Entry> = {
        use Mode::*;

        let mut table = HashMap::new();

        table.insert((OpCode::NoOperation, None), Entry::Single(no_operation));
        table.insert((OpCode::Halt, None), Entry::Single(halt));

        table.insert((OpCode::Move, RegisterRegister), Entry::Single(move_register));
        table.insert((OpCode::Move, Immediate), Entry::Single(move_immediate));

        for mode in &[Absolute, RegisterIndirect, StackOffset] {
            table.insert((OpCode::Load, *mode), Entry::Transfer(Transfer::Load));
            table.insert((OpCode::Store, *mode), Entry::Transfer(Transfer::Store));
        }

        table.insert((OpCode::LoadByte, Absolute), Entry::Single(load_byte));
        table.insert((OpCode::LoadByte, RegisterIndirect), Entry::Single(load_byte));

        for opcode in &[OpCode::Add, OpCode::Subtract, OpCode::Multiply, OpCode::Divide, OpCode::Modulo, OpCode::Compare] {
            table.insert((*opcode, RegisterRegister), Entry::Single(arithmetic));
            table.insert((*opcode, RegisterImmediate), Entry::Single(arithmetic));
        }

        for opcode in OpCode::all() {
            if let OpCode::Jump { .. } = opcode {
                table.insert((opcode, Absolute), Entry::Single(jump));
            }
        }

        table.insert((OpCode::Push, Register), Entry::Transfer(Transfer::Push));
        table.insert((OpCode::Pop, Register), Entry::Transfer(Transfer::Pop));

        table.insert((OpCode::In, Immediate), Entry::Single(input));
        table.insert((OpCode::Out, Immediate), Entry::Single(output));
        table.insert((OpCode::OutLong, Immediate), Entry::OutLong);

        table.insert((OpCode::EnableInterrupts, None), Entry::Single(enable_interrupts));
        table.insert((OpCode::DisableInterrupts, None), Entry::Single(disable_interrupts));
        table.insert((OpCode::ReturnFromInterrupt, None), Entry::Single(return_from_interrupt));
        table.insert((OpCode::AddStackPointer, Immediate), Entry::Single(add_stack_pointer));

        table
    };
}

/// Builds the micro-program of an instruction. `None` if the (opcode, mode)
/// pair has no microcode.
pub fn lookup(ins: Instruction) -> Option<Box<dyn MicroProgram>> {
    let program: Box<dyn MicroProgram> = match TABLE.get(&(ins.opcode, ins.mode))? {
        Entry::Single(op) => Box::new(Single { ins, op: *op }),
        Entry::Transfer(kind) => Box::new(WordTransfer { ins, kind: *kind, stage: 0 }),
        Entry::OutLong => Box::new(OutLong { ins, stage: 0 }),
    };

    Some(program)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_table_entry_decodes() {
        for ((opcode, mode), _) in TABLE.iter() {
            let word: u32 = Instruction::new(*opcode, *mode).into();
            let ins = crate::instruction::decode(word).unwrap();
            assert!(lookup(ins).is_some(), "{} {:?}", opcode, mode);
        }
    }

    #[test]
    fn test_unsupported_modes() {
        let ins = |opcode, mode| Instruction::new(opcode, mode);

        assert!(lookup(ins(OpCode::Load, Mode::Absolute)).is_some());
        assert!(lookup(ins(OpCode::Add, Mode::Absolute)).is_none());
        assert!(lookup(ins(OpCode::Halt, Mode::Register)).is_none());
    }
}
