//! The [Cpu] executes compiled images one tick at a time.
//!
//! Each macro-instruction takes one tick to fetch and decode, after which its
//! [micro-program](microcode::MicroProgram) runs one stage per tick. At every
//! instruction boundary the CPU checks for a pending interrupt request.
//!
//! ```
//! use mcpu::{translate, emulator::{Cpu, RunOutcome}, config::RunConfig, schedule::Schedule};
//!
//! let image = translate("print(6 * 7);").unwrap();
//! let mut cpu = Cpu::new(image.code, image.data, Schedule::new(), &RunConfig::default());
//!
//! assert_eq!(cpu.run_to_end(), RunOutcome::Halted);
//! assert_eq!(cpu.io.numbers(), vec![42]);
//! ```

pub mod alu;
pub mod microcode;

use slog::{debug, o, warn, Discard, Logger};

use std::fmt;

pub use self::alu::Flags;
use self::microcode::{MicroProgram, Progress};

use crate::compiler::VECTOR_BASE;
use crate::config::RunConfig;
use crate::event::{Event, EventDispatcher, EventListener};
use crate::instruction::{decode, Instruction, Register, REGISTER_COUNT, SP_INDEX};
use crate::io::IoController;
use crate::schedule::Schedule;

/// Contains the execution environment of the processor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Context {
    /// Word address of the next instruction to fetch.
    pub pc: u32,

    /// The register file. Slot 15 is the stack pointer.
    pub registers: [u32; REGISTER_COUNT],

    pub flags: Flags,
}

impl Context {
    pub fn sp(&self) -> u32 {
        self.registers[SP_INDEX]
    }
}

#[derive(Debug)]
enum Stage {
    Fetch,
    Execute(Box<dyn MicroProgram>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Halted,
    BudgetExhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceKind {
    Fetch { instruction: Instruction },
    /// A word that could not be executed was skipped.
    Skipped { word: u32, reason: String },
    InterruptRequested { line: u8 },
    /// A request arrived while another one was pending.
    InterruptDropped { line: u8 },
    InterruptEntered { line: u8 },
    InterruptReturned,
    Halted,
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TraceKind::Fetch { instruction } => write!(f, "fetch {}", instruction),
            TraceKind::Skipped { word, reason } => write!(f, "skip 0x{:08x}: {}", word, reason),
            TraceKind::InterruptRequested { line } => write!(f, "interrupt request on line {}", line),
            TraceKind::InterruptDropped { line } => write!(f, "interrupt request on line {} dropped", line),
            TraceKind::InterruptEntered { line } => write!(f, "enter interrupt handler of line {}", line),
            TraceKind::InterruptReturned => write!(f, "return from interrupt"),
            TraceKind::Halted => write!(f, "halt"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEntry {
    pub tick: u64,
    /// Program counter the entry concerns.
    pub pc: u32,
    pub kind: TraceKind,
}

/// The processor together with its data memory and I/O controller.
pub struct Cpu {
    /// The execution context, which includes the registers and flags of the CPU.
    pub context: Context,

    /// Interface to the input and output ports.
    pub io: IoController,

    /// Internal registers of the micro-programs.
    scratch: [u32; 2],

    code: Vec<u32>,

    /// Data image followed by the stack area.
    memory: Vec<u8>,

    stage: Stage,
    interrupts_enabled: bool,
    in_service: bool,
    pending: Option<u8>,
    saved: Option<Context>,

    ticks: u64,
    tick_budget: u64,
    halted: bool,

    trace: Vec<TraceEntry>,
    debug: bool,

    events: EventDispatcher,
    logger: Logger,
}

impl Cpu {
    /// Create a new CPU.
    ///
    /// # Parameters
    /// - `code`: The instruction image. Execution starts at word 0.
    /// - `data`: The data image. The stack area of `config.stack_size` bytes is
    ///   appended to it and `SP` starts at its top.
    /// - `schedule`: Input arriving during the run.
    pub fn new(code: Vec<u32>, data: Vec<u8>, schedule: Schedule, config: &RunConfig) -> Cpu {
        Cpu::with_logger(code, data, schedule, config, None)
    }

    pub fn with_logger<L>(
        code: Vec<u32>,
        mut data: Vec<u8>,
        schedule: Schedule,
        config: &RunConfig,
        logger: L,
    ) -> Cpu
    where
        L: Into<Option<Logger>>,
    {
        let logger = logger
            .into()
            .unwrap_or_else(|| Logger::root(Discard, o!()))
            .new(o!("stage" => "execution"));

        data.resize(data.len() + config.stack_size as usize, 0);

        let mut context = Context::default();
        context.registers[SP_INDEX] = data.len() as u32;

        Cpu {
            context,
            io: IoController::with_logger(schedule, logger.clone()),
            scratch: [0; 2],
            code,
            memory: data,
            stage: Stage::Fetch,
            interrupts_enabled: false,
            in_service: false,
            pending: None,
            saved: None,
            ticks: 0,
            tick_budget: config.tick_budget,
            halted: false,
            trace: Vec::new(),
            debug: config.debug,
            events: EventDispatcher::new(),
            logger,
        }
    }

    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        self.events.add_listener(listener);
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn trace(&self) -> &[TraceEntry] {
        &self.trace
    }

    /// Number of ticks executed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled
    }

    pub fn in_service(&self) -> bool {
        self.in_service
    }

    /// The interrupt line waiting for delivery.
    pub fn pending(&self) -> Option<u8> {
        self.pending
    }

    /// Data memory, including the stack area.
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Reads the little-endian word at byte address `addr`.
    pub fn read_word(&self, addr: u32) -> Option<u32> {
        let addr = addr as usize;
        let bytes = self.memory.get(addr..addr.checked_add(4)?)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// True if no macro-instruction is in flight.
    pub fn at_boundary(&self) -> bool {
        match self.stage {
            Stage::Fetch => true,
            Stage::Execute(_) => false,
        }
    }

    fn record(&mut self, pc: u32, kind: TraceKind) {
        if self.debug {
            debug!(self.logger, "{}", kind; "tick" => self.ticks, "pc" => pc);
        }

        self.trace.push(TraceEntry {
            tick: self.ticks,
            pc,
            kind,
        });
    }

    pub(crate) fn register(&self, register: Option<Register>) -> u32 {
        register
            .map(|r| self.context.registers[r.index()])
            .unwrap_or(0)
    }

    pub(crate) fn set_register(&mut self, register: Option<Register>, data: u32) {
        if let Some(register) = register {
            self.context.registers[register.index()] = data;

            self.events.dispatch(Event::RegisterChange {
                register: register.index(),
                data,
            });
        }
    }

    pub(crate) fn sp(&self) -> u32 {
        self.context.sp()
    }

    pub(crate) fn set_sp(&mut self, data: u32) {
        self.context.registers[SP_INDEX] = data;

        self.events.dispatch(Event::RegisterChange {
            register: SP_INDEX,
            data,
        });
    }

    /// Warns about an access of `len` bytes at `addr` that leaves data memory.
    pub(crate) fn check_access(&self, addr: u32, len: u32) {
        if addr as u64 + len as u64 > self.memory.len() as u64 {
            warn!(self.logger, "data access outside of memory";
                "address" => addr, "length" => len, "memory" => self.memory.len());
        }
    }

    pub(crate) fn read_byte(&self, addr: u32) -> Option<u8> {
        self.memory.get(addr as usize).copied()
    }

    /// Writes outside of memory are dropped.
    pub(crate) fn write_byte(&mut self, addr: u32, byte: u8) {
        if let Some(cell) = self.memory.get_mut(addr as usize) {
            *cell = byte;
        }
    }

    /// Reads the extension word at `PC` and advances past it.
    pub(crate) fn fetch_extension(&mut self) -> u32 {
        let pc = self.context.pc;
        self.context.pc = pc.wrapping_add(1);

        match self.code.get(pc as usize) {
            Some(word) => *word,
            None => {
                warn!(self.logger, "extension word past the end of the code"; "pc" => pc);
                0
            }
        }
    }

    pub(crate) fn halt(&mut self) {
        self.halted = true;

        let pc = self.context.pc;
        self.record(pc, TraceKind::Halted);
        self.events.dispatch(Event::Halted);
    }

    pub(crate) fn return_from_interrupt(&mut self) {
        match self.saved.take() {
            Some(context) => {
                let pc = self.context.pc;

                self.context = context;
                self.in_service = false;

                self.record(pc, TraceKind::InterruptReturned);
                self.events.dispatch(Event::InterruptReturned);
            }
            None => {
                warn!(self.logger, "IRET outside of an interrupt handler"; "pc" => self.context.pc);
            }
        }
    }

    fn sample_input(&mut self) {
        let line = match self.io.tick(self.ticks) {
            Some(line) => line,
            None => return,
        };

        let pc = self.context.pc;

        match self.pending {
            None => {
                self.pending = Some(line);
                self.record(pc, TraceKind::InterruptRequested { line });
            }
            Some(pending) => {
                warn!(self.logger, "interrupt request dropped, another one is pending";
                    "line" => line, "pending" => pending, "tick" => self.ticks);
                self.record(pc, TraceKind::InterruptDropped { line });
            }
        }
    }

    fn deliver_interrupt(&mut self) {
        if !self.at_boundary() || !self.interrupts_enabled || self.in_service {
            return;
        }

        let line = match self.pending.take() {
            Some(line) => line,
            None => return,
        };

        let pc = self.context.pc;

        self.saved = Some(self.context.clone());
        self.in_service = true;
        self.context.pc = VECTOR_BASE + line as u32 * 2;

        self.record(pc, TraceKind::InterruptEntered { line });
        self.events.dispatch(Event::InterruptEntered { line });
    }

    fn fetch(&mut self) {
        let pc = self.context.pc;

        let word = match self.code.get(pc as usize) {
            Some(word) => *word,
            None => {
                warn!(self.logger, "fetch past the end of the code, halting"; "pc" => pc);
                self.halt();
                return;
            }
        };

        self.context.pc = pc.wrapping_add(1);

        let instruction = match decode(word) {
            Ok(instruction) => instruction,
            Err(err) => {
                warn!(self.logger, "skipping undecodable word"; "pc" => pc, "error" => %err);
                self.record(pc, TraceKind::Skipped { word, reason: err.to_string() });
                return;
            }
        };

        match microcode::lookup(instruction) {
            Some(program) => {
                self.record(pc, TraceKind::Fetch { instruction });
                self.stage = Stage::Execute(program);
            }
            None => {
                let reason = format!("no microcode for {} in mode {:?}", instruction.opcode, instruction.mode);
                warn!(self.logger, "skipping instruction"; "pc" => pc, "reason" => %reason);

                if instruction.mode.has_extension_word() {
                    self.context.pc = self.context.pc.wrapping_add(1);
                }

                self.record(pc, TraceKind::Skipped { word, reason });
            }
        }
    }

    /// Executes a single tick: samples the input schedule, delivers a pending
    /// interrupt at an instruction boundary and then fetches or runs one stage.
    pub fn tick(&mut self) {
        if self.halted {
            return;
        }

        self.sample_input();
        self.deliver_interrupt();

        match std::mem::replace(&mut self.stage, Stage::Fetch) {
            Stage::Fetch => self.fetch(),
            Stage::Execute(mut program) => {
                if program.step(self) == Progress::Continue {
                    self.stage = Stage::Execute(program);
                }
            }
        }

        self.ticks += 1;
    }

    /// Ticks until the next macro-instruction completes.
    pub fn step(&mut self) {
        loop {
            self.tick();

            if self.halted || self.at_boundary() {
                break;
            }
        }
    }

    /// Executes at most `budget` ticks.
    pub fn run(&mut self, budget: u64) -> RunOutcome {
        for _ in 0..budget {
            if self.halted {
                break;
            }

            self.tick();
        }

        if self.halted {
            RunOutcome::Halted
        } else {
            RunOutcome::BudgetExhausted
        }
    }

    /// Executes until `HALT` or until the tick budget of the configuration runs out.
    pub fn run_to_end(&mut self) -> RunOutcome {
        self.run(self.tick_budget)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instruction::{JumpCondition, Mode, OpCode};

    use std::cell::RefCell;
    use std::rc::Rc;

    fn ins(opcode: OpCode, mode: Mode) -> Instruction {
        Instruction::new(opcode, mode)
    }

    fn word(ins: Instruction) -> u32 {
        ins.into()
    }

    fn cpu(code: Vec<u32>) -> Cpu {
        Cpu::new(code, vec![0; 16], Schedule::new(), &RunConfig::default().with_stack_size(64))
    }

    fn jump(condition: JumpCondition) -> u32 {
        word(ins(OpCode::Jump { condition }, Mode::Absolute))
    }

    #[test]
    fn test_add_sets_flags() {
        let mut cpu = cpu(vec![
            word(ins(OpCode::Move, Mode::Immediate).rd(Register::R1)),
            0x7FFF_FFFF,
            word(ins(OpCode::Add, Mode::RegisterImmediate).rd(Register::R1).rs1(Register::R1)),
            1,
            word(ins(OpCode::Halt, Mode::None)),
        ]);

        assert_eq!(cpu.run(100), RunOutcome::Halted);
        assert_eq!(cpu.context.registers[1], 0x8000_0000);
        assert_eq!(cpu.context.flags.to_string(), "N-V-");
    }

    #[test]
    fn test_division_by_zero() {
        let mut cpu = cpu(vec![
            word(ins(OpCode::Move, Mode::Immediate).rd(Register::R1)),
            42,
            word(ins(OpCode::Divide, Mode::RegisterRegister).rd(Register::R1).rs1(Register::R1).rs2(Register::R2)),
            word(ins(OpCode::Halt, Mode::None)),
        ]);

        assert_eq!(cpu.run(100), RunOutcome::Halted);
        assert_eq!(cpu.context.registers[1], 42);
        assert!(cpu.context.flags.overflow);
    }

    #[test]
    fn test_stage_costs() {
        let mut cpu = cpu(vec![
            word(ins(OpCode::Store, Mode::Absolute).rs1(Register::R1)),
            0,
            word(ins(OpCode::Halt, Mode::None)),
        ]);

        cpu.step();
        assert_eq!(cpu.ticks(), 5);

        cpu.step();
        assert_eq!(cpu.ticks(), 7);
        assert!(cpu.is_halted());

        let mut cpu = self::cpu(vec![
            word(ins(OpCode::OutLong, Mode::Immediate).rs1(Register::R1)),
            1,
            word(ins(OpCode::Halt, Mode::None)),
        ]);

        cpu.step();
        assert_eq!(cpu.ticks(), 3);
        assert_eq!(cpu.io.output_buffer(1), &[0, 0, 0, 0]);
    }

    #[test]
    fn test_push_pop() {
        let mut cpu = cpu(vec![
            word(ins(OpCode::Move, Mode::Immediate).rd(Register::R1)),
            0xDEAD_BEEF,
            word(ins(OpCode::Push, Mode::Register).rs1(Register::R1)),
            word(ins(OpCode::Pop, Mode::Register).rd(Register::R2)),
            word(ins(OpCode::Halt, Mode::None)),
        ]);

        let top = cpu.context.sp();
        assert_eq!(top, 16 + 64);

        cpu.step();
        cpu.step();
        assert_eq!(cpu.context.sp(), top - 4);
        assert_eq!(cpu.read_word(top - 4), Some(0xDEAD_BEEF));

        cpu.run(100);
        assert_eq!(cpu.context.registers[2], 0xDEAD_BEEF);
        assert_eq!(cpu.context.sp(), top);
    }

    #[test]
    fn test_stack_offset_addressing() {
        let mut cpu = cpu(vec![
            word(ins(OpCode::Move, Mode::Immediate).rd(Register::R1)),
            7,
            word(ins(OpCode::Push, Mode::Register).rs1(Register::R1)),
            word(ins(OpCode::Push, Mode::Register).rs1(Register::R0)),
            word(ins(OpCode::Load, Mode::StackOffset).rd(Register::R3)),
            4,
            word(ins(OpCode::AddStackPointer, Mode::Immediate)),
            8,
            word(ins(OpCode::Halt, Mode::None)),
        ]);

        let top = cpu.context.sp();

        assert_eq!(cpu.run(100), RunOutcome::Halted);
        assert_eq!(cpu.context.registers[3], 7);
        assert_eq!(cpu.context.sp(), top);
    }

    #[test]
    fn test_memory_out_of_range() {
        let mut cpu = cpu(vec![
            word(ins(OpCode::Move, Mode::Immediate).rd(Register::R1)),
            5,
            word(ins(OpCode::Store, Mode::Absolute).rs1(Register::R1)),
            0x1000,
            word(ins(OpCode::Load, Mode::Absolute).rd(Register::R1)),
            0x1000,
            word(ins(OpCode::Halt, Mode::None)),
        ]);

        assert_eq!(cpu.run(100), RunOutcome::Halted);
        assert_eq!(cpu.context.registers[1], 0);
        assert_eq!(cpu.memory().len(), 16 + 64);
    }

    #[test]
    fn test_skips_unknown_words() {
        let mut cpu = cpu(vec![0xFC00_0000, word(ins(OpCode::Add, Mode::Absolute)), 0, word(ins(OpCode::Halt, Mode::None))]);

        assert_eq!(cpu.run(100), RunOutcome::Halted);

        let skipped = cpu
            .trace()
            .iter()
            .filter(|e| matches!(e.kind, TraceKind::Skipped { .. }))
            .map(|e| e.pc)
            .collect::<Vec<_>>();

        assert_eq!(skipped, vec![0, 1]);
    }

    #[test]
    fn test_fetch_past_end_halts() {
        let mut cpu = cpu(vec![word(ins(OpCode::NoOperation, Mode::None))]);

        assert_eq!(cpu.run(100), RunOutcome::Halted);
        assert_eq!(cpu.ticks(), 3);
    }

    #[test]
    fn test_budget() {
        let mut cpu = cpu(vec![jump(JumpCondition::Always), 0]);

        assert_eq!(cpu.run(10), RunOutcome::BudgetExhausted);
        assert_eq!(cpu.ticks(), 10);
    }

    /// Main program loops over a push and a pop. The handler of line 0 echoes
    /// the latched input byte to port 0.
    fn interrupt_program() -> Vec<u32> {
        vec![
            jump(JumpCondition::Always),
            6,
            jump(JumpCondition::Always),
            11,
            word(ins(OpCode::ReturnFromInterrupt, Mode::None)),
            word(ins(OpCode::NoOperation, Mode::None)),
            word(ins(OpCode::EnableInterrupts, Mode::None)),
            word(ins(OpCode::Push, Mode::Register).rs1(Register::R0)),
            word(ins(OpCode::Pop, Mode::Register).rd(Register::R0)),
            jump(JumpCondition::Always),
            7,
            word(ins(OpCode::In, Mode::Immediate).rd(Register::R1)),
            0,
            word(ins(OpCode::Out, Mode::Immediate).rs1(Register::R1)),
            0,
            word(ins(OpCode::ReturnFromInterrupt, Mode::None)),
        ]
    }

    #[test]
    fn test_interrupt_waits_for_boundary() {
        let mut schedule = Schedule::new();
        // Tick 6 is in the middle of the PUSH fetched at tick 4.
        schedule.insert(6, 0, b'x');

        let mut cpu = Cpu::new(interrupt_program(), Vec::new(), schedule, &RunConfig::default());
        cpu.run(40);

        let entered = cpu
            .trace()
            .iter()
            .find(|e| e.kind == TraceKind::InterruptEntered { line: 0 })
            .cloned()
            .unwrap();

        assert_eq!(entered.tick, 9);
        assert_eq!(entered.pc, 8);

        let returned = cpu
            .trace()
            .iter()
            .position(|e| e.kind == TraceKind::InterruptReturned)
            .unwrap();

        let resumed = cpu.trace()[returned + 1..]
            .iter()
            .find(|e| matches!(e.kind, TraceKind::Fetch { .. }))
            .unwrap();

        assert_eq!(resumed.pc, 8);
        assert_eq!(cpu.io.text(), "x");
        assert!(!cpu.in_service());
        assert_eq!(cpu.context.registers[1], 0);
    }

    #[test]
    fn test_interrupts_do_not_nest() {
        let push = word(ins(OpCode::Push, Mode::Register).rs1(Register::R0));
        let pop = word(ins(OpCode::Pop, Mode::Register).rd(Register::R0));

        let mut code = vec![
            jump(JumpCondition::Always),
            6,
            jump(JumpCondition::Always),
            11,
            jump(JumpCondition::Always),
            20,
            word(ins(OpCode::EnableInterrupts, Mode::None)),
            push,
            pop,
            jump(JumpCondition::Always),
            7,
        ];

        // Line 0 keeps the stack busy for a while before returning.
        code.extend(vec![push, pop, push, pop, push, pop, push, pop]);
        code.push(word(ins(OpCode::ReturnFromInterrupt, Mode::None)));

        code.extend(vec![
            word(ins(OpCode::In, Mode::Immediate).rd(Register::R1)),
            1,
            word(ins(OpCode::Out, Mode::Immediate).rs1(Register::R1)),
            0,
            word(ins(OpCode::ReturnFromInterrupt, Mode::None)),
        ]);

        let mut schedule = Schedule::new();
        schedule.insert(6, 0, b'x');
        schedule.insert(12, 1, b'y');

        let mut cpu = Cpu::new(code, Vec::new(), schedule, &RunConfig::default());
        cpu.run(120);

        let position = |kind: TraceKind| cpu.trace().iter().position(|e| e.kind == kind).unwrap();

        let first = position(TraceKind::InterruptEntered { line: 0 });
        let returned = position(TraceKind::InterruptReturned);
        let second = position(TraceKind::InterruptEntered { line: 1 });

        assert!(first < returned && returned < second);
        assert!(cpu.trace()[first].tick < 12);
        assert!(cpu.trace()[returned].tick > 12);
        assert!(!cpu.trace().iter().any(|e| matches!(e.kind, TraceKind::InterruptDropped { .. })));
        assert_eq!(cpu.io.text(), "y");
    }

    #[test]
    fn test_pending_slot_drops_second_request() {
        let mut schedule = Schedule::new();
        schedule.insert(1, 0, 1);
        schedule.insert(2, 1, 2);

        // Interrupts stay disabled, so the first request stays pending.
        let code = vec![jump(JumpCondition::Always), 0];
        let mut cpu = Cpu::new(code, Vec::new(), schedule, &RunConfig::default());
        cpu.run(5);

        assert_eq!(cpu.pending(), Some(0));
        assert!(cpu.trace().iter().any(|e| e.kind == TraceKind::InterruptDropped { line: 1 }));
        assert_eq!(cpu.io.input(0), 1);
        assert_eq!(cpu.io.input(1), 2);
    }

    #[test]
    fn test_events() {
        let events = Rc::new(RefCell::new(Vec::new()));
        let sink = events.clone();

        let mut cpu = cpu(vec![
            word(ins(OpCode::Move, Mode::Immediate).rd(Register::R4)),
            b'!' as u32,
            word(ins(OpCode::Out, Mode::Immediate).rs1(Register::R4)),
            0,
            word(ins(OpCode::Halt, Mode::None)),
        ]);

        cpu.add_listener(move |event: &Event| sink.borrow_mut().push(event.clone()));
        cpu.run(100);

        assert_eq!(*events.borrow(), vec![
            Event::RegisterChange { register: 4, data: b'!' as u32 },
            Event::Output { port: 0, byte: b'!' },
            Event::Halted,
        ]);
    }

    #[test]
    fn test_deterministic() {
        let run = || {
            let mut schedule = Schedule::new();
            schedule.insert(6, 0, b'a');
            schedule.insert(30, 0, b'b');

            let mut cpu = Cpu::new(interrupt_program(), Vec::new(), schedule, &RunConfig::default());
            cpu.run(60);

            (cpu.trace().to_vec(), cpu.io.text(), cpu.context.clone())
        };

        let first = run();
        assert_eq!(first, run());
        assert_eq!(first.1, "ab");
    }
}
