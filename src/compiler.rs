//! Code generation from the [AST](crate::source::ast) into an [Image].
//!
//! The compiler walks the tree once, emitting instruction words into the
//! instruction image and allocating variables into the data image as it goes.
//! Forward jumps are emitted with a placeholder target word which is overwritten
//! once the target address is known.
//!
//! # Image layout
//!
//! ```text
//! word 0-1   JMP start
//! word 2-3   vector of interrupt line 0 (IRET; NOP until a handler is defined)
//! word 4-5   vector of interrupt line 1
//! word 6-    program code, terminated by HALT
//! ```
//!
//! # Storage
//!
//! Variables declared in the global scope live in the data image. Integer
//! variables of nested blocks are pushed on the stack and addressed relative to
//! `SP`, using the stack depth the compiler tracks for every emitted `PUSH` and
//! `POP`. Strings and lists always get static storage in the data image.

use slog::{debug, o, trace, Discard, Logger};

use std::fmt;

use crate::image::Image;
use crate::instruction::{disassemble, Instruction, JumpCondition, Mode, OpCode, Register};
use crate::io::port;
use crate::parsing::Span;
use crate::source::ast::{BinaryOp, Expr, PrefixOp, Program, Stmt, StmtKind};
use crate::symbol_table::{Location, MemoryArea, ScopeStack, Symbol, SymbolType};

/// Number of interrupt lines the image has vectors for.
pub const INTERRUPT_LINES: u8 = 2;

/// Word address of the vector of interrupt line 0. Each vector is two words.
pub const VECTOR_BASE: u32 = 2;

/// Word address of the first program instruction.
pub const CODE_START: u32 = 6;

/// Fixed purposes the code generator assigns to registers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Default destination of expression values.
    Accumulator,
    /// Left operand of a binary operator.
    MathLeft,
    /// Right operand of a binary operator.
    MathRight,
    /// Address walked by the string printing loop and the indexed store.
    OutAddress,
    /// Value written to an output port.
    OutData,
    /// Byte latched from an input port.
    InData,
    /// Remaining iterations of the string printing loop.
    Counter,
}

impl Role {
    pub fn register(self) -> Register {
        match self {
            Role::Accumulator => Register::R0,
            Role::MathLeft => Register::R1,
            Role::MathRight => Register::R2,
            Role::OutAddress => Register::R3,
            Role::OutData => Register::R4,
            Role::InData => Register::R5,
            Role::Counter => Register::R6,
        }
    }
}

const CHARACTER_PORT: u32 = port::CHARACTERS as u32;
const NUMBER_PORT: u32 = port::NUMBERS as u32;

#[derive(Clone, Debug, PartialEq)]
pub enum CompileError {
    DuplicateDeclaration {
        name: String,
        span: Span,
        previous: Span,
    },
    UndeclaredVariable {
        name: String,
        span: Span,
        suggestion: Option<String>,
    },
    /// A construct the code generator cannot translate.
    UnsupportedNode { node: &'static str, span: Span },
    /// A variable is stored in a stack frame that is not active where it is used.
    InvalidMemoryArea { name: String, span: Span },
    InvalidTarget { span: Span },
    TypeMismatch {
        expected: &'static str,
        found: String,
        span: Span,
    },
    InvalidInterruptLine { line: u8, span: Span },
    DuplicateHandler { line: u8, span: Span },
}

impl CompileError {
    pub fn span(&self) -> &Span {
        match self {
            CompileError::DuplicateDeclaration { span, .. }
            | CompileError::UndeclaredVariable { span, .. }
            | CompileError::UnsupportedNode { span, .. }
            | CompileError::InvalidMemoryArea { span, .. }
            | CompileError::InvalidTarget { span }
            | CompileError::TypeMismatch { span, .. }
            | CompileError::InvalidInterruptLine { span, .. }
            | CompileError::DuplicateHandler { span, .. } => span,
        }
    }
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            CompileError::DuplicateDeclaration { name, previous, .. } => write!(
                f,
                "variable '{}' is already declared in this scope (at {})",
                name, previous.start
            ),
            CompileError::UndeclaredVariable { name, suggestion, .. } => {
                write!(f, "undeclared variable '{}'", name)?;

                if let Some(suggestion) = suggestion {
                    write!(f, ", did you mean '{}'?", suggestion)?;
                }

                Ok(())
            }
            CompileError::UnsupportedNode { node, .. } => write!(f, "{} is not supported", node),
            CompileError::InvalidMemoryArea { name, .. } => write!(
                f,
                "variable '{}' lives in the stack frame of another context",
                name
            ),
            CompileError::InvalidTarget { .. } => write!(f, "invalid assignment target"),
            CompileError::TypeMismatch { expected, found, .. } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            CompileError::InvalidInterruptLine { line, .. } => write!(
                f,
                "interrupt line {} does not exist, lines are 0 to {}",
                line,
                INTERRUPT_LINES - 1
            ),
            CompileError::DuplicateHandler { line, .. } => {
                write!(f, "interrupt line {} already has a handler", line)
            }
        }
    }
}

/// Where a value produced by an expression ended up.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Operand {
    Register(Role),
    /// Only the flags were set, by a comparison that holds when `op` does.
    Flags(BinaryOp),
}

/// How an integer variable is reached.
#[derive(Clone, Copy, Debug)]
enum Access {
    Absolute(u32),
    /// Byte offset from `SP`.
    Stack(u32),
}

#[derive(Clone, Copy, Debug)]
struct Frame {
    id: u32,
    /// Words pushed in this frame so far.
    depth: u32,
}

fn jump_condition(op: BinaryOp) -> JumpCondition {
    match op {
        BinaryOp::Equal => JumpCondition::Equal,
        BinaryOp::NotEqual => JumpCondition::NotEqual,
        BinaryOp::Less => JumpCondition::Less,
        BinaryOp::LessEqual => JumpCondition::LessEqual,
        BinaryOp::Greater => JumpCondition::Greater,
        BinaryOp::GreaterEqual => JumpCondition::GreaterEqual,
        op => unreachable!("{} is not a comparison", op),
    }
}

fn invert(op: BinaryOp) -> BinaryOp {
    match op.inverted() {
        Some(op) => op,
        None => unreachable!("{} is not a comparison", op),
    }
}

fn alu_opcode(op: BinaryOp) -> OpCode {
    match op {
        BinaryOp::Add => OpCode::Add,
        BinaryOp::Sub => OpCode::Subtract,
        BinaryOp::Mul => OpCode::Multiply,
        BinaryOp::Div => OpCode::Divide,
        BinaryOp::Mod => OpCode::Modulo,
        _ => OpCode::Compare,
    }
}

fn describe(expr: &Expr) -> String {
    match expr {
        Expr::Str(_) => "a string".to_string(),
        Expr::List(_) => "a list".to_string(),
        other => format!("'{}'", other),
    }
}

struct Compiler {
    logger: Logger,
    image: Image,
    scopes: ScopeStack,
    /// Stack depth at the entry of each open scope.
    scope_depths: Vec<u32>,
    frames: Vec<Frame>,
    next_frame: u32,
    handlers: [bool; INTERRUPT_LINES as usize],
    errors: Vec<CompileError>,
    /// Span of the statement being compiled.
    span: Span,
}

impl Compiler {
    fn new(logger: Logger) -> Compiler {
        let mut compiler = Compiler {
            logger,
            image: Image::default(),
            scopes: ScopeStack::new(),
            scope_depths: vec![0],
            frames: vec![Frame { id: 0, depth: 0 }],
            next_frame: 1,
            handlers: [false; INTERRUPT_LINES as usize],
            errors: Vec::new(),
            span: 0..0,
        };

        compiler.emit_ext(Instruction::new(OpCode::Jump { condition: JumpCondition::Always }, Mode::Absolute), CODE_START);

        for _ in 0..INTERRUPT_LINES {
            compiler.emit(Instruction::new(OpCode::ReturnFromInterrupt, Mode::None));
            compiler.emit(Instruction::new(OpCode::NoOperation, Mode::None));
        }

        compiler
    }

    fn error(&mut self, error: CompileError) {
        debug!(self.logger, "compile error"; "error" => %error, "start" => error.span().start);
        self.errors.push(error);
    }

    /// Address of the next emitted word.
    fn here(&self) -> u32 {
        self.image.code.len() as u32
    }

    fn push_word(&mut self, word: u32) -> u32 {
        let addr = self.here();
        self.image.code.push(word);
        self.image.source_map.insert(addr, self.span.clone());
        addr
    }

    fn emit(&mut self, ins: Instruction) -> u32 {
        trace!(self.logger, "emit"; "address" => self.here(), "instruction" => %ins);
        self.push_word(ins.into())
    }

    /// Emits an instruction followed by its extension word.
    /// Returns the address of the extension word.
    fn emit_ext(&mut self, ins: Instruction, ext: u32) -> u32 {
        trace!(self.logger, "emit"; "address" => self.here(), "instruction" => ins.disassemble(Some(ext)));
        self.push_word(ins.into());
        self.push_word(ext)
    }

    /// Emits a jump with a placeholder target. Returns the address to [patch](Compiler::patch).
    fn emit_jump(&mut self, condition: JumpCondition) -> u32 {
        self.emit_ext(Instruction::new(OpCode::Jump { condition }, Mode::Absolute), 0)
    }

    fn patch(&mut self, addr: u32, target: u32) {
        trace!(self.logger, "patch jump target"; "address" => addr, "target" => target);
        self.image.code[addr as usize] = target;
    }

    fn frame(&self) -> Frame {
        self.frames[self.frames.len() - 1]
    }

    fn frame_mut(&mut self) -> &mut Frame {
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn push(&mut self, role: Role) {
        self.emit(Instruction::new(OpCode::Push, Mode::Register).rs1(role.register()));
        self.frame_mut().depth += 1;
    }

    fn pop(&mut self, role: Role) {
        self.emit(Instruction::new(OpCode::Pop, Mode::Register).rd(role.register()));
        self.frame_mut().depth -= 1;
    }

    fn move_immediate(&mut self, dest: Role, value: i32) {
        self.emit_ext(Instruction::new(OpCode::Move, Mode::Immediate).rd(dest.register()), value as u32);
    }

    fn alu_immediate(&mut self, opcode: OpCode, dest: Role, value: i32) {
        let ins = Instruction::new(opcode, Mode::RegisterImmediate)
            .rd(dest.register())
            .rs1(dest.register());

        self.emit_ext(ins, value as u32);
    }

    /// Appends bytes to the data image. Returns their byte address.
    fn alloc_bytes(&mut self, bytes: &[u8]) -> u32 {
        let addr = self.image.data.len() as u32;
        self.image.data.extend_from_slice(bytes);
        addr
    }

    /// Appends a word aligned to 4 bytes. Returns its byte address.
    fn alloc_word(&mut self, value: i32) -> u32 {
        while self.image.data.len() % 4 != 0 {
            self.image.data.push(0);
        }

        self.alloc_bytes(&value.to_le_bytes())
    }

    fn open_scope(&mut self) {
        self.scopes.push_scope();
        let depth = self.frame().depth;
        self.scope_depths.push(depth);
    }

    /// Pops the innermost scope and releases the stack words its locals occupy.
    fn close_scope(&mut self) {
        self.scopes.pop_scope();

        let entry = self.scope_depths.pop().unwrap_or(0);
        let words = self.frame().depth.saturating_sub(entry);

        if words > 0 {
            self.emit_ext(Instruction::new(OpCode::AddStackPointer, Mode::Immediate), words * 4);
            self.frame_mut().depth = entry;
        }
    }

    fn resolve(&mut self, name: &str) -> Option<Symbol> {
        match self.scopes.lookup(name) {
            Some(symbol) => Some(symbol.clone()),
            None => {
                let suggestion = self.scopes.suggest(name);

                self.error(CompileError::UndeclaredVariable {
                    name: name.to_string(),
                    span: self.span.clone(),
                    suggestion,
                });

                None
            }
        }
    }

    /// Resolves an integer variable into its address.
    fn access(&mut self, name: &str) -> Option<Access> {
        let symbol = self.resolve(name)?;

        if symbol.ty != SymbolType::Int {
            self.error(CompileError::TypeMismatch {
                expected: "an integer",
                found: format!("{} '{}'", symbol.ty, name),
                span: self.span.clone(),
            });

            return None;
        }

        match symbol.location {
            Location::Absolute(addr) => Some(Access::Absolute(addr)),
            Location::Frame { frame, slot } => {
                let current = self.frame();

                if frame != current.id {
                    self.error(CompileError::InvalidMemoryArea {
                        name: name.to_string(),
                        span: self.span.clone(),
                    });

                    return None;
                }

                Some(Access::Stack((current.depth - slot - 1) * 4))
            }
        }
    }

    fn load_variable(&mut self, name: &str, dest: Role) {
        match self.access(name) {
            Some(Access::Absolute(addr)) => {
                self.emit_ext(Instruction::new(OpCode::Load, Mode::Absolute).rd(dest.register()), addr);
            }
            Some(Access::Stack(offset)) => {
                self.emit_ext(Instruction::new(OpCode::Load, Mode::StackOffset).rd(dest.register()), offset);
            }
            None => (),
        }
    }

    fn store_variable(&mut self, name: &str, src: Role) {
        match self.access(name) {
            Some(Access::Absolute(addr)) => {
                self.emit_ext(Instruction::new(OpCode::Store, Mode::Absolute).rs1(src.register()), addr);
            }
            Some(Access::Stack(offset)) => {
                self.emit_ext(Instruction::new(OpCode::Store, Mode::StackOffset).rs1(src.register()), offset);
            }
            None => (),
        }
    }

    /// Resolves a string or list variable for indexing. Returns its base
    /// address and element size.
    fn indexable(&mut self, target: &Expr) -> Option<(u32, i32)> {
        let name = match target {
            Expr::Symbol(name) => name,
            other => {
                self.error(CompileError::TypeMismatch {
                    expected: "a list or string variable",
                    found: describe(other),
                    span: self.span.clone(),
                });

                return None;
            }
        };

        let symbol = self.resolve(name)?;

        let size = match symbol.ty {
            SymbolType::List { .. } => 4,
            SymbolType::Str { .. } => 1,
            SymbolType::Int => {
                self.error(CompileError::TypeMismatch {
                    expected: "a list or string",
                    found: format!("int '{}'", name),
                    span: self.span.clone(),
                });

                return None;
            }
        };

        symbol.address().map(|addr| (addr, size))
    }

    /// Computes the address of `target[index]` into `dest`.
    fn element_address(&mut self, index: &Expr, base: u32, size: i32, dest: Role) {
        self.value(index, dest);

        if size != 1 {
            self.alu_immediate(OpCode::Multiply, dest, size);
        }

        self.alu_immediate(OpCode::Add, dest, base as i32);
    }

    /// Compiles an expression. Integer values end up in `dest`, comparisons only set the flags.
    fn expr(&mut self, expr: &Expr, dest: Role) -> Operand {
        match expr {
            Expr::Number(n) => self.move_immediate(dest, *n),

            Expr::Symbol(name) => self.load_variable(name, dest),

            Expr::Prefix { op: PrefixOp::Negate, rhs } => {
                self.value(rhs, dest);
                self.alu_immediate(OpCode::Multiply, dest, -1);
            }

            Expr::Prefix { op: PrefixOp::Not, rhs } => {
                let op = self.condition(rhs);
                return Operand::Flags(invert(op));
            }

            Expr::Binary { op, lhs, rhs } => {
                let (left, right) = (Role::MathLeft.register(), Role::MathRight.register());

                self.value(lhs, Role::MathLeft);
                self.push(Role::MathLeft);
                self.value(rhs, Role::MathRight);
                self.pop(Role::MathLeft);

                if op.is_comparison() {
                    self.emit(Instruction::new(OpCode::Compare, Mode::RegisterRegister).rs1(left).rs2(right));
                    return Operand::Flags(*op);
                }

                let ins = Instruction::new(alu_opcode(*op), Mode::RegisterRegister)
                    .rd(dest.register())
                    .rs1(left)
                    .rs2(right);

                self.emit(ins);
            }

            Expr::Assign { target, value } => self.assign(target, value, dest),

            Expr::Index { target, index } => {
                if let Some((base, size)) = self.indexable(target) {
                    self.element_address(index, base, size, dest);

                    let opcode = if size == 1 { OpCode::LoadByte } else { OpCode::Load };
                    let ins = Instruction::new(opcode, Mode::RegisterIndirect)
                        .rd(dest.register())
                        .rs1(dest.register());

                    self.emit(ins);
                }
            }

            Expr::Read { port } => {
                let data = Role::InData.register();
                self.emit_ext(Instruction::new(OpCode::In, Mode::Immediate).rd(data), *port as u32);

                if dest != Role::InData {
                    self.emit(Instruction::new(OpCode::Move, Mode::RegisterRegister).rd(dest.register()).rs1(data));
                }
            }

            Expr::Call { .. } => self.error(CompileError::UnsupportedNode {
                node: "function call",
                span: self.span.clone(),
            }),

            Expr::Str(_) | Expr::List(_) => self.error(CompileError::TypeMismatch {
                expected: "an integer expression",
                found: describe(expr),
                span: self.span.clone(),
            }),
        }

        Operand::Register(dest)
    }

    /// Compiles an expression and turns a comparison result into 0 or 1.
    fn value(&mut self, expr: &Expr, dest: Role) {
        if let Operand::Flags(op) = self.expr(expr, dest) {
            self.move_immediate(dest, 1);
            let end = self.emit_jump(jump_condition(op));
            self.move_immediate(dest, 0);
            let here = self.here();
            self.patch(end, here);
        }
    }

    /// Compiles a condition into the flags. Returns the comparison that holds
    /// when the condition is true.
    fn condition(&mut self, expr: &Expr) -> BinaryOp {
        match self.expr(expr, Role::Accumulator) {
            Operand::Flags(op) => op,
            Operand::Register(role) => {
                let ins = Instruction::new(OpCode::Compare, Mode::RegisterImmediate).rs1(role.register());
                self.emit_ext(ins, 0);
                BinaryOp::NotEqual
            }
        }
    }

    fn assign(&mut self, target: &Expr, value: &Expr, dest: Role) {
        match target {
            Expr::Symbol(name) => {
                self.value(value, dest);
                self.store_variable(name, dest);
            }
            Expr::Index { target, index } => {
                let (base, size) = match self.indexable(target) {
                    Some(element) => element,
                    None => return,
                };

                let address = Role::OutAddress.register();

                self.value(value, dest);
                self.push(dest);
                self.element_address(index, base, size, dest);
                self.emit(Instruction::new(OpCode::Move, Mode::RegisterRegister).rd(address).rs1(dest.register()));
                self.pop(dest);

                if size == 1 {
                    self.error(CompileError::UnsupportedNode {
                        node: "assignment to a string character",
                        span: self.span.clone(),
                    });
                }

                let ins = Instruction::new(OpCode::Store, Mode::RegisterIndirect)
                    .rs1(dest.register())
                    .rs2(address);

                self.emit(ins);
            }
            _ => self.error(CompileError::InvalidTarget { span: self.span.clone() }),
        }
    }

    /// Allocates static storage for a list literal. Elements that are not
    /// constant are stored by code.
    fn static_list(&mut self, items: &[Expr]) -> u32 {
        let base = self.alloc_word(items.first().and_then(Expr::constant_value).unwrap_or(0));

        for item in items.iter().skip(1) {
            self.alloc_word(item.constant_value().unwrap_or(0));
        }

        for (i, item) in items.iter().enumerate() {
            if item.constant_value().is_none() {
                let addr = base + i as u32 * 4;

                self.value(item, Role::Accumulator);
                let ins = Instruction::new(OpCode::Store, Mode::Absolute).rs1(Role::Accumulator.register());
                self.emit_ext(ins, addr);
            }
        }

        base
    }

    fn declare(&mut self, symbol: Symbol) {
        let name = symbol.name.clone();

        if let Err(previous) = self.scopes.declare(symbol) {
            self.error(CompileError::DuplicateDeclaration {
                name,
                span: self.span.clone(),
                previous,
            });
        }
    }

    fn let_statement(&mut self, name: &str, value: &Expr) {
        let global = self.scopes.is_global();

        let mut symbol = Symbol {
            name: name.to_string(),
            ty: SymbolType::Int,
            area: MemoryArea::GlobalData,
            location: Location::Absolute(0),
            size: 4,
            constant: None,
            defined: self.span.clone(),
        };

        match value {
            Expr::Str(text) => {
                let len = text.len() as u32;
                symbol.ty = SymbolType::Str { len };
                symbol.size = len;
                symbol.location = Location::Absolute(self.alloc_bytes(text.as_bytes()));
            }

            Expr::List(items) => {
                let len = items.len() as u32;
                symbol.ty = SymbolType::List { len };
                symbol.size = len * 4;
                symbol.location = Location::Absolute(self.static_list(items));
            }

            value if global => match value.constant_value() {
                Some(constant) => {
                    symbol.constant = Some(constant);
                    symbol.location = Location::Absolute(self.alloc_word(constant));
                }
                None => {
                    let addr = self.alloc_word(0);
                    symbol.location = Location::Absolute(addr);

                    self.value(value, Role::Accumulator);
                    let ins = Instruction::new(OpCode::Store, Mode::Absolute).rs1(Role::Accumulator.register());
                    self.emit_ext(ins, addr);
                }
            },

            value => {
                self.value(value, Role::Accumulator);

                let frame = self.frame();
                symbol.area = MemoryArea::StackLocal;
                symbol.constant = value.constant_value();
                symbol.location = Location::Frame {
                    frame: frame.id,
                    slot: frame.depth,
                };

                self.push(Role::Accumulator);
            }
        }

        trace!(self.logger, "declare"; "name" => name, "type" => %symbol.ty, "location" => ?symbol.location);

        self.declare(symbol);
    }

    fn print_string(&mut self, addr: u32, len: u32) {
        if len == 0 {
            return;
        }

        let (address, data, counter) = (
            Role::OutAddress.register(),
            Role::OutData.register(),
            Role::Counter.register(),
        );

        self.move_immediate(Role::OutAddress, addr as i32);
        self.move_immediate(Role::Counter, len as i32);

        let head = self.here();

        self.emit(Instruction::new(OpCode::LoadByte, Mode::RegisterIndirect).rd(data).rs1(address));
        self.emit_ext(Instruction::new(OpCode::Out, Mode::Immediate).rs1(data), CHARACTER_PORT);
        self.emit_ext(Instruction::new(OpCode::Add, Mode::RegisterImmediate).rd(address).rs1(address), 1);
        self.emit_ext(Instruction::new(OpCode::Subtract, Mode::RegisterImmediate).rd(counter).rs1(counter), 1);
        self.emit_ext(Instruction::new(OpCode::Jump { condition: JumpCondition::NotEqual }, Mode::Absolute), head);
    }

    fn print_number(&mut self, expr: &Expr) {
        self.value(expr, Role::OutData);
        let ins = Instruction::new(OpCode::OutLong, Mode::Immediate).rs1(Role::OutData.register());
        self.emit_ext(ins, NUMBER_PORT);
    }

    fn print(&mut self, expr: &Expr) {
        match expr {
            Expr::Str(text) => {
                let addr = self.alloc_bytes(text.as_bytes());
                self.print_string(addr, text.len() as u32);
            }

            Expr::List(items) => {
                for item in items {
                    self.print_number(item);
                }
            }

            Expr::Symbol(name) => {
                let symbol = match self.resolve(name) {
                    Some(symbol) => symbol,
                    None => return,
                };

                match (symbol.ty, symbol.address()) {
                    (SymbolType::Str { len }, Some(addr)) => self.print_string(addr, len),
                    (SymbolType::List { len }, Some(addr)) => {
                        let data = Role::OutData.register();

                        for i in 0..len {
                            self.emit_ext(Instruction::new(OpCode::Load, Mode::Absolute).rd(data), addr + i * 4);
                            self.emit_ext(Instruction::new(OpCode::OutLong, Mode::Immediate).rs1(data), NUMBER_PORT);
                        }
                    }
                    _ => self.print_number(expr),
                }
            }

            expr => self.print_number(expr),
        }
    }

    /// Compiles a branch or loop body in a scope of its own.
    fn scoped(&mut self, stmt: &Stmt) {
        self.open_scope();

        match &stmt.kind {
            StmtKind::Block(body) => {
                for stmt in body {
                    self.statement(stmt);
                }
            }
            _ => self.statement(stmt),
        }

        self.close_scope();
    }

    fn interrupt_handler(&mut self, line: u8, body: &[Stmt]) {
        if self.frames.len() > 1 {
            self.error(CompileError::UnsupportedNode {
                node: "nested interrupt handler",
                span: self.span.clone(),
            });

            return;
        }

        if line >= INTERRUPT_LINES {
            self.error(CompileError::InvalidInterruptLine {
                line,
                span: self.span.clone(),
            });

            return;
        }

        if self.handlers[line as usize] {
            self.error(CompileError::DuplicateHandler {
                line,
                span: self.span.clone(),
            });

            return;
        }

        self.handlers[line as usize] = true;

        let over = self.emit_jump(JumpCondition::Always);
        let handler = self.here();

        debug!(self.logger, "interrupt handler"; "line" => line, "address" => handler);

        let id = self.next_frame;
        self.next_frame += 1;
        self.frames.push(Frame { id, depth: 0 });

        self.open_scope();

        for stmt in body {
            self.statement(stmt);
        }

        self.close_scope();
        self.frames.pop();

        self.emit(Instruction::new(OpCode::ReturnFromInterrupt, Mode::None));

        let here = self.here();
        self.patch(over, here);

        let vector = (VECTOR_BASE + line as u32 * 2) as usize;
        self.image.code[vector] = Instruction::new(OpCode::Jump { condition: JumpCondition::Always }, Mode::Absolute).into();
        self.image.code[vector + 1] = handler;
    }

    fn statement(&mut self, stmt: &Stmt) {
        let outer = std::mem::replace(&mut self.span, stmt.span.clone());

        match &stmt.kind {
            StmtKind::Let { name, value } => self.let_statement(name, value),

            StmtKind::If { cond, then, otherwise } => {
                let op = self.condition(cond);
                let skip = self.emit_jump(jump_condition(invert(op)));

                self.scoped(then);

                match otherwise {
                    Some(otherwise) => {
                        let end = self.emit_jump(JumpCondition::Always);
                        let here = self.here();
                        self.patch(skip, here);

                        self.scoped(otherwise);

                        let here = self.here();
                        self.patch(end, here);
                    }
                    None => {
                        let here = self.here();
                        self.patch(skip, here);
                    }
                }
            }

            StmtKind::While { cond, body } => {
                let head = self.here();

                let op = self.condition(cond);
                let exit = self.emit_jump(jump_condition(invert(op)));

                self.scoped(body);

                let back = self.emit_jump(JumpCondition::Always);
                self.patch(back, head);

                let here = self.here();
                self.patch(exit, here);
            }

            StmtKind::Print(expr) => self.print(expr),

            StmtKind::Block(_) => self.scoped(stmt),

            StmtKind::Inter { line, body } => self.interrupt_handler(*line, body),

            StmtKind::IntOn => {
                self.emit(Instruction::new(OpCode::EnableInterrupts, Mode::None));
            }

            StmtKind::IntOff => {
                self.emit(Instruction::new(OpCode::DisableInterrupts, Mode::None));
            }

            StmtKind::Expr(expr) => {
                self.expr(expr, Role::Accumulator);
            }
        }

        self.span = outer;
    }

    fn finish(mut self) -> Result<Image, Vec<CompileError>> {
        self.emit(Instruction::new(OpCode::Halt, Mode::None));

        if !self.errors.is_empty() {
            return Err(self.errors);
        }

        let mut image = self.image;
        image.listing = disassemble(&image.code);
        image.globals = self.scopes.into_globals();

        Ok(image)
    }
}

/// Compiles a parsed program into an instruction image and a data image.
///
/// # Errors
/// Returns every error found in the program. No image is produced if there were any.
pub fn compile(program: &Program) -> Result<Image, Vec<CompileError>> {
    compile_with_logger(program, None)
}

pub fn compile_with_logger<L>(program: &Program, logger: L) -> Result<Image, Vec<CompileError>>
where
    L: Into<Option<Logger>>,
{
    let logger = logger
        .into()
        .unwrap_or_else(|| Logger::root(Discard, o!()))
        .new(o!("stage" => "compilation"));

    let mut compiler = Compiler::new(logger);

    for stmt in &program.statements {
        compiler.statement(stmt);
    }

    debug!(compiler.logger, "compilation finished";
        "code_words" => compiler.image.code.len(),
        "data_bytes" => compiler.image.data.len(),
        "errors" => compiler.errors.len());

    compiler.finish()
}
