//! A translator and a microcoded emulator for a small word-addressed teaching machine.
//!
//! This crate provides the functionality to:
//! - Lex and parse the source language into an AST ([source]).
//! - Compile the AST into an instruction image, a data image and a disassembly
//!   listing ([compiler]).
//! - Read and write the images as flat binary files ([image]).
//! - Execute the images tick by tick, with interrupts and scheduled port input
//!   ([emulator], [io], [schedule]).
//!
//! # Example
//! ```
//! use mcpu::{
//!     translate,
//!     config::RunConfig,
//!     emulator::{Cpu, RunOutcome},
//!     schedule::Schedule,
//! };
//!
//! let source = r#"
//!     let greeting = "sum: ";
//!     let total = 0;
//!     let i = 1;
//!
//!     while (i <= 4) {
//!         total = total + i;
//!         i = i + 1;
//!     }
//!
//!     print(greeting);
//!     print(total);
//! "#;
//!
//! // Lex, parse and compile the source into images.
//! let image = translate(source).unwrap();
//!
//! // Load the images into a fresh CPU without any scheduled input.
//! let mut cpu = Cpu::new(image.code, image.data, Schedule::new(), &RunConfig::default());
//!
//! assert_eq!(cpu.run_to_end(), RunOutcome::Halted);
//! assert_eq!(cpu.io.text(), "sum: ");
//! assert_eq!(cpu.io.numbers(), vec![10]);
//! ```
//!
//! # Executables
//!
//! ## `mcpuc`
//!
//! Compiles a source file into `PREFIX.code` and `PREFIX.data` and prints the listing.
//!
//! ```text
//! $ mcpuc hello.src -o hello
//! 0000: JMP 0x0006
//! 0002: IRET
//! ...
//! ```
//!
//! ## `mcpurun`
//!
//! Compiles and runs a source file, or runs previously saved images, optionally
//! with an input schedule.

use slog::Logger;

pub mod compiler;
pub mod config;
pub mod emulator;
pub mod error;
pub mod event;
pub mod image;
pub mod instruction;
pub mod io;
pub mod parsing;
pub mod schedule;
pub mod source;
pub mod source_map;
pub mod symbol_table;

pub use crate::error::TranslateError;
pub use crate::image::Image;

/// Runs every translation stage on `source`.
pub fn translate(source: &str) -> Result<Image, TranslateError> {
    translate_with_logger(source, None)
}

pub fn translate_with_logger<L>(source: &str, logger: L) -> Result<Image, TranslateError>
where
    L: Into<Option<Logger>>,
{
    let logger = logger.into();

    let program = source::parse_with_logger(source, logger.clone())?;
    let image = compiler::compile_with_logger(&program, logger)?;

    Ok(image)
}
