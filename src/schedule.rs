//! Tick-scheduled input for the [I/O controller](crate::io::IoController).
//!
//! A schedule file has one entry per line:
//!
//! ```text
//! # tick  line  value
//! 120     0     'A'
//! 300     1     0x2a
//! 301     1     7      # trailing comments are allowed
//! ```
//!
//! At the given tick the value is latched into the input port of the same number
//! and an interrupt is requested on that line. Values are decimal, `0x`
//! hexadecimal or a quoted character.

use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{anychar, char, digit1, hex_digit1, space0, space1},
    combinator::{all_consuming, map, map_res, opt, rest},
    sequence::{delimited, preceded, tuple},
    IResult,
};
use slog::{o, warn, Discard, Logger};

use std::collections::BTreeMap;
use std::fmt;

use crate::compiler::INTERRUPT_LINES;

/// A single scheduled input event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScheduledInput {
    /// Interrupt line, also the number of the port the value is latched into.
    pub line: u8,
    pub value: u8,
}

/// One-shot input events keyed by the tick they occur at.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Schedule {
    entries: BTreeMap<u64, ScheduledInput>,
}

impl Schedule {
    pub fn new() -> Schedule {
        Schedule::default()
    }

    /// Schedules an input. Returns the entry it replaced if the tick was taken.
    pub fn insert(&mut self, tick: u64, line: u8, value: u8) -> Option<ScheduledInput> {
        self.entries.insert(tick, ScheduledInput { line, value })
    }

    pub fn get(&self, tick: u64) -> Option<&ScheduledInput> {
        self.entries.get(&tick)
    }

    /// Removes and returns the entry of `tick`.
    pub fn take(&mut self, tick: u64) -> Option<ScheduledInput> {
        self.entries.remove(&tick)
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, &ScheduledInput)> {
        self.entries.iter().map(|(tick, input)| (*tick, input))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parses a schedule file.
    pub fn parse(input: &str) -> Result<Schedule, ScheduleError> {
        Schedule::parse_with_logger(input, None)
    }

    pub fn parse_with_logger<L>(input: &str, logger: L) -> Result<Schedule, ScheduleError>
    where
        L: Into<Option<Logger>>,
    {
        let logger = logger
            .into()
            .unwrap_or_else(|| Logger::root(Discard, o!()))
            .new(o!("stage" => "schedule"));

        let mut schedule = Schedule::new();

        for (index, text) in input.lines().enumerate() {
            let line_number = index + 1;
            let trimmed = text.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (tick, line, value) = match entry(text) {
                Ok((_, entry)) => entry,
                Err(_) => {
                    return Err(ScheduleError {
                        line: line_number,
                        kind: ScheduleErrorKind::Syntax(trimmed.to_string()),
                    })
                }
            };

            if line >= INTERRUPT_LINES as u32 {
                return Err(ScheduleError {
                    line: line_number,
                    kind: ScheduleErrorKind::InvalidLine(line),
                });
            }

            if value > 0xFF {
                return Err(ScheduleError {
                    line: line_number,
                    kind: ScheduleErrorKind::InvalidValue(value),
                });
            }

            if let Some(previous) = schedule.insert(tick, line as u8, value as u8) {
                warn!(logger, "two inputs scheduled for the same tick, keeping the last";
                    "tick" => tick, "line" => line_number, "dropped" => previous.value);
            }
        }

        Ok(schedule)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ScheduleErrorKind {
    /// The line is not of the form `TICK LINE VALUE`.
    Syntax(String),
    InvalidLine(u32),
    /// The value does not fit into a byte.
    InvalidValue(u32),
}

/// Error in a schedule file. `line` is the 1-based line number.
#[derive(Clone, Debug, PartialEq)]
pub struct ScheduleError {
    pub line: usize,
    pub kind: ScheduleErrorKind,
}

impl fmt::Display for ScheduleError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "line {}: ", self.line)?;

        match &self.kind {
            ScheduleErrorKind::Syntax(text) => write!(f, "expected 'TICK LINE VALUE', found '{}'", text),
            ScheduleErrorKind::InvalidLine(line) => {
                write!(f, "interrupt line {} does not exist", line)
            }
            ScheduleErrorKind::InvalidValue(value) => {
                write!(f, "value {} does not fit in a byte", value)
            }
        }
    }
}

type NomResult<'a, T> = IResult<&'a str, T>;

fn take_u64(input: &str) -> NomResult<u64> {
    map_res(digit1, |s: &str| s.parse::<u64>())(input)
}

fn take_u32(input: &str) -> NomResult<u32> {
    alt((
        preceded(tag("0x"), map_res(hex_digit1, |s| u32::from_str_radix(s, 16))),
        map_res(digit1, |s: &str| s.parse::<u32>()),
    ))(input)
}

fn take_value(input: &str) -> NomResult<u32> {
    alt((
        map(delimited(char('\''), anychar, char('\'')), |c| c as u32),
        take_u32,
    ))(input)
}

fn comment(input: &str) -> NomResult<&str> {
    preceded(char('#'), rest)(input)
}

fn entry(input: &str) -> NomResult<(u64, u32, u32)> {
    map(
        all_consuming(tuple((
            space0,
            take_u64,
            space1,
            take_u32,
            space1,
            take_value,
            space0,
            opt(comment),
        ))),
        |(_, tick, _, line, _, value, _, _)| (tick, line, value),
    )(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let schedule = Schedule::parse(
            "# header\n\n120 0 'A'\n  300\t1 0x2a # hex\n301 1 7\n",
        )
        .unwrap();

        assert_eq!(schedule.len(), 3);
        assert_eq!(schedule.get(120), Some(&ScheduledInput { line: 0, value: b'A' }));
        assert_eq!(schedule.get(300), Some(&ScheduledInput { line: 1, value: 0x2a }));
        assert_eq!(schedule.get(301), Some(&ScheduledInput { line: 1, value: 7 }));
    }

    #[test]
    fn test_same_tick_last_wins() {
        let schedule = Schedule::parse("10 0 1\n10 1 2\n").unwrap();

        assert_eq!(schedule.len(), 1);
        assert_eq!(schedule.get(10), Some(&ScheduledInput { line: 1, value: 2 }));
    }

    #[test]
    fn test_character_literals() {
        let schedule = Schedule::parse("1 0 '#'\n2 0 ' '\n").unwrap();

        assert_eq!(schedule.get(1).map(|i| i.value), Some(b'#'));
        assert_eq!(schedule.get(2).map(|i| i.value), Some(b' '));
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            Schedule::parse("1 0 1\n5 2 1\n"),
            Err(ScheduleError { line: 2, kind: ScheduleErrorKind::InvalidLine(2) }),
        );

        assert_eq!(
            Schedule::parse("5 0 256"),
            Err(ScheduleError { line: 1, kind: ScheduleErrorKind::InvalidValue(256) }),
        );

        let err = Schedule::parse("\n\n5 zero 1").unwrap_err();
        assert_eq!(err.line, 3);
        assert_eq!(err.to_string(), "line 3: expected 'TICK LINE VALUE', found '5 zero 1'");
    }

    #[test]
    fn test_take() {
        let mut schedule = Schedule::new();
        schedule.insert(4, 0, 9);

        assert_eq!(schedule.take(4), Some(ScheduledInput { line: 0, value: 9 }));
        assert_eq!(schedule.take(4), None);
        assert!(schedule.is_empty());
    }
}
