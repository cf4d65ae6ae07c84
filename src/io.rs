//! The I/O controller: scheduled input ports and buffered output ports.

use slog::{o, trace, Discard, Logger};

use std::collections::BTreeMap;

use crate::schedule::Schedule;

/// Port numbers of the standard devices.
pub mod port {
    /// Characters, one byte per write.
    pub const CHARACTERS: u8 = 0;
    /// Numbers, written as little-endian 32-bit words.
    pub const NUMBERS: u8 = 1;
}

/// Delivers the [Schedule] to the input ports and collects everything the
/// program writes to the output ports.
#[derive(Clone, Debug)]
pub struct IoController {
    schedule: Schedule,
    latched: BTreeMap<u8, u8>,
    output: BTreeMap<u8, Vec<u8>>,
    logger: Logger,
}

impl IoController {
    pub fn new(schedule: Schedule) -> IoController {
        IoController::with_logger(schedule, None)
    }

    pub fn with_logger<L>(schedule: Schedule, logger: L) -> IoController
    where
        L: Into<Option<Logger>>,
    {
        IoController {
            schedule,
            latched: BTreeMap::new(),
            output: BTreeMap::new(),
            logger: logger.into().unwrap_or_else(|| Logger::root(Discard, o!())),
        }
    }

    /// Samples the schedule at tick `now`. A scheduled value is latched into its
    /// port and the interrupt line it arrived on is returned.
    pub fn tick(&mut self, now: u64) -> Option<u8> {
        let input = self.schedule.take(now)?;

        trace!(self.logger, "input arrived"; "tick" => now, "line" => input.line, "value" => input.value);

        self.latched.insert(input.line, input.value);

        Some(input.line)
    }

    /// The value latched into `port`, or 0 if nothing has arrived yet.
    pub fn input(&self, port: u8) -> u8 {
        self.latched.get(&port).copied().unwrap_or(0)
    }

    /// Appends a byte to the buffer of `port`.
    pub fn output(&mut self, port: u8, byte: u8) {
        self.output.entry(port).or_default().push(byte);
    }

    /// Appends a 16-bit half of a long write, low byte first.
    pub fn output_half(&mut self, port: u8, half: u16) {
        self.output
            .entry(port)
            .or_default()
            .extend_from_slice(&half.to_le_bytes());
    }

    /// Everything written to `port` so far.
    pub fn output_buffer(&self, port: u8) -> &[u8] {
        self.output.get(&port).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn outputs(&self) -> &BTreeMap<u8, Vec<u8>> {
        &self.output
    }

    /// Inputs that have not arrived yet.
    pub fn pending_schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// The number port buffer decoded as 32-bit words. A trailing partial word is ignored.
    pub fn numbers(&self) -> Vec<i32> {
        self.output_buffer(port::NUMBERS)
            .chunks_exact(4)
            .map(|b| i32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect()
    }

    /// The character port buffer as text.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(self.output_buffer(port::CHARACTERS)).into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latch_and_one_shot() {
        let mut schedule = Schedule::new();
        schedule.insert(3, 1, 42);

        let mut io = IoController::new(schedule);

        assert_eq!(io.input(1), 0);
        assert_eq!(io.tick(2), None);
        assert_eq!(io.tick(3), Some(1));
        assert_eq!(io.input(1), 42);
        assert_eq!(io.input(0), 0);

        assert_eq!(io.tick(3), None);
        assert_eq!(io.input(1), 42);
        assert!(io.pending_schedule().is_empty());
    }

    #[test]
    fn test_output_buffers() {
        let mut io = IoController::new(Schedule::new());

        io.output(port::CHARACTERS, b'h');
        io.output(port::CHARACTERS, b'i');

        let value: i32 = -2;
        io.output_half(port::NUMBERS, value as u32 as u16);
        io.output_half(port::NUMBERS, (value as u32 >> 16) as u16);

        assert_eq!(io.text(), "hi");
        assert_eq!(io.output_buffer(port::NUMBERS), &[0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(io.numbers(), vec![-2]);
        assert!(io.output_buffer(7).is_empty());
    }
}
