//! Run parameters of the [emulator](crate::emulator).

/// Parameters of a single run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Maximum number of ticks [run_to_end](crate::emulator::Cpu::run_to_end) executes.
    pub tick_budget: u64,

    /// Echo every trace entry to the logger.
    pub debug: bool,

    /// Bytes of data memory reserved for the stack, after the data image.
    pub stack_size: u32,
}

impl Default for RunConfig {
    fn default() -> RunConfig {
        RunConfig {
            tick_budget: 100_000,
            debug: false,
            stack_size: 4096,
        }
    }
}

impl RunConfig {
    pub fn with_tick_budget(mut self, ticks: u64) -> RunConfig {
        self.tick_budget = ticks;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> RunConfig {
        self.debug = debug;
        self
    }

    pub fn with_stack_size(mut self, bytes: u32) -> RunConfig {
        self.stack_size = bytes;
        self
    }
}

#[test]
fn test_defaults() {
    let config = RunConfig::default().with_debug(true);

    assert_eq!(config.tick_budget, 100_000);
    assert_eq!(config.stack_size, 4096);
    assert!(config.debug);
}
