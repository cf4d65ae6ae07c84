//! Event handling.
//!
//! This library exposes an event-based interface for reacting
//! to the state changes of the CPU in real-time. [EventListeners](EventListener)
//! can be registered on the [Cpu](crate::emulator::Cpu) with the
//! [add_listener](crate::emulator::Cpu::add_listener) method.
//!
//! A blanket implementation of [EventListener] for all `FnMut(&Event)` is provided.

use std::fmt;

/// Represents an event that occurred while executing a program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The program modified a data memory word.
    MemoryChange {
        /// The byte address of the changed word.
        address: u32,

        /// New value of the word.
        data: u32,
    },

    /// The program modified a register.
    RegisterChange {
        /// Index of the register slot. Slot 15 is the stack pointer.
        register: usize,

        /// The new value of the register.
        data: u32,
    },

    /// A byte was written to an output port.
    Output { port: u8, byte: u8 },

    /// The CPU jumped to the vector of an interrupt line.
    InterruptEntered { line: u8 },

    /// An `IRET` restored the interrupted context.
    InterruptReturned,

    Halted,
}

/// Trait for consuming events.
pub trait EventListener {
    /// Called whenever a new event has been created.
    fn event(&mut self, event: &Event);
}

impl<F> EventListener for F
where
    F: FnMut(&Event),
{
    fn event(&mut self, event: &Event) {
        self(event)
    }
}

pub(crate) struct EventDispatcher {
    listeners: Vec<Box<dyn EventListener>>,
}

impl EventDispatcher {
    pub fn new() -> EventDispatcher {
        EventDispatcher {
            listeners: Vec::new(),
        }
    }

    pub fn add_listener<L: EventListener + 'static>(&mut self, listener: L) {
        self.listeners.push(Box::new(listener) as Box<dyn EventListener>)
    }

    pub fn dispatch(&mut self, event: Event) {
        for listener in &mut self.listeners {
            listener.event(&event);
        }
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "EventDispatcher({} listeners)", self.listeners.len())
    }
}
