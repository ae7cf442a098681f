use anyhow::Result;
use std::collections::VecDeque;
use std::time::Duration;

/// Input the viewer reacts to, already translated from the window system
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    ScrollDown,
    ScrollUp,
    PageDown,
    PageUp,
    ToggleDarkMode,
    Resize { width: usize, height: usize },
    /// The window contents were damaged and must be redrawn
    Expose,
    Quit,
}

/// Trait for abstracting event sources to enable testing
pub trait EventSource {
    /// Poll for events with a timeout
    fn poll(&mut self, timeout: Duration) -> Result<bool>;

    /// Read the next event
    fn read(&mut self) -> Result<Event>;
}

/// Simulated event source for testing
pub struct SimulatedEventSource {
    pub(crate) events: VecDeque<Event>,
}

impl SimulatedEventSource {
    pub fn new(events: Vec<Event>) -> Self {
        Self {
            events: events.into(),
        }
    }

    /// Events not read yet
    pub fn remaining(&self) -> usize {
        self.events.len()
    }
}

impl EventSource for SimulatedEventSource {
    fn poll(&mut self, _timeout: Duration) -> Result<bool> {
        Ok(!self.events.is_empty())
    }

    fn read(&mut self) -> Result<Event> {
        // Return a quit event if we've exhausted all events
        Ok(self.events.pop_front().unwrap_or(Event::Quit))
    }
}
