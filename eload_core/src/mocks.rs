//! Test and helper mocks for eload_core

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use eload_traits::{Channel, Field, InputEvent};

/// An analog source that returns a fixed raw value per channel.
pub struct StaticSource {
    pub voltage: u16,
    pub current: u16,
}

impl eload_traits::AnalogSource for StaticSource {
    fn convert(
        &mut self,
        channel: Channel,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        Ok(match channel {
            Channel::Voltage => self.voltage,
            Channel::Current => self.current,
        })
    }
}

/// An analog source that always errors; models a disconnected or faulted
/// converter.
pub struct NoopSource;

impl eload_traits::AnalogSource for NoopSource {
    fn convert(
        &mut self,
        _channel: Channel,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        Err(Box::new(std::io::Error::other("noop source")))
    }
}

/// A display that discards every write.
pub struct NullDisplay;

impl eload_traits::Display for NullDisplay {
    fn write_field(
        &mut self,
        _field: Field,
        _digits: &[u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Ok(())
    }
}

/// A display that records every field write for later assertions.
#[derive(Clone, Default)]
pub struct RecordingDisplay {
    writes: Arc<Mutex<Vec<(Field, Vec<u8>)>>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn writes(&self) -> Vec<(Field, Vec<u8>)> {
        self.writes.lock().map(|w| w.clone()).unwrap_or_default()
    }
}

impl eload_traits::Display for RecordingDisplay {
    fn write_field(
        &mut self,
        field: Field,
        digits: &[u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut w) = self.writes.lock() {
            w.push((field, digits.to_vec()));
        }
        Ok(())
    }
}

/// An input panel with no keys pressed, ever.
pub struct IdlePanel;

impl eload_traits::InputPanel for IdlePanel {
    fn poll(&mut self) -> Result<Option<InputEvent>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(None)
    }
}

/// An input panel that replays a scripted sequence of events, one per poll.
pub struct ScriptedPanel {
    events: VecDeque<InputEvent>,
}

impl ScriptedPanel {
    pub fn new(events: impl IntoIterator<Item = InputEvent>) -> Self {
        Self {
            events: events.into_iter().collect(),
        }
    }
}

impl eload_traits::InputPanel for ScriptedPanel {
    fn poll(&mut self) -> Result<Option<InputEvent>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(self.events.pop_front())
    }
}

/// A duty sink that records every command it receives.
#[derive(Clone, Default)]
pub struct RecordingSink {
    history: Arc<Mutex<Vec<u16>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn history(&self) -> Vec<u16> {
        self.history.lock().map(|h| h.clone()).unwrap_or_default()
    }

    pub fn last(&self) -> Option<u16> {
        self.history.lock().ok().and_then(|h| h.last().copied())
    }
}

impl eload_traits::DutySink for RecordingSink {
    fn set_duty(&mut self, ticks: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if let Ok(mut h) = self.history.lock() {
            h.push(ticks);
        }
        Ok(())
    }
}
