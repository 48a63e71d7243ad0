// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//
use std::{error::Error, fmt, sync::Arc};

use parking_lot::Mutex;
use tracing::debug;

use crate::event::Event;

/// A mock device. Records everything it's asked to emit.
#[derive(Clone)]
pub struct Device {
    name: String,
    emitted: Arc<Mutex<Vec<Event>>>,
}

impl Device {
    /// Gets the given mock device.
    pub fn get(name: &str) -> Device {
        Device {
            name: name.to_string(),
            emitted: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Gets every event emitted so far.
    pub fn emitted_events(&self) -> Vec<Event> {
        self.emitted.lock().clone()
    }

    /// Gets every event emitted so far as MIDI wire bytes.
    pub fn emitted_bytes(&self) -> Result<Vec<Vec<u8>>, Box<dyn Error>> {
        self.emitted.lock().iter().map(Event::to_bytes).collect()
    }

    /// Forgets the emitted events.
    pub fn reset_emitted_events(&self) {
        self.emitted.lock().clear();
    }
}

impl super::Device for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn emit(&self, events: &[Event]) -> Result<(), Box<dyn Error>> {
        // Reject what a real port would reject.
        for event in events {
            event.to_midi_event()?;
        }

        debug!(device = self.name, count = events.len(), "Emitting events (mock).");
        self.emitted.lock().extend_from_slice(events);
        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Mock)", self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::super::Device as _;
    use super::*;

    #[test]
    fn test_records_events() {
        let device = Device::get("mock");
        let events = [
            Event::NoteOn {
                note: 60,
                velocity: 100,
                channel: 0,
            },
            Event::NoteOff {
                note: 60,
                channel: 0,
            },
        ];
        device.emit(&events).unwrap();

        assert_eq!(device.emitted_events(), events.to_vec());
        assert_eq!(
            device.emitted_bytes().unwrap(),
            vec![vec![0x90, 60, 100], vec![0x80, 60, 0]]
        );

        device.reset_emitted_events();
        assert!(device.emitted_events().is_empty());
    }

    #[test]
    fn test_rejects_invalid_events() {
        let device = Device::get("mock");
        let result = device.emit(&[Event::NoteOff {
            note: 200,
            channel: 0,
        }]);
        assert!(result.is_err());
        assert!(device.emitted_events().is_empty());
    }
}
