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

use tracing::info;

use crate::event::Event;

mod midir;
mod mock;

pub use mock::Device as MockDevice;

/// A destination for trigger events.
pub trait Device: fmt::Display + std::marker::Send + std::marker::Sync {
    /// Returns the name of the device.
    fn name(&self) -> String;

    /// Emits the events in order.
    fn emit(&self, events: &[Event]) -> Result<(), Box<dyn Error>>;
}

/// Gets a device with the given name. Names starting with "mock" give a mock device, no
/// name gives a device that only logs.
pub fn get_device(name: Option<&str>) -> Result<Arc<dyn Device>, Box<dyn Error>> {
    match name {
        None => Ok(Arc::new(LogDevice {})),
        Some(name) if name.starts_with("mock") => Ok(Arc::new(mock::Device::get(name))),
        Some(name) => Ok(Arc::new(midir::get(name)?)),
    }
}

/// Lists the names of the MIDI outputs on this machine.
pub fn list_devices() -> Result<Vec<String>, Box<dyn Error>> {
    midir::list()
}

/// A device that logs events instead of sending them anywhere.
pub struct LogDevice {}

impl Device for LogDevice {
    fn name(&self) -> String {
        "log".to_string()
    }

    fn emit(&self, events: &[Event]) -> Result<(), Box<dyn Error>> {
        for event in events {
            info!(
                channel = event.channel(),
                event = event.to_string(),
                "MIDI event."
            );
        }
        Ok(())
    }
}

impl fmt::Display for LogDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_device() {
        assert_eq!(get_device(None).unwrap().name(), "log");
        let device = get_device(Some("mock-out")).unwrap();
        assert_eq!(device.name(), "mock-out");
        assert_eq!(device.to_string(), "mock-out (Mock)");
    }
}
