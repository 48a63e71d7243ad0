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
use std::{error::Error, fmt};

use midir::{MidiOutput, MidiOutputConnection};
use parking_lot::Mutex;
use tracing::{info, span, Level};

use crate::event::Event;

/// A MIDI output port.
pub struct Device {
    name: String,
    connection: Mutex<MidiOutputConnection>,
}

impl super::Device for Device {
    fn name(&self) -> String {
        self.name.clone()
    }

    fn emit(&self, events: &[Event]) -> Result<(), Box<dyn Error>> {
        let mut connection = self.connection.lock();
        for event in events {
            connection.send(&event.to_bytes()?)?;
        }
        Ok(())
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (Output)", self.name)
    }
}

/// Opens the output port whose name contains the given name.
pub fn get(name: &str) -> Result<Device, Box<dyn Error>> {
    let span = span!(Level::INFO, "open MIDI output (midir)");
    let _enter = span.enter();

    let output = MidiOutput::new("vmtrigger output")?;
    let mut matches = Vec::new();
    for port in output.ports() {
        let port_name = output.port_name(&port)?;
        if port_name.contains(name) {
            matches.push((port_name, port));
        }
    }

    if matches.is_empty() {
        return Err(format!("no MIDI output found with name {}", name).into());
    }
    if matches.len() > 1 {
        return Err(format!(
            "found too many MIDI outputs that match ({}), use a less ambiguous name",
            matches
                .iter()
                .map(|(port_name, _)| port_name.clone())
                .collect::<Vec<String>>()
                .join(", ")
        )
        .into());
    }

    // We've verified that there's only one element in the vector, so this should be safe.
    let (port_name, port) = matches.swap_remove(0);
    let connection = output
        .connect(&port, "vmtrigger")
        .map_err(|e| format!("unable to connect to {}: {}", port_name, e))?;
    info!(device = port_name, "Opened MIDI output.");

    Ok(Device {
        name: port_name,
        connection: Mutex::new(connection),
    })
}

/// Lists the names of the available MIDI output ports.
pub fn list() -> Result<Vec<String>, Box<dyn Error>> {
    let output = MidiOutput::new("vmtrigger output listing")?;
    let mut names = Vec::new();
    for port in output.ports() {
        names.push(output.port_name(&port)?);
    }
    Ok(names)
}
