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

use midly::{
    live::LiveEvent,
    num::{u4, u7},
    MidiMessage,
};

/// An event emitted by a trigger. Channels are zero-indexed (0-15).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    NoteOn { note: u8, velocity: u8, channel: u8 },
    NoteOff { note: u8, channel: u8 },
    ControlChange { cc: u8, value: u8, channel: u8 },
}

impl Event {
    /// Gets the channel of the event.
    pub fn channel(&self) -> u8 {
        match self {
            Event::NoteOn { channel, .. }
            | Event::NoteOff { channel, .. }
            | Event::ControlChange { channel, .. } => *channel,
        }
    }

    /// Converts the event to a MIDI live event.
    pub fn to_midi_event(&self) -> Result<LiveEvent<'static>, Box<dyn Error>> {
        let (channel, message) = match *self {
            Event::NoteOn {
                note,
                velocity,
                channel,
            } => (
                channel,
                MidiMessage::NoteOn {
                    key: parse_u7(note)?,
                    vel: parse_u7(velocity)?,
                },
            ),
            Event::NoteOff { note, channel } => (
                channel,
                MidiMessage::NoteOff {
                    key: parse_u7(note)?,
                    vel: u7::new(0),
                },
            ),
            Event::ControlChange { cc, value, channel } => (
                channel,
                MidiMessage::Controller {
                    controller: parse_u7(cc)?,
                    value: parse_u7(value)?,
                },
            ),
        };

        Ok(LiveEvent::Midi {
            channel: parse_channel(channel)?,
            message,
        })
    }

    /// Serializes the event into MIDI wire bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>, Box<dyn Error>> {
        let mut buf: Vec<u8> = Vec::with_capacity(3);
        self.to_midi_event()?.write(&mut buf)?;
        Ok(buf)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::NoteOn {
                note,
                velocity,
                channel,
            } => write!(f, "NoteOn(note={note}, velocity={velocity}, channel={channel})"),
            Event::NoteOff { note, channel } => {
                write!(f, "NoteOff(note={note}, channel={channel})")
            }
            Event::ControlChange { cc, value, channel } => {
                write!(f, "ControlChange(cc={cc}, value={value}, channel={channel})")
            }
        }
    }
}

fn parse_channel(channel: u8) -> Result<u4, Box<dyn Error>> {
    u4::try_from(channel).ok_or(format!("channel {} is out of range", channel).into())
}

fn parse_u7(value: u8) -> Result<u7, Box<dyn Error>> {
    u7::try_from(value).ok_or(format!("value {} is not a valid MIDI data byte", value).into())
}
