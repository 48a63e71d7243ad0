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

//! Note name parsing. Octaves follow the convention where C4 is MIDI note 60 and the
//! lowest octave is -1.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The octave used when a note name doesn't specify one.
pub const DEFAULT_OCTAVE: i32 = 4;

/// A note given either as a MIDI number or as a name like "C", "D#4" or "Bb-1".
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum NoteValue {
    Number(u8),
    Name(String),
}

impl NoteValue {
    /// Resolves the note to a MIDI note number.
    pub fn to_midi_note(&self) -> Result<u8, NoteNameError> {
        match self {
            NoteValue::Number(note) if *note <= 127 => Ok(*note),
            NoteValue::Number(note) => Err(NoteNameError::OutOfRange(i32::from(*note))),
            NoteValue::Name(name) => parse_note_name(name),
        }
    }
}

impl fmt::Display for NoteValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NoteValue::Number(note) => write!(f, "{}", note),
            NoteValue::Name(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NoteNameError {
    #[error("note name is empty")]
    Empty,

    #[error("unknown note letter {0:?}")]
    Letter(char),

    #[error("invalid octave {0:?}")]
    Octave(String),

    #[error("note {0} is outside the MIDI range (0-127)")]
    OutOfRange(i32),
}

const OCTAVE_MIN: i32 = -1;
const OCTAVE_MAX: i32 = 9;

/// Parses a note name into a MIDI note number. The letter is case-insensitive and may be
/// followed by `#` or `b` and an octave.
pub fn parse_note_name(name: &str) -> Result<u8, NoteNameError> {
    let name = name.trim();
    let mut chars = name.chars();
    let letter = chars.next().ok_or(NoteNameError::Empty)?;

    let semitone = match letter.to_ascii_uppercase() {
        'C' => 0,
        'D' => 2,
        'E' => 4,
        'F' => 5,
        'G' => 7,
        'A' => 9,
        'B' => 11,
        _ => return Err(NoteNameError::Letter(letter)),
    };

    let rest = chars.as_str();
    let (accidental, octave) = if let Some(octave) = rest.strip_prefix('#') {
        (1, octave)
    } else if let Some(octave) = rest.strip_prefix('b') {
        (-1, octave)
    } else {
        (0, rest)
    };

    let octave = if octave.is_empty() {
        DEFAULT_OCTAVE
    } else {
        octave
            .parse::<i32>()
            .ok()
            .filter(|octave| (OCTAVE_MIN..=OCTAVE_MAX).contains(octave))
            .ok_or_else(|| NoteNameError::Octave(octave.to_string()))?
    };

    let note = (octave + 1) * 12 + semitone + accidental;
    u8::try_from(note)
        .ok()
        .filter(|note| *note <= 127)
        .ok_or(NoteNameError::OutOfRange(note))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_note_names() {
        assert_eq!(parse_note_name("C"), Ok(60));
        assert_eq!(parse_note_name("C4"), Ok(60));
        assert_eq!(parse_note_name("c4"), Ok(60));
        assert_eq!(parse_note_name("D#4"), Ok(63));
        assert_eq!(parse_note_name("Eb3"), Ok(51));
        assert_eq!(parse_note_name("A4"), Ok(69));
        assert_eq!(parse_note_name("B"), Ok(71));
        assert_eq!(parse_note_name("C-1"), Ok(0));
        assert_eq!(parse_note_name("G9"), Ok(127));
        assert_eq!(parse_note_name(" F#2 "), Ok(42));
    }

    #[test]
    fn test_parse_note_name_errors() {
        assert_eq!(parse_note_name(""), Err(NoteNameError::Empty));
        assert_eq!(parse_note_name("H4"), Err(NoteNameError::Letter('H')));
        assert_eq!(
            parse_note_name("C#x"),
            Err(NoteNameError::Octave("x".to_string()))
        );
        assert_eq!(parse_note_name("G#9"), Err(NoteNameError::OutOfRange(128)));
        assert_eq!(parse_note_name("Cb-1"), Err(NoteNameError::OutOfRange(-1)));
    }

    #[test]
    fn test_octave_out_of_range() {
        assert_eq!(
            parse_note_name("C2147483647"),
            Err(NoteNameError::Octave("2147483647".to_string()))
        );
        assert_eq!(
            parse_note_name("C10"),
            Err(NoteNameError::Octave("10".to_string()))
        );
        assert_eq!(
            parse_note_name("D#-2"),
            Err(NoteNameError::Octave("-2".to_string()))
        );
    }

    #[test]
    fn test_note_value() {
        assert_eq!(NoteValue::Number(62).to_midi_note(), Ok(62));
        assert_eq!(
            NoteValue::Number(200).to_midi_note(),
            Err(NoteNameError::OutOfRange(200))
        );
        assert_eq!(NoteValue::Name("D".to_string()).to_midi_note(), Ok(62));
    }
}
