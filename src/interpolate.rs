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

//! Two-point linear interpolation from detected values to MIDI data bytes.

/// The largest value a MIDI data byte can carry.
pub const MIDI_DATA_MAX: u8 = 127;

/// A calibration point mapping a detected value to a MIDI output value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    /// The detected value.
    pub value: f64,
    /// The output (velocity or CC value) at that detected value.
    pub output: u8,
}

impl Point {
    /// Creates a new calibration point.
    pub const fn new(value: f64, output: u8) -> Point {
        Point { value, output }
    }
}

impl From<(f64, u8)> for Point {
    fn from((value, output): (f64, u8)) -> Self {
        Point { value, output }
    }
}

/// Maps the value onto the line between min and max, clamping to the end points and to
/// the MIDI data range. A zero-width calibration always yields the min output. NaN is
/// treated as being below the calibration.
pub fn interpolate(value: f64, min: impl Into<Point>, max: impl Into<Point>) -> u8 {
    let min = min.into();
    let max = max.into();

    if value.is_nan() || value <= min.value || max.value == min.value {
        return min.output.min(MIDI_DATA_MAX);
    }
    if value >= max.value {
        return max.output.min(MIDI_DATA_MAX);
    }

    let fraction = (value - min.value) / (max.value - min.value);
    let output = f64::from(min.output) + fraction * (f64::from(max.output) - f64::from(min.output));
    output.round().clamp(0.0, f64::from(MIDI_DATA_MAX)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries() {
        assert_eq!(interpolate(2.0, (2.0, 80), (20.0, 127)), 80);
        assert_eq!(interpolate(20.0, (2.0, 80), (20.0, 127)), 127);
        assert_eq!(interpolate(25.0, (2.0, 80), (20.0, 127)), 127);
        assert_eq!(interpolate(-3.0, (2.0, 80), (20.0, 127)), 80);
    }

    #[test]
    fn test_midpoint_rounds_to_nearest() {
        // 80 + 0.5 * 47 = 103.5
        assert_eq!(interpolate(11.0, (2.0, 80), (20.0, 127)), 104);
        assert_eq!(interpolate(127.5, (0.0, 0), (255.0, 127)), 64);
    }

    #[test]
    fn test_descending_outputs() {
        assert_eq!(interpolate(0.0, (0.0, 127), (100.0, 0)), 127);
        assert_eq!(interpolate(50.0, (0.0, 127), (100.0, 0)), 64);
        assert_eq!(interpolate(100.0, (0.0, 127), (100.0, 0)), 0);
    }

    #[test]
    fn test_zero_width_range() {
        assert_eq!(interpolate(5.0, (10.0, 30), (10.0, 90)), 30);
        assert_eq!(interpolate(10.0, (10.0, 30), (10.0, 90)), 30);
        assert_eq!(interpolate(15.0, (10.0, 30), (10.0, 90)), 30);
    }

    #[test]
    fn test_clamps_to_midi_range() {
        assert_eq!(interpolate(100.0, (0.0, 0), (10.0, 200)), 127);
        assert_eq!(interpolate(9.0, (0.0, 120), (10.0, 255)), 127);
    }

    #[test]
    fn test_non_finite_values() {
        assert_eq!(interpolate(f64::NAN, (0.0, 10), (10.0, 20)), 10);
        assert_eq!(interpolate(f64::INFINITY, (0.0, 10), (10.0, 20)), 20);
        assert_eq!(interpolate(f64::NEG_INFINITY, (0.0, 10), (10.0, 20)), 10);
    }
}
