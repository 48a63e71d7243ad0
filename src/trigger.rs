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

//! Trigger definitions and the per-trigger evaluation state machine.
//!
//! A trigger turns the detected value of a single video region into MIDI events. Discrete
//! kinds (brightness, darkness, motion, difference) hold a note while their condition is
//! met, with debounce delaying the note off and throttle delaying the next note on.
//! Continuous kinds (range, difference range) emit a control change on every sample.

use std::{collections::HashSet, fmt, time::Duration};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::interpolate::{interpolate, Point, MIDI_DATA_MAX};

mod state;

pub use state::{Phase, Trigger, TriggerStatus};

/// A monotonic point in time, measured from an arbitrary origin chosen by the caller
/// (usually the start of the stream).
pub type Timestamp = Duration;

/// The largest detected value a threshold or range may refer to. Samples are means of
/// 8-bit luma values or differences of them.
pub const DETECTED_VALUE_MAX: f64 = 255.0;

/// The highest zero-indexed MIDI channel.
pub const MIDI_CHANNEL_MAX: u8 = 15;

/// The type of a trigger.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// Active while the region is at least as bright as the threshold.
    Brightness,
    /// Active while the region is at most as bright as the threshold.
    Darkness,
    /// Active while the frame-to-frame change is at least the threshold.
    Motion,
    /// Active while the change from the baseline is at least the threshold.
    Difference,
    /// Maps brightness onto a control change.
    Range,
    /// Maps the change from the baseline onto a control change.
    DifferenceRange,
}

impl TriggerKind {
    /// Returns true if the kind emits control changes every frame rather than notes.
    pub fn is_continuous(&self) -> bool {
        matches!(self, TriggerKind::Range | TriggerKind::DifferenceRange)
    }

    /// Evaluates the raw trigger condition. Boundaries are inclusive.
    pub fn is_met(&self, value: f64, threshold: f64) -> bool {
        match self {
            TriggerKind::Brightness => value >= threshold,
            TriggerKind::Darkness => value <= threshold,
            TriggerKind::Motion | TriggerKind::Difference => value.abs() >= threshold,
            TriggerKind::Range | TriggerKind::DifferenceRange => false,
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TriggerKind::Brightness => "brightness",
            TriggerKind::Darkness => "darkness",
            TriggerKind::Motion => "motion",
            TriggerKind::Difference => "difference",
            TriggerKind::Range => "range",
            TriggerKind::DifferenceRange => "difference_range",
        };
        f.write_str(name)
    }
}

/// How the note on velocity is chosen.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum VelocitySpec {
    /// Always the same velocity.
    Fixed(u8),
    /// Interpolated from the detected value at the moment of activation.
    Variable { min: Point, max: Point },
}

impl VelocitySpec {
    /// Computes the velocity for the given detected value.
    pub fn velocity(&self, value: f64) -> u8 {
        match self {
            VelocitySpec::Fixed(velocity) => *velocity,
            VelocitySpec::Variable { min, max } => interpolate(value, *min, *max),
        }
    }
}

impl Default for VelocitySpec {
    fn default() -> Self {
        VelocitySpec::Fixed(100)
    }
}

/// What a trigger evaluates against and what it emits.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Mapping {
    /// Threshold crossing to note on/off.
    Note {
        threshold: f64,
        note: u8,
        channel: u8,
        velocity: VelocitySpec,
    },
    /// Value range to control change value.
    Control {
        min: f64,
        max: f64,
        cc: u8,
        channel: u8,
    },
}

/// A fully resolved trigger configuration. Durations have already had the global defaults
/// applied, so the state machine never looks anything up.
#[derive(Clone, Debug, PartialEq)]
pub struct TriggerConfig {
    name: String,
    kind: TriggerKind,
    mapping: Mapping,
    debounce: Duration,
    throttle: Duration,
}

impl TriggerConfig {
    /// Creates a note trigger with no debounce or throttle.
    pub fn note(
        name: &str,
        kind: TriggerKind,
        threshold: f64,
        note: u8,
        channel: u8,
        velocity: VelocitySpec,
    ) -> TriggerConfig {
        TriggerConfig {
            name: name.to_string(),
            kind,
            mapping: Mapping::Note {
                threshold,
                note,
                channel,
                velocity,
            },
            debounce: Duration::ZERO,
            throttle: Duration::ZERO,
        }
    }

    /// Creates a control change trigger.
    pub fn control(
        name: &str,
        kind: TriggerKind,
        min: f64,
        max: f64,
        cc: u8,
        channel: u8,
    ) -> TriggerConfig {
        TriggerConfig {
            name: name.to_string(),
            kind,
            mapping: Mapping::Control {
                min,
                max,
                cc,
                channel,
            },
            debounce: Duration::ZERO,
            throttle: Duration::ZERO,
        }
    }

    /// Sets the debounce duration.
    pub fn with_debounce(mut self, debounce: Duration) -> TriggerConfig {
        self.debounce = debounce;
        self
    }

    /// Sets the throttle duration.
    pub fn with_throttle(mut self, throttle: Duration) -> TriggerConfig {
        self.throttle = throttle;
        self
    }

    /// Gets the trigger name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the trigger kind.
    pub fn kind(&self) -> TriggerKind {
        self.kind
    }

    /// Gets the mapping.
    pub fn mapping(&self) -> &Mapping {
        &self.mapping
    }

    /// Gets the debounce duration.
    pub fn debounce(&self) -> Duration {
        self.debounce
    }

    /// Gets the throttle duration.
    pub fn throttle(&self) -> Duration {
        self.throttle
    }

    /// Checks that every field is within its documented range and that the mapping fits
    /// the kind.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let trigger = || self.name.clone();

        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }

        match self.mapping {
            Mapping::Note {
                threshold,
                note,
                channel,
                velocity,
            } => {
                if self.kind.is_continuous() {
                    return Err(ValidationError::KindMismatch {
                        trigger: trigger(),
                        kind: self.kind,
                    });
                }
                if !is_detected_value(threshold) {
                    return Err(ValidationError::Threshold {
                        trigger: trigger(),
                        threshold,
                    });
                }
                check_data_byte(&self.name, "note", note)?;
                check_channel(&self.name, channel)?;
                match velocity {
                    VelocitySpec::Fixed(velocity) => {
                        check_data_byte(&self.name, "velocity", velocity)?
                    }
                    VelocitySpec::Variable { min, max } => {
                        check_data_byte(&self.name, "velocity", min.output)?;
                        check_data_byte(&self.name, "velocity", max.output)?;
                        if !min.value.is_finite()
                            || !max.value.is_finite()
                            || min.value > max.value
                        {
                            return Err(ValidationError::VelocityRange {
                                trigger: trigger(),
                                min: min.value,
                                max: max.value,
                            });
                        }
                    }
                }
            }
            Mapping::Control {
                min,
                max,
                cc,
                channel,
            } => {
                if !self.kind.is_continuous() {
                    return Err(ValidationError::KindMismatch {
                        trigger: trigger(),
                        kind: self.kind,
                    });
                }
                if !is_detected_value(min) || !is_detected_value(max) || min > max {
                    return Err(ValidationError::ValueRange {
                        trigger: trigger(),
                        min,
                        max,
                    });
                }
                check_data_byte(&self.name, "cc", cc)?;
                check_channel(&self.name, channel)?;
            }
        }

        Ok(())
    }
}

/// Validates every configuration in a snapshot and checks that names are unique.
pub fn validate_all(configs: &[TriggerConfig]) -> Result<(), ValidationError> {
    let mut names: HashSet<&str> = HashSet::with_capacity(configs.len());
    for config in configs {
        config.validate()?;
        if !names.insert(config.name()) {
            return Err(ValidationError::DuplicateName(config.name().to_string()));
        }
    }
    Ok(())
}

fn is_detected_value(value: f64) -> bool {
    value.is_finite() && (0.0..=DETECTED_VALUE_MAX).contains(&value)
}

fn check_data_byte(trigger: &str, field: &'static str, value: u8) -> Result<(), ValidationError> {
    if value > MIDI_DATA_MAX {
        return Err(ValidationError::DataByte {
            trigger: trigger.to_string(),
            field,
            value,
        });
    }
    Ok(())
}

fn check_channel(trigger: &str, channel: u8) -> Result<(), ValidationError> {
    if channel > MIDI_CHANNEL_MAX {
        return Err(ValidationError::Channel {
            trigger: trigger.to_string(),
            channel,
        });
    }
    Ok(())
}

/// A trigger configuration that can't be applied.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("trigger name must not be empty")]
    EmptyName,

    #[error("trigger name {0} is used more than once")]
    DuplicateName(String),

    #[error("trigger {trigger}: kind {kind} does not match its MIDI mapping")]
    KindMismatch { trigger: String, kind: TriggerKind },

    #[error("trigger {trigger}: threshold {threshold} must be between 0 and 255")]
    Threshold { trigger: String, threshold: f64 },

    #[error("trigger {trigger}: range {min}..{max} must be ascending and between 0 and 255")]
    ValueRange { trigger: String, min: f64, max: f64 },

    #[error("trigger {trigger}: velocity min value {min} must not exceed max value {max}")]
    VelocityRange { trigger: String, min: f64, max: f64 },

    #[error("trigger {trigger}: {field} {value} is out of range (0-127)")]
    DataByte {
        trigger: String,
        field: &'static str,
        value: u8,
    },

    #[error("trigger {trigger}: channel {channel} is out of range (0-15)")]
    Channel { trigger: String, channel: u8 },
}
