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
use std::time::Duration;

use duration_string::DurationString;
use serde::{Deserialize, Serialize};

use super::error::ConfigError;
use super::note::NoteValue;
use super::region::{Position, Region};
use crate::interpolate::Point;
use crate::trigger::{TriggerConfig, TriggerKind, VelocitySpec};

/// Default velocity when a trigger doesn't set one.
pub const DEFAULT_VELOCITY: u8 = 100;

/// A duration given either as a number of seconds or as a duration string like "250ms".
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum DurationValue {
    Seconds(f64),
    Text(String),
}

impl DurationValue {
    /// Converts the value into a duration. The field name is only used for error reporting.
    pub fn to_duration(&self, field: &str) -> Result<Duration, ConfigError> {
        let error = |value: String, reason: String| ConfigError::Duration {
            field: field.to_string(),
            value,
            reason,
        };

        match self {
            DurationValue::Seconds(seconds) => Duration::try_from_secs_f64(*seconds)
                .map_err(|e| error(seconds.to_string(), e.to_string())),
            DurationValue::Text(text) => match text.trim().parse::<f64>() {
                Ok(seconds) => DurationValue::Seconds(seconds).to_duration(field),
                Err(_) => Ok(DurationString::from_string(text.trim().to_string())
                    .map_err(|e| error(text.clone(), e.to_string()))?
                    .into()),
            },
        }
    }
}

/// The velocity of a note trigger: a fixed number, or two (value, velocity) calibration
/// points to interpolate between.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
#[serde(untagged)]
pub enum VelocityValue {
    Fixed(u8),
    Variable { min: (f64, u8), max: (f64, u8) },
}

impl From<VelocityValue> for VelocitySpec {
    fn from(value: VelocityValue) -> Self {
        match value {
            VelocityValue::Fixed(velocity) => VelocitySpec::Fixed(velocity),
            VelocityValue::Variable { min, max } => VelocitySpec::Variable {
                min: Point::from(min),
                max: Point::from(max),
            },
        }
    }
}

/// The MIDI output of a trigger.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Midi {
    /// The note for discrete triggers.
    note: Option<NoteValue>,

    /// The controller number for continuous triggers.
    cc: Option<u8>,

    /// The note on velocity for discrete triggers.
    velocity: Option<VelocityValue>,

    /// The MIDI channel (0-15).
    #[serde(default)]
    channel: u8,
}

/// The value range mapped onto CC values 0-127.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct ValueRange {
    min: f64,
    max: f64,
}

/// The durations applied to triggers that don't set their own.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Defaults {
    pub debounce: Duration,
    pub throttle: Duration,
}

fn default_name() -> String {
    "Unnamed Trigger".to_string()
}

/// A YAML representation of a trigger.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Trigger {
    /// The trigger name. Used to match triggers across reloads, so it must be unique.
    #[serde(default = "default_name")]
    name: String,

    /// A rectangle in percent of the frame.
    position: Option<Position>,

    /// A polygon in percent of the frame.
    shape: Option<Vec<[f64; 2]>>,

    #[serde(rename = "type")]
    kind: TriggerKind,

    /// The activation threshold for discrete triggers.
    threshold: Option<f64>,

    /// The value range for continuous triggers.
    range: Option<ValueRange>,

    midi: Midi,

    /// Overrides the global debounce.
    debounce: Option<DurationValue>,

    /// Overrides the global throttle.
    throttle: Option<DurationValue>,
}

impl Trigger {
    /// Gets the trigger name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the trigger kind.
    pub fn kind(&self) -> TriggerKind {
        self.kind
    }

    /// Gets the sampled region.
    pub fn region(&self) -> Result<Region, ConfigError> {
        let region = match (&self.position, &self.shape) {
            (Some(position), None) => Region::Rectangle(*position),
            (None, Some(shape)) => Region::Polygon(shape.clone()),
            (Some(_), Some(_)) => {
                return Err(self.region_error("only one of position and shape may be set"))
            }
            (None, None) => return Err(self.region_error("one of position or shape is required")),
        };
        region.validate().map_err(|reason| self.region_error(reason))?;
        Ok(region)
    }

    /// Resolves the trigger into the configuration the trigger engine runs, applying the
    /// given defaults for unset durations.
    pub fn to_trigger_config(&self, defaults: &Defaults) -> Result<TriggerConfig, ConfigError> {
        self.region()?;

        let config = if self.kind.is_continuous() {
            let range = self.range.ok_or_else(|| self.missing("range"))?;
            let cc = self.midi.cc.ok_or_else(|| self.missing("midi.cc"))?;
            TriggerConfig::control(
                &self.name,
                self.kind,
                range.min,
                range.max,
                cc,
                self.midi.channel,
            )
        } else {
            let threshold = self.threshold.ok_or_else(|| self.missing("threshold"))?;
            let note = self
                .midi
                .note
                .as_ref()
                .ok_or_else(|| self.missing("midi.note"))?
                .to_midi_note()
                .map_err(|source| ConfigError::Note {
                    trigger: self.name.clone(),
                    source,
                })?;
            let velocity = self
                .midi
                .velocity
                .map(VelocitySpec::from)
                .unwrap_or(VelocitySpec::Fixed(DEFAULT_VELOCITY));
            TriggerConfig::note(
                &self.name,
                self.kind,
                threshold,
                note,
                self.midi.channel,
                velocity,
            )
        };

        let debounce = match &self.debounce {
            Some(debounce) => debounce.to_duration(&format!("{}.debounce", self.name))?,
            None => defaults.debounce,
        };
        let throttle = match &self.throttle {
            Some(throttle) => throttle.to_duration(&format!("{}.throttle", self.name))?,
            None => defaults.throttle,
        };

        let config = config.with_debounce(debounce).with_throttle(throttle);
        config.validate()?;
        Ok(config)
    }

    fn missing(&self, field: &'static str) -> ConfigError {
        ConfigError::MissingField {
            trigger: self.name.clone(),
            kind: self.kind,
            field,
        }
    }

    fn region_error(&self, reason: impl Into<String>) -> ConfigError {
        ConfigError::Region {
            trigger: self.name.clone(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use config::{Config, File, FileFormat};

    use super::*;
    use crate::trigger::Mapping;

    fn parse(yaml: &str) -> Trigger {
        Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_note_trigger() {
        let trigger = parse(
            r#"
            name: Lamp
            position:
              x: 25
              y: 25
              width: 20
              height: 20
            type: brightness
            threshold: 150
            midi:
              note: 60
              velocity: 110
              channel: 2
            "#,
        );

        let config = trigger.to_trigger_config(&Defaults::default()).unwrap();
        assert_eq!(config.name(), "Lamp");
        assert_eq!(config.kind(), TriggerKind::Brightness);
        assert_eq!(
            *config.mapping(),
            Mapping::Note {
                threshold: 150.0,
                note: 60,
                channel: 2,
                velocity: VelocitySpec::Fixed(110),
            }
        );
        assert_eq!(config.debounce(), Duration::ZERO);
    }

    #[test]
    fn test_note_name_and_variable_velocity() {
        let trigger = parse(
            r#"
            name: Road
            shape: [[10.5, 20.3], [30.2, 40.1], [50.0, 50.0]]
            type: motion
            threshold: 2
            midi:
              note: "D#4"
              velocity:
                min: [2, 80]
                max: [20, 127]
            "#,
        );

        let config = trigger.to_trigger_config(&Defaults::default()).unwrap();
        assert_eq!(
            *config.mapping(),
            Mapping::Note {
                threshold: 2.0,
                note: 63,
                channel: 0,
                velocity: VelocitySpec::Variable {
                    min: Point::new(2.0, 80),
                    max: Point::new(20.0, 127),
                },
            }
        );
        assert!(matches!(trigger.region(), Ok(Region::Polygon(points)) if points.len() == 3));
    }

    #[test]
    fn test_continuous_trigger() {
        let trigger = parse(
            r#"
            name: Sky
            position: { x: 0, y: 0, width: 100, height: 30 }
            type: difference_range
            range: { min: 5, max: 60 }
            midi: { cc: 74, channel: 1 }
            "#,
        );

        let config = trigger.to_trigger_config(&Defaults::default()).unwrap();
        assert_eq!(
            *config.mapping(),
            Mapping::Control {
                min: 5.0,
                max: 60.0,
                cc: 74,
                channel: 1,
            }
        );
    }

    #[test]
    fn test_duration_overrides() {
        let trigger = parse(
            r#"
            name: Lamp
            position: { x: 0, y: 0, width: 10, height: 10 }
            type: darkness
            threshold: 20
            debounce: 250ms
            midi: { note: C }
            "#,
        );

        let defaults = Defaults {
            debounce: Duration::from_secs(1),
            throttle: Duration::from_secs(2),
        };
        let config = trigger.to_trigger_config(&defaults).unwrap();
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert_eq!(config.throttle(), Duration::from_secs(2));
        assert_eq!(
            *config.mapping(),
            Mapping::Note {
                threshold: 20.0,
                note: 60,
                channel: 0,
                velocity: VelocitySpec::Fixed(DEFAULT_VELOCITY),
            }
        );
    }

    #[test]
    fn test_missing_fields() {
        let trigger = parse(
            r#"
            name: Lamp
            position: { x: 0, y: 0, width: 10, height: 10 }
            type: brightness
            midi: { note: 60 }
            "#,
        );
        assert!(matches!(
            trigger.to_trigger_config(&Defaults::default()),
            Err(ConfigError::MissingField {
                field: "threshold",
                ..
            })
        ));

        let trigger = parse(
            r#"
            name: Sky
            position: { x: 0, y: 0, width: 10, height: 10 }
            type: range
            range: { min: 0, max: 10 }
            midi: { note: 60 }
            "#,
        );
        assert!(matches!(
            trigger.to_trigger_config(&Defaults::default()),
            Err(ConfigError::MissingField {
                field: "midi.cc",
                ..
            })
        ));
    }

    #[test]
    fn test_invalid_trigger() {
        let trigger = parse(
            r#"
            name: Road
            position: { x: 0, y: 0, width: 10, height: 10 }
            type: motion
            threshold: 5
            midi:
              note: H2
            "#,
        );
        assert!(matches!(
            trigger.to_trigger_config(&Defaults::default()),
            Err(ConfigError::Note { .. })
        ));

        let trigger = parse(
            r#"
            name: Road
            position: { x: 0, y: 0, width: 10, height: 10 }
            type: motion
            threshold: 5
            midi:
              note: 60
              velocity:
                min: [20, 80]
                max: [2, 127]
            "#,
        );
        assert!(matches!(
            trigger.to_trigger_config(&Defaults::default()),
            Err(ConfigError::Invalid(_))
        ));

        let trigger = parse(
            r#"
            name: Road
            type: motion
            threshold: 5
            midi: { note: 60 }
            "#,
        );
        assert!(matches!(
            trigger.to_trigger_config(&Defaults::default()),
            Err(ConfigError::Region { .. })
        ));
    }

    #[test]
    fn test_duration_values() {
        assert_eq!(
            DurationValue::Seconds(0.5).to_duration("d").unwrap(),
            Duration::from_millis(500)
        );
        assert_eq!(
            DurationValue::Text("2s".to_string()).to_duration("d").unwrap(),
            Duration::from_secs(2)
        );
        assert_eq!(
            DurationValue::Text("0.25".to_string()).to_duration("d").unwrap(),
            Duration::from_millis(250)
        );
        assert!(DurationValue::Seconds(-1.0).to_duration("d").is_err());
        assert!(DurationValue::Text("soon".to_string()).to_duration("d").is_err());
    }
}
