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

//! Recorded detected values, replayed in place of a live sampler.
//!
//! A trace file lists frames in order. Each frame has a time (seconds or a duration
//! string) and the detected value of every trigger sampled in that frame:
//!
//! ```yaml
//! fps: 30
//! frames:
//!   - values: { Lamp: 150 }
//!   - time: 100ms
//!     values: { Lamp: 210, Sky: 80 }
//! ```
//!
//! Frames without a time are placed at `index / fps`.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::config::DurationValue;
use crate::trigger::Timestamp;

#[derive(Debug, Error)]
pub enum TraceError {
    #[error("unable to read trace: {0}")]
    Io(#[from] std::io::Error),

    #[error("unable to parse trace: {0}")]
    Parse(#[from] serde_yml::Error),

    #[error("frame {frame}: {reason}")]
    Time { frame: usize, reason: String },

    #[error("frame {frame} at {time:?} is earlier than the frame before it")]
    OutOfOrder { frame: usize, time: Timestamp },
}

#[derive(Deserialize)]
struct TraceFile {
    fps: Option<f64>,
    #[serde(default)]
    frames: Vec<FrameRecord>,
}

#[derive(Deserialize)]
struct FrameRecord {
    time: Option<DurationValue>,
    #[serde(default)]
    values: HashMap<String, f64>,
}

/// The detected values of a single frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    pub time: Timestamp,
    pub values: HashMap<String, f64>,
}

/// A sequence of frames with non-decreasing times.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trace {
    frames: Vec<Frame>,
}

impl Trace {
    /// Reads a trace from a YAML file.
    pub fn load(path: &Path) -> Result<Trace, TraceError> {
        Trace::from_yaml(&fs::read_to_string(path)?)
    }

    /// Parses a trace from YAML.
    pub fn from_yaml(yaml: &str) -> Result<Trace, TraceError> {
        let file: TraceFile = serde_yml::from_str(yaml)?;

        let frame_period = match file.fps {
            Some(fps) if fps.is_finite() && fps > 0.0 => {
                Some(Duration::try_from_secs_f64(1.0 / fps).map_err(|e| TraceError::Time {
                    frame: 0,
                    reason: format!("fps {} gives an invalid frame period: {}", fps, e),
                })?)
            }
            _ => None,
        };

        let mut frames: Vec<Frame> = Vec::with_capacity(file.frames.len());
        for (index, record) in file.frames.into_iter().enumerate() {
            let time = match (&record.time, frame_period) {
                (Some(time), _) => time
                    .to_duration("time")
                    .map_err(|e| TraceError::Time {
                        frame: index,
                        reason: e.to_string(),
                    })?,
                (None, Some(period)) => u32::try_from(index)
                    .ok()
                    .and_then(|index| period.checked_mul(index))
                    .ok_or_else(|| TraceError::Time {
                        frame: index,
                        reason: "frame time is too large".to_string(),
                    })?,
                (None, None) => {
                    return Err(TraceError::Time {
                        frame: index,
                        reason: "a time is required when the trace has no fps".to_string(),
                    })
                }
            };

            if frames.last().is_some_and(|last| time < last.time) {
                return Err(TraceError::OutOfOrder { frame: index, time });
            }
            frames.push(Frame {
                time,
                values: record.values,
            });
        }

        Ok(Trace { frames })
    }

    /// Gets the frames in order.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Gets the time of the last frame.
    pub fn duration(&self) -> Timestamp {
        self.frames
            .last()
            .map(|frame| frame.time)
            .unwrap_or_default()
    }

    /// Gets the time one pass occupies when the trace is looped: the duration plus the gap
    /// between the last two frames.
    pub fn loop_length(&self) -> Timestamp {
        let gap = match self.frames.as_slice() {
            [.., previous, last] => last.time.saturating_sub(previous.time),
            _ => Duration::ZERO,
        };
        self.duration().saturating_add(gap)
    }
}
