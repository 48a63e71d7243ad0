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

//! Loading and resolving trigger files.

use std::path::{Path, PathBuf};

use config::{Config, File};
use serde::Deserialize;

use crate::trigger::{validate_all, TriggerConfig};

pub mod error;
pub mod note;
pub mod region;
pub mod trigger;

pub use error::ConfigError;
pub use trigger::{Defaults, DurationValue};

const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;
const DEFAULT_CAMERA_FPS: u32 = 30;

/// Where frames come from.
#[derive(Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    #[default]
    Video,
    Camera,
}

/// A YAML representation of the camera configuration.
#[derive(Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Camera {
    /// The capture device index.
    #[serde(default)]
    index: u32,
    width: Option<u32>,
    height: Option<u32>,
    fps: Option<u32>,
}

impl Camera {
    /// Gets the capture device index.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Gets the requested frame width.
    pub fn width(&self) -> u32 {
        self.width.unwrap_or(DEFAULT_CAMERA_WIDTH)
    }

    /// Gets the requested frame height.
    pub fn height(&self) -> u32 {
        self.height.unwrap_or(DEFAULT_CAMERA_HEIGHT)
    }

    /// Gets the requested frame rate.
    pub fn fps(&self) -> u32 {
        self.fps.unwrap_or(DEFAULT_CAMERA_FPS)
    }
}

/// The resolved frame source, handed to the frame acquisition loop.
#[derive(Clone, Debug, PartialEq)]
pub enum Source {
    Video(PathBuf),
    Camera(Camera),
}

/// A YAML representation of a trigger file.
#[derive(Deserialize, Clone, Debug)]
pub struct TriggerFile {
    /// Where frames come from.
    #[serde(default)]
    source: SourceKind,

    /// The video file, when the source is a video.
    video_path: Option<String>,

    /// The camera settings, when the source is a camera.
    camera: Option<Camera>,

    /// The debounce applied to triggers that don't set their own.
    debounce: Option<DurationValue>,

    /// The throttle applied to triggers that don't set their own.
    throttle: Option<DurationValue>,

    /// The triggers, in evaluation order.
    #[serde(default)]
    triggers: Vec<trigger::Trigger>,
}

impl TriggerFile {
    /// Parses a trigger file from disk.
    pub fn deserialize(path: &Path) -> Result<TriggerFile, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<TriggerFile>()?)
    }

    /// Gets the frame source.
    pub fn source(&self) -> Result<Source, ConfigError> {
        match self.source {
            SourceKind::Video => self
                .video_path
                .as_ref()
                .map(|path| Source::Video(PathBuf::from(path)))
                .ok_or_else(|| ConfigError::Source("video sources require video_path".into())),
            SourceKind::Camera => Ok(Source::Camera(self.camera.clone().unwrap_or_default())),
        }
    }

    /// Gets the global defaults.
    pub fn defaults(&self) -> Result<Defaults, ConfigError> {
        let mut defaults = Defaults::default();
        if let Some(debounce) = &self.debounce {
            defaults.debounce = debounce.to_duration("debounce")?;
        }
        if let Some(throttle) = &self.throttle {
            defaults.throttle = throttle.to_duration("throttle")?;
        }
        Ok(defaults)
    }

    /// Gets the triggers as written in the file.
    pub fn triggers(&self) -> &[trigger::Trigger] {
        &self.triggers
    }

    /// Resolves every trigger against the global defaults and validates the result as a
    /// whole, so a file either loads completely or not at all.
    pub fn trigger_configs(&self) -> Result<Vec<TriggerConfig>, ConfigError> {
        let defaults = self.defaults()?;
        let configs = self
            .triggers
            .iter()
            .map(|trigger| trigger.to_trigger_config(&defaults))
            .collect::<Result<Vec<TriggerConfig>, ConfigError>>()?;
        validate_all(&configs)?;
        Ok(configs)
    }
}

/// Loads and resolves the triggers in the given file.
pub fn load_trigger_configs(path: &Path) -> Result<Vec<TriggerConfig>, ConfigError> {
    TriggerFile::deserialize(path)?.trigger_configs()
}
