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

//! Watches a trigger file and reloads it when it changes.

use std::error::Error;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossbeam_channel::Sender;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use tracing::{error, info, span, warn, Level};

use crate::config::{self, ConfigError};
use crate::trigger::TriggerConfig;

/// Editors tend to write a file in several steps, so changes are coalesced for this long.
const WATCH_DEBOUNCE: Duration = Duration::from_millis(200);

/// The outcome of reloading a trigger file.
pub type Reload = Result<Vec<TriggerConfig>, ConfigError>;

/// Reloads a trigger file on every change and sends the result. The file is parsed on the
/// watcher thread; applying it is up to the receiver, which should only do so between
/// ticks. Watching stops when this is dropped.
pub struct ConfigWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
}

impl ConfigWatcher {
    /// Starts watching the given trigger file.
    pub fn new(path: &Path, sender: Sender<Reload>) -> Result<ConfigWatcher, Box<dyn Error>> {
        let file_name: OsString = path
            .file_name()
            .ok_or_else(|| format!("{} is not a file", path.display()))?
            .to_os_string();
        // The directory is watched rather than the file, as editors often replace the file.
        let directory = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let config_path = path.to_path_buf();

        let mut debouncer = new_debouncer(WATCH_DEBOUNCE, move |result: DebounceEventResult| {
            let span = span!(Level::INFO, "trigger file watcher");
            let _enter = span.enter();

            let events = match result {
                Ok(events) => events,
                Err(e) => {
                    error!(err = format!("{:?}", e), "Error watching trigger file.");
                    return;
                }
            };
            if !events
                .iter()
                .any(|event| event.path.file_name() == Some(file_name.as_os_str()))
            {
                return;
            }

            info!(path = config_path.display().to_string(), "Trigger file changed.");
            let reload = config::load_trigger_configs(&config_path);
            if sender.send(reload).is_err() {
                warn!("Reload receiver is gone, ignoring trigger file change.");
            }
        })?;
        debouncer
            .watcher()
            .watch(&directory, RecursiveMode::NonRecursive)?;

        info!(path = path.display().to_string(), "Watching trigger file.");
        Ok(ConfigWatcher {
            _debouncer: debouncer,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const LAMP: &str = r#"
triggers:
  - name: Lamp
    position: { x: 0, y: 0, width: 10, height: 10 }
    type: brightness
    threshold: 150
    midi: { note: 60 }
"#;

    #[test]
    fn test_reload_on_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triggers.yaml");
        fs::write(&path, LAMP).unwrap();

        let (sender, receiver) = crossbeam_channel::unbounded();
        let _watcher = ConfigWatcher::new(&path, sender).unwrap();

        fs::write(&path, LAMP.replace("150", "120")).unwrap();
        let configs = receiver
            .recv_timeout(Duration::from_secs(10))
            .unwrap()
            .unwrap();
        assert_eq!(configs.len(), 1);
        assert_eq!(configs[0].name(), "Lamp");
    }
}
