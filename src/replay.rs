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

//! Drives a trigger set from a recorded trace, standing in for the live frame loop.

use std::error::Error;
use std::sync::Arc;
use std::time::Instant;

use crossbeam_channel::Receiver;
use tracing::{error, info, span, Level};

use crate::config::ConfigError;
use crate::midi::Device;
use crate::trace::Trace;
use crate::trigger::{Timestamp, TriggerConfig};
use crate::trigger_set::TriggerSet;

/// How many times the trace is played.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Repeat {
    #[default]
    Once,
    Times(u32),
    /// Plays until emitting fails or the process is stopped.
    Forever,
}

impl Repeat {
    fn includes(&self, pass: u32) -> bool {
        match self {
            Repeat::Once => pass == 0,
            Repeat::Times(times) => pass < *times,
            Repeat::Forever => true,
        }
    }
}

/// Counters describing a finished replay.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub passes: u32,
    pub frames: usize,
    pub events: usize,
    pub reloads: usize,
    pub rejected_reloads: usize,
}

/// Feeds trace frames through a trigger set and emits the resulting events.
pub struct Replayer {
    triggers: TriggerSet,
    device: Arc<dyn Device>,
    reloads: Option<Receiver<Result<Vec<TriggerConfig>, ConfigError>>>,
    realtime: bool,
    repeat: Repeat,
}

impl Replayer {
    /// Creates a replayer that emits to the given device.
    pub fn new(triggers: TriggerSet, device: Arc<dyn Device>) -> Replayer {
        Replayer {
            triggers,
            device,
            reloads: None,
            realtime: false,
            repeat: Repeat::Once,
        }
    }

    /// Applies configurations received on the channel between frames.
    pub fn with_reloads(
        mut self,
        reloads: Receiver<Result<Vec<TriggerConfig>, ConfigError>>,
    ) -> Replayer {
        self.reloads = Some(reloads);
        self
    }

    /// Waits until each frame's time before processing it, instead of running as fast as
    /// possible.
    pub fn realtime(mut self, realtime: bool) -> Replayer {
        self.realtime = realtime;
        self
    }

    /// Plays the trace more than once. Each pass continues the clock where the previous one
    /// ended, so trigger timers carry over from pass to pass.
    pub fn repeat(mut self, repeat: Repeat) -> Replayer {
        self.repeat = repeat;
        self
    }

    /// Gets the trigger set.
    pub fn triggers(&self) -> &TriggerSet {
        &self.triggers
    }

    /// Replays the trace. Every sounding note is released once the trace ends, or if
    /// emitting fails part way through.
    pub fn run(&mut self, trace: &Trace) -> Result<Summary, Box<dyn Error>> {
        let span = span!(Level::INFO, "replay");
        let _enter = span.enter();

        info!(
            frames = trace.frames().len(),
            duration = format!("{:?}", trace.duration()),
            repeat = format!("{:?}", self.repeat),
            triggers = self.triggers.len(),
            device = self.device.name(),
            "Starting replay."
        );

        let mut summary = Summary::default();
        let result = self.run_frames(trace, &mut summary);

        let released = self.triggers.release_all();
        summary.events += released.len();
        self.device.emit(&released)?;

        result?;
        info!(
            passes = summary.passes,
            frames = summary.frames,
            events = summary.events,
            reloads = summary.reloads,
            rejected_reloads = summary.rejected_reloads,
            "Replay finished."
        );
        Ok(summary)
    }

    fn run_frames(&mut self, trace: &Trace, summary: &mut Summary) -> Result<(), Box<dyn Error>> {
        let start = Instant::now();
        let loop_length = trace.loop_length();

        let mut pass = 0;
        while self.repeat.includes(pass) && !trace.frames().is_empty() {
            let offset = loop_length.saturating_mul(pass);
            for frame in trace.frames() {
                let now = offset.saturating_add(frame.time);
                if self.realtime {
                    self.wait_until(start, now);
                }

                self.apply_reloads(summary)?;

                let events = self.triggers.tick(&frame.values, now);
                summary.frames += 1;
                summary.events += events.len();
                self.device.emit(&events)?;
            }
            summary.passes += 1;
            pass = pass.saturating_add(1);
        }
        Ok(())
    }

    fn wait_until(&self, start: Instant, time: Timestamp) {
        let wait = time.saturating_sub(start.elapsed());
        if !wait.is_zero() {
            spin_sleep::sleep(wait);
        }
    }

    /// Applies every pending reload. Rejected configurations are logged and the current
    /// triggers stay in place.
    fn apply_reloads(&mut self, summary: &mut Summary) -> Result<(), Box<dyn Error>> {
        let Some(reloads) = &self.reloads else {
            return Ok(());
        };

        for reload in reloads.try_iter() {
            let applied = reload
                .map_err(Box::<dyn Error>::from)
                .and_then(|configs| Ok(self.triggers.reload(configs)?));
            let released = match applied {
                Ok(released) => released,
                Err(e) => {
                    error!(
                        err = e.to_string(),
                        "Rejected trigger reload, keeping current triggers."
                    );
                    summary.rejected_reloads += 1;
                    continue;
                }
            };

            summary.reloads += 1;
            summary.events += released.len();
            self.device.emit(&released)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::event::Event;
    use crate::midi::MockDevice;
    use crate::trigger::{TriggerKind, ValidationError, VelocitySpec};

    fn lamp(threshold: f64) -> TriggerConfig {
        TriggerConfig::note(
            "Lamp",
            TriggerKind::Brightness,
            threshold,
            60,
            0,
            VelocitySpec::Fixed(100),
        )
    }

    const TRACE: &str = r#"
fps: 1
frames:
  - values: { Lamp: 150 }
  - values: { Lamp: 210 }
  - values: { Lamp: 190 }
  - values: { Lamp: 220 }
"#;

    fn note_on() -> Event {
        Event::NoteOn {
            note: 60,
            velocity: 100,
            channel: 0,
        }
    }

    fn note_off() -> Event {
        Event::NoteOff {
            note: 60,
            channel: 0,
        }
    }

    #[test]
    fn test_replay_emits_and_releases() {
        let device = MockDevice::get("mock");
        let mut replayer = Replayer::new(
            TriggerSet::with_configs(vec![lamp(200.0)]).unwrap(),
            Arc::new(device.clone()),
        );

        let summary = replayer.run(&Trace::from_yaml(TRACE).unwrap()).unwrap();

        assert_eq!(
            device.emitted_events(),
            vec![note_on(), note_off(), note_on(), note_off()]
        );
        assert_eq!(
            summary,
            Summary {
                passes: 1,
                frames: 4,
                events: 4,
                reloads: 0,
                rejected_reloads: 0,
            }
        );
        assert!(!replayer.triggers().status("Lamp").unwrap().emitted_active);
    }

    #[test]
    fn test_repeat_continues_the_clock() {
        let device = MockDevice::get("mock");
        let mut replayer = Replayer::new(
            TriggerSet::with_configs(vec![lamp(200.0)]).unwrap(),
            Arc::new(device.clone()),
        )
        .repeat(Repeat::Times(2));

        let summary = replayer.run(&Trace::from_yaml(TRACE).unwrap()).unwrap();

        // The second pass starts at 4s with the note from 3s still sounding.
        assert_eq!(
            device.emitted_events(),
            vec![
                note_on(),
                note_off(),
                note_on(),
                note_off(),
                note_on(),
                note_off(),
                note_on(),
                note_off(),
            ]
        );
        assert_eq!(summary.passes, 2);
        assert_eq!(summary.frames, 8);
    }

    #[test]
    fn test_empty_trace_forever_finishes() {
        let device = MockDevice::get("mock");
        let mut replayer = Replayer::new(
            TriggerSet::with_configs(vec![lamp(200.0)]).unwrap(),
            Arc::new(device.clone()),
        )
        .repeat(Repeat::Forever);

        let summary = replayer.run(&Trace::default()).unwrap();
        assert_eq!(summary.passes, 0);
        assert!(device.emitted_events().is_empty());
    }

    #[test]
    fn test_pending_reloads_apply_before_frame() {
        let device = MockDevice::get("mock");
        let (sender, receiver) = crossbeam_channel::unbounded();
        let mut replayer = Replayer::new(
            TriggerSet::with_configs(vec![lamp(200.0)]).unwrap(),
            Arc::new(device.clone()),
        )
        .with_reloads(receiver);

        sender
            .send(Err(ConfigError::Invalid(ValidationError::EmptyName)))
            .unwrap();
        sender.send(Ok(vec![lamp(100.0)])).unwrap();

        let trace = Trace::from_yaml("fps: 10\nframes:\n  - values: { Lamp: 150 }\n").unwrap();
        let summary = replayer.run(&trace).unwrap();

        // 150 is only above the reloaded threshold.
        assert_eq!(device.emitted_events(), vec![note_on(), note_off()]);
        assert_eq!(summary.reloads, 1);
        assert_eq!(summary.rejected_reloads, 1);
        assert_eq!(
            replayer.triggers().config("Lamp").unwrap().mapping(),
            lamp(100.0).mapping()
        );
    }

    #[test]
    fn test_realtime_waits_for_frames() {
        let device = MockDevice::get("mock");
        let mut replayer = Replayer::new(
            TriggerSet::with_configs(vec![lamp(200.0)]).unwrap(),
            Arc::new(device),
        )
        .realtime(true);

        let trace =
            Trace::from_yaml("frames:\n  - time: 0\n  - time: 50ms\n    values: { Lamp: 1 }\n")
                .unwrap();
        let start = Instant::now();
        replayer.run(&trace).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
