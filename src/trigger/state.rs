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
use tracing::debug;

use super::{Mapping, Timestamp, TriggerConfig};
use crate::event::Event;
use crate::interpolate::{interpolate, MIDI_DATA_MAX};

/// The externally observable phase of a trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// No note is sounding.
    Inactive,
    /// A note is sounding and the condition is met.
    Active,
    /// A note is sounding, the condition is no longer met and the debounce timer is running.
    PendingOff,
    /// Continuous triggers have no on/off state.
    Continuous,
}

/// A read-only snapshot of a trigger's runtime state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriggerStatus {
    pub phase: Phase,
    /// The raw condition as of the latest sample.
    pub logical_active: bool,
    /// Whether a note on has been sent without its note off.
    pub emitted_active: bool,
    pub pending_off_since: Option<Timestamp>,
    pub throttled_until: Option<Timestamp>,
    pub last_value: Option<f64>,
    pub last_emitted_cc: Option<u8>,
}

/// The note a trigger turned on. The matching note off always goes here, even if the
/// trigger has since been reconfigured with a different note or channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Sounding {
    note: u8,
    channel: u8,
}

#[derive(Debug, Default)]
struct NoteState {
    logical_active: bool,
    sounding: Option<Sounding>,
    pending_off_since: Option<Timestamp>,
    throttled_until: Option<Timestamp>,
    last_value: Option<f64>,
}

#[derive(Debug, Default)]
struct ControlState {
    last_value: Option<f64>,
    last_emitted_cc: Option<u8>,
}

#[derive(Debug)]
enum State {
    Note(NoteState),
    Control(ControlState),
}

impl State {
    fn for_config(config: &TriggerConfig) -> State {
        match config.mapping() {
            Mapping::Note { .. } => State::Note(NoteState::default()),
            Mapping::Control { .. } => State::Control(ControlState::default()),
        }
    }
}

/// A configured trigger together with its runtime state.
#[derive(Debug)]
pub struct Trigger {
    config: TriggerConfig,
    state: State,
}

impl Trigger {
    /// Creates a trigger with fresh state.
    pub fn new(config: TriggerConfig) -> Trigger {
        let state = State::for_config(&config);
        Trigger { config, state }
    }

    /// Gets the trigger configuration.
    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    /// Gets the trigger name.
    pub fn name(&self) -> &str {
        self.config.name()
    }

    /// Feeds a detected value into the trigger and returns the event it produces, if any.
    pub fn update(&mut self, value: f64, now: Timestamp) -> Option<Event> {
        match (&mut self.state, *self.config.mapping()) {
            (
                State::Note(state),
                Mapping::Note {
                    threshold,
                    note,
                    channel,
                    velocity,
                },
            ) => {
                state.last_value = Some(value);
                state.logical_active = self.config.kind().is_met(value, threshold);

                match (state.sounding, state.logical_active) {
                    (None, true) => {
                        if state.throttled_until.is_some_and(|until| now < until) {
                            return None;
                        }

                        let velocity = velocity.velocity(value);
                        state.sounding = Some(Sounding { note, channel });
                        state.pending_off_since = None;
                        debug!(
                            trigger = self.config.name(),
                            value, note, velocity, channel, "Note on."
                        );
                        Some(Event::NoteOn {
                            note,
                            velocity,
                            channel,
                        })
                    }
                    (Some(sounding), false) => {
                        let since = *state.pending_off_since.get_or_insert(now);
                        if now.saturating_sub(since) < self.config.debounce() {
                            return None;
                        }

                        state.sounding = None;
                        state.pending_off_since = None;
                        state.throttled_until = Some(now.saturating_add(self.config.throttle()));
                        debug!(
                            trigger = self.config.name(),
                            value,
                            note = sounding.note,
                            channel = sounding.channel,
                            "Note off."
                        );
                        Some(Event::NoteOff {
                            note: sounding.note,
                            channel: sounding.channel,
                        })
                    }
                    (Some(_), true) => {
                        state.pending_off_since = None;
                        None
                    }
                    (None, false) => None,
                }
            }
            (
                State::Control(state),
                Mapping::Control {
                    min,
                    max,
                    cc,
                    channel,
                },
            ) => {
                let value_out = interpolate(value, (min, 0), (max, MIDI_DATA_MAX));
                state.last_value = Some(value);
                state.last_emitted_cc = Some(value_out);
                Some(Event::ControlChange {
                    cc,
                    value: value_out,
                    channel,
                })
            }
            // The state is always built from the mapping, so this is only reachable if a
            // reconfiguration skipped the rebuild. Start over rather than stay stuck.
            _ => {
                let released = self.force_off();
                self.state = State::for_config(&self.config);
                released
            }
        }
    }

    /// Replaces the configuration while keeping the runtime state. If the new configuration
    /// belongs to the other kind family the state is rebuilt, and a sounding note is
    /// released through the returned event.
    pub fn reconfigure(&mut self, config: TriggerConfig) -> Option<Event> {
        let same_family = matches!(
            (&self.state, config.mapping()),
            (State::Note(_), Mapping::Note { .. }) | (State::Control(_), Mapping::Control { .. })
        );
        self.config = config;
        if same_family {
            return None;
        }

        let released = self.force_off();
        self.state = State::for_config(&self.config);
        released
    }

    /// Turns off a sounding note immediately, ignoring debounce, and resets the trigger to
    /// inactive. Throttle is not applied.
    pub fn force_off(&mut self) -> Option<Event> {
        match &mut self.state {
            State::Note(state) => {
                state.pending_off_since = None;
                state.sounding.take().map(|sounding| Event::NoteOff {
                    note: sounding.note,
                    channel: sounding.channel,
                })
            }
            State::Control(_) => None,
        }
    }

    /// Returns true if a note on is outstanding.
    pub fn emitted_active(&self) -> bool {
        matches!(&self.state, State::Note(state) if state.sounding.is_some())
    }

    /// Gets a snapshot of the runtime state.
    pub fn status(&self) -> TriggerStatus {
        match &self.state {
            State::Note(state) => TriggerStatus {
                phase: match (state.sounding, state.pending_off_since) {
                    (None, _) => Phase::Inactive,
                    (Some(_), None) => Phase::Active,
                    (Some(_), Some(_)) => Phase::PendingOff,
                },
                logical_active: state.logical_active,
                emitted_active: state.sounding.is_some(),
                pending_off_since: state.pending_off_since,
                throttled_until: state.throttled_until,
                last_value: state.last_value,
                last_emitted_cc: None,
            },
            State::Control(state) => TriggerStatus {
                phase: Phase::Continuous,
                logical_active: false,
                emitted_active: false,
                pending_off_since: None,
                throttled_until: None,
                last_value: state.last_value,
                last_emitted_cc: state.last_emitted_cc,
            },
        }
    }
}
