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

//! The ordered set of triggers that is advanced once per video frame.

use std::collections::HashMap;

use tracing::{info, span, warn, Level};

use crate::event::Event;
use crate::trigger::{
    validate_all, Timestamp, Trigger, TriggerConfig, TriggerStatus, ValidationError,
};


/// Owns every trigger and its runtime state. Triggers are updated in configuration order
/// so the emitted event order is reproducible.
///
/// `tick` and `reload` both take `&mut self`, so a reload can only ever land between
/// two ticks.
#[derive(Debug, Default)]
pub struct TriggerSet {
    triggers: Vec<Trigger>,
}

impl TriggerSet {
    /// Creates an empty trigger set.
    pub fn new() -> TriggerSet {
        TriggerSet::default()
    }

    /// Creates a trigger set from the given configuration.
    pub fn with_configs(configs: Vec<TriggerConfig>) -> Result<TriggerSet, ValidationError> {
        let mut set = TriggerSet::new();
        set.reload(configs)?;
        Ok(set)
    }

    /// Replaces the configuration. Triggers are matched to their previous instance by name
    /// and keep their runtime state. Triggers that disappeared are dropped, and any of them
    /// that had a note sounding produce a note off in the returned events.
    ///
    /// The whole snapshot is validated first. On error nothing changes.
    pub fn reload(&mut self, configs: Vec<TriggerConfig>) -> Result<Vec<Event>, ValidationError> {
        validate_all(&configs)?;

        let span = span!(Level::INFO, "reload triggers");
        let _enter = span.enter();

        let mut previous: HashMap<String, Trigger> = self
            .triggers
            .drain(..)
            .map(|trigger| (trigger.name().to_string(), trigger))
            .collect();

        let mut events = Vec::new();
        let mut kept = 0;
        for config in configs {
            let trigger = match previous.remove(config.name()) {
                Some(mut trigger) => {
                    kept += 1;
                    events.extend(trigger.reconfigure(config));
                    trigger
                }
                None => Trigger::new(config),
            };
            self.triggers.push(trigger);
        }

        // Release removed triggers in a stable order.
        let mut removed: Vec<Trigger> = previous.into_values().collect();
        removed.sort_by(|a, b| a.name().cmp(b.name()));
        for mut trigger in removed {
            if let Some(event) = trigger.force_off() {
                warn!(
                    trigger = trigger.name(),
                    event = event.to_string(),
                    "Trigger removed while active, releasing note."
                );
                events.push(event);
            }
        }

        info!(
            triggers = self.triggers.len(),
            kept,
            released = events.len(),
            "Triggers reloaded."
        );

        Ok(events)
    }

    /// Advances every trigger that has a sample in this tick and returns the emitted events
    /// in configuration order. Triggers without a sample are left untouched.
    pub fn tick(&mut self, samples: &HashMap<String, f64>, now: Timestamp) -> Vec<Event> {
        self.triggers
            .iter_mut()
            .filter_map(|trigger| {
                let value = *samples.get(trigger.name())?;
                trigger.update(value, now)
            })
            .collect()
    }

    /// Turns off every sounding note and returns the note offs.
    pub fn release_all(&mut self) -> Vec<Event> {
        self.triggers
            .iter_mut()
            .filter_map(Trigger::force_off)
            .collect()
    }

    /// Gets the trigger names in configuration order.
    pub fn names(&self) -> Vec<&str> {
        self.triggers.iter().map(Trigger::name).collect()
    }

    /// Gets the configuration of the named trigger.
    pub fn config(&self, name: &str) -> Option<&TriggerConfig> {
        self.get(name).map(Trigger::config)
    }

    /// Gets a snapshot of the named trigger's runtime state.
    pub fn status(&self, name: &str) -> Option<TriggerStatus> {
        self.get(name).map(Trigger::status)
    }

    /// Gets the number of triggers.
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Returns true if there are no triggers.
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    fn get(&self, name: &str) -> Option<&Trigger> {
        self.triggers.iter().find(|trigger| trigger.name() == name)
    }
}
