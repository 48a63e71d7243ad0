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
use super::note::NoteNameError;
use crate::trigger::{TriggerKind, ValidationError};

/// Typed error for trigger file load/parse failures so callers can distinguish
/// e.g. file-not-found from validation errors without string matching.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config load/parse error: {0}")]
    Load(#[from] config::ConfigError),

    #[error("invalid {field} duration {value}: {reason}")]
    Duration {
        field: String,
        value: String,
        reason: String,
    },

    #[error("trigger {trigger}: invalid note: {source}")]
    Note {
        trigger: String,
        #[source]
        source: NoteNameError,
    },

    #[error("trigger {trigger}: {kind} triggers require {field}")]
    MissingField {
        trigger: String,
        kind: TriggerKind,
        field: &'static str,
    },

    #[error("trigger {trigger}: invalid region: {reason}")]
    Region { trigger: String, reason: String },

    #[error("invalid source: {0}")]
    Source(String),

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}
