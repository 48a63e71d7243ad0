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
use clap::{crate_version, Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use vmtrigger::config::{note, Source, TriggerFile};
use vmtrigger::midi;
use vmtrigger::replay::{Repeat, Replayer};
use vmtrigger::trace::Trace;
use vmtrigger::trigger::{Mapping, TriggerConfig, VelocitySpec};
use vmtrigger::trigger_set::TriggerSet;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "Turns changes in video regions into MIDI."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Loads and verifies a trigger file.
    Verify {
        /// The path to the trigger file.
        config_path: String,
    },
    /// Prints the MIDI number of a note name, e.g. C4 or F#3.
    Note {
        /// The note name.
        name: String,
    },
    /// Lists the available MIDI output devices.
    MidiDevices {},
    /// Replays a recorded trace of detected values through the triggers.
    Replay {
        /// The path to the trigger file.
        config_path: String,
        /// The path to the trace.
        trace_path: String,
        /// The MIDI device name to send events to. Events are logged if not set.
        #[arg[short, long]]
        midi_device: Option<String>,
        /// Replays frames at their recorded times instead of as fast as possible.
        #[arg[short, long]]
        realtime: bool,
        /// Reloads the trigger file whenever it changes.
        #[arg[short, long]]
        watch: bool,
        /// Restarts the trace every time it ends, like a looping video.
        #[arg[short, long = "loop", conflicts_with = "repeat"]]
        looping: bool,
        /// Plays the trace this many times.
        #[arg[long]]
        repeat: Option<u32>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Verify { config_path } => {
            let file = TriggerFile::deserialize(&PathBuf::from(&config_path))?;
            let source = file.source()?;
            let configs = file.trigger_configs()?;

            match &source {
                Source::Video(path) => println!("Source: video {}", path.display()),
                Source::Camera(camera) => println!(
                    "Source: camera {} ({}x{} at {} fps)",
                    camera.index(),
                    camera.width(),
                    camera.height(),
                    camera.fps()
                ),
            }

            if configs.is_empty() {
                println!("No triggers found in {}.", config_path);
                return Ok(());
            }

            println!("Triggers (count: {}):", configs.len());
            for (trigger, config) in file.triggers().iter().zip(configs.iter()) {
                println!("- {}", describe(config));
                if let Source::Camera(camera) = &source {
                    let pixels = trigger.region()?.to_pixels(camera.width(), camera.height());
                    println!("  region: {} pixels", pixels.len());
                }
            }
        }
        Commands::Note { name } => {
            println!("{} = {}", name, note::parse_note_name(&name)?);
        }
        Commands::MidiDevices {} => {
            let devices = midi::list_devices()?;

            if devices.is_empty() {
                println!("No devices found.");
                return Ok(());
            }

            println!("Devices:");
            for device in devices {
                println!("- {}", device);
            }
        }
        Commands::Replay {
            config_path,
            trace_path,
            midi_device,
            realtime,
            watch,
            looping,
            repeat,
        } => {
            let config_path = PathBuf::from(&config_path);
            let triggers =
                TriggerSet::with_configs(vmtrigger::config::load_trigger_configs(&config_path)?)?;
            let trace = Trace::load(&PathBuf::from(&trace_path))?;
            let device = midi::get_device(midi_device.as_deref())?;

            if watch && !cfg!(feature = "watch") {
                return Err("this build does not support watching trigger files".into());
            }

            #[cfg_attr(not(feature = "watch"), allow(unused_mut))]
            let repeat = match (looping, repeat) {
                (true, _) => Repeat::Forever,
                (false, Some(times)) => Repeat::Times(times),
                (false, None) => Repeat::Once,
            };
            let mut replayer = Replayer::new(triggers, device)
                .realtime(realtime)
                .repeat(repeat);

            #[cfg(feature = "watch")]
            let _watcher = if watch {
                let (sender, receiver) = crossbeam_channel::unbounded();
                replayer = replayer.with_reloads(receiver);
                Some(vmtrigger::watch::ConfigWatcher::new(&config_path, sender)?)
            } else {
                None
            };

            let summary = replayer.run(&trace)?;
            println!(
                "Replayed {} passes, {} frames, {} events, {} reloads ({} rejected).",
                summary.passes,
                summary.frames,
                summary.events,
                summary.reloads,
                summary.rejected_reloads
            );
        }
    }

    Ok(())
}

fn describe(config: &TriggerConfig) -> String {
    match config.mapping() {
        Mapping::Note {
            threshold,
            note,
            channel,
            velocity,
        } => {
            let velocity = match velocity {
                VelocitySpec::Fixed(velocity) => velocity.to_string(),
                VelocitySpec::Variable { min, max } => format!(
                    "{}..{} from {}..{}",
                    min.output, max.output, min.value, max.value
                ),
            };
            format!(
                "{} ({} at {}): note {} channel {} velocity {}, debounce {:?}, throttle {:?}",
                config.name(),
                config.kind(),
                threshold,
                note,
                channel,
                velocity,
                config.debounce(),
                config.throttle()
            )
        }
        Mapping::Control {
            min,
            max,
            cc,
            channel,
        } => format!(
            "{} ({} {}..{}): cc {} channel {}",
            config.name(),
            config.kind(),
            min,
            max,
            cc,
            channel
        ),
    }
}
