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
use std::cell::Cell;
use std::collections::BTreeMap;
use std::error::Error;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Duration;

use clap::{crate_version, Parser, Subcommand};
use duration_string::DurationString;
use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use sfxpool::device::mock;
use sfxpool::util::duration_seconds_millis;
use sfxpool::{Catalog, PlayOptions, PlayTarget, SfxPlayer, SoundDefinition, TickScheduler};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[clap(
    author = "Michael Wilson",
    version = crate_version!(),
    about = "A pooled sound effect player."
)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Lists the sounds in a catalog, grouped by category.
    Sounds {
        /// The path to the catalog file.
        catalog: PathBuf,
    },
    /// Samples every sound in a catalog once and reports any that can't be played.
    Verify {
        /// The path to the catalog file.
        catalog: PathBuf,
    },
    /// Plays a sound on simulated devices and ticks until it finishes.
    Simulate {
        /// The path to the catalog file.
        catalog: PathBuf,
        /// The name of the sound to play.
        sound: String,
        /// Host ticks per second.
        #[arg(short, long, default_value_t = 60, value_parser = clap::value_parser!(u32).range(1..))]
        tick_rate: u32,
        /// Stop the sound after this long, e.g. 500ms.
        #[arg(short, long)]
        stop_after: Option<String>,
        /// Play at a world position instead of globally. Should be in the form x,y,z.
        #[arg(short, long)]
        position: Option<String>,
        /// Seed for sampling clips, volume and pitch.
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Sounds { catalog } => {
            let catalog = Catalog::load(&catalog)?;
            if catalog.is_empty() {
                println!("No sounds found.");
                return Ok(());
            }

            let mut categories: BTreeMap<&str, Vec<&SoundDefinition>> = BTreeMap::new();
            for sound in catalog.all() {
                categories
                    .entry(sound.category().unwrap_or("uncategorized"))
                    .or_default()
                    .push(sound);
            }

            println!("Sounds (count: {}):", catalog.len());
            for (category, sounds) in categories {
                println!("\n{} (count: {}):", category, sounds.len());
                for sound in sounds {
                    println!(
                        "- {} ({} of {} clips)",
                        sound.name(),
                        sound.usable_clip_count(),
                        sound.clips().len()
                    );
                }
            }
        }
        Commands::Verify { catalog } => {
            let catalog = Catalog::load(&catalog)?;
            let mut rng = StdRng::from_entropy();

            let mut failures = 0;
            for sound in catalog.all() {
                if let Err(e) = sound.sample(&mut rng) {
                    println!("- {}: {}", sound.name(), e);
                    failures += 1;
                }
            }

            if failures > 0 {
                return Err(format!("{} of {} sounds can't be played", failures, catalog.len()).into());
            }
            println!("All {} sounds verified.", catalog.len());
        }
        Commands::Simulate {
            catalog,
            sound,
            tick_rate,
            stop_after,
            position,
            seed,
        } => {
            let catalog = Catalog::load(&catalog)?;
            let target = match position {
                Some(position) => PlayTarget::Position(parse_position(&position)?),
                None => PlayTarget::Global,
            };
            let rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };

            let factory = mock::Factory::new();
            let mut player = SfxPlayer::with_rng(catalog, Box::new(factory.clone()), rng);
            let handle = player.play_named(&sound, target, PlayOptions::default())?;

            let finished = Rc::new(Cell::new(None));
            let sink = finished.clone();
            player
                .handle(handle)
                .on_finished(move |reason| sink.set(Some(reason)));

            let mut scheduler: TickScheduler<SfxPlayer> = TickScheduler::new();
            if let Some(stop_after) = stop_after {
                let delay: Duration = DurationString::from_string(stop_after)?.into();
                scheduler.after(delay, move |player: &mut SfxPlayer| {
                    player.stop(handle);
                });
            }

            let dt = Duration::from_secs(1) / tick_rate;
            let mut elapsed = Duration::ZERO;
            let mut ticks = 0u64;
            let reason = loop {
                player.tick(dt);
                scheduler.tick(&mut player, dt);
                elapsed += dt;
                ticks += 1;
                if let Some(reason) = finished.get() {
                    break reason;
                }
            };

            info!(
                ticks,
                devices = factory.created(),
                "Simulation finished"
            );
            println!(
                "{} {} after {} ({} ticks)",
                sound,
                reason,
                duration_seconds_millis(elapsed),
                ticks
            );
        }
    }

    Ok(())
}

/// Parses a position in the form x,y,z.
fn parse_position(position: &str) -> Result<Vec3, Box<dyn Error>> {
    let coordinates = position
        .split(',')
        .map(|coordinate| coordinate.trim().parse::<f32>())
        .collect::<Result<Vec<f32>, _>>()?;
    match coordinates[..] {
        [x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => Err("malformed position, expected x,y,z".into()),
    }
}
