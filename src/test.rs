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
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::catalog::{Catalog, CatalogSettings};
use crate::diagnostics::LogFlags;
use crate::pool::PoolSettings;
use crate::sound::{Clip, ClipRef, SoundDefinition};

/// Writes a silent mono 16 bit WAV file with the given number of frames.
pub fn write_wav(path: &Path, sample_rate: u32, frames: u32) -> Result<(), Box<dyn Error>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for _ in 0..frames {
        writer.write_sample(0i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Creates a clip with the given length in milliseconds.
pub fn clip(name: &str, millis: u64) -> ClipRef {
    Arc::new(Clip::new(name, Duration::from_millis(millis)))
}

/// Creates a catalog with every log category enabled.
pub fn catalog(pool: PoolSettings, sounds: Vec<SoundDefinition>) -> Catalog {
    Catalog::new(
        CatalogSettings {
            pool,
            log: LogFlags::all(),
        },
        sounds,
    )
    .expect("valid test catalog")
}
