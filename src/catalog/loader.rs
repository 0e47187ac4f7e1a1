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

//! Clip metadata loading for catalog entries.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::CatalogError;
use crate::config::ClipEntry;
use crate::sound::{Clip, ClipRef};
use crate::util::file_stem_display;

/// Resolves clip entries into clips, caching file-backed clips by path so sounds that share a
/// file share one clip.
pub struct ClipLoader {
    /// Directory relative file entries are resolved against.
    base_path: PathBuf,
    /// Cache of loaded clips by resolved file path.
    cache: HashMap<PathBuf, ClipRef>,
}

impl ClipLoader {
    /// Creates a new clip loader.
    pub fn new(base_path: &Path) -> Self {
        Self {
            base_path: base_path.to_path_buf(),
            cache: HashMap::new(),
        }
    }

    /// Resolves a single clip entry for the named sound.
    pub fn load(&mut self, sound: &str, entry: &ClipEntry) -> Result<ClipRef, CatalogError> {
        let explicit = entry.length().map_err(|source| CatalogError::Length {
            sound: sound.to_string(),
            source,
        })?;

        let Some(file) = entry.file_path() else {
            let (Some(name), Some(length)) = (entry.name(), explicit) else {
                return Err(CatalogError::ClipWithoutSource(sound.to_string()));
            };
            return Ok(Arc::new(Clip::new(name, length)));
        };

        let path = self.base_path.join(file);
        let name = entry
            .name()
            .unwrap_or_else(|| file_stem_display(Path::new(file)));

        if let Some(length) = explicit {
            return Ok(Arc::new(Clip::from_file(name, length, file)));
        }

        if let Some(clip) = self.cache.get(&path) {
            if clip.name() == name {
                debug!(path = ?path, "Using cached clip");
                return Ok(clip.clone());
            }
        }

        let length = wav_length(&path)?;
        info!(path = ?path, length = format!("{:?}", length), "Loaded clip");

        let clip = Arc::new(Clip::from_file_header(name, length, file));
        self.cache.insert(path, clip.clone());
        Ok(clip)
    }

    /// Number of distinct files loaded.
    pub fn cached_count(&self) -> usize {
        self.cache.len()
    }
}

/// Reads the length of a WAV file from its header.
fn wav_length(path: &Path) -> Result<Duration, CatalogError> {
    let reader = hound::WavReader::open(path).map_err(|source| CatalogError::Wav {
        path: path.to_path_buf(),
        source,
    })?;
    let sample_rate = reader.spec().sample_rate;
    if sample_rate == 0 {
        return Ok(Duration::ZERO);
    }
    Ok(Duration::from_secs_f64(
        f64::from(reader.duration()) / f64::from(sample_rate),
    ))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::test::write_wav;

    #[test]
    fn test_inline_clip() {
        let mut loader = ClipLoader::new(Path::new("."));
        let clip = loader
            .load("beep", &ClipEntry::inline("beep", Duration::from_millis(250)))
            .unwrap();
        assert_eq!(clip.name(), "beep");
        assert_eq!(clip.length(), Duration::from_millis(250));
        assert_eq!(clip.file(), None);
    }

    #[test]
    fn test_wav_clip_is_cached() {
        let tempdir = tempfile::tempdir().unwrap();
        write_wav(&tempdir.path().join("tone.wav"), 44100, 22050).unwrap();

        let mut loader = ClipLoader::new(tempdir.path());
        let first = loader.load("a", &ClipEntry::file("tone.wav")).unwrap();
        let second = loader.load("b", &ClipEntry::file("tone.wav")).unwrap();

        assert_eq!(first.name(), "tone");
        assert_eq!(first.length(), Duration::from_millis(500));
        assert_eq!(first.file(), Some("tone.wav"));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.cached_count(), 1);
    }

    #[test]
    fn test_missing_file() {
        let tempdir = tempfile::tempdir().unwrap();
        let mut loader = ClipLoader::new(tempdir.path());
        assert!(matches!(
            loader.load("a", &ClipEntry::file("nope.wav")),
            Err(CatalogError::Wav { .. })
        ));
    }
}
