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

//! Sound definitions and per-play sampling.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::seq::IteratorRandom;
use rand::Rng;

/// A playable audio clip. Only the metadata the playback subsystem needs is kept here.
#[derive(Clone, Debug, PartialEq)]
pub struct Clip {
    /// The name of the clip.
    name: String,
    /// The length of the clip at a pitch of 1.0.
    length: Duration,
    /// The file the clip was loaded from, as written in the catalog.
    file: Option<String>,
    /// True if the length was read from the file rather than given explicitly.
    length_from_file: bool,
}

/// Shared reference to a clip.
pub type ClipRef = Arc<Clip>;

impl Clip {
    /// Creates a new clip with no backing file.
    pub fn new(name: &str, length: Duration) -> Clip {
        Clip {
            name: name.to_string(),
            length,
            file: None,
            length_from_file: false,
        }
    }

    /// Creates a new clip backed by the given catalog file entry, with an explicit length.
    pub fn from_file(name: &str, length: Duration, file: &str) -> Clip {
        Clip {
            name: name.to_string(),
            length,
            file: Some(file.to_string()),
            length_from_file: false,
        }
    }

    /// Creates a new clip whose length was read from the given file.
    pub fn from_file_header(name: &str, length: Duration, file: &str) -> Clip {
        Clip {
            length_from_file: true,
            ..Clip::from_file(name, length, file)
        }
    }

    /// Gets the name of the clip.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets the length of the clip.
    pub fn length(&self) -> Duration {
        self.length
    }

    /// Gets the catalog file entry for the clip.
    pub fn file(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Returns true if the length came from the file header.
    pub fn length_from_file(&self) -> bool {
        self.length_from_file
    }
}

impl fmt::Display for Clip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.3}s)", self.name, self.length.as_secs_f32())
    }
}

/// Errors produced when sampling a sound definition.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SoundError {
    #[error("sound '{0}' has no clips to play")]
    NoClipAvailable(String),
    #[error("sound '{name}' sampled an invalid pitch of {pitch}")]
    InvalidPitch { name: String, pitch: f32 },
    #[error("sound '{name}' sampled an invalid volume of {volume}")]
    InvalidVolume { name: String, volume: f32 },
}

/// The values chosen for a single play of a sound definition.
#[derive(Clone, Debug)]
pub struct PlaySample {
    pub clip: ClipRef,
    pub volume: f32,
    pub pitch: f32,
}

/// Returns true if a pitch can be handed to a device.
pub(crate) fn valid_pitch(pitch: f32) -> bool {
    pitch.is_finite() && pitch > 0.0
}

/// Returns true if a volume can be handed to a device.
pub(crate) fn valid_volume(volume: f32) -> bool {
    volume.is_finite() && volume >= 0.0
}

/// Picks a value between the two bounds. The bounds may be equal or inverted.
fn uniform<R: Rng + ?Sized>(rng: &mut R, min: f32, max: f32) -> f32 {
    min + (max - min) * rng.gen::<f32>()
}

/// A named sound effect: candidate clips plus volume and pitch ranges.
#[derive(Clone, Debug, PartialEq)]
pub struct SoundDefinition {
    name: String,
    category: Option<String>,
    clips: Vec<Option<ClipRef>>,
    volume_min: f32,
    volume_max: f32,
    randomize_volume: bool,
    pitch_min: f32,
    pitch_max: f32,
    randomize_pitch: bool,
}

impl SoundDefinition {
    /// Creates an empty definition with the given name and category.
    pub fn new(name: &str, category: Option<&str>) -> SoundDefinition {
        SoundDefinition {
            name: name.to_string(),
            category: category.map(str::to_string),
            clips: Vec::new(),
            volume_min: 1.0,
            volume_max: 1.0,
            randomize_volume: false,
            pitch_min: 1.0,
            pitch_max: 1.0,
            randomize_pitch: false,
        }
    }

    /// Creates a definition named after the clip that always plays it.
    pub fn from_clip(clip: ClipRef) -> SoundDefinition {
        let mut definition = SoundDefinition::new(clip.name(), None);
        definition.clips.push(Some(clip));
        definition
    }

    /// Creates a definition that picks from the given clips at a fixed volume and pitch.
    pub fn fixed(name: &str, clips: Vec<ClipRef>, volume: f32, pitch: f32) -> SoundDefinition {
        SoundDefinition {
            clips: clips.into_iter().map(Some).collect(),
            volume_min: volume,
            volume_max: volume,
            pitch_min: pitch,
            pitch_max: pitch,
            ..SoundDefinition::new(name, None)
        }
    }

    /// Creates a definition that picks from the given clips with randomized volume and pitch.
    pub fn randomized(
        name: &str,
        category: Option<&str>,
        clips: Vec<ClipRef>,
        volume: (f32, f32),
        pitch: (f32, f32),
    ) -> SoundDefinition {
        SoundDefinition {
            clips: clips.into_iter().map(Some).collect(),
            volume_min: volume.0,
            volume_max: volume.1,
            randomize_volume: true,
            pitch_min: pitch.0,
            pitch_max: pitch.1,
            randomize_pitch: true,
            ..SoundDefinition::new(name, category)
        }
    }

    /// Replaces the clip list. Entries may be absent.
    pub fn with_clips(mut self, clips: Vec<Option<ClipRef>>) -> SoundDefinition {
        self.clips = clips;
        self
    }

    /// Sets the volume range and whether it is randomized.
    pub fn with_volume(mut self, min: f32, max: f32, randomize: bool) -> SoundDefinition {
        self.volume_min = min;
        self.volume_max = max;
        self.randomize_volume = randomize;
        self
    }

    /// Sets the pitch range and whether it is randomized.
    pub fn with_pitch(mut self, min: f32, max: f32, randomize: bool) -> SoundDefinition {
        self.pitch_min = min;
        self.pitch_max = max;
        self.randomize_pitch = randomize;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn clips(&self) -> &[Option<ClipRef>] {
        &self.clips
    }

    pub fn volume_range(&self) -> (f32, f32) {
        (self.volume_min, self.volume_max)
    }

    pub fn randomize_volume(&self) -> bool {
        self.randomize_volume
    }

    pub fn pitch_range(&self) -> (f32, f32) {
        (self.pitch_min, self.pitch_max)
    }

    pub fn randomize_pitch(&self) -> bool {
        self.randomize_pitch
    }

    /// Returns the number of clips that are actually present.
    pub fn usable_clip_count(&self) -> usize {
        self.clips.iter().flatten().count()
    }

    /// Chooses a clip, volume and pitch for a single play of this sound.
    ///
    /// The clip is picked uniformly among the present clips. When randomization is off the
    /// minimum of the range is used.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<PlaySample, SoundError> {
        let clip = self
            .clips
            .iter()
            .flatten()
            .choose(rng)
            .cloned()
            .ok_or_else(|| SoundError::NoClipAvailable(self.name.clone()))?;

        let pitch = if self.randomize_pitch {
            uniform(rng, self.pitch_min, self.pitch_max)
        } else {
            self.pitch_min
        };
        let volume = if self.randomize_volume {
            uniform(rng, self.volume_min, self.volume_max)
        } else {
            self.volume_min
        };

        if !valid_pitch(pitch) {
            return Err(SoundError::InvalidPitch {
                name: self.name.clone(),
                pitch,
            });
        }
        if !valid_volume(volume) {
            return Err(SoundError::InvalidVolume {
                name: self.name.clone(),
                volume,
            });
        }

        Ok(PlaySample {
            clip,
            volume,
            pitch,
        })
    }
}

impl fmt::Display for SoundDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.category {
            Some(category) => write!(f, "{}/{}", category, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

#[cfg(test)]
mod test {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    fn clip(name: &str, secs: f32) -> ClipRef {
        Arc::new(Clip::new(name, Duration::from_secs_f32(secs)))
    }

    #[test]
    fn test_fixed_volume_ignores_seed() {
        let definition = SoundDefinition::new("hit", None)
            .with_clips(vec![Some(clip("a", 1.0))])
            .with_volume(0.4, 0.9, false);

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let sample = definition.sample(&mut rng).unwrap();
            assert_eq!(sample.volume, 0.4);
            assert_eq!(sample.pitch, 1.0);
        }
    }

    #[test]
    fn test_single_clip_always_chosen() {
        let only = clip("only", 0.5);
        let definition = SoundDefinition::randomized(
            "step",
            Some("player"),
            vec![only.clone()],
            (0.5, 1.0),
            (0.8, 1.2),
        );

        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let sample = definition.sample(&mut rng).unwrap();
            assert!(Arc::ptr_eq(&sample.clip, &only));
            assert!((0.5..=1.0).contains(&sample.volume));
            assert!((0.8..=1.2).contains(&sample.pitch));
        }
    }

    #[test]
    fn test_ranges_are_not_swapped() {
        // Disjoint ranges make a pitch/volume mixup visible.
        let definition = SoundDefinition::randomized(
            "swap",
            None,
            vec![clip("a", 1.0)],
            (0.1, 0.2),
            (2.0, 3.0),
        );
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..20 {
            let sample = definition.sample(&mut rng).unwrap();
            assert!((0.1..=0.2).contains(&sample.volume));
            assert!((2.0..=3.0).contains(&sample.pitch));
        }
    }

    #[test]
    fn test_no_clip_available() {
        let mut rng = StdRng::seed_from_u64(0);

        let empty = SoundDefinition::new("empty", None);
        assert_eq!(
            empty.sample(&mut rng).unwrap_err(),
            SoundError::NoClipAvailable("empty".to_string())
        );

        let absent = SoundDefinition::new("absent", None).with_clips(vec![None, None]);
        assert!(matches!(
            absent.sample(&mut rng),
            Err(SoundError::NoClipAvailable(_))
        ));
    }

    #[test]
    fn test_absent_clips_are_skipped() {
        let present = clip("present", 1.0);
        let definition =
            SoundDefinition::new("gaps", None).with_clips(vec![None, Some(present.clone()), None]);
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..20 {
            assert!(Arc::ptr_eq(&definition.sample(&mut rng).unwrap().clip, &present));
        }
        assert_eq!(definition.usable_clip_count(), 1);
    }

    #[test]
    fn test_zero_pitch_rejected() {
        let definition = SoundDefinition::new("silent", None)
            .with_clips(vec![Some(clip("a", 1.0))])
            .with_pitch(0.0, 0.0, true);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(matches!(
            definition.sample(&mut rng),
            Err(SoundError::InvalidPitch { .. })
        ));
    }

    #[test]
    fn test_inverted_range_does_not_panic() {
        let definition = SoundDefinition::new("inverted", None)
            .with_clips(vec![Some(clip("a", 1.0))])
            .with_volume(1.0, 0.5, true);
        let mut rng = StdRng::seed_from_u64(0);
        let sample = definition.sample(&mut rng).unwrap();
        assert!((0.5..=1.0).contains(&sample.volume));
    }
}
