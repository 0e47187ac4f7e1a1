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

//! The sound catalog: named sound definitions plus player settings.
//!
//! A catalog is constructed explicitly, either from definitions in memory or by loading a
//! catalog file, and handed to the player. There is no global instance.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, span, Level};

use crate::config::{self, CatalogFile, ClipEntry, ConfigError, Range};
use crate::diagnostics::LogFlags;
use crate::pool::PoolSettings;
use crate::sound::SoundDefinition;
use crate::util::file_stem_display;

mod loader;

pub use loader::ClipLoader;

/// Errors produced while building, loading or saving a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unable to read clip {path}: {source}")]
    Wav {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    #[error("invalid clip length in sound '{sound}': {source}")]
    Length {
        sound: String,
        #[source]
        source: duration_string::Error,
    },

    #[error("a clip in sound '{0}' needs either a file or a name and length")]
    ClipWithoutSource(String),

    #[error("sound at position {0} has an empty name")]
    EmptyName(usize),

    #[error("more than one sound is named '{0}'")]
    DuplicateName(String),
}

/// Settings the player takes from the catalog.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct CatalogSettings {
    pub pool: PoolSettings,
    pub log: LogFlags,
}

/// A serializable reference to a catalog sound by both name and position.
///
/// The position makes lookups cheap; the name lets the reference survive the catalog being
/// reordered. See [`Catalog::resolve`].
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq, Hash)]
pub struct SoundRef {
    name: String,
    index: usize,
}

impl SoundRef {
    pub fn new(name: &str, index: usize) -> SoundRef {
        SoundRef {
            name: name.to_string(),
            index,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// The collection of named sound definitions.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    settings: CatalogSettings,
    sounds: Vec<SoundDefinition>,
    by_name: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog from definitions. Names must be unique and non-empty.
    pub fn new(
        settings: CatalogSettings,
        sounds: Vec<SoundDefinition>,
    ) -> Result<Catalog, CatalogError> {
        let mut catalog = Catalog {
            settings,
            sounds,
            by_name: HashMap::new(),
        };
        catalog.reindex()?;
        Ok(catalog)
    }

    /// Loads a catalog file. Clip files are resolved relative to the catalog's directory.
    pub fn load(path: &Path) -> Result<Catalog, CatalogError> {
        let span = span!(Level::INFO, "load catalog");
        let _enter = span.enter();

        let file = CatalogFile::deserialize(path)?;
        let base_path = path.parent().unwrap_or(Path::new("."));
        let catalog = Catalog::from_file(&file, base_path)?;

        info!(
            path = ?path,
            sounds = catalog.len(),
            "Loaded catalog"
        );
        Ok(catalog)
    }

    /// Builds a catalog from a parsed catalog file.
    pub fn from_file(file: &CatalogFile, base_path: &Path) -> Result<Catalog, CatalogError> {
        let mut loader = ClipLoader::new(base_path);
        let sounds = file
            .sounds()
            .iter()
            .map(|sound| to_definition(sound, &mut loader))
            .collect::<Result<Vec<SoundDefinition>, CatalogError>>()?;

        Catalog::new(
            CatalogSettings {
                pool: file.settings().pool(),
                log: file.settings().log(),
            },
            sounds,
        )
    }

    /// Converts the catalog back into its file representation.
    pub fn to_file(&self) -> CatalogFile {
        CatalogFile::new(
            config::Settings::new(self.settings.pool, self.settings.log),
            self.sounds.iter().map(to_sound).collect(),
        )
    }

    /// Writes the catalog, including any edits, to a catalog file.
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        Ok(self.to_file().save(path)?)
    }

    fn reindex(&mut self) -> Result<(), CatalogError> {
        self.by_name.clear();
        for (index, sound) in self.sounds.iter().enumerate() {
            if sound.name().is_empty() {
                return Err(CatalogError::EmptyName(index));
            }
            if self.by_name.insert(sound.name().to_string(), index).is_some() {
                return Err(CatalogError::DuplicateName(sound.name().to_string()));
            }
        }
        Ok(())
    }

    pub fn settings(&self) -> CatalogSettings {
        self.settings
    }

    pub fn set_settings(&mut self, settings: CatalogSettings) {
        self.settings = settings;
    }

    /// Finds a sound by name.
    pub fn lookup(&self, name: &str) -> Option<&SoundDefinition> {
        self.index_of(name).map(|index| &self.sounds[index])
    }

    /// Gets the sound at a catalog position.
    pub fn get(&self, index: usize) -> Option<&SoundDefinition> {
        self.sounds.get(index)
    }

    /// The position of the named sound.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.by_name.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Every sound, in catalog order.
    pub fn all(&self) -> &[SoundDefinition] {
        &self.sounds
    }

    /// Every sound name, in catalog order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sounds.iter().map(|sound| sound.name())
    }

    pub fn len(&self) -> usize {
        self.sounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sounds.is_empty()
    }

    /// Returns a reference to the named sound.
    pub fn sound_ref(&self, name: &str) -> Option<SoundRef> {
        self.index_of(name).map(|index| SoundRef::new(name, index))
    }

    /// Reconciles a stored name and position against the current catalog.
    ///
    /// The name wins whenever it still exists: a position that now points at a different sound
    /// means the catalog was reordered. A name that no longer exists means the sound was
    /// deleted, and the reference is unresolved even if the position is still in range. With
    /// no name, a valid position is trusted.
    pub fn resolve(&self, name_hint: Option<&str>, index_hint: Option<usize>) -> Option<SoundRef> {
        let name_hint = name_hint.filter(|name| !name.is_empty());
        let indexed = index_hint.and_then(|index| self.get(index).map(|sound| (index, sound)));

        match (indexed, name_hint) {
            (Some((index, sound)), None) => Some(SoundRef::new(sound.name(), index)),
            (Some((index, sound)), Some(name)) if sound.name() == name => {
                Some(SoundRef::new(name, index))
            }
            (_, Some(name)) => self.sound_ref(name),
            (None, None) => None,
        }
    }

    /// Adds a sound, replacing any sound of the same name in place.
    pub fn upsert(&mut self, sound: SoundDefinition) -> Result<usize, CatalogError> {
        if sound.name().is_empty() {
            return Err(CatalogError::EmptyName(self.sounds.len()));
        }
        if let Some(index) = self.index_of(sound.name()) {
            self.sounds[index] = sound;
            return Ok(index);
        }
        self.by_name
            .insert(sound.name().to_string(), self.sounds.len());
        self.sounds.push(sound);
        Ok(self.sounds.len() - 1)
    }

    /// Removes a sound by name. Positions of later sounds shift down.
    pub fn remove(&mut self, name: &str) -> Option<SoundDefinition> {
        let index = self.index_of(name)?;
        let removed = self.sounds.remove(index);
        self.by_name.remove(name);
        for position in self.by_name.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }
        Some(removed)
    }

    /// Moves a sound to a new position.
    pub fn reorder(&mut self, name: &str, to: usize) -> bool {
        let Some(from) = self.index_of(name) else {
            return false;
        };
        let sound = self.sounds.remove(from);
        let to = to.min(self.sounds.len());
        self.sounds.insert(to, sound);
        // Names were unique before the move, so this can't fail.
        self.reindex().is_ok()
    }
}

fn to_definition(
    sound: &config::Sound,
    loader: &mut ClipLoader,
) -> Result<SoundDefinition, CatalogError> {
    let clips = sound
        .clips()
        .iter()
        .map(|entry| match entry {
            Some(entry) => loader.load(sound.name(), entry).map(Some),
            None => Ok(None),
        })
        .collect::<Result<Vec<_>, CatalogError>>()?;

    let volume = sound.volume();
    let pitch = sound.pitch();
    Ok(SoundDefinition::new(sound.name(), sound.category())
        .with_clips(clips)
        .with_volume(volume.min(), volume.max(), volume.randomize())
        .with_pitch(pitch.min(), pitch.max(), pitch.randomize()))
}

fn to_sound(definition: &SoundDefinition) -> config::Sound {
    let clips = definition
        .clips()
        .iter()
        .map(|clip| {
            clip.as_ref().map(|clip| match clip.file() {
                Some(file) => {
                    let name = (clip.name() != file_stem_display(Path::new(file)))
                        .then(|| clip.name());
                    let length = (!clip.length_from_file()).then(|| clip.length());
                    ClipEntry::file_with(file, name, length)
                }
                None => ClipEntry::inline(clip.name(), clip.length()),
            })
        })
        .collect();

    let (volume_min, volume_max) = definition.volume_range();
    let (pitch_min, pitch_max) = definition.pitch_range();
    config::Sound::new(
        definition.name(),
        definition.category().map(str::to_string),
        clips,
        Range::new(volume_min, volume_max, definition.randomize_volume()),
        Range::new(pitch_min, pitch_max, definition.randomize_pitch()),
    )
}

#[cfg(test)]
mod test {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use crate::sound::Clip;
    use crate::test::write_wav;

    fn defs(names: &[&str]) -> Vec<SoundDefinition> {
        names
            .iter()
            .map(|name| {
                SoundDefinition::from_clip(Arc::new(Clip::new(name, Duration::from_secs(1))))
            })
            .collect()
    }

    fn catalog(names: &[&str]) -> Catalog {
        Catalog::new(CatalogSettings::default(), defs(names)).unwrap()
    }

    #[test]
    fn test_lookup() {
        let catalog = catalog(&["a", "b", "c"]);
        assert_eq!(catalog.lookup("b").unwrap().name(), "b");
        assert_eq!(catalog.index_of("c"), Some(2));
        assert!(catalog.lookup("d").is_none());
        assert_eq!(catalog.names().collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_rejects_duplicates_and_empty_names() {
        assert!(matches!(
            Catalog::new(CatalogSettings::default(), defs(&["a", "a"])),
            Err(CatalogError::DuplicateName(_))
        ));
        assert!(matches!(
            Catalog::new(CatalogSettings::default(), defs(&["a", ""])),
            Err(CatalogError::EmptyName(1))
        ));
    }

    #[test]
    fn test_resolve() {
        let catalog = catalog(&["a", "b", "c"]);

        // Matching pair.
        assert_eq!(catalog.resolve(Some("b"), Some(1)), Some(SoundRef::new("b", 1)));
        // Name missing, index valid: name is filled in.
        assert_eq!(catalog.resolve(None, Some(2)), Some(SoundRef::new("c", 2)));
        // Reordered: index points elsewhere, name wins.
        assert_eq!(catalog.resolve(Some("a"), Some(2)), Some(SoundRef::new("a", 0)));
        // Deleted: unknown name with a valid index.
        assert_eq!(catalog.resolve(Some("gone"), Some(0)), None);
        // Index out of range, name known.
        assert_eq!(catalog.resolve(Some("c"), Some(40)), Some(SoundRef::new("c", 2)));
        // Index out of range, name unknown.
        assert_eq!(catalog.resolve(Some("gone"), Some(40)), None);
        // Empty reference.
        assert_eq!(catalog.resolve(None, None), None);
        assert_eq!(catalog.resolve(Some(""), None), None);
    }

    #[test]
    fn test_resolve_after_edits() {
        let mut catalog = catalog(&["a", "b", "c"]);
        let stored = catalog.sound_ref("c").unwrap();

        catalog.remove("a");
        assert_eq!(
            catalog.resolve(Some(stored.name()), Some(stored.index())),
            Some(SoundRef::new("c", 1))
        );

        assert!(catalog.reorder("c", 0));
        assert_eq!(catalog.resolve(Some("c"), Some(1)), Some(SoundRef::new("c", 0)));
        assert_eq!(catalog.index_of("b"), Some(1));
    }

    #[test]
    fn test_upsert() {
        let mut catalog = catalog(&["a"]);
        let replacement = SoundDefinition::new("a", Some("ui"));
        assert_eq!(catalog.upsert(replacement).unwrap(), 0);
        assert_eq!(catalog.lookup("a").unwrap().category(), Some("ui"));
        assert_eq!(catalog.upsert(SoundDefinition::new("b", None)).unwrap(), 1);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.upsert(SoundDefinition::new("", None)).is_err());
    }

    #[test]
    fn test_load_edit_save() {
        let tempdir = tempfile::tempdir().unwrap();
        write_wav(&tempdir.path().join("hit.wav"), 8000, 16000).unwrap();
        let path = tempdir.path().join("sounds.yaml");
        std::fs::write(
            &path,
            r#"
settings:
  pool_default: 1
  pool_max: 4
sounds:
  - name: hit
    category: combat
    clips:
      - file: hit.wav
      - ~
    pitch: { min: 0.9, max: 1.1, randomize: true }
"#,
        )
        .unwrap();

        let mut catalog = Catalog::load(&path).unwrap();
        assert_eq!(catalog.settings().pool, PoolSettings::new(1, 4));
        let hit = catalog.lookup("hit").unwrap();
        assert_eq!(hit.category(), Some("combat"));
        assert_eq!(hit.clips().len(), 2);
        assert_eq!(
            hit.clips()[0].as_ref().unwrap().length(),
            Duration::from_secs(2)
        );

        catalog
            .upsert(SoundDefinition::from_clip(Arc::new(Clip::new(
                "blip",
                Duration::from_millis(80),
            ))))
            .unwrap();
        catalog.save(&path).unwrap();

        let reloaded = Catalog::load(&path).unwrap();
        assert_eq!(reloaded.names().collect::<Vec<_>>(), vec!["hit", "blip"]);
        assert_eq!(reloaded.lookup("hit").unwrap(), catalog.lookup("hit").unwrap());
        assert_eq!(
            reloaded.lookup("blip").unwrap().clips()[0]
                .as_ref()
                .unwrap()
                .length(),
            Duration::from_millis(80)
        );
    }

    #[test]
    fn test_save_keeps_clip_overrides() {
        let tempdir = tempfile::tempdir().unwrap();
        write_wav(&tempdir.path().join("step.wav"), 8000, 4000).unwrap();
        let path = tempdir.path().join("sounds.yaml");
        std::fs::write(
            &path,
            r#"
sounds:
  - name: explosion
    clips:
      - file: boom.ogg
        name: big_boom
        length: 350ms
      - file: step.wav
        name: left_step
"#,
        )
        .unwrap();

        let catalog = Catalog::load(&path).unwrap();
        catalog.save(&path).unwrap();
        let reloaded = Catalog::load(&path).unwrap();

        let clips = reloaded.lookup("explosion").unwrap().clips();
        let boom = clips[0].as_ref().unwrap();
        assert_eq!(boom.name(), "big_boom");
        assert_eq!(boom.length(), Duration::from_millis(350));
        assert_eq!(boom.file(), Some("boom.ogg"));

        let step = clips[1].as_ref().unwrap();
        assert_eq!(step.name(), "left_step");
        assert_eq!(step.length(), Duration::from_millis(500));
        assert!(step.length_from_file());
        assert_eq!(
            reloaded.lookup("explosion").unwrap(),
            catalog.lookup("explosion").unwrap()
        );
    }
}
