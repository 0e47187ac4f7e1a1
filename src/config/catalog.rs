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
use std::fs;
use std::path::Path;
use std::time::Duration;

use config::{Config, File, FileFormat};
use duration_string::DurationString;
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::ConfigError;
use crate::diagnostics::{LogCategory, LogFlags};
use crate::pool::{PoolSettings, DEFAULT_POOL_MAX, DEFAULT_POOL_SIZE};

fn one() -> f32 {
    1.0
}

/// A YAML representation of a sound catalog.
#[derive(Deserialize, Serialize, Clone, Debug, Default)]
pub struct CatalogFile {
    /// Player settings.
    #[serde(default)]
    settings: Settings,

    /// The sound definitions, in catalog order.
    #[serde(default)]
    sounds: Vec<Sound>,
}

impl CatalogFile {
    /// Creates a new catalog configuration.
    pub fn new(settings: Settings, sounds: Vec<Sound>) -> CatalogFile {
        CatalogFile { settings, sounds }
    }

    /// Parse a catalog from a YAML file.
    pub fn deserialize(path: &Path) -> Result<CatalogFile, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from(path))
            .build()?
            .try_deserialize::<CatalogFile>()?)
    }

    /// Parse a catalog from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<CatalogFile, ConfigError> {
        Ok(Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()?
            .try_deserialize::<CatalogFile>()?)
    }

    /// Serialize and save the catalog to a file at the given path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let serialized = serde_yml::to_string(self)?;
        fs::write(path, serialized)?;
        info!(path = ?path, sounds = self.sounds.len(), "Saved catalog");
        Ok(())
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn sounds(&self) -> &[Sound] {
        &self.sounds
    }
}

/// Player settings stored alongside the sounds.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct Settings {
    /// Number of emitters created up front.
    #[serde(skip_serializing_if = "Option::is_none")]
    pool_default: Option<usize>,

    /// Maximum number of pooled emitters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pool_max: Option<usize>,

    /// Enabled log categories. Defaults to errors, info and missing clips.
    #[serde(skip_serializing_if = "Option::is_none")]
    log: Option<Vec<LogCategory>>,
}

impl Settings {
    /// Creates settings from a pool configuration and log flags.
    pub fn new(pool: PoolSettings, log: LogFlags) -> Settings {
        Settings {
            pool_default: Some(pool.default_size()),
            pool_max: Some(pool.max_size()),
            log: Some(log.categories()),
        }
    }

    /// Returns the emitter pool settings.
    pub fn pool(&self) -> PoolSettings {
        PoolSettings::new(
            self.pool_default.unwrap_or(DEFAULT_POOL_SIZE),
            self.pool_max.unwrap_or(DEFAULT_POOL_MAX),
        )
    }

    /// Returns the enabled log categories.
    pub fn log(&self) -> LogFlags {
        match &self.log {
            Some(categories) => LogFlags::from_categories(categories),
            None => LogFlags::default(),
        }
    }
}

/// A YAML representation of a sound definition.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Sound {
    /// The name code refers to the sound by.
    name: String,

    /// Display category.
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<String>,

    /// Candidate clips. Empty entries are allowed and skipped when sampling.
    #[serde(default)]
    clips: Vec<Option<ClipEntry>>,

    /// Volume range.
    #[serde(default)]
    volume: Range,

    /// Pitch range.
    #[serde(default)]
    pitch: Range,
}

impl Sound {
    /// Creates a new sound configuration.
    pub fn new(
        name: &str,
        category: Option<String>,
        clips: Vec<Option<ClipEntry>>,
        volume: Range,
        pitch: Range,
    ) -> Sound {
        Sound {
            name: name.to_string(),
            category,
            clips,
            volume,
            pitch,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn clips(&self) -> &[Option<ClipEntry>] {
        &self.clips
    }

    pub fn volume(&self) -> &Range {
        &self.volume
    }

    pub fn pitch(&self) -> &Range {
        &self.pitch
    }
}

/// A clip reference. Either a file, whose length is read from its header, or a named clip with
/// an explicit length. A length given alongside a file overrides the header.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct ClipEntry {
    /// Clip name. Defaults to the file stem.
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,

    /// Audio file, relative to the catalog file.
    #[serde(skip_serializing_if = "Option::is_none")]
    file: Option<String>,

    /// Clip length as a duration string, e.g. 350ms.
    #[serde(skip_serializing_if = "Option::is_none")]
    length: Option<String>,
}

impl ClipEntry {
    /// Creates a clip entry backed by a file.
    pub fn file(file: &str) -> ClipEntry {
        ClipEntry {
            name: None,
            file: Some(file.to_string()),
            length: None,
        }
    }

    /// Creates a file-backed clip entry that overrides the clip name or the header length.
    pub fn file_with(file: &str, name: Option<&str>, length: Option<Duration>) -> ClipEntry {
        ClipEntry {
            name: name.map(str::to_string),
            file: Some(file.to_string()),
            length: length.map(|length| DurationString::from(length).to_string()),
        }
    }

    /// Creates a named clip entry with an explicit length.
    pub fn inline(name: &str, length: Duration) -> ClipEntry {
        ClipEntry {
            name: Some(name.to_string()),
            file: None,
            length: Some(DurationString::from(length).to_string()),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn file_path(&self) -> Option<&str> {
        self.file.as_deref()
    }

    /// Returns the explicit length, if one was given.
    pub fn length(&self) -> Result<Option<Duration>, duration_string::Error> {
        match &self.length {
            Some(length) => Ok(Some(DurationString::from_string(length.clone())?.into())),
            None => Ok(None),
        }
    }
}

/// A value range with an optional randomization switch. When randomization is off, `min` is used.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq)]
pub struct Range {
    #[serde(default = "one")]
    min: f32,

    #[serde(default = "one")]
    max: f32,

    #[serde(default)]
    randomize: bool,
}

impl Range {
    pub fn new(min: f32, max: f32, randomize: bool) -> Range {
        Range { min, max, randomize }
    }

    pub fn min(&self) -> f32 {
        self.min
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn randomize(&self) -> bool {
        self.randomize
    }
}

impl Default for Range {
    fn default() -> Self {
        Range::new(1.0, 1.0, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog() {
        let yaml = r#"
            settings:
              pool_default: 2
              pool_max: 6
              log: [critical, verbose]
            sounds:
              - name: footstep
                category: player
                clips:
                  - file: step1.wav
                  - name: step2
                    length: 350ms
                  - ~
                volume: { min: 0.8, max: 1.0, randomize: true }
                pitch: { min: 0.9, max: 1.1, randomize: true }
              - name: click
                clips:
                  - name: click
                    length: 1s
        "#;

        let catalog = CatalogFile::from_yaml(yaml).unwrap();
        assert_eq!(catalog.settings().pool(), PoolSettings::new(2, 6));
        assert!(catalog.settings().log().enabled(LogCategory::Verbose));
        assert!(!catalog.settings().log().enabled(LogCategory::Info));

        let footstep = &catalog.sounds()[0];
        assert_eq!(footstep.name(), "footstep");
        assert_eq!(footstep.category(), Some("player"));
        assert_eq!(footstep.clips().len(), 3);
        assert!(footstep.clips()[2].is_none());
        assert_eq!(footstep.clips()[0].as_ref().unwrap().file_path(), Some("step1.wav"));
        assert_eq!(
            footstep.clips()[1].as_ref().unwrap().length().unwrap(),
            Some(Duration::from_millis(350))
        );
        assert!(footstep.pitch().randomize());
        assert_eq!(footstep.volume().min(), 0.8);

        let click = &catalog.sounds()[1];
        assert_eq!(click.category(), None);
        assert_eq!(*click.volume(), Range::default());
    }

    #[test]
    fn test_defaults() {
        let catalog = CatalogFile::from_yaml("sounds: []").unwrap();
        assert_eq!(catalog.settings().pool(), PoolSettings::default());
        assert_eq!(catalog.settings().log(), LogFlags::default());
        assert!(catalog.sounds().is_empty());
    }

    #[test]
    fn test_bad_length() {
        let entry = ClipEntry {
            name: Some("bad".to_string()),
            file: None,
            length: Some("soon".to_string()),
        };
        assert!(entry.length().is_err());
    }

    #[test]
    fn test_save_and_reload() {
        let tempdir = tempfile::tempdir().unwrap();
        let path = tempdir.path().join("catalog.yaml");

        let original = CatalogFile::new(
            Settings::new(PoolSettings::new(1, 4), LogFlags::all()),
            vec![Sound::new(
                "beep",
                Some("ui".to_string()),
                vec![
                    Some(ClipEntry::inline("beep", Duration::from_millis(120))),
                    None,
                ],
                Range::new(0.5, 0.75, true),
                Range::default(),
            )],
        );
        original.save(&path).unwrap();

        let reloaded = CatalogFile::deserialize(&path).unwrap();
        assert_eq!(reloaded.settings(), original.settings());
        assert_eq!(reloaded.sounds(), original.sounds());
    }
}
