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

//! Plays sound definitions through pooled emitters and tracks them until they finish.

use std::fmt;
use std::time::Duration;

use glam::Vec3;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info, span, warn, Level, Span};

use crate::catalog::{Catalog, SoundRef};
use crate::device::DeviceFactory;
use crate::diagnostics::{LogCategory, LogFlags};
use crate::emitter::{FinishReason, PlayTarget};
use crate::handle::{ActivePlayback, HandleId, HandleTable, PlaybackHandle};
use crate::pool::EmitterPool;
use crate::sound::{valid_pitch, valid_volume, ClipRef, PlaySample, SoundDefinition, SoundError};
use crate::transform::TransformRef;

/// Multipliers applied on top of the values sampled from a sound definition.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayOptions {
    pub volume: f32,
    pub pitch: f32,
}

impl PlayOptions {
    pub fn new(volume: f32, pitch: f32) -> PlayOptions {
        PlayOptions { volume, pitch }
    }
}

impl Default for PlayOptions {
    fn default() -> Self {
        PlayOptions::new(1.0, 1.0)
    }
}

/// Reasons a play request didn't start a sound.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlayError {
    #[error("no sound named '{0}' in the catalog")]
    UnknownSound(String),
    #[error("sound reference '{0}' no longer resolves to a sound")]
    UnresolvedRef(String),
    #[error("no sound at catalog position {0}")]
    UnknownIndex(usize),
    #[error(transparent)]
    Sound(#[from] SoundError),
}

/// The playback subsystem. Owns the catalog, the emitter pool and every active playback.
pub struct SfxPlayer {
    catalog: Catalog,
    pool: EmitterPool,
    active: HandleTable,
    rng: StdRng,
    flags: LogFlags,
    span: Span,
}

impl SfxPlayer {
    /// Creates a new player using the catalog's pool and log settings.
    pub fn new(catalog: Catalog, factory: Box<dyn DeviceFactory>) -> SfxPlayer {
        SfxPlayer::with_rng(catalog, factory, StdRng::from_entropy())
    }

    /// Creates a new player with a specific random source, for reproducible sampling.
    pub fn with_rng(catalog: Catalog, factory: Box<dyn DeviceFactory>, rng: StdRng) -> SfxPlayer {
        let settings = catalog.settings();
        SfxPlayer {
            pool: EmitterPool::new(factory, settings.pool, settings.log),
            catalog,
            active: HandleTable::default(),
            rng,
            flags: settings.log,
            span: span!(Level::INFO, "sfx player"),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn pool(&self) -> &EmitterPool {
        &self.pool
    }

    pub fn log_flags(&self) -> LogFlags {
        self.flags
    }

    /// Number of sounds currently playing.
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Plays a sound definition.
    pub fn play(
        &mut self,
        definition: &SoundDefinition,
        target: impl Into<PlayTarget>,
        options: PlayOptions,
    ) -> Result<PlaybackHandle, PlayError> {
        let sampled = definition.sample(&mut self.rng);
        self.start(definition.name(), sampled, target.into(), options)
    }

    /// Plays a catalog sound by name.
    pub fn play_named(
        &mut self,
        name: &str,
        target: impl Into<PlayTarget>,
        options: PlayOptions,
    ) -> Result<PlaybackHandle, PlayError> {
        let Some(definition) = self.catalog.lookup(name) else {
            if self.flags.enabled(LogCategory::UnknownSound) {
                warn!(sound = name, "Tried to play a sound that isn't in the catalog");
            }
            return Err(PlayError::UnknownSound(name.to_string()));
        };
        let sampled = definition.sample(&mut self.rng);
        self.start(name, sampled, target.into(), options)
    }

    /// Plays a catalog sound by position.
    pub fn play_index(
        &mut self,
        index: usize,
        target: impl Into<PlayTarget>,
        options: PlayOptions,
    ) -> Result<PlaybackHandle, PlayError> {
        let Some(definition) = self.catalog.get(index) else {
            if self.flags.enabled(LogCategory::UnknownSound) {
                warn!(index, "Tried to play a catalog position that doesn't exist");
            }
            return Err(PlayError::UnknownIndex(index));
        };
        let name = definition.name().to_string();
        let sampled = definition.sample(&mut self.rng);
        self.start(&name, sampled, target.into(), options)
    }

    /// Plays a stored sound reference, healing it against the current catalog first.
    pub fn play_ref(
        &mut self,
        sound: &SoundRef,
        target: impl Into<PlayTarget>,
        options: PlayOptions,
    ) -> Result<PlaybackHandle, PlayError> {
        match self.catalog.resolve(Some(sound.name()), Some(sound.index())) {
            Some(resolved) => self.play_index(resolved.index(), target, options),
            None => {
                if self.flags.enabled(LogCategory::UnknownSound) {
                    warn!(
                        sound = sound.name(),
                        index = sound.index(),
                        "Sound reference no longer resolves"
                    );
                }
                Err(PlayError::UnresolvedRef(sound.name().to_string()))
            }
        }
    }

    /// Plays a bare clip at the given multipliers.
    pub fn play_clip(
        &mut self,
        clip: ClipRef,
        target: impl Into<PlayTarget>,
        options: PlayOptions,
    ) -> Result<PlaybackHandle, PlayError> {
        let definition = SoundDefinition::from_clip(clip);
        self.play(&definition, target, options)
    }

    fn start(
        &mut self,
        name: &str,
        sampled: Result<PlaySample, SoundError>,
        target: PlayTarget,
        options: PlayOptions,
    ) -> Result<PlaybackHandle, PlayError> {
        let _enter = self.span.enter();

        let sample = match sampled.and_then(|sample| Self::check_options(name, sample, options)) {
            Ok(sample) => sample,
            Err(err) => {
                let category = match err {
                    SoundError::NoClipAvailable(_) => LogCategory::MissingClip,
                    _ => LogCategory::Error,
                };
                if self.flags.enabled(category) {
                    warn!(sound = name, err = %err, "Failed to play sound");
                }
                return Err(err.into());
            }
        };

        let mut emitter = self.pool.acquire();
        emitter.load(sample.clip.clone(), sample.volume, sample.pitch);

        let mut playback = ActivePlayback::new(emitter, name, sample.volume, sample.pitch);
        if options.volume != 1.0 {
            playback.volume = options.volume;
            playback
                .emitter
                .device_mut()
                .set_volume(options.volume * sample.volume);
        }
        if options.pitch != 1.0 {
            playback.pitch = options.pitch;
            playback
                .emitter
                .device_mut()
                .set_pitch(options.pitch * sample.pitch);
        }
        playback.emitter.play(target);

        let handle = self.active.insert(playback);
        debug!(
            sound = name,
            clip = sample.clip.name(),
            handle = %handle,
            volume = sample.volume,
            pitch = sample.pitch,
            "Playing sound"
        );
        Ok(handle)
    }

    /// Ensures the multipliers leave the device with a playable pitch and volume.
    fn check_options(
        name: &str,
        sample: PlaySample,
        options: PlayOptions,
    ) -> Result<PlaySample, SoundError> {
        let pitch = sample.pitch * options.pitch;
        if !valid_pitch(pitch) {
            return Err(SoundError::InvalidPitch {
                name: name.to_string(),
                pitch,
            });
        }
        let volume = sample.volume * options.volume;
        if !valid_volume(volume) {
            return Err(SoundError::InvalidVolume {
                name: name.to_string(),
                volume,
            });
        }
        Ok(sample)
    }

    /// Returns true while the handle's sound is still playing.
    pub fn is_valid(&self, handle: PlaybackHandle) -> bool {
        self.active.contains(handle.id())
    }

    /// Gives access to a playback through its handle. Works on expired handles too; every
    /// operation on those is a logged no-op.
    pub fn handle(&mut self, handle: PlaybackHandle) -> HandleMut<'_> {
        HandleMut {
            player: self,
            handle,
        }
    }

    /// Stops the handle's sound. Shorthand for `handle(h).stop()`.
    pub fn stop(&mut self, handle: PlaybackHandle) -> bool {
        self.handle(handle).stop()
    }

    /// Advances every active playback by one host tick and completes those that finished.
    pub fn tick(&mut self, dt: Duration) {
        let finished: Vec<(HandleId, FinishReason)> = self
            .active
            .iter_mut()
            .filter_map(|(id, playback)| playback.emitter.tick(dt).map(|reason| (id, reason)))
            .collect();

        for (id, reason) in finished {
            self.complete(id, reason);
        }
    }

    /// Stops every active sound. Returns how many were stopped.
    pub fn stop_all(&mut self) -> usize {
        let mut count = 0;
        for id in self.active.ids() {
            let stopped = self
                .active
                .get_mut(id)
                .and_then(|playback| playback.emitter.stop());
            if let Some(reason) = stopped {
                self.complete(id, reason);
                count += 1;
            }
        }
        if count > 0 && self.flags.enabled(LogCategory::Info) {
            info!(count, "Stopped all sounds");
        }
        count
    }

    /// Removes a finished playback, returns its emitter to the pool and notifies the owner.
    fn complete(&mut self, id: HandleId, reason: FinishReason) {
        let Some(playback) = self.active.remove(id) else {
            if self.flags.enabled(LogCategory::Critical) {
                tracing::error!(?id, "Completed a playback that wasn't active");
            }
            return;
        };

        debug!(sound = %playback.sound, %reason, "Sound finished");
        self.pool.release(playback.emitter);
        if let Some(on_finished) = playback.on_finished {
            on_finished(reason);
        }
    }
}

impl fmt::Debug for SfxPlayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SfxPlayer")
            .field("sounds", &self.catalog.len())
            .field("active", &self.active.len())
            .field("pool", &self.pool)
            .finish()
    }
}

/// Live access to one playback.
pub struct HandleMut<'a> {
    player: &'a mut SfxPlayer,
    handle: PlaybackHandle,
}

impl HandleMut<'_> {
    fn expired(&self, action: &str) {
        if self.player.flags.enabled(LogCategory::ExpiredHandle) {
            warn!(
                handle = %self.handle,
                action,
                "Attempted to use an expired playback handle"
            );
        }
    }

    fn playback(&self) -> Option<&ActivePlayback> {
        self.player.active.get(self.handle.id())
    }

    fn playback_mut(&mut self, action: &str) -> Option<&mut ActivePlayback> {
        if !self.player.active.contains(self.handle.id()) {
            self.expired(action);
            return None;
        }
        self.player.active.get_mut(self.handle.id())
    }

    pub fn is_valid(&self) -> bool {
        self.playback().is_some()
    }

    /// The name of the sound being played.
    pub fn sound(&self) -> Option<&str> {
        self.playback().map(|playback| playback.sound.as_str())
    }

    /// Time elapsed since the sound started.
    pub fn elapsed(&self) -> Option<Duration> {
        self.playback().map(|playback| playback.emitter.elapsed())
    }

    /// The volume multiplier. Starts at 1 and scales the sampled volume.
    pub fn volume(&self) -> Option<f32> {
        self.playback().map(|playback| playback.volume)
    }

    pub fn set_volume(&mut self, volume: f32) {
        let flags = self.player.flags;
        let Some(playback) = self.playback_mut("set_volume") else {
            return;
        };
        let effective = volume * playback.initial_volume;
        if !valid_volume(effective) {
            if flags.enabled(LogCategory::Error) {
                warn!(volume, "Ignoring invalid volume multiplier");
            }
            return;
        }
        playback.volume = volume;
        playback.emitter.device_mut().set_volume(effective);
    }

    /// The pitch multiplier. Starts at 1 and scales the sampled pitch.
    pub fn pitch(&self) -> Option<f32> {
        self.playback().map(|playback| playback.pitch)
    }

    pub fn set_pitch(&mut self, pitch: f32) {
        let flags = self.player.flags;
        let Some(playback) = self.playback_mut("set_pitch") else {
            return;
        };
        let effective = pitch * playback.initial_pitch;
        if !valid_pitch(effective) {
            if flags.enabled(LogCategory::Error) {
                warn!(pitch, "Ignoring invalid pitch multiplier");
            }
            return;
        }
        playback.pitch = pitch;
        playback.emitter.device_mut().set_pitch(effective);
    }

    /// The world position of the sound, or `None` if it plays globally.
    pub fn world_position(&self) -> Option<Vec3> {
        let device = self.playback()?.emitter.device();
        device.spatialize().then(|| device.position())
    }

    /// Moves the sound to a fixed point, or makes it global with `None`. Stops any following.
    pub fn set_world_position(&mut self, position: Option<Vec3>) {
        if let Some(playback) = self.playback_mut("set_world_position") {
            playback.emitter.place(position);
        }
    }

    /// Makes the sound track a transform at a local offset.
    pub fn follow_transform(&mut self, target: &TransformRef, offset: Vec3) {
        if let Some(playback) = self.playback_mut("follow_transform") {
            playback.emitter.follow(target, offset);
        }
    }

    /// Sets the callback run when the sound finishes, replacing any previous one.
    pub fn on_finished<F>(&mut self, callback: F)
    where
        F: FnOnce(FinishReason) + 'static,
    {
        if let Some(playback) = self.playback_mut("on_finished") {
            playback.on_finished = Some(Box::new(callback));
        }
    }

    /// Stops the sound immediately. Returns false if the handle had already expired.
    pub fn stop(&mut self) -> bool {
        let id = self.handle.id();
        let Some(reason) = self
            .playback_mut("stop")
            .and_then(|playback| playback.emitter.stop())
        else {
            return false;
        };
        self.player.complete(id, reason);
        true
    }
}
