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
use std::rc::Rc;
use std::time::Duration;

use glam::Vec3;
use tracing::trace;

use crate::device::{Device as DeviceTrait, DeviceFactory};
use crate::sound::ClipRef;

/// Counters and switches shared between a mock factory and every device it creates.
#[derive(Debug, Default)]
struct Shared {
    created: Cell<usize>,
    destroyed: Cell<usize>,
    started: Cell<usize>,
    stalled: Cell<bool>,
}

/// A mock device. Doesn't actually play anything; its cursor advances with the host tick,
/// scaled by pitch.
#[derive(Debug)]
pub struct Device {
    id: usize,
    clip: Option<ClipRef>,
    playing: bool,
    time: Duration,
    volume: f32,
    pitch: f32,
    spatialize: bool,
    position: Vec3,
    shared: Rc<Shared>,
}

impl Device {
    /// The creation order of this device within its factory.
    pub fn id(&self) -> usize {
        self.id
    }
}

impl DeviceTrait for Device {
    fn set_clip(&mut self, clip: Option<ClipRef>) {
        self.clip = clip;
        self.time = Duration::ZERO;
    }

    fn clip(&self) -> Option<&ClipRef> {
        self.clip.as_ref()
    }

    fn play(&mut self) {
        self.time = Duration::ZERO;
        self.playing = self.clip.is_some();
        if self.playing {
            self.shared.started.set(self.shared.started.get() + 1);
        }
        trace!(device = self.id, playing = self.playing, "Mock device play");
    }

    fn stop(&mut self) {
        self.playing = false;
        self.time = Duration::ZERO;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn time(&self) -> Duration {
        self.time
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume;
    }

    fn pitch(&self) -> f32 {
        self.pitch
    }

    fn set_pitch(&mut self, pitch: f32) {
        self.pitch = pitch;
    }

    fn spatialize(&self) -> bool {
        self.spatialize
    }

    fn set_spatialize(&mut self, spatialize: bool) {
        self.spatialize = spatialize;
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    fn update(&mut self, dt: Duration) {
        if !self.playing || self.shared.stalled.get() {
            return;
        }
        if let Some(clip) = &self.clip {
            let scaled = dt.as_secs_f64() * f64::from(self.pitch);
            let advanced = Duration::try_from_secs_f64(scaled).unwrap_or(Duration::MAX);
            self.time = self.time.saturating_add(advanced).min(clip.length());
        }
    }
}

impl Drop for Device {
    fn drop(&mut self) {
        self.shared.destroyed.set(self.shared.destroyed.get() + 1);
    }
}

/// Creates mock devices. Clones share the same counters, so a clone kept by the host can
/// observe the devices used by a player.
#[derive(Clone, Debug, Default)]
pub struct Factory {
    shared: Rc<Shared>,
}

impl Factory {
    pub fn new() -> Factory {
        Factory::default()
    }

    /// Number of devices created so far.
    pub fn created(&self) -> usize {
        self.shared.created.get()
    }

    /// Number of devices dropped so far.
    pub fn destroyed(&self) -> usize {
        self.shared.destroyed.get()
    }

    /// Number of times a device started playing a clip.
    pub fn started(&self) -> usize {
        self.shared.started.get()
    }

    /// Freezes the playback cursor of every device, as if paused outside of the player.
    pub fn set_stalled(&self, stalled: bool) {
        self.shared.stalled.set(stalled);
    }
}

impl DeviceFactory for Factory {
    fn create(&mut self) -> Box<dyn DeviceTrait> {
        let id = self.shared.created.get();
        self.shared.created.set(id + 1);
        Box::new(Device {
            id,
            clip: None,
            playing: false,
            time: Duration::ZERO,
            volume: 1.0,
            pitch: 1.0,
            spatialize: false,
            position: Vec3::ZERO,
            shared: self.shared.clone(),
        })
    }
}
