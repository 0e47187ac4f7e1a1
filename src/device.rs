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

//! Playback device abstraction. Emitters drive a device; backends supply them.

use std::fmt;
use std::time::Duration;

use glam::Vec3;

use crate::sound::ClipRef;

pub mod mock;

/// A single audio-emitting device that plays one clip at a time.
pub trait Device: fmt::Debug {
    /// Assigns the clip to play. Assigning resets the playback cursor.
    fn set_clip(&mut self, clip: Option<ClipRef>);

    /// The currently assigned clip.
    fn clip(&self) -> Option<&ClipRef>;

    /// Starts the assigned clip from the beginning.
    fn play(&mut self);

    /// Stops playback and rewinds the cursor.
    fn stop(&mut self);

    /// Returns true while the device is producing sound.
    fn is_playing(&self) -> bool;

    /// The playback cursor within the current clip.
    fn time(&self) -> Duration;

    fn volume(&self) -> f32;

    fn set_volume(&mut self, volume: f32);

    fn pitch(&self) -> f32;

    fn set_pitch(&mut self, pitch: f32);

    /// Returns true if the device is positioned in world space.
    fn spatialize(&self) -> bool;

    fn set_spatialize(&mut self, spatialize: bool);

    fn position(&self) -> Vec3;

    fn set_position(&mut self, position: Vec3);

    /// Called once per host tick before completion is checked. Backends with their own clock
    /// can ignore it.
    fn update(&mut self, _dt: Duration) {}
}

/// Constructs devices for the emitter pool.
pub trait DeviceFactory {
    fn create(&mut self) -> Box<dyn Device>;
}

impl<F> DeviceFactory for F
where
    F: FnMut() -> Box<dyn Device>,
{
    fn create(&mut self) -> Box<dyn Device> {
        self()
    }
}
