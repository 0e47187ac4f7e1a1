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

//! Emitters: one pooled device plus the state needed to detect when its playback is over.

use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;
use std::time::Duration;

use glam::Vec3;
use tracing::debug;

use crate::device::Device;
use crate::sound::ClipRef;
use crate::transform::{Transform, TransformRef};

/// If an emitter is still playing after this many lengths of its clip, it is forcefully
/// completed. Pausing a device outside of the player will therefore eventually end it.
pub const FORCE_END_CLIP_LENGTHS: u32 = 5;

/// Where a sound plays.
#[derive(Clone, Debug, Default)]
pub enum PlayTarget {
    /// Not positioned in the world.
    #[default]
    Global,
    /// A fixed point in world space.
    Position(Vec3),
    /// Tracks a transform every tick, at a local offset.
    Follow { target: TransformRef, offset: Vec3 },
}

impl PlayTarget {
    /// Follows the given transform with no offset.
    pub fn follow(target: &TransformRef) -> PlayTarget {
        PlayTarget::Follow {
            target: target.clone(),
            offset: Vec3::ZERO,
        }
    }

    /// Follows the given transform at a local offset.
    pub fn follow_offset(target: &TransformRef, offset: Vec3) -> PlayTarget {
        PlayTarget::Follow {
            target: target.clone(),
            offset,
        }
    }
}

impl From<Vec3> for PlayTarget {
    fn from(position: Vec3) -> Self {
        PlayTarget::Position(position)
    }
}

impl From<Option<Vec3>> for PlayTarget {
    fn from(position: Option<Vec3>) -> Self {
        position.map_or(PlayTarget::Global, PlayTarget::Position)
    }
}

/// Why a playback ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FinishReason {
    /// The device reached the end of the clip.
    Completed,
    /// The safety timeout elapsed without the device reaching the end.
    ForceEnded,
    /// The playback was stopped explicitly.
    Stopped,
}

impl fmt::Display for FinishReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FinishReason::Completed => "completed",
            FinishReason::ForceEnded => "force-ended",
            FinishReason::Stopped => "stopped",
        })
    }
}

/// The playback state of an emitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EmitterState {
    Idle,
    Playing,
    Finished(FinishReason),
}

struct Follow {
    target: Weak<RefCell<Transform>>,
    offset: Vec3,
}

/// Observable emitter state, used to check that a released emitter looks brand new.
#[derive(Clone, Debug, PartialEq)]
pub struct EmitterSnapshot {
    pub state: EmitterState,
    pub has_clip: bool,
    pub playing: bool,
    pub volume: f32,
    pub pitch: f32,
    pub spatialize: bool,
    pub position: Vec3,
    pub following: bool,
    pub elapsed: Duration,
}

/// A pooled device along with its transient play state.
pub struct Emitter {
    device: Box<dyn Device>,
    state: EmitterState,
    elapsed: Duration,
    follow: Option<Follow>,
}

impl Emitter {
    /// Wraps a freshly created device.
    pub fn new(device: Box<dyn Device>) -> Emitter {
        let mut emitter = Emitter {
            device,
            state: EmitterState::Idle,
            elapsed: Duration::ZERO,
            follow: None,
        };
        emitter.reset();
        emitter
    }

    pub fn state(&self) -> EmitterState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        self.state == EmitterState::Playing
    }

    /// Time accumulated from host ticks since playback started.
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    pub fn device(&self) -> &dyn Device {
        self.device.as_ref()
    }

    pub(crate) fn device_mut(&mut self) -> &mut dyn Device {
        self.device.as_mut()
    }

    /// Returns true if the emitter is tracking a transform.
    pub fn is_following(&self) -> bool {
        self.follow.is_some()
    }

    /// Assigns the clip, volume and pitch to play next.
    pub fn load(&mut self, clip: ClipRef, volume: f32, pitch: f32) {
        self.device.set_clip(Some(clip));
        self.device.set_volume(volume);
        self.device.set_pitch(pitch);
    }

    /// Starts the loaded clip at the given target.
    pub fn play(&mut self, target: PlayTarget) {
        match target {
            PlayTarget::Global => self.place(None),
            PlayTarget::Position(position) => self.place(Some(position)),
            PlayTarget::Follow { target, offset } => self.follow(&target, offset),
        }
        self.elapsed = Duration::ZERO;
        self.device.play();
        self.state = EmitterState::Playing;
    }

    /// Stops following and places the emitter at a point, or makes it global.
    pub fn place(&mut self, position: Option<Vec3>) {
        self.follow = None;
        self.device.set_spatialize(position.is_some());
        self.device.set_position(position.unwrap_or(Vec3::ZERO));
    }

    /// Starts tracking a transform at a local offset. The position is updated immediately.
    pub fn follow(&mut self, target: &TransformRef, offset: Vec3) {
        self.device.set_position(target.get().follow_point(offset));
        self.device.set_spatialize(true);
        self.follow = Some(Follow {
            target: target.downgrade(),
            offset,
        });
    }

    /// Advances the emitter by one host tick. Returns the finish reason on the tick where
    /// playback ends; every other call returns `None`.
    pub fn tick(&mut self, dt: Duration) -> Option<FinishReason> {
        if self.state != EmitterState::Playing {
            return None;
        }

        self.device.update(dt);
        self.elapsed += dt;
        self.track_follow_target();

        let length = self
            .device
            .clip()
            .map_or(Duration::ZERO, |clip| clip.length());
        let reason = if self.device.time() >= length {
            FinishReason::Completed
        } else if self.elapsed > length.saturating_mul(FORCE_END_CLIP_LENGTHS) {
            FinishReason::ForceEnded
        } else {
            return None;
        };

        self.finish(reason);
        Some(reason)
    }

    /// Stops a playing emitter. Returns `None` if it wasn't playing.
    pub fn stop(&mut self) -> Option<FinishReason> {
        if self.state != EmitterState::Playing {
            return None;
        }
        self.finish(FinishReason::Stopped);
        Some(FinishReason::Stopped)
    }

    fn finish(&mut self, reason: FinishReason) {
        self.device.stop();
        self.state = EmitterState::Finished(reason);
        debug!(
            %reason,
            elapsed = format!("{:?}", self.elapsed),
            "Emitter finished"
        );
    }

    fn track_follow_target(&mut self) {
        let Some(follow) = &self.follow else {
            return;
        };
        match follow.target.upgrade() {
            Some(target) => {
                let position = target.borrow().follow_point(follow.offset);
                self.device.set_position(position);
            }
            None => {
                debug!("Followed transform was dropped, holding last position");
                self.follow = None;
            }
        }
    }

    /// Returns the emitter to the state of a freshly constructed one.
    pub fn reset(&mut self) {
        self.state = EmitterState::Idle;
        self.elapsed = Duration::ZERO;
        self.follow = None;
        self.device.stop();
        self.device.set_clip(None);
        self.device.set_pitch(1.0);
        self.device.set_volume(1.0);
        self.device.set_spatialize(false);
        self.device.set_position(Vec3::ZERO);
    }

    pub fn snapshot(&self) -> EmitterSnapshot {
        EmitterSnapshot {
            state: self.state,
            has_clip: self.device.clip().is_some(),
            playing: self.device.is_playing(),
            volume: self.device.volume(),
            pitch: self.device.pitch(),
            spatialize: self.device.spatialize(),
            position: self.device.position(),
            following: self.follow.is_some(),
            elapsed: self.elapsed,
        }
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("state", &self.state)
            .field("elapsed", &self.elapsed)
            .field("following", &self.follow.is_some())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use super::*;
    use crate::device::{mock, DeviceFactory};
    use crate::sound::Clip;

    const TICK: Duration = Duration::from_millis(100);

    fn emitter(factory: &mut mock::Factory, secs: u64) -> Emitter {
        let mut emitter = Emitter::new(factory.create());
        emitter.load(Arc::new(Clip::new("c", Duration::from_secs(secs))), 1.0, 1.0);
        emitter
    }

    #[test]
    fn test_natural_completion_fires_once() {
        let mut factory = mock::Factory::new();
        let mut emitter = emitter(&mut factory, 2);
        emitter.play(PlayTarget::Global);

        let mut reasons = Vec::new();
        for _ in 0..30 {
            reasons.extend(emitter.tick(TICK));
        }
        assert_eq!(reasons, vec![FinishReason::Completed]);
        assert_eq!(emitter.state(), EmitterState::Finished(FinishReason::Completed));
        assert_eq!(emitter.elapsed(), Duration::from_secs(2));
    }

    #[test]
    fn test_force_end_when_stalled() {
        let mut factory = mock::Factory::new();
        let mut emitter = emitter(&mut factory, 1);
        emitter.play(PlayTarget::Global);
        factory.set_stalled(true);

        let mut ticks = 0;
        let reason = loop {
            ticks += 1;
            if let Some(reason) = emitter.tick(TICK) {
                break reason;
            }
            assert!(ticks < 100, "emitter never force-ended");
        };
        assert_eq!(reason, FinishReason::ForceEnded);
        // 5.0s is not past the limit; the next tick is.
        assert_eq!(ticks, 51);
    }

    #[test]
    fn test_stop_only_when_playing() {
        let mut factory = mock::Factory::new();
        let mut emitter = emitter(&mut factory, 1);
        assert_eq!(emitter.stop(), None);
        emitter.play(PlayTarget::Global);
        assert_eq!(emitter.stop(), Some(FinishReason::Stopped));
        assert_eq!(emitter.stop(), None);
        assert_eq!(emitter.tick(TICK), None);
        assert!(!emitter.device().is_playing());
    }

    #[test]
    fn test_targets_set_spatialization() {
        let mut factory = mock::Factory::new();
        let mut emitter = emitter(&mut factory, 1);

        emitter.play(PlayTarget::Global);
        assert!(!emitter.device().spatialize());

        emitter.play(Vec3::new(1.0, 2.0, 3.0).into());
        assert!(emitter.device().spatialize());
        assert_eq!(emitter.device().position(), Vec3::new(1.0, 2.0, 3.0));

        let target = TransformRef::new(Transform::from_position(Vec3::X));
        emitter.play(PlayTarget::follow_offset(&target, Vec3::Y));
        assert!(emitter.device().spatialize());
        assert_eq!(emitter.device().position(), Vec3::new(2.0, 1.0, 0.0));
    }

    #[test]
    fn test_dropped_target_holds_position() {
        let mut factory = mock::Factory::new();
        let mut emitter = emitter(&mut factory, 10);
        let target = TransformRef::new(Transform::from_position(Vec3::X));
        emitter.play(PlayTarget::follow(&target));
        target.set_position(Vec3::Z);
        emitter.tick(TICK);
        drop(target);
        emitter.tick(TICK);

        assert!(!emitter.is_following());
        assert_eq!(emitter.device().position(), Vec3::Z * 2.0);
    }

    #[test]
    fn test_reset_matches_fresh() {
        let mut factory = mock::Factory::new();
        let fresh = Emitter::new(factory.create()).snapshot();

        let mut emitter = emitter(&mut factory, 1);
        emitter.device_mut().set_volume(0.3);
        emitter.play(PlayTarget::Position(Vec3::ONE));
        emitter.tick(TICK);
        emitter.reset();

        assert_eq!(emitter.snapshot(), fresh);
    }

    #[test]
    fn test_huge_clip_does_not_overflow_force_end() {
        let mut factory = mock::Factory::new();
        let mut emitter = Emitter::new(factory.create());
        emitter.load(
            Arc::new(Clip::new("endless", Duration::from_secs(u64::MAX / 4))),
            1.0,
            1.0,
        );
        emitter.play(PlayTarget::Global);

        assert_eq!(emitter.tick(Duration::from_millis(16)), None);
        assert!(emitter.is_playing());
    }
}
