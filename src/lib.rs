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
//! Pooled, randomized sound effect playback.
//!
//! A [`Catalog`] holds named [`SoundDefinition`]s. An [`SfxPlayer`] samples a definition,
//! checks an [`Emitter`] out of its [`EmitterPool`], and returns a [`PlaybackHandle`] that stays
//! valid until the sound completes, is stopped, or is force-ended. The host drives everything
//! by calling [`SfxPlayer::tick`] once per frame.
pub mod catalog;
pub mod config;
pub mod device;
pub mod diagnostics;
pub mod emitter;
pub mod handle;
pub mod player;
pub mod pool;
pub mod schedule;
pub mod sound;
pub mod transform;
pub mod util;

#[cfg(test)]
mod test;

pub use catalog::{Catalog, CatalogError, CatalogSettings, SoundRef};
pub use diagnostics::{LogCategory, LogFlags};
pub use emitter::{Emitter, FinishReason, PlayTarget};
pub use handle::PlaybackHandle;
pub use player::{HandleMut, PlayError, PlayOptions, SfxPlayer};
pub use pool::{EmitterPool, PoolSettings};
pub use schedule::{TaskId, TickScheduler};
pub use sound::{Clip, ClipRef, SoundDefinition, SoundError};
pub use transform::{Transform, TransformRef};
