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

//! A bounded pool of reusable emitters.
//!
//! Acquiring never fails: when the pool is already at capacity an overflow emitter is
//! constructed, and destroyed again on release instead of being recycled.

use std::fmt;

use tracing::debug;

use crate::device::DeviceFactory;
use crate::diagnostics::{LogCategory, LogFlags};
use crate::emitter::Emitter;

/// Default number of emitters created up front.
pub const DEFAULT_POOL_SIZE: usize = 3;

/// Default maximum number of pooled emitters.
pub const DEFAULT_POOL_MAX: usize = 10;

/// Sizing of the emitter pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolSettings {
    /// Emitters created when the pool is constructed.
    default_size: usize,
    /// Maximum number of emitters the pool keeps alive.
    max_size: usize,
}

impl PoolSettings {
    /// Creates new pool settings. The maximum is raised to at least one.
    pub fn new(default_size: usize, max_size: usize) -> PoolSettings {
        PoolSettings {
            default_size,
            max_size: max_size.max(1),
        }
    }

    pub fn default_size(&self) -> usize {
        self.default_size
    }

    pub fn max_size(&self) -> usize {
        self.max_size.max(1)
    }
}

impl Default for PoolSettings {
    fn default() -> Self {
        PoolSettings::new(DEFAULT_POOL_SIZE, DEFAULT_POOL_MAX)
    }
}

/// Owns idle emitters and counts every emitter it has handed out.
pub struct EmitterPool {
    factory: Box<dyn DeviceFactory>,
    settings: PoolSettings,
    idle: Vec<Emitter>,
    /// Idle plus checked-out emitters that haven't been destroyed.
    live: usize,
    flags: LogFlags,
}

impl EmitterPool {
    /// Creates a new pool and prewarms it with the default number of emitters.
    pub fn new(factory: Box<dyn DeviceFactory>, settings: PoolSettings, flags: LogFlags) -> Self {
        let mut pool = EmitterPool {
            factory,
            settings,
            idle: Vec::with_capacity(settings.max_size()),
            live: 0,
            flags,
        };

        let prewarm = settings.default_size().min(settings.max_size());
        for _ in 0..prewarm {
            let emitter = pool.construct();
            pool.idle.push(emitter);
        }
        pool
    }

    fn construct(&mut self) -> Emitter {
        self.live += 1;
        if self.flags.enabled(LogCategory::Verbose) {
            debug!(live = self.live, "Created new emitter");
        }
        Emitter::new(self.factory.create())
    }

    /// Hands out an idle emitter, constructing one if none are idle.
    pub fn acquire(&mut self) -> Emitter {
        if let Some(emitter) = self.idle.pop() {
            return emitter;
        }

        let emitter = self.construct();
        if self.live > self.settings.max_size() && self.flags.enabled(LogCategory::Verbose) {
            debug!(
                live = self.live,
                max = self.settings.max_size(),
                "Emitter pool exhausted, created overflow emitter"
            );
        }
        emitter
    }

    /// Resets an emitter and takes it back. Emitters beyond capacity are destroyed.
    pub fn release(&mut self, mut emitter: Emitter) {
        emitter.reset();
        if self.live > self.settings.max_size() || self.idle.len() >= self.settings.max_size() {
            self.live = self.live.saturating_sub(1);
            if self.flags.enabled(LogCategory::Verbose) {
                debug!(live = self.live, "Destroyed overflow emitter");
            }
            return;
        }
        self.idle.push(emitter);
    }

    /// Number of emitters waiting to be acquired.
    pub fn idle_count(&self) -> usize {
        self.idle.len()
    }

    /// Number of emitters currently alive, idle or checked out.
    pub fn live_count(&self) -> usize {
        self.live
    }

    pub fn settings(&self) -> PoolSettings {
        self.settings
    }
}

impl fmt::Debug for EmitterPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EmitterPool")
            .field("idle", &self.idle.len())
            .field("live", &self.live)
            .field("settings", &self.settings)
            .finish()
    }
}
