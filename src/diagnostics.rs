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

//! Log category flags.
//!
//! Every diagnostic the playback subsystem emits belongs to a category. The
//! categories enabled in the catalog settings decide whether an event is
//! emitted at all; the tracing subscriber still decides the level filter.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A category of diagnostic output.
#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    /// Internal errors that leave the subsystem in a degraded state.
    Critical,
    /// Internal errors that are recovered from.
    Error,
    /// Basic informational messages.
    Info,
    /// Pool growth, overflow and other chatty notifications.
    Verbose,
    /// Attempts to play a sound that isn't in the catalog.
    UnknownSound,
    /// Attempts to play a sound that has no usable clips.
    MissingClip,
    /// Use of a playback handle after its sound finished.
    ExpiredHandle,
}

impl LogCategory {
    /// All categories, in bit order.
    pub const ALL: [LogCategory; 7] = [
        LogCategory::Critical,
        LogCategory::Error,
        LogCategory::Info,
        LogCategory::Verbose,
        LogCategory::UnknownSound,
        LogCategory::MissingClip,
        LogCategory::ExpiredHandle,
    ];

    fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// A set of enabled log categories.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct LogFlags(u8);

impl LogFlags {
    /// No logging at all.
    pub const NONE: LogFlags = LogFlags(0);

    /// Returns a flag set with every category enabled.
    pub fn all() -> LogFlags {
        Self::from_categories(&LogCategory::ALL)
    }

    /// Builds a flag set from the given categories.
    pub fn from_categories(categories: &[LogCategory]) -> LogFlags {
        LogFlags(categories.iter().fold(0, |bits, c| bits | c.bit()))
    }

    /// Returns true if the category is enabled.
    pub fn enabled(&self, category: LogCategory) -> bool {
        self.0 & category.bit() != 0
    }

    /// Returns a copy of this set with the category enabled.
    pub fn with(self, category: LogCategory) -> LogFlags {
        LogFlags(self.0 | category.bit())
    }

    /// Returns a copy of this set with the category disabled.
    pub fn without(self, category: LogCategory) -> LogFlags {
        LogFlags(self.0 & !category.bit())
    }

    /// The enabled categories, in bit order.
    pub fn categories(&self) -> Vec<LogCategory> {
        LogCategory::ALL
            .into_iter()
            .filter(|c| self.enabled(*c))
            .collect()
    }
}

impl Default for LogFlags {
    fn default() -> Self {
        LogFlags::from_categories(&[
            LogCategory::Critical,
            LogCategory::Error,
            LogCategory::Info,
            LogCategory::MissingClip,
        ])
    }
}

impl fmt::Debug for LogFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.categories()).finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_default_flags() {
        let flags = LogFlags::default();
        assert!(flags.enabled(LogCategory::Critical));
        assert!(flags.enabled(LogCategory::MissingClip));
        assert!(!flags.enabled(LogCategory::Verbose));
        assert!(!flags.enabled(LogCategory::ExpiredHandle));
    }

    #[test]
    fn test_with_without() {
        let flags = LogFlags::NONE.with(LogCategory::Verbose);
        assert_eq!(flags.categories(), vec![LogCategory::Verbose]);
        assert_eq!(flags.without(LogCategory::Verbose), LogFlags::NONE);
        assert_eq!(LogFlags::all().categories().len(), LogCategory::ALL.len());
    }
}
