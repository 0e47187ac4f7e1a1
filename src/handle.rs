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

//! Playback handles and the table of active playbacks.
//!
//! A handle is a small copyable value that names one playback. The emitter it refers to
//! lives in the table entry while the sound plays; once the sound finishes the entry is
//! removed and the slot's generation moves on, so any copy of the old handle is
//! permanently invalid even after the slot is reused.

use std::fmt;

use crate::emitter::{Emitter, FinishReason};

/// Callback run once when a playback finishes, just before its handle becomes invalid.
pub type FinishedCallback = Box<dyn FnOnce(FinishReason)>;

/// Identifies a slot in the handle table at a particular generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HandleId {
    index: u32,
    generation: u32,
}

/// A handle to one in-flight playback, returned by a successful play request.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlaybackHandle {
    id: HandleId,
    initial_volume: f32,
    initial_pitch: f32,
}

impl PlaybackHandle {
    pub fn id(&self) -> HandleId {
        self.id
    }

    /// The volume sampled from the sound definition. Volume multipliers scale this.
    pub fn initial_volume(&self) -> f32 {
        self.initial_volume
    }

    /// The pitch sampled from the sound definition. Pitch multipliers scale this.
    pub fn initial_pitch(&self) -> f32 {
        self.initial_pitch
    }
}

impl fmt::Display for PlaybackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}.{}", self.id.index, self.id.generation)
    }
}

/// A playback in progress.
pub(crate) struct ActivePlayback {
    pub(crate) emitter: Emitter,
    pub(crate) sound: String,
    pub(crate) initial_volume: f32,
    pub(crate) initial_pitch: f32,
    pub(crate) volume: f32,
    pub(crate) pitch: f32,
    pub(crate) on_finished: Option<FinishedCallback>,
}

impl ActivePlayback {
    pub(crate) fn new(emitter: Emitter, sound: &str, volume: f32, pitch: f32) -> Self {
        ActivePlayback {
            emitter,
            sound: sound.to_string(),
            initial_volume: volume,
            initial_pitch: pitch,
            volume: 1.0,
            pitch: 1.0,
            on_finished: None,
        }
    }
}

struct Slot {
    generation: u32,
    entry: Option<ActivePlayback>,
}

/// The set of currently valid handles along with the emitters they own.
#[derive(Default)]
pub(crate) struct HandleTable {
    slots: Vec<Slot>,
    free: Vec<u32>,
    len: usize,
}

impl HandleTable {
    /// Stores a new playback and returns its handle.
    pub(crate) fn insert(&mut self, playback: ActivePlayback) -> PlaybackHandle {
        let initial_volume = playback.initial_volume;
        let initial_pitch = playback.initial_pitch;

        let index = match self.free.pop() {
            Some(index) => {
                self.slots[index as usize].entry = Some(playback);
                index
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(playback),
                });
                (self.slots.len() - 1) as u32
            }
        };
        self.len += 1;

        PlaybackHandle {
            id: HandleId {
                index,
                generation: self.slots[index as usize].generation,
            },
            initial_volume,
            initial_pitch,
        }
    }

    pub(crate) fn get(&self, id: HandleId) -> Option<&ActivePlayback> {
        self.slots
            .get(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_ref())
    }

    pub(crate) fn get_mut(&mut self, id: HandleId) -> Option<&mut ActivePlayback> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)
            .and_then(|slot| slot.entry.as_mut())
    }

    /// Removes a playback, invalidating every copy of its handle.
    pub(crate) fn remove(&mut self, id: HandleId) -> Option<ActivePlayback> {
        let slot = self
            .slots
            .get_mut(id.index as usize)
            .filter(|slot| slot.generation == id.generation)?;
        let entry = slot.entry.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(id.index);
        self.len -= 1;
        Some(entry)
    }

    pub(crate) fn contains(&self, id: HandleId) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Ids of every active playback, in slot order.
    pub(crate) fn ids(&self) -> Vec<HandleId> {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.entry.is_some())
            .map(|(index, slot)| HandleId {
                index: index as u32,
                generation: slot.generation,
            })
            .collect()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = (HandleId, &mut ActivePlayback)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter_map(|(index, slot)| {
                let generation = slot.generation;
                slot.entry.as_mut().map(|entry| {
                    (
                        HandleId {
                            index: index as u32,
                            generation,
                        },
                        entry,
                    )
                })
            })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::device::{mock, DeviceFactory};

    fn playback(factory: &mut mock::Factory) -> ActivePlayback {
        ActivePlayback::new(Emitter::new(factory.create()), "test", 0.5, 1.25)
    }

    #[test]
    fn test_insert_and_remove() {
        let mut factory = mock::Factory::new();
        let mut table = HandleTable::default();

        let handle = table.insert(playback(&mut factory));
        assert_eq!(handle.initial_volume(), 0.5);
        assert_eq!(handle.initial_pitch(), 1.25);
        assert!(table.contains(handle.id()));
        assert_eq!(table.len(), 1);

        assert!(table.remove(handle.id()).is_some());
        assert!(!table.contains(handle.id()));
        assert!(table.remove(handle.id()).is_none());
        assert_eq!(table.len(), 0);
    }

    #[test]
    fn test_reused_slot_does_not_revive_old_handle() {
        let mut factory = mock::Factory::new();
        let mut table = HandleTable::default();

        let old = table.insert(playback(&mut factory));
        table.remove(old.id());
        let new = table.insert(playback(&mut factory));

        assert_ne!(old.id(), new.id());
        assert!(!table.contains(old.id()));
        assert!(table.contains(new.id()));
        assert!(table.get_mut(old.id()).is_none());
    }

    #[test]
    fn test_ids_lists_active_only() {
        let mut factory = mock::Factory::new();
        let mut table = HandleTable::default();

        let a = table.insert(playback(&mut factory));
        let b = table.insert(playback(&mut factory));
        let c = table.insert(playback(&mut factory));
        table.remove(b.id());

        assert_eq!(table.ids(), vec![a.id(), c.id()]);
        assert_eq!(table.iter_mut().count(), 2);
    }
}
