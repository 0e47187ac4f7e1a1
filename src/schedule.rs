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

//! Per-tick callbacks registered with the host loop.
//!
//! The host owns the scheduler and calls [`TickScheduler::tick`] once per frame. A task runs on
//! every tick until it returns `ControlFlow::Break` or is cancelled through its id.

use std::fmt;
use std::ops::ControlFlow;
use std::time::Duration;

use tracing::trace;

/// Identifies a registered task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TaskId(u64);

type Task<C> = Box<dyn FnMut(&mut C, Duration) -> ControlFlow<()>>;

/// Runs registered callbacks once per tick against a context owned by the host.
pub struct TickScheduler<C> {
    tasks: Vec<(TaskId, Task<C>)>,
    next_id: u64,
}

impl<C> TickScheduler<C> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 0,
        }
    }

    /// Registers a task that runs on every tick until it breaks.
    pub fn register<F>(&mut self, task: F) -> TaskId
    where
        F: FnMut(&mut C, Duration) -> ControlFlow<()> + 'static,
    {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push((id, Box::new(task)));
        trace!(task = id.0, "Registered tick task");
        id
    }

    /// Registers a task that runs once after the given delay has elapsed.
    pub fn after<F>(&mut self, delay: Duration, task: F) -> TaskId
    where
        F: FnOnce(&mut C) + 'static,
    {
        let mut remaining = delay;
        let mut task = Some(task);
        self.register(move |ctx, dt| {
            remaining = remaining.saturating_sub(dt);
            if !remaining.is_zero() {
                return ControlFlow::Continue(());
            }
            if let Some(task) = task.take() {
                task(ctx);
            }
            ControlFlow::Break(())
        })
    }

    /// Removes a task. Returns false if it already finished or was never registered.
    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|(task_id, _)| *task_id != id);
        self.tasks.len() != before
    }

    /// Returns true if the task is still registered.
    pub fn is_scheduled(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|(task_id, _)| *task_id == id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Runs every task once, in registration order, and drops those that break.
    pub fn tick(&mut self, ctx: &mut C, dt: Duration) {
        self.tasks.retain_mut(|(id, task)| match task(&mut *ctx, dt) {
            ControlFlow::Continue(()) => true,
            ControlFlow::Break(()) => {
                trace!(task = id.0, "Tick task finished");
                false
            }
        });
    }
}

impl<C> Default for TickScheduler<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> fmt::Debug for TickScheduler<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TickScheduler")
            .field("tasks", &self.tasks.len())
            .finish()
    }
}
