/*
 * Task Records
 *
 * Per-task scheduling metadata kept by the band policy for every task the
 * host has attached to it. Queue membership itself is tracked by the
 * LevelQueueSet side map, not here, so a record never holds a link into
 * another task.
 */

use super::types::{Priority, TaskId};

/// Scheduling metadata for one attached task
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskRecord {
    id: TaskId,

    /// Current priority; always inside the policy's band
    priority: Priority,

    /// Ticks consumed since the last reset
    run_ticks: u32,

    /// Counted as runnable in the domain (queued or running)
    on_rq: bool,
}

impl TaskRecord {
    pub fn new(id: TaskId, priority: Priority) -> Self {
        Self {
            id,
            priority,
            run_ticks: 0,
            on_rq: false,
        }
    }

    pub fn id(&self) -> TaskId {
        self.id
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn run_ticks(&self) -> u32 {
        self.run_ticks
    }

    pub fn on_rq(&self) -> bool {
        self.on_rq
    }

    /// True once the task has used up a slice of `timeslice` ticks
    pub fn slice_exhausted(&self, timeslice: u32) -> bool {
        self.run_ticks >= timeslice
    }

    pub(crate) fn set_priority(&mut self, priority: Priority) {
        self.priority = priority;
    }

    /// Account one tick and return the new total
    pub(crate) fn charge_tick(&mut self) -> u32 {
        self.run_ticks = self.run_ticks.saturating_add(1);
        self.run_ticks
    }

    pub(crate) fn reset_run_ticks(&mut self) {
        self.run_ticks = 0;
    }

    pub(crate) fn set_on_rq(&mut self, on_rq: bool) {
        self.on_rq = on_rq;
    }
}
