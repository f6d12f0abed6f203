/*
 * Scheduler Event Definitions
 *
 * This module defines the events the mechanism layer (SchedulerCore) turns
 * host operations into before forwarding them to the scheduling class.
 * Every host-facing method of SchedulerCore produces exactly one event, so
 * the event stream is also a complete trace of what the class was told.
 */

use super::types::{DomainId, Priority, TaskId};

/// Events that the mechanism reports to the scheduling class
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedEvent {
    /// A task joined the class and is runnable
    TaskAdmitted {
        task: TaskId,
        priority: Priority,
    },

    /// A blocked task became runnable again
    TaskWoke {
        task: TaskId,
    },

    /// A task stopped being runnable (waiting for I/O, a lock, ...)
    TaskBlocked {
        task: TaskId,
    },

    /// A task finished and will never run again
    TaskExited {
        task: TaskId,
    },

    /// The running task gave up the rest of its slice
    TaskYielded {
        domain: DomainId,
    },

    /// Timer tick on a domain
    ///
    /// This is the primary event driving rotation and aging.
    Tick {
        domain: DomainId,
        current: Option<TaskId>,
    },

    /// A task's priority was changed by the host
    PriorityChanged {
        task: TaskId,
        old_priority: Priority,
        new_priority: Priority,
    },

    /// A task moved into this class from another one
    SwitchedIn {
        task: TaskId,
        priority: Priority,
    },

    /// A task moved from this class to another one
    SwitchedOut {
        task: TaskId,
    },
}

impl SchedEvent {
    /// Get a short name for logging
    pub fn name(&self) -> &'static str {
        match self {
            SchedEvent::TaskAdmitted { .. } => "TaskAdmitted",
            SchedEvent::TaskWoke { .. } => "TaskWoke",
            SchedEvent::TaskBlocked { .. } => "TaskBlocked",
            SchedEvent::TaskExited { .. } => "TaskExited",
            SchedEvent::TaskYielded { .. } => "TaskYielded",
            SchedEvent::Tick { .. } => "Tick",
            SchedEvent::PriorityChanged { .. } => "PriorityChanged",
            SchedEvent::SwitchedIn { .. } => "SwitchedIn",
            SchedEvent::SwitchedOut { .. } => "SwitchedOut",
        }
    }

    /// Task the event is about, if it names one
    pub fn task(&self) -> Option<TaskId> {
        match *self {
            SchedEvent::TaskAdmitted { task, .. }
            | SchedEvent::TaskWoke { task }
            | SchedEvent::TaskBlocked { task }
            | SchedEvent::TaskExited { task }
            | SchedEvent::PriorityChanged { task, .. }
            | SchedEvent::SwitchedIn { task, .. }
            | SchedEvent::SwitchedOut { task } => Some(task),
            SchedEvent::Tick { current, .. } => current,
            SchedEvent::TaskYielded { .. } => None,
        }
    }

    /// Check if this event makes a new task runnable
    ///
    /// Such events are followed by a preemption check against the running
    /// task.
    pub fn makes_runnable(&self) -> bool {
        matches!(
            self,
            SchedEvent::TaskAdmitted { .. }
                | SchedEvent::TaskWoke { .. }
                | SchedEvent::SwitchedIn { .. }
        )
    }
}
