/*
 * Scheduler Type Definitions
 *
 * This module defines the core types shared by the banded round-robin
 * policy and the mechanism layer that drives it. They are small,
 * Copy-able values so they can cross the policy/host boundary freely.
 */

use core::fmt;

use bitflags::bitflags;

/// Number of priority levels handled by the band
pub const LEVELS: usize = 5;

/// Lowest (most urgent) priority value of the reference band
pub const MIN_PRIO: Priority = Priority(131);

/// Scheduling domain identifier
///
/// A domain is one independently scheduled unit, usually one CPU. Each
/// domain owns its own run queue; nothing but the tunables is shared.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DomainId(pub u32);

impl DomainId {
    /// Bootstrap domain (CPU 0)
    pub const BSP: DomainId = DomainId(0);

    /// Get the domain ID as a usize for indexing
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for DomainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Domain({})", self.0)
    }
}

/// Task identifier, assigned by the host
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TaskId(pub usize);

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task({})", self.0)
    }
}

/// Task priority in the host's global numbering
///
/// Numerically smaller values are MORE urgent, the way the host numbers its
/// priorities. Use `is_more_urgent_than` instead of comparing raw values so
/// the direction is never inverted by accident.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Priority(pub i32);

impl Priority {
    /// True if `self` should run before `other`
    pub fn is_more_urgent_than(self, other: Priority) -> bool {
        self.0 < other.0
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Contiguous range of priorities `[min, min + LEVELS)` managed by the policy
///
/// Level index 0 maps to `min` (most urgent), level `LEVELS - 1` to the
/// least urgent priority of the band.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PriorityBand {
    min: Priority,
}

impl PriorityBand {
    /// Band used by the reference configuration: 131..=135
    pub const REFERENCE: PriorityBand = PriorityBand { min: MIN_PRIO };

    /// Create a band starting at `min`
    pub const fn new(min: Priority) -> Self {
        Self { min }
    }

    /// Most urgent priority of the band
    pub fn min(&self) -> Priority {
        self.min
    }

    /// Least urgent priority of the band
    pub fn max(&self) -> Priority {
        Priority(self.min.0 + LEVELS as i32 - 1)
    }

    pub fn contains(&self, priority: Priority) -> bool {
        priority >= self.min && priority <= self.max()
    }

    /// Level index for `priority`, or None if it lies outside the band
    pub fn level_of(&self, priority: Priority) -> Option<usize> {
        if self.contains(priority) {
            Some((priority.0 - self.min.0) as usize)
        } else {
            None
        }
    }

    /// Level index for a priority the caller guarantees is in band
    ///
    /// # Panics
    /// If `priority` is outside the band. Queueing an out-of-band task
    /// would corrupt the fairness invariants, so this fails fast.
    pub fn level_index(&self, priority: Priority) -> usize {
        match self.level_of(priority) {
            Some(level) => level,
            None => panic!(
                "priority {} outside band [{}, {}]",
                priority,
                self.min,
                self.max()
            ),
        }
    }

    /// Priority value of level index `level`
    pub fn priority_at(&self, level: usize) -> Priority {
        assert!(level < LEVELS, "level {} outside band of {} levels", level, LEVELS);
        Priority(self.min.0 + level as i32)
    }
}

impl Default for PriorityBand {
    fn default() -> Self {
        Self::REFERENCE
    }
}

/// Time slice duration in timer ticks
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct TimeSliceTicks(pub u32);

impl TimeSliceTicks {
    /// Get the value as u32
    pub fn get(self) -> u32 {
        self.0
    }
}

/// Dispatch decision made by the policy
///
/// `next == None` means the band has nothing runnable and the host should
/// fall through to the next (lower) scheduling class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchDecision {
    /// Task to run next
    pub next: Option<TaskId>,

    /// Recommended slice for the selected task
    pub timeslice: TimeSliceTicks,
}

impl DispatchDecision {
    /// Create a decision to run a specific task
    pub fn run_task(task: TaskId, timeslice: TimeSliceTicks) -> Self {
        Self {
            next: Some(task),
            timeslice,
        }
    }

    /// Create a decision with nothing to run in this band
    pub fn idle(timeslice: TimeSliceTicks) -> Self {
        Self {
            next: None,
            timeslice,
        }
    }
}

bitflags! {
    /// Why a reschedule was requested
    ///
    /// The host accumulates these until its next context switch; any
    /// non-empty set means "switch at the next opportunity".
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
    pub struct ReschedFlags: u8 {
        /// Running task consumed its full slice
        const SLICE_EXPIRED = 1 << 0;
        /// A more urgent (or equal, after slice expiry) task became runnable
        const PREEMPT       = 1 << 1;
        /// Running task gave up the CPU voluntarily
        const YIELD         = 1 << 2;
        /// A task's priority improved
        const PRIORITY      = 1 << 3;
        /// Running task blocked or left the class
        const TASK_LEFT     = 1 << 4;
    }
}
