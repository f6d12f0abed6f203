/*
 * Banded Round-Robin Scheduler
 *
 * This module implements a scheduling class that manages the tasks of a
 * fixed band of LEVELS priorities (131..=135 in the reference band).
 *
 * SCHEDULING ALGORITHM:
 * ====================
 *
 * 1. One FIFO queue per priority level; the head of the most urgent
 *    non-empty level runs next
 * 2. The running task is charged one tick per timer tick; after
 *    `timeslice` ticks it goes to the tail of its level (round-robin)
 * 3. A newly runnable task preempts the running one if it is more urgent,
 *    or if it is equally urgent and the running task's slice is used up
 * 4. Every `age_threshold` ticks, each level strictly less urgent than the
 *    running task moves one level up, so no level starves
 *
 * POLICY / MECHANISM SPLIT:
 * ========================
 *
 * - BandRoundRobinPolicy (policies::band_rr) makes every decision. It
 *   keeps per-domain state in a BandRunQueue and talks to its host only
 *   through the SchedHost trait.
 * - SchedulerCore (sched_core) is a reference host: per-domain locking,
 *   current-task tracking, reschedule flags and the pick/switch step.
 *
 * TUNABLES:
 * ========
 *
 * `timeslice` (default 100 ticks) and `age_threshold` (default 300 ticks)
 * live in a shared SchedTunables handle and may change at any time; the
 * new values apply from the next tick.
 */

pub mod config;
pub mod events;
pub mod level_queue;
pub mod policies;
pub mod run_queue;
pub mod sched_core;
pub mod task;
pub mod traits;
pub mod types;


pub use config::{ConfigError, SchedTunables, SwitchInPolicy, Tunable};
pub use events::SchedEvent;
pub use level_queue::LevelQueueSet;
pub use policies::BandRoundRobinPolicy;
pub use run_queue::{BandRunQueue, RunQueueStats};
pub use sched_core::{PerDomainState, SchedulerCore};
pub use task::TaskRecord;
pub use traits::{SchedClass, SchedHost};
pub use types::{
    DispatchDecision, DomainId, Priority, PriorityBand, ReschedFlags, TaskId, TimeSliceTicks,
    LEVELS, MIN_PRIO,
};
