/*
 * Scheduler Trait Definitions
 *
 * This module defines the two traits that separate scheduling policy from
 * mechanism:
 *
 * - SchedClass: the hooks a scheduling class exposes to the host
 * - SchedHost: what the class may ask of, or tell, the host
 *
 * The class never owns tasks or performs context switches. It only keeps
 * queue membership and per-task accounting in the BandRunQueue the host
 * hands it, and reports decisions back through SchedHost.
 */

use super::{
    run_queue::BandRunQueue,
    types::{DispatchDecision, DomainId, Priority, ReschedFlags, TaskId, TimeSliceTicks},
};

/// Host interface consumed by the scheduling class
///
/// Every call is made while the host holds exclusive access to `domain`.
pub trait SchedHost {
    /// Task currently occupying the domain, if any
    fn running_task(&self, domain: DomainId) -> Option<TaskId>;

    /// Ask the host to switch tasks at its next opportunity
    ///
    /// Asynchronous: the host decides when the switch actually happens.
    fn request_reschedule(&mut self, domain: DomainId, reason: ReschedFlags);

    /// A task became runnable in the domain (load bookkeeping)
    fn running_count_increment(&mut self, domain: DomainId);

    /// A task stopped being runnable in the domain (load bookkeeping)
    fn running_count_decrement(&mut self, domain: DomainId);

    /// The class changed a task's priority (aging promotion)
    fn set_task_priority(&mut self, task: TaskId, priority: Priority);
}

/// Scheduling class interface
///
/// Each domain has its own BandRunQueue created by `init`; the class object
/// itself is shared by all domains and only holds configuration.
///
/// Hooks taking a task require it to be attached to `rq`; violating that,
/// or the per-hook preconditions below, panics.
pub trait SchedClass: Send + Sync {
    /// Get the class name for debugging
    fn name(&self) -> &'static str;

    /// Create the run queue of a new domain
    fn init(&self, domain: DomainId) -> BandRunQueue;

    /// Start tracking `task` at `priority` (must be inside the band)
    fn attach_task(&self, rq: &mut BandRunQueue, task: TaskId, priority: Priority);

    /// Stop tracking `task`, dequeuing it first if it is still runnable
    fn detach_task(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue, task: TaskId);

    /// Make `task` runnable at the tail of its level (must not be runnable)
    fn enqueue_task(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue, task: TaskId);

    /// Make `task` non-runnable (must be runnable, queued or running)
    fn dequeue_task(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue, task: TaskId);

    /// The running task gives up the rest of its slice
    fn yield_task(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue);

    /// `candidate` just became runnable: preempt the running task?
    fn check_preempt_curr(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue, candidate: TaskId);

    /// Choose the next task to run and remove it from its level queue
    fn pick_next_task(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue) -> DispatchDecision;

    /// The host is switching away from `prev`
    ///
    /// Must be called before `pick_next_task` whenever the outgoing task is
    /// one of ours, so a preempted task regains its place in line.
    fn put_prev_task(&self, rq: &mut BandRunQueue, prev: TaskId);

    /// The host made `curr` the running task
    fn set_curr_task(&self, _rq: &mut BandRunQueue, curr: TaskId) {
        log::trace!("[{}] set_curr {}", self.name(), curr);
    }

    /// Periodic tick while `curr` runs
    fn task_tick(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue, curr: TaskId);

    /// `task` is leaving this class
    fn switched_from(&self, _host: &mut dyn SchedHost, _rq: &mut BandRunQueue, task: TaskId) {
        log::trace!("[{}] switched_from {}", self.name(), task);
    }

    /// `task` has just become governed by this class
    fn switched_to(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue, task: TaskId);

    /// `task`'s priority changed from `old_priority` to its current one
    fn prio_changed(
        &self,
        host: &mut dyn SchedHost,
        rq: &mut BandRunQueue,
        task: TaskId,
        old_priority: Priority,
    );

    /// Change `task`'s priority, moving it between levels if it is queued,
    /// then run `prio_changed`
    fn set_priority(
        &self,
        host: &mut dyn SchedHost,
        rq: &mut BandRunQueue,
        task: TaskId,
        priority: Priority,
    );

    /// Slice length the host should report for `task`
    fn get_rr_interval(&self, rq: &BandRunQueue, task: TaskId) -> TimeSliceTicks;
}
