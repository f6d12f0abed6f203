/*
 * Scheduler Core - Mechanism Layer
 *
 * This module implements SchedulerCore, the reference host for a
 * scheduling class:
 * 1. Holds the scheduling class (Box<dyn SchedClass>)
 * 2. Owns one run queue plus host-side state per domain, each behind its
 *    own spin lock so different domains can be driven concurrently
 * 3. Implements SchedHost on the per-domain state (current task, pending
 *    reschedule reasons, load counter, priority table)
 * 4. Translates host operations into SchedEvents and forwards them
 * 5. Performs the pick/switch step when the embedding kernel asks for it
 *
 * It never generates ticks or switches stacks; the embedding kernel calls
 * `on_tick` from its timer handler and `reschedule` when it is ready to
 * switch, then performs the real context switch to the returned task.
 */

use alloc::boxed::Box;
use alloc::collections::{BTreeMap, VecDeque};
use alloc::vec::Vec;

use spin::Mutex;

use super::{
    events::SchedEvent,
    run_queue::{BandRunQueue, RunQueueStats},
    traits::{SchedClass, SchedHost},
    types::{DomainId, Priority, ReschedFlags, TaskId, TimeSliceTicks},
};

/// Number of recent events kept per domain for debugging
pub const TRACE_CAPACITY: usize = 64;

/// Host-side state of one domain
///
/// This is what the scheduling class sees through SchedHost.
#[derive(Debug)]
pub struct PerDomainState {
    /// Which domain this state belongs to
    pub domain: DomainId,

    /// Task currently occupying the domain
    pub current: Option<TaskId>,

    /// Reasons accumulated since the last reschedule
    pub pending: ReschedFlags,

    /// Host's view of task priorities, updated by aging write-backs
    pub priorities: BTreeMap<TaskId, Priority>,

    /// Runnable tasks, as reported through the count hooks
    pub nr_running: usize,

    /// Slice granted to the current task at dispatch
    pub timeslice: TimeSliceTicks,

    /// Total ticks this domain has seen
    pub total_ticks: u64,

    /// Number of context switches performed
    pub context_switches: u64,
}

impl PerDomainState {
    pub fn new(domain: DomainId) -> Self {
        Self {
            domain,
            current: None,
            pending: ReschedFlags::empty(),
            priorities: BTreeMap::new(),
            nr_running: 0,
            timeslice: TimeSliceTicks(0),
            total_ticks: 0,
            context_switches: 0,
        }
    }

    /// Check if this domain needs to reschedule
    pub fn should_reschedule(&self) -> bool {
        !self.pending.is_empty()
    }
}

impl SchedHost for PerDomainState {
    fn running_task(&self, domain: DomainId) -> Option<TaskId> {
        debug_assert_eq!(domain, self.domain);
        self.current
    }

    fn request_reschedule(&mut self, domain: DomainId, reason: ReschedFlags) {
        debug_assert_eq!(domain, self.domain);
        self.pending |= reason;
    }

    fn running_count_increment(&mut self, _domain: DomainId) {
        self.nr_running += 1;
    }

    fn running_count_decrement(&mut self, domain: DomainId) {
        assert!(self.nr_running > 0, "runnable count underflow on {}", domain);
        self.nr_running -= 1;
    }

    fn set_task_priority(&mut self, task: TaskId, priority: Priority) {
        self.priorities.insert(task, priority);
    }
}

/// Everything guarded by one domain lock
struct DomainSlot {
    host: PerDomainState,
    rq: BandRunQueue,
    trace: VecDeque<SchedEvent>,
}

/// Scheduler Core - The Mechanism Layer
///
/// External code calls methods like task_admitted(), task_woke(),
/// on_tick(), etc., and SchedulerCore forwards them as SchedEvents to the
/// scheduling class. reschedule() asks the class for the next task.
pub struct SchedulerCore {
    /// The scheduling class shared by all domains
    policy: Box<dyn SchedClass>,

    /// Per-domain state, one lock each
    domains: Vec<Mutex<DomainSlot>>,
}

impl SchedulerCore {
    /// Create a SchedulerCore managing `domain_count` domains
    pub fn new(policy: Box<dyn SchedClass>, domain_count: usize) -> Self {
        let domains = (0..domain_count)
            .map(|i| {
                let domain = DomainId(i as u32);
                Mutex::new(DomainSlot {
                    host: PerDomainState::new(domain),
                    rq: policy.init(domain),
                    trace: VecDeque::with_capacity(TRACE_CAPACITY),
                })
            })
            .collect();

        log::info!("SchedulerCore initialized with policy: {}", policy.name());
        log::info!("Managing {} domain(s)", domain_count);

        Self { policy, domains }
    }

    /// Get the name of the active policy
    pub fn policy_name(&self) -> &'static str {
        self.policy.name()
    }

    pub fn domain_count(&self) -> usize {
        self.domains.len()
    }

    // ========================================================================
    // EXTERNAL API - What the embedding kernel calls
    // ========================================================================

    /// A new task joins the class on `domain` and is runnable
    pub fn task_admitted(&self, domain: DomainId, task: TaskId, priority: Priority) {
        self.dispatch(domain, SchedEvent::TaskAdmitted { task, priority });
    }

    /// A blocked task became runnable
    pub fn task_woke(&self, domain: DomainId, task: TaskId) {
        self.dispatch(domain, SchedEvent::TaskWoke { task });
    }

    /// A task (possibly the running one) blocked
    pub fn task_blocked(&self, domain: DomainId, task: TaskId) {
        self.dispatch(domain, SchedEvent::TaskBlocked { task });
    }

    /// A task exited; its record is dropped
    pub fn task_exited(&self, domain: DomainId, task: TaskId) {
        self.dispatch(domain, SchedEvent::TaskExited { task });
    }

    /// The running task yields the rest of its slice
    pub fn task_yielded(&self, domain: DomainId) {
        self.dispatch(domain, SchedEvent::TaskYielded { domain });
    }

    /// Change a task's priority
    pub fn priority_changed(&self, domain: DomainId, task: TaskId, new_priority: Priority) {
        self.with_slot(domain, |slot| {
            let old_priority = match slot.host.priorities.get(&task) {
                Some(&priority) => priority,
                None => slot.rq.record(task).priority(),
            };
            self.apply(
                slot,
                SchedEvent::PriorityChanged {
                    task,
                    old_priority,
                    new_priority,
                },
            );
        });
    }

    /// A task moves into this class from another one
    pub fn switched_in(&self, domain: DomainId, task: TaskId, priority: Priority) {
        self.dispatch(domain, SchedEvent::SwitchedIn { task, priority });
    }

    /// A task moves out of this class
    pub fn switched_out(&self, domain: DomainId, task: TaskId) {
        self.dispatch(domain, SchedEvent::SwitchedOut { task });
    }

    // ========================================================================
    // TIMER TICK HANDLING
    // ========================================================================

    /// Handle a timer tick on `domain`
    ///
    /// # Returns
    /// true if a reschedule should occur, false otherwise
    pub fn on_tick(&self, domain: DomainId) -> bool {
        self.with_slot(domain, |slot| {
            let current = slot.host.current;
            self.apply(slot, SchedEvent::Tick { domain, current });
            slot.host.should_reschedule()
        })
    }

    // ========================================================================
    // CONTEXT SWITCH EXECUTION
    // ========================================================================

    /// Pick the task that should occupy `domain` next
    ///
    /// Clears pending reasons, returns the outgoing task to the class and
    /// installs the class's choice as current.
    ///
    /// # Returns
    /// - Some(TaskId): switch to this task
    /// - None: nothing runnable in this class; fall through to the next one
    pub fn reschedule(&self, domain: DomainId) -> Option<TaskId> {
        self.with_slot(domain, |slot| {
            let DomainSlot { host, rq, .. } = slot;
            host.pending = ReschedFlags::empty();

            let prev = host.current;
            if let Some(prev) = prev {
                self.policy.put_prev_task(rq, prev);
            }

            let decision = self.policy.pick_next_task(host, rq);
            host.current = decision.next;
            host.timeslice = decision.timeslice;
            if let Some(next) = decision.next {
                self.policy.set_curr_task(rq, next);
            }

            if prev != decision.next {
                host.context_switches += 1;
                log::debug!("[SchedulerCore] {}: {:?} -> {:?}", domain, prev, decision.next);
            }
            decision.next
        })
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    pub fn current_task(&self, domain: DomainId) -> Option<TaskId> {
        self.with_slot(domain, |slot| slot.host.current)
    }

    pub fn should_reschedule(&self, domain: DomainId) -> bool {
        self.with_slot(domain, |slot| slot.host.should_reschedule())
    }

    pub fn pending_reasons(&self, domain: DomainId) -> ReschedFlags {
        self.with_slot(domain, |slot| slot.host.pending)
    }

    /// Runnable tasks on `domain`, as counted by the host hooks
    pub fn nr_running(&self, domain: DomainId) -> usize {
        self.with_slot(domain, |slot| slot.host.nr_running)
    }

    /// Host-side priority of `task`, tracking aging promotions
    pub fn priority_of(&self, domain: DomainId, task: TaskId) -> Option<Priority> {
        self.with_slot(domain, |slot| slot.host.priorities.get(&task).copied())
    }

    /// Slice length to report for `task`
    pub fn rr_interval(&self, domain: DomainId, task: TaskId) -> TimeSliceTicks {
        self.with_slot(domain, |slot| self.policy.get_rr_interval(&slot.rq, task))
    }

    /// Inspect the run queue of `domain` under its lock
    pub fn with_run_queue<R>(&self, domain: DomainId, f: impl FnOnce(&BandRunQueue) -> R) -> R {
        self.with_slot(domain, |slot| f(&slot.rq))
    }

    // ========================================================================
    // STATISTICS AND DEBUGGING
    // ========================================================================

    pub fn run_queue_stats(&self, domain: DomainId) -> RunQueueStats {
        self.with_slot(domain, |slot| slot.rq.stats())
    }

    pub fn context_switch_count(&self, domain: DomainId) -> u64 {
        self.with_slot(domain, |slot| slot.host.context_switches)
    }

    pub fn total_ticks(&self, domain: DomainId) -> u64 {
        self.with_slot(domain, |slot| slot.host.total_ticks)
    }

    /// Most recent events of `domain`, oldest first
    pub fn recent_events(&self, domain: DomainId) -> Vec<SchedEvent> {
        self.with_slot(domain, |slot| slot.trace.iter().cloned().collect())
    }

    // ========================================================================
    // EVENT ROUTING
    // ========================================================================

    fn dispatch(&self, domain: DomainId, event: SchedEvent) {
        self.with_slot(domain, |slot| self.apply(slot, event));
    }

    fn with_slot<R>(&self, domain: DomainId, f: impl FnOnce(&mut DomainSlot) -> R) -> R {
        let slot = match self.domains.get(domain.as_usize()) {
            Some(slot) => slot,
            None => panic!("{} not managed by this SchedulerCore", domain),
        };
        let mut guard = slot.lock();
        f(&mut *guard)
    }

    fn apply(&self, slot: &mut DomainSlot, event: SchedEvent) {
        let policy = self.policy.as_ref();
        let DomainSlot { host, rq, trace } = slot;
        log::trace!(
            "[SchedulerCore] {}: {} {:?}",
            host.domain,
            event.name(),
            event.task()
        );

        match event {
            SchedEvent::TaskAdmitted { task, priority } | SchedEvent::SwitchedIn { task, priority } => {
                host.priorities.insert(task, priority);
                policy.attach_task(rq, task, priority);
                policy.enqueue_task(host, rq, task);
            }
            SchedEvent::TaskWoke { task } => {
                policy.enqueue_task(host, rq, task);
            }
            SchedEvent::TaskBlocked { task } => {
                policy.dequeue_task(host, rq, task);
                if host.current == Some(task) {
                    host.pending |= ReschedFlags::TASK_LEFT;
                }
            }
            SchedEvent::TaskExited { task } | SchedEvent::SwitchedOut { task } => {
                policy.detach_task(host, rq, task);
                host.priorities.remove(&task);
                if matches!(event, SchedEvent::SwitchedOut { .. }) {
                    policy.switched_from(host, rq, task);
                }
                if host.current == Some(task) {
                    host.pending |= ReschedFlags::TASK_LEFT;
                }
            }
            SchedEvent::TaskYielded { .. } => {
                policy.yield_task(host, rq);
            }
            SchedEvent::Tick { current, .. } => {
                host.total_ticks += 1;
                if let Some(curr) = current.filter(|&task| rq.is_attached(task)) {
                    policy.task_tick(host, rq, curr);
                }
            }
            SchedEvent::PriorityChanged { task, new_priority, .. } => {
                policy.set_priority(host, rq, task, new_priority);
                host.priorities.insert(task, new_priority);
            }
        }

        if event.makes_runnable() {
            if let Some(task) = event.task() {
                if matches!(event, SchedEvent::SwitchedIn { .. }) {
                    policy.switched_to(host, rq, task);
                } else {
                    policy.check_preempt_curr(host, rq, task);
                }
            }
        }

        if trace.len() == TRACE_CAPACITY {
            trace.pop_front();
        }
        trace.push_back(event);
    }
}

// ============================================================================
// DEBUG IMPLEMENTATION
// ============================================================================

impl core::fmt::Debug for SchedulerCore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SchedulerCore")
            .field("policy", &self.policy.name())
            .field("domain_count", &self.domains.len())
            .finish()
    }
}
