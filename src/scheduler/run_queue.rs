/*
 * Band Run Queue - per-domain state
 *
 * One BandRunQueue exists per scheduling domain. It owns the level queues,
 * the table of attached task records, the runnable count and the aging
 * tick counter. It enforces the membership invariants; scheduling
 * decisions live in the policy.
 *
 * The caller must hold exclusive access to the domain (`&mut self`); no
 * locking happens here.
 */

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use super::{
    level_queue::{LevelIter, LevelQueueSet},
    task::TaskRecord,
    types::{DomainId, Priority, PriorityBand, TaskId},
};

/// Per-domain counters, exposed for host load reporting and debugging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunQueueStats {
    /// Ticks accounted to a running task of this band
    pub ticks: u64,
    /// Selections that returned a task
    pub picks: u64,
    /// Selections that found every level empty
    pub idle_picks: u64,
    /// Times a running task used up its slice
    pub slice_expiries: u64,
    /// Aging passes performed
    pub aging_passes: u64,
    /// Tasks moved one level up by aging
    pub tasks_aged: u64,
}

/// Run-queue state of one scheduling domain
#[derive(Debug)]
pub struct BandRunQueue {
    domain: DomainId,
    band: PriorityBand,
    queues: LevelQueueSet,
    tasks: BTreeMap<TaskId, TaskRecord>,

    /// Runnable tasks (queued or running)
    nr_running: usize,

    /// Ticks since the last aging pass
    aging_ticks: u32,

    stats: RunQueueStats,
}

impl BandRunQueue {
    pub fn new(domain: DomainId, band: PriorityBand) -> Self {
        Self {
            domain,
            band,
            queues: LevelQueueSet::new(),
            tasks: BTreeMap::new(),
            nr_running: 0,
            aging_ticks: 0,
            stats: RunQueueStats::default(),
        }
    }

    pub fn domain(&self) -> DomainId {
        self.domain
    }

    pub fn band(&self) -> PriorityBand {
        self.band
    }

    pub fn nr_running(&self) -> usize {
        self.nr_running
    }

    /// Tasks waiting in level queues (excludes a picked, running task)
    pub fn nr_queued(&self) -> usize {
        self.queues.total_len()
    }

    pub fn aging_ticks(&self) -> u32 {
        self.aging_ticks
    }

    pub fn stats(&self) -> RunQueueStats {
        self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut RunQueueStats {
        &mut self.stats
    }

    // ========================================================================
    // TASK RECORDS
    // ========================================================================

    /// Attach a task to this domain with an initial priority
    ///
    /// # Panics
    /// If the priority is out of band or the task is already attached.
    pub fn attach(&mut self, task: TaskId, priority: Priority) {
        assert!(
            self.band.contains(priority),
            "{} priority {} outside band [{}, {}]",
            task,
            priority,
            self.band.min(),
            self.band.max()
        );
        if self.tasks.contains_key(&task) {
            panic!("{} already attached to {}", task, self.domain);
        }
        self.tasks.insert(task, TaskRecord::new(task, priority));
    }

    /// Drop the record of a task that is no longer runnable here
    ///
    /// # Panics
    /// If the task is unattached or still counted as runnable.
    pub fn detach(&mut self, task: TaskId) -> TaskRecord {
        let record = match self.tasks.remove(&task) {
            Some(record) => record,
            None => panic!("detach of unattached {} on {}", task, self.domain),
        };
        assert!(!record.on_rq(), "detach of runnable {}", task);
        record
    }

    pub fn is_attached(&self, task: TaskId) -> bool {
        self.tasks.contains_key(&task)
    }

    pub fn get(&self, task: TaskId) -> Option<&TaskRecord> {
        self.tasks.get(&task)
    }

    pub(crate) fn get_mut(&mut self, task: TaskId) -> Option<&mut TaskRecord> {
        self.tasks.get_mut(&task)
    }

    /// Record of a task the caller guarantees is attached
    pub fn record(&self, task: TaskId) -> &TaskRecord {
        match self.tasks.get(&task) {
            Some(record) => record,
            None => panic!("{} not attached to {}", task, self.domain),
        }
    }

    pub(crate) fn record_mut(&mut self, task: TaskId) -> &mut TaskRecord {
        match self.tasks.get_mut(&task) {
            Some(record) => record,
            None => panic!("{} not attached to {}", task, self.domain),
        }
    }

    // ========================================================================
    // QUEUE MEMBERSHIP
    // ========================================================================

    /// Make `task` runnable: append it to its level and count it
    ///
    /// # Panics
    /// If the task is unattached or already runnable.
    pub(crate) fn push_task(&mut self, task: TaskId) {
        let record = self.record(task);
        assert!(!record.on_rq(), "double enqueue of {}", task);
        let level = self.band.level_index(record.priority());

        self.queues.push_back(level, task);
        self.record_mut(task).set_on_rq(true);
        self.nr_running += 1;
    }

    /// Make `task` non-runnable: unlink it (if queued) and uncount it
    ///
    /// # Panics
    /// If the task is unattached or not runnable.
    pub(crate) fn pull_task(&mut self, task: TaskId) {
        assert!(self.record(task).on_rq(), "dequeue of non-runnable {}", task);

        self.queues.remove(task);
        self.record_mut(task).set_on_rq(false);
        self.nr_running -= 1;
    }

    /// Put a runnable, unqueued task back at the head of its level
    pub(crate) fn restore_head(&mut self, task: TaskId) {
        let level = self.restore_level(task);
        self.queues.push_front(level, task);
    }

    /// Put a runnable, unqueued task back at the tail of its level
    pub(crate) fn restore_tail(&mut self, task: TaskId) {
        let level = self.restore_level(task);
        self.queues.push_back(level, task);
    }

    fn restore_level(&self, task: TaskId) -> usize {
        let record = self.record(task);
        assert!(record.on_rq(), "restore of non-runnable {}", task);
        self.band.level_index(record.priority())
    }

    /// Remove and return the oldest task of the most urgent non-empty level
    ///
    /// The task stays runnable; it is simply no longer waiting.
    pub(crate) fn take_head(&mut self) -> Option<TaskId> {
        let level = self.queues.first_non_empty()?;
        self.queues.pop_front(level)
    }

    /// Move every task queued at `level` to the tail of `level - 1`
    ///
    /// Arrival order among the moved tasks is preserved and each record
    /// takes the priority of its new level. Returns the moved tasks.
    pub(crate) fn promote_level(&mut self, level: usize) -> Vec<TaskId> {
        assert!(level > 0, "level 0 cannot be promoted");
        let new_priority = self.band.priority_at(level - 1);

        let mut moved = Vec::with_capacity(self.queues.len(level));
        while let Some(task) = self.queues.pop_front(level) {
            self.queues.push_back(level - 1, task);
            self.record_mut(task).set_priority(new_priority);
            moved.push(task);
        }
        moved
    }

    /// Level currently holding `task`, None when running or not runnable
    pub fn queued_level(&self, task: TaskId) -> Option<usize> {
        self.queues.level_of(task)
    }

    pub fn is_queued(&self, task: TaskId) -> bool {
        self.queues.contains(task)
    }

    /// Tasks waiting at `level`, oldest first
    pub fn queued_at(&self, level: usize) -> LevelIter<'_> {
        self.queues.iter(level)
    }

    // ========================================================================
    // AGING CLOCK
    // ========================================================================

    /// Advance the aging clock by one tick and return the new value
    pub(crate) fn advance_aging(&mut self) -> u32 {
        self.aging_ticks = self.aging_ticks.saturating_add(1);
        self.aging_ticks
    }

    pub(crate) fn reset_aging(&mut self) {
        self.aging_ticks = 0;
    }
}
