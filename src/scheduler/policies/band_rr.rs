/*
 * Banded Round-Robin Scheduling Policy
 *
 * Multi-level round-robin over a fixed band of LEVELS priorities with
 * starvation-avoidance aging.
 *
 * Features:
 * - One FIFO per level; the most urgent non-empty level always wins
 * - Equal-priority tasks rotate every `timeslice` ticks
 * - Equal-priority arrivals never cut in line mid-slice
 * - Every `age_threshold` ticks, each level strictly below the running
 *   task's level moves up by one
 *
 * The task chosen by pick_next leaves its queue while it runs. A task whose
 * slice expires, that yields, or that is displaced by a priority change is
 * put at the tail of its level; one preempted mid-slice goes back to the
 * head through put_prev_task.
 */

use alloc::sync::Arc;

use super::super::{
    config::{SchedTunables, SwitchInPolicy},
    run_queue::BandRunQueue,
    traits::{SchedClass, SchedHost},
    types::{
        DispatchDecision, DomainId, Priority, PriorityBand, ReschedFlags, TaskId, TimeSliceTicks,
        LEVELS,
    },
};

/// Banded round-robin policy
///
/// Holds only configuration; all mutable state lives in the per-domain
/// BandRunQueue passed to each hook.
#[derive(Debug)]
pub struct BandRoundRobinPolicy {
    tunables: Arc<SchedTunables>,
    band: PriorityBand,
    switch_in: SwitchInPolicy,
}

impl BandRoundRobinPolicy {
    /// Create a policy for the reference band reading `tunables`
    pub fn new(tunables: Arc<SchedTunables>) -> Self {
        Self {
            tunables,
            band: PriorityBand::REFERENCE,
            switch_in: SwitchInPolicy::default(),
        }
    }

    pub fn with_band(mut self, band: PriorityBand) -> Self {
        self.band = band;
        self
    }

    pub fn with_switch_in_policy(mut self, switch_in: SwitchInPolicy) -> Self {
        self.switch_in = switch_in;
        self
    }

    pub fn tunables(&self) -> &Arc<SchedTunables> {
        &self.tunables
    }

    pub fn band(&self) -> PriorityBand {
        self.band
    }

    fn timeslice(&self) -> u32 {
        self.tunables.timeslice()
    }

    /// Move a runnable task to the tail of its level
    fn requeue(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue, task: TaskId) {
        if rq.record(task).on_rq() {
            self.dequeue_task(host, rq, task);
            self.enqueue_task(host, rq, task);
        }
    }

    /// Running task, if the host has one and it belongs to this band
    fn current(&self, host: &dyn SchedHost, rq: &BandRunQueue) -> Option<TaskId> {
        host.running_task(rq.domain())
            .filter(|&task| rq.is_attached(task))
    }

    /// Shift every level below the running task's level up by one
    fn perform_aging(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue, curr: TaskId) {
        let band = rq.band();
        let base = band.level_index(rq.record(curr).priority()) + 1;

        rq.stats_mut().aging_passes += 1;
        for level in base..LEVELS {
            let moved = rq.promote_level(level);
            if moved.is_empty() {
                continue;
            }

            let priority = band.priority_at(level - 1);
            log::debug!(
                "[Band RR] {}: aged {} task(s) from {} to {}",
                rq.domain(),
                moved.len(),
                band.priority_at(level),
                priority
            );
            rq.stats_mut().tasks_aged += moved.len() as u64;
            for task in moved {
                host.set_task_priority(task, priority);
            }
        }
    }
}

impl SchedClass for BandRoundRobinPolicy {
    fn name(&self) -> &'static str {
        "Band-RR"
    }

    fn init(&self, domain: DomainId) -> BandRunQueue {
        log::info!(
            "[Band RR] {}: levels {}..={} timeslice={} age_threshold={}",
            domain,
            self.band.min(),
            self.band.max(),
            self.tunables.timeslice(),
            self.tunables.age_threshold()
        );
        BandRunQueue::new(domain, self.band)
    }

    fn attach_task(&self, rq: &mut BandRunQueue, task: TaskId, priority: Priority) {
        rq.attach(task, priority);
    }

    fn detach_task(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue, task: TaskId) {
        if rq.record(task).on_rq() {
            self.dequeue_task(host, rq, task);
        }
        rq.detach(task);
    }

    fn enqueue_task(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue, task: TaskId) {
        rq.push_task(task);
        host.running_count_increment(rq.domain());
        log::trace!(
            "[Band RR] enqueue {} at prio {}",
            task,
            rq.record(task).priority()
        );
    }

    fn dequeue_task(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue, task: TaskId) {
        rq.pull_task(task);
        host.running_count_decrement(rq.domain());
    }

    fn yield_task(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue) {
        let Some(curr) = self.current(host, rq) else {
            return;
        };
        self.requeue(host, rq, curr);
        host.request_reschedule(rq.domain(), ReschedFlags::YIELD);
    }

    fn check_preempt_curr(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue, candidate: TaskId) {
        let domain = rq.domain();
        let Some(curr) = self.current(host, rq) else {
            // idle, or the outgoing task already left the band
            host.request_reschedule(domain, ReschedFlags::PREEMPT);
            return;
        };
        if curr == candidate {
            return;
        }

        let incoming = rq.record(candidate).priority();
        let running = rq.record(curr);

        if incoming.is_more_urgent_than(running.priority()) {
            log::debug!("[Band RR] {} preempts {}", candidate, curr);
            host.request_reschedule(domain, ReschedFlags::PREEMPT);
        } else if incoming == running.priority() && running.slice_exhausted(self.timeslice()) {
            log::debug!("[Band RR] {} replaces expired {}", candidate, curr);
            host.request_reschedule(domain, ReschedFlags::PREEMPT);
        }
    }

    fn pick_next_task(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue) -> DispatchDecision {
        let timeslice = self.timeslice();

        let Some(next) = rq.take_head() else {
            rq.stats_mut().idle_picks += 1;
            return DispatchDecision::idle(TimeSliceTicks(timeslice));
        };

        // A task that finished its slice starts the next one from zero,
        // including one that blocked before it could be switched out.
        let curr = host.running_task(rq.domain());
        for task in curr.into_iter().chain(Some(next)) {
            if let Some(record) = rq.get_mut(task) {
                if record.slice_exhausted(timeslice) {
                    record.reset_run_ticks();
                }
            }
        }

        rq.stats_mut().picks += 1;
        DispatchDecision::run_task(next, TimeSliceTicks(timeslice))
    }

    fn put_prev_task(&self, rq: &mut BandRunQueue, prev: TaskId) {
        let Some(record) = rq.get(prev) else {
            return;
        };
        if !record.on_rq() || rq.is_queued(prev) {
            return;
        }

        // A used-up slice (e.g. shortened between ticks) loses its place
        if record.slice_exhausted(self.timeslice()) {
            log::trace!("[Band RR] {} put back at tail, slice used up", prev);
            rq.restore_tail(prev);
        } else {
            rq.restore_head(prev);
        }
    }

    fn task_tick(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue, curr: TaskId) {
        let domain = rq.domain();
        let run_ticks = rq.record_mut(curr).charge_tick();
        rq.stats_mut().ticks += 1;
        log::trace!("[Band RR] tick {} run_ticks={}", curr, run_ticks);

        if run_ticks >= self.timeslice() {
            // run_ticks is reset by the next pick, not here
            self.requeue(host, rq, curr);
            rq.stats_mut().slice_expiries += 1;
            host.request_reschedule(domain, ReschedFlags::SLICE_EXPIRED);
        }

        if rq.advance_aging() >= self.tunables.age_threshold() {
            self.perform_aging(host, rq, curr);
            rq.reset_aging();
        }
    }

    fn switched_to(&self, host: &mut dyn SchedHost, rq: &mut BandRunQueue, task: TaskId) {
        match self.switch_in {
            SwitchInPolicy::Preempt => self.check_preempt_curr(host, rq, task),
            SwitchInPolicy::Passive => {
                log::trace!("[Band RR] switched_to {} (passive)", task);
            }
        }
    }

    fn prio_changed(
        &self,
        host: &mut dyn SchedHost,
        rq: &mut BandRunQueue,
        task: TaskId,
        old_priority: Priority,
    ) {
        let new_priority = rq.record(task).priority();
        if !new_priority.is_more_urgent_than(old_priority) {
            return;
        }

        log::debug!(
            "[Band RR] {} raised {} -> {}",
            task,
            old_priority,
            new_priority
        );
        if let Some(curr) = self.current(host, rq) {
            self.requeue(host, rq, curr);
        }
        host.request_reschedule(rq.domain(), ReschedFlags::PRIORITY);
    }

    fn set_priority(
        &self,
        host: &mut dyn SchedHost,
        rq: &mut BandRunQueue,
        task: TaskId,
        priority: Priority,
    ) {
        let band = rq.band();
        assert!(
            band.contains(priority),
            "{} priority {} outside band [{}, {}]",
            task,
            priority,
            band.min(),
            band.max()
        );
        let old_priority = rq.record(task).priority();
        let queued = rq.is_queued(task);

        if queued {
            self.dequeue_task(host, rq, task);
        }
        rq.record_mut(task).set_priority(priority);
        if queued {
            self.enqueue_task(host, rq, task);
        }

        self.prio_changed(host, rq, task, old_priority);
    }

    fn get_rr_interval(&self, _rq: &BandRunQueue, _task: TaskId) -> TimeSliceTicks {
        TimeSliceTicks(self.timeslice())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::collections::BTreeMap;
    use alloc::vec::Vec;

    /// Minimal host: one domain, explicit current task, recorded requests
    #[derive(Default)]
    struct MockHost {
        current: Option<TaskId>,
        resched: Vec<ReschedFlags>,
        count: isize,
        priorities: BTreeMap<TaskId, Priority>,
    }

    impl SchedHost for MockHost {
        fn running_task(&self, _domain: DomainId) -> Option<TaskId> {
            self.current
        }

        fn request_reschedule(&mut self, _domain: DomainId, reason: ReschedFlags) {
            self.resched.push(reason);
        }

        fn running_count_increment(&mut self, _domain: DomainId) {
            self.count += 1;
        }

        fn running_count_decrement(&mut self, _domain: DomainId) {
            self.count -= 1;
        }

        fn set_task_priority(&mut self, task: TaskId, priority: Priority) {
            self.priorities.insert(task, priority);
        }
    }

    fn setup(timeslice: u32, age_threshold: u32) -> (BandRoundRobinPolicy, BandRunQueue, MockHost) {
        let tunables = Arc::new(SchedTunables::new(timeslice, age_threshold).unwrap());
        let policy = BandRoundRobinPolicy::new(tunables);
        let rq = policy.init(DomainId::BSP);
        (policy, rq, MockHost::default())
    }

    fn admit(p: &BandRoundRobinPolicy, host: &mut MockHost, rq: &mut BandRunQueue, id: usize, prio: i32) {
        p.attach_task(rq, TaskId(id), Priority(prio));
        p.enqueue_task(host, rq, TaskId(id));
    }

    /// Pick the next task and make it current, like a host context switch
    fn switch(p: &BandRoundRobinPolicy, host: &mut MockHost, rq: &mut BandRunQueue) -> Option<usize> {
        if let Some(prev) = host.current {
            p.put_prev_task(rq, prev);
        }
        let next = p.pick_next_task(host, rq).next;
        host.current = next;
        host.resched.clear();
        next.map(|t| t.0)
    }

    fn queued(rq: &BandRunQueue, level: usize) -> Vec<usize> {
        rq.queued_at(level).map(|t| t.0).collect()
    }

    #[test]
    fn test_fifo_within_level() {
        let (p, mut rq, mut host) = setup(100, 300);
        for id in 1..=4 {
            admit(&p, &mut host, &mut rq, id, 132);
        }

        let order: Vec<_> = (0..4)
            .filter_map(|_| p.pick_next_task(&mut host, &mut rq).next)
            .map(|t| t.0)
            .collect();
        assert_eq!(order, [1, 2, 3, 4]);
        assert!(p.pick_next_task(&mut host, &mut rq).next.is_none());
        assert_eq!(rq.stats().idle_picks, 1);
    }

    #[test]
    fn test_more_urgent_level_wins() {
        let (p, mut rq, mut host) = setup(100, 300);
        admit(&p, &mut host, &mut rq, 1, 135);
        admit(&p, &mut host, &mut rq, 2, 133);
        admit(&p, &mut host, &mut rq, 3, 131);

        assert_eq!(switch(&p, &mut host, &mut rq), Some(3));
        p.dequeue_task(&mut host, &mut rq, TaskId(3));
        assert_eq!(switch(&p, &mut host, &mut rq), Some(2));
        assert_eq!(host.count, 2);
    }

    #[test]
    fn test_rotation_after_full_slice() {
        let (p, mut rq, mut host) = setup(100, 10_000);
        admit(&p, &mut host, &mut rq, 1, 131); // A
        admit(&p, &mut host, &mut rq, 2, 131); // B
        admit(&p, &mut host, &mut rq, 3, 133); // C

        assert_eq!(switch(&p, &mut host, &mut rq), Some(1));
        for _ in 0..99 {
            p.task_tick(&mut host, &mut rq, TaskId(1));
        }
        assert!(host.resched.is_empty());
        assert_eq!(rq.record(TaskId(1)).run_ticks(), 99);

        p.task_tick(&mut host, &mut rq, TaskId(1));
        assert_eq!(host.resched, [ReschedFlags::SLICE_EXPIRED]);
        assert_eq!(queued(&rq, 0), [2, 1]);
        // not reset until the next pick
        assert_eq!(rq.record(TaskId(1)).run_ticks(), 100);

        assert_eq!(switch(&p, &mut host, &mut rq), Some(2));
        assert_eq!(rq.record(TaskId(1)).run_ticks(), 0);
        assert_eq!(rq.nr_running(), 3);
    }

    #[test]
    fn test_lone_task_keeps_running_with_fresh_slice() {
        let (p, mut rq, mut host) = setup(3, 10_000);
        admit(&p, &mut host, &mut rq, 1, 134);
        assert_eq!(switch(&p, &mut host, &mut rq), Some(1));

        for _ in 0..3 {
            p.task_tick(&mut host, &mut rq, TaskId(1));
        }
        assert_eq!(switch(&p, &mut host, &mut rq), Some(1));
        assert_eq!(rq.record(TaskId(1)).run_ticks(), 0);
        assert!(!rq.is_queued(TaskId(1)));
    }

    #[test]
    fn test_equal_priority_arrival_waits_for_slice() {
        let (p, mut rq, mut host) = setup(10, 10_000);
        admit(&p, &mut host, &mut rq, 1, 132);
        switch(&p, &mut host, &mut rq);
        for _ in 0..5 {
            p.task_tick(&mut host, &mut rq, TaskId(1));
        }

        admit(&p, &mut host, &mut rq, 2, 132);
        p.check_preempt_curr(&mut host, &mut rq, TaskId(2));
        assert!(host.resched.is_empty());

        // a more urgent arrival always preempts
        admit(&p, &mut host, &mut rq, 3, 131);
        p.check_preempt_curr(&mut host, &mut rq, TaskId(3));
        assert_eq!(host.resched, [ReschedFlags::PREEMPT]);

        // a less urgent one never does
        host.resched.clear();
        admit(&p, &mut host, &mut rq, 4, 135);
        p.check_preempt_curr(&mut host, &mut rq, TaskId(4));
        assert!(host.resched.is_empty());
    }

    #[test]
    fn test_equal_priority_arrival_after_exhausted_slice() {
        let (p, mut rq, mut host) = setup(4, 10_000);
        admit(&p, &mut host, &mut rq, 1, 133);
        switch(&p, &mut host, &mut rq);
        for _ in 0..4 {
            p.task_tick(&mut host, &mut rq, TaskId(1));
        }
        host.resched.clear();

        admit(&p, &mut host, &mut rq, 2, 133);
        p.check_preempt_curr(&mut host, &mut rq, TaskId(2));
        assert_eq!(host.resched, [ReschedFlags::PREEMPT]);
    }

    #[test]
    fn test_shortened_slice_gives_way_to_equal_arrival() {
        let (p, mut rq, mut host) = setup(100, 10_000);
        admit(&p, &mut host, &mut rq, 1, 132);
        switch(&p, &mut host, &mut rq);
        for _ in 0..10 {
            p.task_tick(&mut host, &mut rq, TaskId(1));
        }

        // slice cut below the ticks already used, before the next tick
        p.tunables().set_timeslice(5).unwrap();
        admit(&p, &mut host, &mut rq, 2, 132);
        p.check_preempt_curr(&mut host, &mut rq, TaskId(2));
        assert_eq!(host.resched, [ReschedFlags::PREEMPT]);

        assert_eq!(switch(&p, &mut host, &mut rq), Some(2));
        assert_eq!(queued(&rq, 1), [1]);
        assert_eq!(rq.record(TaskId(1)).run_ticks(), 0);
    }

    #[test]
    fn test_blocked_task_with_spent_slice_starts_fresh() {
        let (p, mut rq, mut host) = setup(10, 10_000);
        admit(&p, &mut host, &mut rq, 1, 132);
        switch(&p, &mut host, &mut rq);
        for _ in 0..10 {
            p.task_tick(&mut host, &mut rq, TaskId(1));
        }

        // blocks before the host gets to switch it out
        p.dequeue_task(&mut host, &mut rq, TaskId(1));
        assert_eq!(switch(&p, &mut host, &mut rq), None);

        p.enqueue_task(&mut host, &mut rq, TaskId(1));
        assert_eq!(switch(&p, &mut host, &mut rq), Some(1));
        assert_eq!(rq.record(TaskId(1)).run_ticks(), 0);

        p.task_tick(&mut host, &mut rq, TaskId(1));
        assert!(host.resched.is_empty());
    }

    #[test]
    fn test_preempted_task_resumes_at_head() {
        let (p, mut rq, mut host) = setup(100, 10_000);
        admit(&p, &mut host, &mut rq, 1, 132);
        admit(&p, &mut host, &mut rq, 2, 132);
        switch(&p, &mut host, &mut rq);

        admit(&p, &mut host, &mut rq, 3, 131);
        p.check_preempt_curr(&mut host, &mut rq, TaskId(3));
        assert_eq!(switch(&p, &mut host, &mut rq), Some(3));
        assert_eq!(queued(&rq, 1), [1, 2]);

        p.dequeue_task(&mut host, &mut rq, TaskId(3));
        assert_eq!(switch(&p, &mut host, &mut rq), Some(1));
    }

    #[test]
    fn test_idle_domain_preempts_on_wake() {
        let (p, mut rq, mut host) = setup(100, 300);
        admit(&p, &mut host, &mut rq, 1, 135);
        p.check_preempt_curr(&mut host, &mut rq, TaskId(1));
        assert_eq!(host.resched, [ReschedFlags::PREEMPT]);
    }

    #[test]
    fn test_yield_moves_to_tail() {
        let (p, mut rq, mut host) = setup(100, 10_000);
        admit(&p, &mut host, &mut rq, 1, 134);
        admit(&p, &mut host, &mut rq, 2, 134);
        switch(&p, &mut host, &mut rq);
        p.task_tick(&mut host, &mut rq, TaskId(1));

        p.yield_task(&mut host, &mut rq);
        assert_eq!(host.resched, [ReschedFlags::YIELD]);
        assert_eq!(queued(&rq, 3), [2, 1]);
        assert_eq!(switch(&p, &mut host, &mut rq), Some(2));
        // partial slice is kept
        assert_eq!(rq.record(TaskId(1)).run_ticks(), 1);
    }

    #[test]
    fn test_priority_raise_requeues_running_task() {
        let (p, mut rq, mut host) = setup(100, 10_000);
        admit(&p, &mut host, &mut rq, 1, 133);
        admit(&p, &mut host, &mut rq, 2, 133);
        admit(&p, &mut host, &mut rq, 3, 135);
        switch(&p, &mut host, &mut rq);

        p.set_priority(&mut host, &mut rq, TaskId(3), Priority(134));
        assert_eq!(host.resched, [ReschedFlags::PRIORITY]);
        assert_eq!(queued(&rq, 2), [2, 1]);
        assert_eq!(queued(&rq, 3), [3]);
        assert_eq!(host.count, 3);
    }

    #[test]
    fn test_priority_drop_is_silent() {
        let (p, mut rq, mut host) = setup(100, 10_000);
        admit(&p, &mut host, &mut rq, 1, 131);
        admit(&p, &mut host, &mut rq, 2, 132);
        switch(&p, &mut host, &mut rq);

        p.set_priority(&mut host, &mut rq, TaskId(2), Priority(135));
        assert!(host.resched.is_empty());
        assert_eq!(rq.queued_level(TaskId(2)), Some(4));
    }

    #[test]
    fn test_aging_promotes_levels_below_runner() {
        let (p, mut rq, mut host) = setup(1_000, 5);
        admit(&p, &mut host, &mut rq, 1, 133); // runner
        admit(&p, &mut host, &mut rq, 2, 131);
        admit(&p, &mut host, &mut rq, 3, 134);
        admit(&p, &mut host, &mut rq, 4, 135);
        admit(&p, &mut host, &mut rq, 5, 135);
        p.dequeue_task(&mut host, &mut rq, TaskId(2));
        switch(&p, &mut host, &mut rq);
        assert_eq!(host.current, Some(TaskId(1)));
        p.enqueue_task(&mut host, &mut rq, TaskId(2));

        for _ in 0..4 {
            p.task_tick(&mut host, &mut rq, TaskId(1));
        }
        assert_eq!(rq.aging_ticks(), 4);
        p.task_tick(&mut host, &mut rq, TaskId(1));

        assert_eq!(rq.aging_ticks(), 0);
        assert_eq!(queued(&rq, 0), [2]);
        assert_eq!(queued(&rq, 2), [3]);
        assert_eq!(queued(&rq, 3), [4, 5]);
        assert!(queued(&rq, 4).is_empty());
        assert_eq!(rq.record(TaskId(3)).priority(), Priority(133));
        assert_eq!(host.priorities.get(&TaskId(5)), Some(&Priority(134)));
        assert_eq!(rq.stats().tasks_aged, 3);
    }

    #[test]
    fn test_aging_never_passes_runner_level() {
        let (p, mut rq, mut host) = setup(1_000, 1);
        admit(&p, &mut host, &mut rq, 1, 132);
        admit(&p, &mut host, &mut rq, 2, 135);
        switch(&p, &mut host, &mut rq);

        for _ in 0..10 {
            p.task_tick(&mut host, &mut rq, TaskId(1));
        }
        assert_eq!(rq.record(TaskId(2)).priority(), Priority(132));
        assert_eq!(rq.stats().aging_passes, 10);
    }

    #[test]
    fn test_aging_no_op_when_runner_at_lowest_level() {
        let (p, mut rq, mut host) = setup(1_000, 1);
        admit(&p, &mut host, &mut rq, 1, 135);
        admit(&p, &mut host, &mut rq, 2, 135);
        switch(&p, &mut host, &mut rq);

        p.task_tick(&mut host, &mut rq, TaskId(1));
        assert_eq!(queued(&rq, 4), [2]);
        assert_eq!(rq.stats().tasks_aged, 0);
    }

    #[test]
    fn test_tunable_change_applies_on_next_tick() {
        let (p, mut rq, mut host) = setup(100, 10_000);
        admit(&p, &mut host, &mut rq, 1, 131);
        admit(&p, &mut host, &mut rq, 2, 131);
        switch(&p, &mut host, &mut rq);
        for _ in 0..10 {
            p.task_tick(&mut host, &mut rq, TaskId(1));
        }

        p.tunables().set_timeslice(5).unwrap();
        assert_eq!(p.get_rr_interval(&rq, TaskId(1)), TimeSliceTicks(5));
        p.task_tick(&mut host, &mut rq, TaskId(1));
        assert_eq!(host.resched, [ReschedFlags::SLICE_EXPIRED]);
    }

    #[test]
    fn test_age_threshold_change_applies_on_next_tick() {
        let (p, mut rq, mut host) = setup(1_000, 10_000);
        admit(&p, &mut host, &mut rq, 1, 131);
        admit(&p, &mut host, &mut rq, 2, 135);
        switch(&p, &mut host, &mut rq);
        for _ in 0..3 {
            p.task_tick(&mut host, &mut rq, TaskId(1));
        }
        assert_eq!(rq.record(TaskId(2)).priority(), Priority(135));

        p.tunables().write("sched_band_rr_age_threshold", "4").unwrap();
        p.task_tick(&mut host, &mut rq, TaskId(1));
        assert_eq!(rq.record(TaskId(2)).priority(), Priority(134));
        assert_eq!(rq.aging_ticks(), 0);
        assert_eq!(rq.stats().aging_passes, 1);
    }

    #[test]
    fn test_custom_band() {
        let tunables = Arc::new(SchedTunables::new(1_000, 2).unwrap());
        let p = BandRoundRobinPolicy::new(tunables).with_band(PriorityBand::new(Priority(100)));
        let mut rq = p.init(DomainId::BSP);
        let mut host = MockHost::default();
        assert_eq!(rq.band().max(), Priority(104));

        admit(&p, &mut host, &mut rq, 1, 104);
        admit(&p, &mut host, &mut rq, 2, 100);
        assert_eq!(switch(&p, &mut host, &mut rq), Some(2));
        assert_eq!(queued(&rq, 4), [1]);

        p.task_tick(&mut host, &mut rq, TaskId(2));
        p.task_tick(&mut host, &mut rq, TaskId(2));
        assert_eq!(queued(&rq, 3), [1]);
        assert_eq!(host.priorities.get(&TaskId(1)), Some(&Priority(103)));
    }

    #[test]
    #[should_panic(expected = "outside band")]
    fn test_custom_band_rejects_reference_priorities() {
        let tunables = Arc::new(SchedTunables::default());
        let p = BandRoundRobinPolicy::new(tunables).with_band(PriorityBand::new(Priority(100)));
        let mut rq = p.init(DomainId::BSP);
        p.attach_task(&mut rq, TaskId(1), Priority(131));
    }

    #[test]
    #[should_panic(expected = "outside band")]
    fn test_set_priority_out_of_band_panics() {
        let (p, mut rq, mut host) = setup(100, 300);
        admit(&p, &mut host, &mut rq, 1, 133);
        p.set_priority(&mut host, &mut rq, TaskId(1), Priority(140));
    }

    #[test]
    fn test_switched_to_policy_choice() {
        let (p, mut rq, mut host) = setup(100, 10_000);
        let passive = BandRoundRobinPolicy::new(p.tunables().clone())
            .with_switch_in_policy(SwitchInPolicy::Passive);
        admit(&p, &mut host, &mut rq, 1, 134);
        switch(&p, &mut host, &mut rq);

        admit(&p, &mut host, &mut rq, 2, 131);
        passive.switched_to(&mut host, &mut rq, TaskId(2));
        assert!(host.resched.is_empty());

        p.switched_to(&mut host, &mut rq, TaskId(2));
        assert_eq!(host.resched, [ReschedFlags::PREEMPT]);
    }

    #[test]
    fn test_enqueue_dequeue_round_trip() {
        let (p, mut rq, mut host) = setup(100, 300);
        admit(&p, &mut host, &mut rq, 1, 133);
        let before: Vec<_> = (0..5).map(|l| queued(&rq, l)).collect();

        p.attach_task(&mut rq, TaskId(9), Priority(133));
        p.enqueue_task(&mut host, &mut rq, TaskId(9));
        p.dequeue_task(&mut host, &mut rq, TaskId(9));

        let after: Vec<_> = (0..5).map(|l| queued(&rq, l)).collect();
        assert_eq!(before, after);
        assert_eq!(rq.nr_running(), 1);
        assert_eq!(host.count, 1);
    }

    #[test]
    fn test_detach_runnable_task_dequeues_it() {
        let (p, mut rq, mut host) = setup(100, 300);
        admit(&p, &mut host, &mut rq, 1, 133);
        p.detach_task(&mut host, &mut rq, TaskId(1));
        assert!(!rq.is_attached(TaskId(1)));
        assert_eq!(rq.nr_running(), 0);
        assert_eq!(host.count, 0);
    }

    #[test]
    #[should_panic(expected = "double enqueue")]
    fn test_enqueue_of_runnable_task_panics() {
        let (p, mut rq, mut host) = setup(100, 300);
        admit(&p, &mut host, &mut rq, 1, 133);
        p.enqueue_task(&mut host, &mut rq, TaskId(1));
    }
}
