/*
 * Level Queue Set
 *
 * One FIFO per priority level of the band. Each FIFO is a doubly linked
 * list threaded through a side map keyed by TaskId, so pushing, popping the
 * head and unlinking an arbitrary member never scan a queue.
 *
 * A task is linked into at most one level at a time; `push_back` and
 * `push_front` assert this.
 */

use alloc::collections::BTreeMap;

use super::types::{TaskId, LEVELS};

#[derive(Debug, Clone, Copy)]
struct Link {
    level: usize,
    prev: Option<TaskId>,
    next: Option<TaskId>,
}

#[derive(Debug, Clone, Copy, Default)]
struct Ends {
    head: Option<TaskId>,
    tail: Option<TaskId>,
    len: usize,
}

/// Array of `LEVELS` FIFO queues of task IDs
#[derive(Debug, Default)]
pub struct LevelQueueSet {
    ends: [Ends; LEVELS],
    links: BTreeMap<TaskId, Link>,
}

impl LevelQueueSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `task` at the tail of `level`
    pub fn push_back(&mut self, level: usize, task: TaskId) {
        self.check_insert(level, task);

        let old_tail = self.ends[level].tail;
        self.links.insert(
            task,
            Link {
                level,
                prev: old_tail,
                next: None,
            },
        );
        match old_tail {
            Some(tail) => self.link_mut(tail).next = Some(task),
            None => self.ends[level].head = Some(task),
        }
        self.ends[level].tail = Some(task);
        self.ends[level].len += 1;
    }

    /// Insert `task` at the head of `level`
    pub fn push_front(&mut self, level: usize, task: TaskId) {
        self.check_insert(level, task);

        let old_head = self.ends[level].head;
        self.links.insert(
            task,
            Link {
                level,
                prev: None,
                next: old_head,
            },
        );
        match old_head {
            Some(head) => self.link_mut(head).prev = Some(task),
            None => self.ends[level].tail = Some(task),
        }
        self.ends[level].head = Some(task);
        self.ends[level].len += 1;
    }

    /// Remove and return the oldest task of `level`
    pub fn pop_front(&mut self, level: usize) -> Option<TaskId> {
        let head = self.ends.get(level)?.head?;
        self.remove(head);
        Some(head)
    }

    /// Oldest task of `level`, without removing it
    pub fn front(&self, level: usize) -> Option<TaskId> {
        self.ends.get(level)?.head
    }

    /// Unlink `task` from whichever level holds it
    ///
    /// Returns the level it was removed from, or None if it was not queued.
    pub fn remove(&mut self, task: TaskId) -> Option<usize> {
        let link = self.links.remove(&task)?;

        match link.prev {
            Some(prev) => self.link_mut(prev).next = link.next,
            None => self.ends[link.level].head = link.next,
        }
        match link.next {
            Some(next) => self.link_mut(next).prev = link.prev,
            None => self.ends[link.level].tail = link.prev,
        }
        self.ends[link.level].len -= 1;

        Some(link.level)
    }

    /// Level currently holding `task`
    pub fn level_of(&self, task: TaskId) -> Option<usize> {
        self.links.get(&task).map(|link| link.level)
    }

    pub fn contains(&self, task: TaskId) -> bool {
        self.links.contains_key(&task)
    }

    pub fn len(&self, level: usize) -> usize {
        self.ends.get(level).map_or(0, |ends| ends.len)
    }

    /// Number of queued tasks across all levels
    pub fn total_len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// Most urgent level with at least one queued task
    pub fn first_non_empty(&self) -> Option<usize> {
        self.ends.iter().position(|ends| ends.head.is_some())
    }

    /// Tasks of `level` in queue order (oldest first)
    pub fn iter(&self, level: usize) -> LevelIter<'_> {
        LevelIter {
            set: self,
            cursor: self.front(level),
        }
    }

    fn check_insert(&self, level: usize, task: TaskId) {
        assert!(level < LEVELS, "level {} outside band of {} levels", level, LEVELS);
        if let Some(existing) = self.level_of(task) {
            panic!("{} already queued at level {}", task, existing);
        }
    }

    fn link_mut(&mut self, task: TaskId) -> &mut Link {
        match self.links.get_mut(&task) {
            Some(link) => link,
            None => panic!("level queue corrupted: {} linked but not present", task),
        }
    }
}

/// Iterator over one level, head to tail
pub struct LevelIter<'a> {
    set: &'a LevelQueueSet,
    cursor: Option<TaskId>,
}

impl Iterator for LevelIter<'_> {
    type Item = TaskId;

    fn next(&mut self) -> Option<TaskId> {
        let current = self.cursor?;
        self.cursor = self.set.links.get(&current).and_then(|link| link.next);
        Some(current)
    }
}
