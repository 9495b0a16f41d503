//! Delayed state transitions (respawns and round resets)

use std::collections::BTreeMap;

use tokio::time::Instant;

use super::ConnId;

/// A deferred arena transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    /// Bring a dead player back
    Respawn(ConnId),
    /// Reset every player and the coin set after a win
    GameReset,
}

/// Ordered set of pending tasks.
///
/// Entries are keyed by deadline plus an insertion counter, so tasks due at
/// the same instant run in the order they were scheduled.
#[derive(Debug, Default)]
pub struct Scheduler {
    entries: BTreeMap<(Instant, u64), Task>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, due: Instant, task: Task) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert((due, seq), task);
    }

    /// Drop every pending entry equal to `task`, returning how many were removed
    pub fn cancel(&mut self, task: Task) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, t| *t != task);
        before - self.entries.len()
    }

    /// Drop every pending respawn (a round reset revives everyone)
    pub fn cancel_respawns(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, t| !matches!(t, Task::Respawn(_)));
        before - self.entries.len()
    }

    pub fn is_pending(&self, task: Task) -> bool {
        self.entries.values().any(|t| *t == task)
    }

    /// Deadline of the earliest pending task
    pub fn next_due(&self) -> Option<Instant> {
        self.entries.keys().next().map(|(due, _)| *due)
    }

    /// Remove and return every task due at or before `now`, earliest first
    pub fn take_due(&mut self, now: Instant) -> Vec<Task> {
        let mut due = Vec::new();
        while let Some(entry) = self.entries.first_entry() {
            if entry.key().0 > now {
                break;
            }
            due.push(entry.remove());
        }
        due
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use uuid::Uuid;

    #[test]
    fn due_tasks_come_out_in_deadline_order() {
        let now = Instant::now();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(now + Duration::from_secs(5), Task::Respawn(a));
        scheduler.schedule(now + Duration::from_secs(2), Task::Respawn(b));
        scheduler.schedule(now + Duration::from_secs(9), Task::GameReset);

        assert_eq!(scheduler.next_due(), Some(now + Duration::from_secs(2)));
        assert!(scheduler.take_due(now + Duration::from_secs(1)).is_empty());
        assert_eq!(
            scheduler.take_due(now + Duration::from_secs(5)),
            vec![Task::Respawn(b), Task::Respawn(a)]
        );
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn same_deadline_keeps_insertion_order() {
        let now = Instant::now();
        let a = Uuid::new_v4();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(now, Task::GameReset);
        scheduler.schedule(now, Task::Respawn(a));
        assert_eq!(scheduler.take_due(now), vec![Task::GameReset, Task::Respawn(a)]);
    }

    #[test]
    fn cancel_removes_only_matching_entries() {
        let now = Instant::now();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut scheduler = Scheduler::new();
        scheduler.schedule(now, Task::Respawn(a));
        scheduler.schedule(now, Task::Respawn(b));
        scheduler.schedule(now, Task::GameReset);

        assert_eq!(scheduler.cancel(Task::Respawn(a)), 1);
        assert!(!scheduler.is_pending(Task::Respawn(a)));
        assert!(scheduler.is_pending(Task::Respawn(b)));

        assert_eq!(scheduler.cancel_respawns(), 1);
        assert_eq!(scheduler.take_due(now), vec![Task::GameReset]);
        assert!(scheduler.is_empty());
    }
}
