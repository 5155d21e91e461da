// Cancellable deferred work owned by one diagram session.
//
// What this does:
// - Holds at most one pending task per kind, each with a due time in host ms
// - Tags everything with an epoch; data change, query change and dispose
//   bump the epoch, which drops every pending task
// - A host callback carrying an old epoch is recognized as stale, so a tick
//   scheduled before a reload can never touch the new diagram

use log::debug;
use serde::Serialize;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub enum TaskKind {
    /// Force the simulation to settle when the wall-clock budget runs out.
    SimulationBudget,
    /// End of an animated transition; pending exits can be dropped.
    Transition,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TickOutcome {
    /// More ticks wanted.
    Continue,
    /// Nothing left to animate; the host may stop its frame loop.
    Settled,
    /// The tick belonged to an older epoch and was ignored.
    Cancelled,
}

impl TickOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Settled => "settled",
            Self::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
struct Task {
    kind: TaskKind,
    due_ms: f64,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    epoch: u64,
    tasks: Vec<Task>,
}

impl Scheduler {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_live(&self, epoch: u64) -> bool {
        epoch == self.epoch
    }

    /// Cancels everything and starts a new epoch.
    pub fn bump_epoch(&mut self) -> u64 {
        if !self.tasks.is_empty() {
            debug!("scheduler: epoch {} cancelled {} task(s)", self.epoch, self.tasks.len());
        }
        self.tasks.clear();
        self.epoch += 1;
        self.epoch
    }

    /// Schedules `kind` at `due_ms`, replacing a pending task of that kind.
    pub fn schedule(&mut self, kind: TaskKind, due_ms: f64) {
        self.cancel(kind);
        self.tasks.push(Task { kind, due_ms });
    }

    pub fn cancel(&mut self, kind: TaskKind) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.kind != kind);
        self.tasks.len() != before
    }

    pub fn cancel_all(&mut self) {
        self.tasks.clear();
    }

    pub fn is_scheduled(&self, kind: TaskKind) -> bool {
        self.tasks.iter().any(|t| t.kind == kind)
    }

    pub fn is_idle(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Removes and returns the tasks due at `now_ms`, earliest first.
    pub fn poll(&mut self, now_ms: f64) -> Vec<TaskKind> {
        let mut due: Vec<Task> = Vec::new();
        self.tasks.retain(|t| {
            if t.due_ms <= now_ms {
                due.push(*t);
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| a.due_ms.total_cmp(&b.due_ms));
        due.into_iter().map(|t| t.kind).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_poll_returns_due_tasks_once() {
        let mut s = Scheduler::default();
        s.schedule(TaskKind::SimulationBudget, 3000.0);
        s.schedule(TaskKind::Transition, 750.0);
        assert!(s.poll(500.0).is_empty());
        assert_eq!(s.poll(3000.0), vec![TaskKind::Transition, TaskKind::SimulationBudget]);
        assert!(s.poll(5000.0).is_empty());
        assert!(s.is_idle());
    }

    #[test]
    fn test_reschedule_replaces() {
        let mut s = Scheduler::default();
        s.schedule(TaskKind::SimulationBudget, 100.0);
        s.schedule(TaskKind::SimulationBudget, 900.0);
        assert!(s.poll(500.0).is_empty());
        assert_eq!(s.poll(900.0), vec![TaskKind::SimulationBudget]);
    }

    #[test]
    fn test_epoch_bump_cancels() {
        let mut s = Scheduler::default();
        let old = s.epoch();
        s.schedule(TaskKind::Transition, 10.0);
        let new = s.bump_epoch();
        assert_ne!(old, new);
        assert!(!s.is_live(old));
        assert!(s.is_live(new));
        assert!(s.poll(1e9).is_empty());
    }

    #[test]
    fn test_cancel_single_kind() {
        let mut s = Scheduler::default();
        s.schedule(TaskKind::Transition, 10.0);
        s.schedule(TaskKind::SimulationBudget, 10.0);
        assert!(s.cancel(TaskKind::Transition));
        assert!(!s.cancel(TaskKind::Transition));
        assert!(s.is_scheduled(TaskKind::SimulationBudget));
    }
}
