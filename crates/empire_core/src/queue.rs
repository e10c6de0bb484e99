//! FIFO job queues for construction, training and research.
//!
//! Each queue runs one job at a time: only the head entry's timer advances,
//! later entries keep their full `time_remaining` until they reach the head.
//! Completion side effects are applied by the engine; this module only
//! handles timing and ordering.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::data::{BuildingKind, TechKey, UnitKind};
use crate::error::{CommandError, CommandResult};
use crate::map::Coord;
use crate::math::{fixed_serde, Fixed};

/// The three independent queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum QueueKind {
    /// Building construction and upgrades.
    Construction,
    /// Troop training.
    Training,
    /// Technology research.
    Research,
}

impl QueueKind {
    /// All queues in tick order.
    pub const ALL: [Self; 3] = [Self::Construction, Self::Training, Self::Research];
}

impl fmt::Display for QueueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Construction => f.write_str("construction"),
            Self::Training => f.write_str("training"),
            Self::Research => f.write_str("research"),
        }
    }
}

/// What a queued job produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobPayload {
    /// Build or upgrade a building to `target_level`.
    Construction {
        /// Building type.
        building: BuildingKind,
        /// Level reached on completion.
        target_level: u8,
        /// Map cell of the building.
        position: Coord,
    },
    /// Train a batch of units.
    Training {
        /// Unit type.
        unit: UnitKind,
        /// Units added on completion.
        quantity: u32,
    },
    /// Research a technology.
    Research {
        /// Technology researched on completion.
        tech: TechKey,
    },
}

impl JobPayload {
    /// Queue this payload belongs to.
    #[must_use]
    pub const fn queue_kind(&self) -> QueueKind {
        match self {
            Self::Construction { .. } => QueueKind::Construction,
            Self::Training { .. } => QueueKind::Training,
            Self::Research { .. } => QueueKind::Research,
        }
    }
}

/// A pending job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueEntry {
    /// What the job produces.
    pub payload: JobPayload,
    /// Seconds left; never negative.
    #[serde(with = "fixed_serde")]
    pub time_remaining: Fixed,
    /// Full duration in seconds, for progress display.
    #[serde(with = "fixed_serde")]
    pub total_time: Fixed,
}

impl QueueEntry {
    /// Create a new entry with its full duration remaining.
    #[must_use]
    pub fn new(payload: JobPayload, duration: Fixed) -> Self {
        let duration = duration.max(Fixed::ZERO);
        Self {
            payload,
            time_remaining: duration,
            total_time: duration,
        }
    }

    /// Get progress as a percentage (0-100).
    #[must_use]
    pub fn percentage(&self) -> u32 {
        if self.total_time <= Fixed::ZERO {
            return 100;
        }
        let done = self
            .total_time
            .saturating_sub(self.time_remaining)
            .saturating_mul(Fixed::from_num(100))
            .saturating_div(self.total_time);
        done.saturating_to_num::<u32>().min(100)
    }
}

/// What happens to the time left over when a head entry completes mid-tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ResidualPolicy {
    /// Drop the leftover; at most one completion per queue per tick.
    #[default]
    Discard,
    /// Feed the leftover into the next head, possibly completing several.
    CarryForward,
}

/// A FIFO queue of jobs of one kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobQueue {
    kind: QueueKind,
    entries: VecDeque<QueueEntry>,
    max_len: usize,
}

impl JobQueue {
    /// Default maximum queue length.
    pub const DEFAULT_MAX_LEN: usize = 5;

    /// Create an empty queue.
    #[must_use]
    pub fn new(kind: QueueKind, max_len: usize) -> Self {
        Self {
            kind,
            entries: VecDeque::new(),
            max_len,
        }
    }

    /// Change the length limit. Existing entries are kept even if over it.
    pub fn set_max_len(&mut self, max_len: usize) {
        self.max_len = max_len;
    }

    /// Which queue this is.
    #[must_use]
    pub const fn kind(&self) -> QueueKind {
        self.kind
    }

    /// Check if the queue is full.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.max_len
    }

    /// Check if the queue is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of queued entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The active job.
    #[must_use]
    pub fn head(&self) -> Option<&QueueEntry> {
        self.entries.front()
    }

    /// All entries, head first.
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    /// Append an entry at the tail.
    ///
    /// Returns `Err` if the queue is full.
    pub fn push(&mut self, entry: QueueEntry) -> CommandResult<()> {
        if self.is_full() {
            return Err(CommandError::QueueFull(self.kind));
        }
        self.entries.push_back(entry);
        Ok(())
    }

    /// Advance the head entry by `delta` seconds.
    ///
    /// Returns the completed entries in completion order. With
    /// [`ResidualPolicy::Discard`] that is at most one entry and the next
    /// head is left untouched.
    pub fn advance(&mut self, delta: Fixed, policy: ResidualPolicy) -> Vec<QueueEntry> {
        let mut completed = Vec::new();
        let mut budget = delta.max(Fixed::ZERO);

        while let Some(head) = self.entries.front_mut() {
            head.time_remaining = head.time_remaining.saturating_sub(budget);
            if head.time_remaining > Fixed::ZERO {
                break;
            }

            let residual = -head.time_remaining;
            if let Some(mut done) = self.entries.pop_front() {
                done.time_remaining = Fixed::ZERO;
                completed.push(done);
            }

            match policy {
                ResidualPolicy::Discard => break,
                ResidualPolicy::CarryForward => budget = residual,
            }
        }

        completed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn training(quantity: u32, secs: i32) -> QueueEntry {
        QueueEntry::new(
            JobPayload::Training {
                unit: UnitKind::Spearman,
                quantity,
            },
            Fixed::from_num(secs),
        )
    }

    fn quantities(entries: &[QueueEntry]) -> Vec<u32> {
        entries
            .iter()
            .map(|e| match e.payload {
                JobPayload::Training { quantity, .. } => quantity,
                _ => 0,
            })
            .collect()
    }

    #[test]
    fn test_empty_queue_is_noop() {
        let mut queue = JobQueue::new(QueueKind::Training, 5);
        assert!(queue.advance(Fixed::from_num(100), ResidualPolicy::Discard).is_empty());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_only_head_advances() {
        let mut queue = JobQueue::new(QueueKind::Training, 5);
        queue.push(training(1, 10)).unwrap();
        queue.push(training(2, 20)).unwrap();

        assert!(queue.advance(Fixed::from_num(4), ResidualPolicy::Discard).is_empty());
        let remaining: Vec<Fixed> = queue.iter().map(|e| e.time_remaining).collect();
        assert_eq!(remaining, vec![Fixed::from_num(6), Fixed::from_num(20)]);
        assert_eq!(queue.head().unwrap().percentage(), 40);
    }

    #[test]
    fn test_discard_policy_drops_residual() {
        let mut queue = JobQueue::new(QueueKind::Training, 5);
        queue.push(training(1, 10)).unwrap();
        queue.push(training(2, 20)).unwrap();

        let done = queue.advance(Fixed::from_num(15), ResidualPolicy::Discard);
        assert_eq!(quantities(&done), vec![1]);
        assert_eq!(done[0].time_remaining, Fixed::ZERO);
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.head().unwrap().time_remaining, Fixed::from_num(20));
    }

    #[test]
    fn test_carry_forward_policy_uses_residual() {
        let mut queue = JobQueue::new(QueueKind::Training, 5);
        queue.push(training(1, 10)).unwrap();
        queue.push(training(2, 3)).unwrap();
        queue.push(training(3, 20)).unwrap();

        let done = queue.advance(Fixed::from_num(15), ResidualPolicy::CarryForward);
        assert_eq!(quantities(&done), vec![1, 2]);
        assert_eq!(queue.head().unwrap().time_remaining, Fixed::from_num(18));
    }

    #[test]
    fn test_exact_completion() {
        let mut queue = JobQueue::new(QueueKind::Training, 5);
        queue.push(training(1, 10)).unwrap();
        let done = queue.advance(Fixed::from_num(10), ResidualPolicy::Discard);
        assert_eq!(done.len(), 1);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_negative_delta_does_not_rewind() {
        let mut queue = JobQueue::new(QueueKind::Training, 5);
        queue.push(training(1, 10)).unwrap();
        queue.advance(Fixed::from_num(-5), ResidualPolicy::Discard);
        assert_eq!(queue.head().unwrap().time_remaining, Fixed::from_num(10));
    }

    #[test]
    fn test_queue_full() {
        let mut queue = JobQueue::new(QueueKind::Research, 2);
        queue.push(training(1, 1)).unwrap();
        queue.push(training(2, 1)).unwrap();
        assert!(queue.is_full());
        assert_eq!(
            queue.push(training(3, 1)),
            Err(CommandError::QueueFull(QueueKind::Research))
        );
    }

    #[test]
    fn test_completions_follow_start_order() {
        let mut queue = JobQueue::new(QueueKind::Training, 10);
        for (i, secs) in [7, 1, 5, 2].into_iter().enumerate() {
            queue.push(training(i as u32, secs)).unwrap();
        }

        let mut order = Vec::new();
        while !queue.is_empty() {
            order.extend(quantities(&queue.advance(Fixed::from_num(1), ResidualPolicy::Discard)));
        }
        assert_eq!(order, vec![0, 1, 2, 3]);
    }
}
