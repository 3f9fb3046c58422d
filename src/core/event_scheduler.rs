use super::event::Wakeup;
use super::types::{ProcessId, SimulationTime};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug)]
pub struct ScheduledWakeup {
    pub time: SimulationTime,
    pub sequence_num: u64,
    pub process_id: ProcessId,
}

impl PartialEq for ScheduledWakeup {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScheduledWakeup {}

impl PartialOrd for ScheduledWakeup {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScheduledWakeup {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap (BinaryHeap is max-heap by default)
        other
            .time
            .total_cmp(&self.time)
            .then_with(|| other.sequence_num.cmp(&self.sequence_num))
    }
}

/// Pending wake-ups ordered by time, FIFO among equal times
pub struct EventScheduler {
    event_queue: BinaryHeap<ScheduledWakeup>,
    sequence_counter: u64,
}

impl EventScheduler {
    /// Create a new EventScheduler
    pub fn new() -> Self {
        Self {
            event_queue: BinaryHeap::new(),
            sequence_counter: 0,
        }
    }

    /// Schedule a process to resume at an absolute time
    pub fn schedule(&mut self, process_id: ProcessId, at_time: SimulationTime) {
        let scheduled = ScheduledWakeup {
            time: at_time,
            sequence_num: self.sequence_counter,
            process_id,
        };

        self.event_queue.push(scheduled);
        self.sequence_counter += 1;
    }

    /// Remove and return the earliest pending wake-up
    pub fn pop_next(&mut self) -> Option<Wakeup> {
        self.event_queue
            .pop()
            .map(|scheduled| Wakeup::new(scheduled.time, scheduled.process_id))
    }

    /// Check if there are any wake-ups remaining in the queue
    pub fn has_events(&self) -> bool {
        !self.event_queue.is_empty()
    }

    /// Get the time of the next wake-up without removing it
    pub fn peek_next_time(&self) -> Option<SimulationTime> {
        self.event_queue.peek().map(|scheduled| scheduled.time)
    }

    pub fn len(&self) -> usize {
        self.event_queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.event_queue.is_empty()
    }
}

impl Default for EventScheduler {
    fn default() -> Self {
        Self::new()
    }
}
