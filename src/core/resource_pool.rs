use super::errors::SimulationError;
use super::types::{PoolKind, ProcessId, SimulationTime};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, VecDeque};

/// Handle for one request against a pool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ticket {
    pool: PoolKind,
    id: u64,
}

impl Ticket {
    pub fn pool(&self) -> PoolKind {
        self.pool
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

impl std::fmt::Display for Ticket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.pool, self.id)
    }
}

/// Result of `ResourcePool::request`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    /// A slot was free; the ticket is already active
    Granted(Ticket),
    /// The pool is full; the ticket waits in the FIFO queue
    Queued(Ticket),
}

impl RequestOutcome {
    pub fn ticket(&self) -> Ticket {
        match self {
            RequestOutcome::Granted(ticket) | RequestOutcome::Queued(ticket) => *ticket,
        }
    }

    pub fn is_granted(&self) -> bool {
        matches!(self, RequestOutcome::Granted(_))
    }
}

#[derive(Debug, Clone, Copy)]
struct Waiter {
    ticket_id: u64,
    owner: ProcessId,
}

/// One monitor sample of a pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSnapshot {
    pub time: SimulationTime,
    pub pool: PoolKind,
    pub occupancy: usize,
    pub capacity: usize,
    pub queue_length: usize,
    pub utilization: f64,
    pub all_busy: bool,
}

/// Capacity-bounded pool granting waiters strictly in request order
#[derive(Debug, Clone)]
pub struct ResourcePool {
    kind: PoolKind,
    capacity: usize,
    active: BTreeSet<u64>,
    queue: VecDeque<Waiter>,
    next_ticket: u64,
    total_requests: u64,
}

impl ResourcePool {
    pub fn new(kind: PoolKind, capacity: usize) -> Result<Self, SimulationError> {
        if capacity == 0 {
            return Err(SimulationError::InvalidConfiguration(format!(
                "{} pool capacity must be at least 1",
                kind
            )));
        }
        Ok(Self {
            kind,
            capacity,
            active: BTreeSet::new(),
            queue: VecDeque::new(),
            next_ticket: 0,
            total_requests: 0,
        })
    }

    pub fn kind(&self) -> PoolKind {
        self.kind
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots held by active tickets
    pub fn occupancy(&self) -> usize {
        self.active.len()
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_full(&self) -> bool {
        self.occupancy() >= self.capacity
    }

    pub fn total_requests(&self) -> u64 {
        self.total_requests
    }

    pub fn is_active(&self, ticket: Ticket) -> bool {
        ticket.pool == self.kind && self.active.contains(&ticket.id)
    }

    /// Request a slot on behalf of `owner`.
    ///
    /// A free slot is granted at once. Otherwise the ticket joins the back of
    /// the queue and `owner` is returned from a later `release` when the slot
    /// is handed to it.
    pub fn request(&mut self, owner: ProcessId) -> RequestOutcome {
        let ticket = Ticket {
            pool: self.kind,
            id: self.next_ticket,
        };
        self.next_ticket += 1;
        self.total_requests += 1;

        if self.queue.is_empty() && !self.is_full() {
            self.active.insert(ticket.id);
            debug!(
                "[Pool:{}] Granted {} to {} (occupancy: {}/{})",
                self.kind, ticket, owner, self.occupancy(), self.capacity
            );
            RequestOutcome::Granted(ticket)
        } else {
            self.queue.push_back(Waiter {
                ticket_id: ticket.id,
                owner,
            });
            debug!(
                "[Pool:{}] Queued {} for {} (queue: {})",
                self.kind, ticket, owner, self.queue.len()
            );
            RequestOutcome::Queued(ticket)
        }
    }

    /// Release an active ticket.
    ///
    /// If someone is waiting, the freed slot goes straight to the head of the
    /// queue and that waiter's owner is returned so it can be resumed.
    pub fn release(&mut self, ticket: Ticket) -> Result<Option<ProcessId>, SimulationError> {
        if ticket.pool != self.kind || !self.active.remove(&ticket.id) {
            return Err(SimulationError::protocol(
                format!("ticket {}", ticket),
                "inactive",
                format!("release on {} pool of a ticket that is not active", self.kind),
            ));
        }

        match self.queue.pop_front() {
            Some(waiter) => {
                self.active.insert(waiter.ticket_id);
                debug!(
                    "[Pool:{}] Handed slot from {} to {}#{} ({})",
                    self.kind, ticket, self.kind, waiter.ticket_id, waiter.owner
                );
                Ok(Some(waiter.owner))
            }
            None => {
                debug!(
                    "[Pool:{}] Released {} (occupancy: {}/{})",
                    self.kind, ticket, self.occupancy(), self.capacity
                );
                Ok(None)
            }
        }
    }

    pub fn snapshot(&self, time: SimulationTime) -> PoolSnapshot {
        let occupancy = self.occupancy();
        PoolSnapshot {
            time,
            pool: self.kind,
            occupancy,
            capacity: self.capacity,
            queue_length: self.queue.len(),
            utilization: occupancy as f64 / self.capacity as f64,
            all_busy: occupancy == self.capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner(raw: u64) -> ProcessId {
        ProcessId::new(raw)
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = ResourcePool::new(PoolKind::Theatre, 0).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_grants_until_full_then_queues() {
        let mut pool = ResourcePool::new(PoolKind::Preparation, 2).unwrap();

        assert!(pool.request(owner(1)).is_granted());
        assert!(pool.request(owner(2)).is_granted());
        let third = pool.request(owner(3));

        assert!(!third.is_granted());
        assert!(!pool.is_active(third.ticket()));
        assert_eq!(pool.occupancy(), 2);
        assert_eq!(pool.queue_len(), 1);
        assert!(pool.is_full());
    }

    #[test]
    fn test_release_hands_slot_to_head_waiter() {
        let mut pool = ResourcePool::new(PoolKind::Recovery, 1).unwrap();
        let first = pool.request(owner(1)).ticket();
        let second = pool.request(owner(2)).ticket();

        let woken = pool.release(first).unwrap();

        assert_eq!(woken, Some(owner(2)));
        assert!(pool.is_active(second));
        assert_eq!(pool.occupancy(), 1);
        assert_eq!(pool.queue_len(), 0);
    }

    #[test]
    fn test_waiters_are_served_in_request_order() {
        let mut pool = ResourcePool::new(PoolKind::Theatre, 1).unwrap();
        let mut held = pool.request(owner(0)).ticket();
        let queued: Vec<Ticket> = (1..=4).map(|i| pool.request(owner(i)).ticket()).collect();

        let mut served = Vec::new();
        for expected in &queued {
            let woken = pool.release(held).unwrap().unwrap();
            assert!(pool.is_active(*expected));
            served.push(woken.raw());
            held = *expected;
        }

        assert_eq!(served, vec![1, 2, 3, 4]);
        assert_eq!(pool.release(held).unwrap(), None);
        assert_eq!(pool.occupancy(), 0);
    }

    #[test]
    fn test_newcomer_does_not_overtake_queue() {
        let mut pool = ResourcePool::new(PoolKind::Recovery, 1).unwrap();
        let held = pool.request(owner(1)).ticket();
        let waiting = pool.request(owner(2)).ticket();

        // Slot moves to the waiter, so a later request still has to queue
        pool.release(held).unwrap();
        let late = pool.request(owner(3));

        assert!(pool.is_active(waiting));
        assert!(!late.is_granted());
    }

    #[test]
    fn test_double_release_is_protocol_error() {
        let mut pool = ResourcePool::new(PoolKind::Preparation, 1).unwrap();
        let ticket = pool.request(owner(1)).ticket();
        pool.release(ticket).unwrap();

        let err = pool.release(ticket).unwrap_err();
        assert!(err.is_protocol());
    }

    #[test]
    fn test_release_of_queued_ticket_is_protocol_error() {
        let mut pool = ResourcePool::new(PoolKind::Preparation, 1).unwrap();
        pool.request(owner(1));
        let queued = pool.request(owner(2)).ticket();

        assert!(pool.release(queued).unwrap_err().is_protocol());
        assert_eq!(pool.queue_len(), 1);
    }

    #[test]
    fn test_foreign_ticket_rejected() {
        let mut theatre = ResourcePool::new(PoolKind::Theatre, 1).unwrap();
        let mut recovery = ResourcePool::new(PoolKind::Recovery, 1).unwrap();
        let ticket = theatre.request(owner(1)).ticket();
        recovery.request(owner(2));

        assert!(recovery.release(ticket).unwrap_err().is_protocol());
        assert_eq!(recovery.occupancy(), 1);
    }

    #[test]
    fn test_snapshot_reports_utilization() {
        let mut pool = ResourcePool::new(PoolKind::Recovery, 2).unwrap();
        pool.request(owner(1));
        let half = pool.snapshot(60.0);
        assert_eq!(half.occupancy, 1);
        assert!((half.utilization - 0.5).abs() < 1e-12);
        assert!(!half.all_busy);

        pool.request(owner(2));
        pool.request(owner(3));
        let full = pool.snapshot(120.0);
        assert!(full.all_busy);
        assert_eq!(full.queue_length, 1);
        assert!((full.utilization - 1.0).abs() < 1e-12);
    }
}
