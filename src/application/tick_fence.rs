// Fencing tokens for overlapping tick fetches
use serde::Serialize;

/// Captured when a tick is issued, checked when its response is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TickTicket {
    pub generation: u64,
    pub sequence: u64,
}

/// The generation moves on every scheduler start, stop and rate change;
/// the sequence moves on every issued tick. A response is admitted only if
/// it belongs to the current generation and is newer than anything applied.
#[derive(Debug, Clone, Default)]
pub struct TickFence {
    generation: u64,
    next_sequence: u64,
    last_applied: u64,
}

impl TickFence {
    pub fn advance(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn issue(&mut self) -> TickTicket {
        self.next_sequence += 1;
        TickTicket {
            generation: self.generation,
            sequence: self.next_sequence,
        }
    }

    pub fn is_current(&self, ticket: TickTicket) -> bool {
        ticket.generation == self.generation && ticket.sequence > self.last_applied
    }

    /// Check and commit in one step.
    pub fn admit(&mut self, ticket: TickTicket) -> bool {
        if !self.is_current(ticket) {
            return false;
        }
        self.last_applied = ticket.sequence;
        true
    }

    /// Like `admit`, but for full refreshes, which are not owned by the
    /// scheduler and so survive generation changes. Only issuance order counts.
    pub fn admit_refresh(&mut self, ticket: TickTicket) -> bool {
        if ticket.sequence <= self.last_applied {
            return false;
        }
        self.last_applied = ticket.sequence;
        true
    }
}
