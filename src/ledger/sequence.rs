//! Ordering for concurrent balance refreshes.
//!
//! Each refresh takes a ticket before it starts. A response is applied only if
//! its ticket is newer than the last applied one, so a slow stale response can
//! never overwrite a fresher balance.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use super::TokenBalance;

/// Sequence stamp for one in-flight request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

#[derive(Debug, Default)]
struct Applied {
    sequence: u64,
    balance: Option<TokenBalance>,
}

/// Latest-wins balance holder.
#[derive(Debug, Default)]
pub struct BalanceTracker {
    issued: AtomicU64,
    applied: Mutex<Applied>,
}

impl BalanceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for a new request.
    pub fn begin(&self) -> RequestTicket {
        RequestTicket(self.issued.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Apply a response. Returns false if a newer response was already applied.
    pub fn apply(&self, ticket: RequestTicket, balance: TokenBalance) -> bool {
        let mut applied = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
        if ticket.0 <= applied.sequence {
            tracing::debug!(
                "Discarding stale balance response {} (applied {})",
                ticket.0,
                applied.sequence
            );
            return false;
        }
        applied.sequence = ticket.0;
        applied.balance = Some(balance);
        true
    }

    /// Whether a response for this ticket would still be applied.
    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        let applied = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
        ticket.0 > applied.sequence
    }

    pub fn latest(&self) -> Option<TokenBalance> {
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .balance
            .clone()
    }

    pub fn last_applied(&self) -> u64 {
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .sequence
    }

    /// Drop the balance and invalidate every ticket issued so far.
    pub fn reset(&self) {
        let mut applied = self.applied.lock().unwrap_or_else(PoisonError::into_inner);
        applied.sequence = self.issued.load(Ordering::SeqCst);
        applied.balance = None;
    }
}
