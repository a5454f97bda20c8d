//! Next-token counter.

/// Next token number to issue. Always >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Counter {
    next: u32,
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

impl Counter {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    /// Counter consistent with a ledger holding `len` records of the
    /// current epoch.
    pub fn from_ledger_len(len: usize) -> Self {
        let issued = u32::try_from(len).unwrap_or(u32::MAX - 1);
        Self { next: issued + 1 }
    }

    pub fn current(&self) -> u32 {
        self.next
    }

    /// Called exactly once per successful issuance.
    pub fn advance(&mut self) {
        self.next = self.next.saturating_add(1);
    }

    pub fn reset(&mut self) {
        self.next = 1;
    }
}
