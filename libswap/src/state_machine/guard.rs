use crate::state_machine::error::LockError;
use std::cell::Cell;

/// A per-contract "currently executing" flag.
///
/// Every entry point that transfers funds enters the guard first. A token that calls back into the contract while a
/// transfer is in flight finds the flag set and is rejected before it can read or write any state.
#[derive(Debug, Default)]
pub struct ReentrancyGuard {
    entered: Cell<bool>,
}

impl ReentrancyGuard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self) -> Result<GuardedSection<'_>, LockError> {
        if self.entered.replace(true) {
            return Err(LockError::Reentrancy);
        }
        Ok(GuardedSection { entered: &self.entered })
    }

    pub fn is_entered(&self) -> bool {
        self.entered.get()
    }
}

/// Releases the guard when dropped, on every exit path.
#[must_use]
pub struct GuardedSection<'a> {
    entered: &'a Cell<bool>,
}

impl Drop for GuardedSection<'_> {
    fn drop(&mut self) {
        self.entered.set(false);
    }
}
