//! The fungible-token interface the swap lock moves funds through.
//!
//! The swap contract never inspects token internals. It calls [`Erc20::transfer`] / [`Erc20::transfer_from`] and
//! treats a `false` return as a failed transfer. Implementations may call back into the contract, which is why the lock
//! guards every entry point that transfers.

use crate::address::Address;
use crate::error::ErrorKind;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransferError {
    #[error("The token refused to transfer {amount} to {to}.")]
    Rejected { to: Address, amount: u128 },
    #[error("The token refused to pull {amount} from {from}.")]
    PullRejected { from: Address, amount: u128 },
}

impl TransferError {
    pub fn kind(&self) -> ErrorKind {
        ErrorKind::TransferFailure
    }
}

pub trait Erc20 {
    /// The token contract's own address. Never the zero address for a real token.
    fn address(&self) -> Address;

    /// Moves `amount` from `caller` to `to`.
    fn transfer(&self, caller: Address, to: Address, amount: u128) -> bool;

    /// Moves `amount` from `from` to `to` on the authority of `caller`.
    fn transfer_from(&self, caller: Address, from: Address, to: Address, amount: u128) -> bool;

    fn balance_of(&self, owner: Address) -> u128;
}

#[cfg(any(test, feature = "mocks"))]
pub use mock::{InMemoryToken, TransferHook};

#[cfg(any(test, feature = "mocks"))]
mod mock {
    use super::Erc20;
    use crate::address::Address;
    use log::*;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// Called after a successful transfer, with the transfer's `to` and `amount`. Lets tests act as a malicious token
    /// that calls back into the contract mid-transfer.
    pub type TransferHook = Box<dyn Fn(Address, u128)>;

    /// A simple balance ledger. Allowances are not modelled: `transfer_from` succeeds whenever `from` has the funds.
    pub struct InMemoryToken {
        address: Address,
        balances: RefCell<HashMap<Address, u128>>,
        fail_transfers: Cell<bool>,
        hook: RefCell<Option<TransferHook>>,
    }

    impl InMemoryToken {
        pub fn new(address: Address) -> Self {
            InMemoryToken {
                address,
                balances: RefCell::new(HashMap::new()),
                fail_transfers: Cell::new(false),
                hook: RefCell::new(None),
            }
        }

        pub fn mint(&self, owner: Address, amount: u128) {
            *self.balances.borrow_mut().entry(owner).or_default() += amount;
        }

        /// When set, every subsequent transfer returns `false` without moving funds.
        pub fn set_fail_transfers(&self, fail: bool) {
            self.fail_transfers.set(fail);
        }

        pub fn set_hook(&self, hook: TransferHook) {
            *self.hook.borrow_mut() = Some(hook);
        }

        fn move_funds(&self, from: Address, to: Address, amount: u128) -> bool {
            if self.fail_transfers.get() {
                debug!("Mock token refusing transfer of {amount} from {from} to {to}");
                return false;
            }
            {
                let mut balances = self.balances.borrow_mut();
                let available = balances.get(&from).copied().unwrap_or_default();
                if available < amount {
                    return false;
                }
                balances.insert(from, available - amount);
                *balances.entry(to).or_default() += amount;
            }
            // The ledger borrow is released before the hook so that re-entrant calls can transfer
            if let Some(hook) = self.hook.borrow().as_ref() {
                hook(to, amount);
            }
            true
        }
    }

    impl Erc20 for InMemoryToken {
        fn address(&self) -> Address {
            self.address
        }

        fn transfer(&self, caller: Address, to: Address, amount: u128) -> bool {
            self.move_funds(caller, to, amount)
        }

        fn transfer_from(&self, _caller: Address, from: Address, to: Address, amount: u128) -> bool {
            self.move_funds(from, to, amount)
        }

        fn balance_of(&self, owner: Address) -> u128 {
            self.balances.borrow().get(&owner).copied().unwrap_or_default()
        }
    }
}
