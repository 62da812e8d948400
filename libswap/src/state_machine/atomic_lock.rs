//! The hashlocked, timelocked swap contract.
//!
//! An [`AtomicLock`] holds a deposit until either the unlocker publishes the preimage of the hashlock (and waits out
//! the grace period) or the lock time passes with the secret still unrevealed and the depositor takes the funds back.
//! Deployment is gated on a DLEQ proof tying the hashlock to the adaptor point `T`, so publishing the preimage is
//! exactly what hands the depositor the adaptor scalar on the other chain.
//!
//! Each entry point runs to completion. State is written before any token transfer and restored from a snapshot if the
//! transfer fails, so a failed call leaves no trace.

use crate::address::Address;
use crate::config::SwapConfig;
use crate::cryptography::curve::CurveGroup;
use crate::cryptography::dleq::{DleqVerificationInput, DleqVerifier};
use crate::cryptography::hashes::Hashlock;
use crate::cryptography::secret::SwapSecret;
use crate::helpers::Timestamp;
use crate::state_machine::error::LockError;
use crate::state_machine::events::{EventSink, SwapEvent};
use crate::state_machine::guard::ReentrancyGuard;
use crate::state_machine::lifecycle::LockStage;
use crate::token::{Erc20, TransferError};
use log::*;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;
use std::time::Duration;

/// Who is calling, and the settlement layer's clock at the time of the call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    pub caller: Address,
    pub timestamp: Timestamp,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: Timestamp) -> Self {
        CallContext { caller, timestamp }
    }
}

/// Everything the depositor submits at deployment besides the token itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeployParams {
    /// The DLEQ proof material. Its hashlock becomes the lock's hashlock.
    pub verification: DleqVerificationInput,
    pub lock_until: Timestamp,
    pub amount: u128,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct LockState {
    stage: LockStage,
    unlocker: Option<Address>,
    secret_revealed: bool,
    unlocked: bool,
    claimable_after: Option<Timestamp>,
    revealed_secret: Option<SwapSecret>,
}

impl LockState {
    fn locked() -> Self {
        LockState {
            stage: LockStage::Locked,
            unlocker: None,
            secret_revealed: false,
            unlocked: false,
            claimable_after: None,
            revealed_secret: None,
        }
    }
}

pub struct AtomicLock<C: CurveGroup> {
    address: Address,
    depositor: Address,
    hashlock: Hashlock,
    adaptor_point: C::Point,
    second_point: C::Point,
    lock_until: Timestamp,
    token: Option<Rc<dyn Erc20>>,
    amount: u128,
    grace_period: Duration,
    state: RefCell<LockState>,
    guard: ReentrancyGuard,
    events: Rc<dyn EventSink>,
}

impl<C: CurveGroup> AtomicLock<C> {
    /// The address a lock deployed by `depositor` with these parameters receives.
    pub fn derive_address(depositor: &Address, hashlock: &Hashlock, lock_until: Timestamp) -> Address {
        Address::derive(&[depositor.as_bytes(), hashlock.as_bytes(), &lock_until.as_secs().to_le_bytes()])
    }

    /// Verifies the proof, checks the parameters and takes the deposit. Nothing exists if any step fails.
    ///
    /// `token` is `None` for a lock that holds no funds (the zero-address token). The amount must then be zero.
    pub fn deploy(
        ctx: &CallContext,
        params: DeployParams,
        token: Option<Rc<dyn Erc20>>,
        config: &SwapConfig,
        events: Rc<dyn EventSink>,
    ) -> Result<Self, LockError> {
        config.validate().map_err(|e| LockError::InvalidConfig(e.to_string()))?;
        let depositor = ctx.caller;
        let hashlock = params.verification.hashlock;
        let address = Self::derive_address(&depositor, &hashlock, params.lock_until);

        let verified = match DleqVerifier::<C>::verify(&params.verification) {
            Ok(verified) => verified,
            Err(e) => {
                warn!("Refusing to deploy swap lock {address}: {e}");
                events.emit(SwapEvent::ProofVerificationFailed { address, hashlock, reason: e.to_string() });
                return Err(e.into());
            }
        };
        if params.lock_until <= ctx.timestamp {
            return Err(LockError::LockTimeNotInFuture { lock_until: params.lock_until, now: ctx.timestamp });
        }
        if hashlock.is_zero() {
            return Err(LockError::ZeroHashlock);
        }
        match &token {
            None if params.amount != 0 => return Err(LockError::AmountWithoutToken(params.amount)),
            Some(_) if params.amount == 0 => return Err(LockError::ZeroAmount),
            Some(t) if t.address().is_zero() => return Err(LockError::ZeroTokenAddress),
            _ => {}
        }
        if let Some(t) = &token {
            if !t.transfer_from(address, depositor, address, params.amount) {
                return Err(TransferError::PullRejected { from: depositor, amount: params.amount }.into());
            }
        }

        info!("Swap lock {address} deployed by {depositor}: {} locked until {}", params.amount, params.lock_until);
        events.emit(SwapEvent::Deployed {
            address,
            depositor,
            hashlock,
            lock_until: params.lock_until,
            amount: params.amount,
        });
        Ok(AtomicLock {
            address,
            depositor,
            hashlock,
            adaptor_point: *verified.adaptor_point(),
            second_point: *verified.second_point(),
            lock_until: params.lock_until,
            token,
            amount: params.amount,
            grace_period: config.grace_period(),
            state: RefCell::new(LockState::locked()),
            guard: ReentrancyGuard::new(),
            events,
        })
    }

    /// Publishes the secret. Returns `Ok(false)`, changing nothing, if it does not open the hashlock.
    ///
    /// No funds move. The caller becomes the unlocker and may claim once the grace period has passed.
    pub fn reveal_secret(&self, ctx: &CallContext, secret: &SwapSecret) -> Result<bool, LockError> {
        let _section = self.guard.enter()?;
        let stage = self.stage();
        if stage != LockStage::Locked {
            return Err(LockError::invalid_stage_for("reveal_secret", stage));
        }
        if !self.hashlock.matches(secret.as_bytes()) {
            debug!("Swap lock {}: revealed secret does not match the hashlock", self.address);
            return Ok(false);
        }
        let claimable_after = ctx.timestamp.checked_add(self.grace_period).ok_or(LockError::TimestampOverflow)?;
        {
            let mut state = self.state.borrow_mut();
            state.secret_revealed = true;
            state.unlocker = Some(ctx.caller);
            state.claimable_after = Some(claimable_after);
            state.revealed_secret = Some(secret.clone());
            state.stage = LockStage::SecretRevealed;
        }
        info!("Swap lock {}: secret revealed by {}, claimable after {claimable_after}", self.address, ctx.caller);
        self.events.emit(SwapEvent::SecretRevealed {
            address: self.address,
            revealer: ctx.caller,
            secret: secret.clone(),
            claimable_after,
        });
        Ok(true)
    }

    /// Pays the deposit to the unlocker once the grace period after the reveal has passed.
    pub fn claim_tokens(&self, ctx: &CallContext) -> Result<(), LockError> {
        let _section = self.guard.enter()?;
        let snapshot = self.state.borrow().clone();
        if snapshot.stage != LockStage::SecretRevealed || !snapshot.secret_revealed {
            return Err(LockError::invalid_stage_for("claim_tokens", snapshot.stage));
        }
        let unlocker = match snapshot.unlocker {
            Some(unlocker) if unlocker == ctx.caller => unlocker,
            _ => return Err(LockError::Unauthorized { operation: "claim_tokens", caller: ctx.caller }),
        };
        let claimable_after =
            snapshot.claimable_after.ok_or(LockError::invalid_stage_for("claim_tokens", snapshot.stage))?;
        if ctx.timestamp < claimable_after {
            let now = ctx.timestamp;
            return Err(LockError::TimelockActive { operation: "claim_tokens", until: claimable_after, now });
        }
        {
            let mut state = self.state.borrow_mut();
            state.unlocked = true;
            state.stage = LockStage::Claimed;
        }
        self.pay_out_or_restore(unlocker, snapshot)?;
        info!("Swap lock {}: {} claimed by {unlocker}", self.address, self.amount);
        self.events.emit(SwapEvent::TokensClaimed {
            address: self.address,
            claimer: unlocker,
            amount: self.amount,
            timestamp: ctx.timestamp,
        });
        Ok(())
    }

    /// The single-step unlock: checks the secret and pays out immediately, without a grace period.
    ///
    /// Only available while the lock is still `Locked`. Once a secret has been revealed through [`Self::reveal_secret`]
    /// the funds are reserved for that unlocker. Returns `Ok(false)`, changing nothing, on a hashlock mismatch.
    pub fn verify_and_unlock(&self, ctx: &CallContext, secret: &SwapSecret) -> Result<bool, LockError> {
        let _section = self.guard.enter()?;
        let snapshot = self.state.borrow().clone();
        if snapshot.stage != LockStage::Locked || snapshot.unlocked {
            return Err(LockError::invalid_stage_for("verify_and_unlock", snapshot.stage));
        }
        if !self.hashlock.matches(secret.as_bytes()) {
            debug!("Swap lock {}: secret does not match the hashlock", self.address);
            return Ok(false);
        }
        {
            let mut state = self.state.borrow_mut();
            state.secret_revealed = true;
            state.unlocked = true;
            state.unlocker = Some(ctx.caller);
            state.revealed_secret = Some(secret.clone());
            state.stage = LockStage::Claimed;
        }
        self.pay_out_or_restore(ctx.caller, snapshot)?;
        info!("Swap lock {}: unlocked in a single step by {}", self.address, ctx.caller);
        self.events.emit(SwapEvent::Unlocked {
            address: self.address,
            unlocker: ctx.caller,
            secret: secret.clone(),
            amount: self.amount,
        });
        Ok(true)
    }

    /// Returns the deposit to the depositor after the lock time, provided the secret was never revealed.
    pub fn refund(&self, ctx: &CallContext) -> Result<(), LockError> {
        let _section = self.guard.enter()?;
        if ctx.caller != self.depositor {
            return Err(LockError::Unauthorized { operation: "refund", caller: ctx.caller });
        }
        let snapshot = self.state.borrow().clone();
        // Once the secret is public the counterparty may already be spending on the other chain
        if snapshot.stage != LockStage::Locked || snapshot.secret_revealed {
            return Err(LockError::invalid_stage_for("refund", snapshot.stage));
        }
        if ctx.timestamp < self.lock_until {
            return Err(LockError::TimelockActive { operation: "refund", until: self.lock_until, now: ctx.timestamp });
        }
        self.state.borrow_mut().stage = LockStage::Refunded;
        self.pay_out_or_restore(self.depositor, snapshot)?;
        info!("Swap lock {}: {} refunded to {}", self.address, self.amount, self.depositor);
        self.events.emit(SwapEvent::Refunded { address: self.address, depositor: self.depositor, amount: self.amount });
        Ok(())
    }

    fn pay_out_or_restore(&self, to: Address, snapshot: LockState) -> Result<(), LockError> {
        let Some(token) = &self.token else {
            return Ok(());
        };
        if token.transfer(self.address, to, self.amount) {
            return Ok(());
        }
        warn!("Swap lock {}: transfer of {} to {to} failed, rolling back", self.address, self.amount);
        *self.state.borrow_mut() = snapshot;
        Err(TransferError::Rejected { to, amount: self.amount }.into())
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn depositor(&self) -> Address {
        self.depositor
    }

    pub fn unlocker(&self) -> Option<Address> {
        self.state.borrow().unlocker
    }

    pub fn hashlock(&self) -> &Hashlock {
        &self.hashlock
    }

    pub fn adaptor_point(&self) -> &C::Point {
        &self.adaptor_point
    }

    pub fn second_point(&self) -> &C::Point {
        &self.second_point
    }

    pub fn lock_until(&self) -> Timestamp {
        self.lock_until
    }

    pub fn claimable_after(&self) -> Option<Timestamp> {
        self.state.borrow().claimable_after
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    pub fn amount(&self) -> u128 {
        self.amount
    }

    /// The token's address, or the zero address for a lock without a token.
    pub fn token_address(&self) -> Address {
        self.token.as_ref().map(|t| t.address()).unwrap_or(Address::ZERO)
    }

    pub fn stage(&self) -> LockStage {
        self.state.borrow().stage
    }

    pub fn is_secret_revealed(&self) -> bool {
        self.state.borrow().secret_revealed
    }

    pub fn is_unlocked(&self) -> bool {
        self.state.borrow().unlocked
    }

    /// The published preimage, once revealed. This is how the depositor learns the adaptor scalar.
    pub fn revealed_secret(&self) -> Option<SwapSecret> {
        self.state.borrow().revealed_secret.clone()
    }
}

impl<C: CurveGroup> Debug for AtomicLock<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomicLock")
            .field("address", &self.address)
            .field("depositor", &self.depositor)
            .field("hashlock", &self.hashlock)
            .field("lock_until", &self.lock_until)
            .field("amount", &self.amount)
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}
