//! A watchtower for swap locks.
//!
//! The [`SwapMonitor`] consumes [`SwapEvent`]s and the passage of time and raises [`Alert`]s for the depositor's
//! operator. The important one is the warning shortly before `claimable_after`: once a secret is revealed the depositor
//! has only the grace period to use it on the other chain.

use crate::address::Address;
use crate::config::SwapConfig;
use crate::helpers::Timestamp;
use crate::state_machine::{EventSink, SwapEvent};
use log::*;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::time::Duration;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AlertLevel {
    Info,
    Warning,
    Critical,
}

impl Display for AlertLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertLevel::Info => write!(f, "INFO"),
            AlertLevel::Warning => write!(f, "WARNING"),
            AlertLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub level: AlertLevel,
    pub title: String,
    pub message: String,
    pub address: Address,
}

impl Alert {
    fn new(level: AlertLevel, address: Address, title: impl Into<String>, message: impl Into<String>) -> Self {
        Alert { level, title: title.into(), message: message.into(), address }
    }
}

impl Display for Alert {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {} ({}): {}", self.level, self.title, self.address, self.message)
    }
}

/// The monitor's view of one lock.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum WatchedSwap {
    Locked { lock_until: Timestamp },
    Revealed { revealer: Address, claimable_after: Timestamp, warned: bool },
    Completed,
    /// Refunded, or past its lock time with the secret never revealed.
    Expired,
}

impl WatchedSwap {
    pub fn is_finished(&self) -> bool {
        matches!(self, WatchedSwap::Completed | WatchedSwap::Expired)
    }
}

pub struct SwapMonitor {
    alert_window: Duration,
    swaps: RefCell<HashMap<Address, WatchedSwap>>,
    alerts: RefCell<Vec<Alert>>,
}

impl SwapMonitor {
    pub fn new(alert_window: Duration) -> Self {
        SwapMonitor { alert_window, swaps: RefCell::new(HashMap::new()), alerts: RefCell::new(Vec::new()) }
    }

    pub fn from_config(config: &SwapConfig) -> Self {
        Self::new(config.alert_window())
    }

    pub fn status(&self, address: &Address) -> Option<WatchedSwap> {
        self.swaps.borrow().get(address).cloned()
    }

    /// Stops tracking `address`, returning its last known state.
    pub fn forget(&self, address: &Address) -> Option<WatchedSwap> {
        self.swaps.borrow_mut().remove(address)
    }

    /// Drops every completed or expired swap. Returns how many were removed.
    pub fn prune_finished(&self) -> usize {
        let mut swaps = self.swaps.borrow_mut();
        let before = swaps.len();
        swaps.retain(|_, swap| !swap.is_finished());
        let removed = before - swaps.len();
        if removed > 0 {
            debug!("Monitor pruned {removed} finished swaps, {} still watched", swaps.len());
        }
        removed
    }

    pub fn watched(&self) -> usize {
        self.swaps.borrow().len()
    }

    /// Takes all alerts raised so far.
    pub fn drain_alerts(&self) -> Vec<Alert> {
        std::mem::take(&mut *self.alerts.borrow_mut())
    }

    /// Raises the time-driven alerts: the grace-period warning and lock expiry.
    pub fn poll(&self, now: Timestamp) -> Vec<Alert> {
        let mut raised = Vec::new();
        let mut swaps = self.swaps.borrow_mut();
        for (address, swap) in swaps.iter_mut() {
            match swap {
                WatchedSwap::Revealed { claimable_after, warned, .. } if !*warned => {
                    if now.secs_until(*claimable_after) <= self.alert_window.as_secs() && now < *claimable_after {
                        *warned = true;
                        let remaining = now.secs_until(*claimable_after);
                        raised.push(Alert::new(
                            AlertLevel::Warning,
                            *address,
                            "Grace period ending",
                            format!("The unlocker can claim in {remaining}s (at {claimable_after})."),
                        ));
                    }
                }
                WatchedSwap::Locked { lock_until } if now >= *lock_until => {
                    let lock_until = *lock_until;
                    *swap = WatchedSwap::Expired;
                    raised.push(Alert::new(
                        AlertLevel::Info,
                        *address,
                        "Lock expired",
                        format!("No secret was revealed before {lock_until}. The deposit can be refunded."),
                    ));
                }
                _ => {}
            }
        }
        drop(swaps);
        for alert in &raised {
            self.log(alert);
        }
        self.alerts.borrow_mut().extend(raised.iter().cloned());
        raised
    }

    fn raise(&self, alert: Alert) {
        self.log(&alert);
        self.alerts.borrow_mut().push(alert);
    }

    fn log(&self, alert: &Alert) {
        match alert.level {
            AlertLevel::Info => info!("{alert}"),
            AlertLevel::Warning => warn!("{alert}"),
            AlertLevel::Critical => error!("{alert}"),
        }
    }

    fn update(&self, address: Address, state: WatchedSwap) {
        self.swaps.borrow_mut().insert(address, state);
    }
}

impl EventSink for SwapMonitor {
    fn emit(&self, event: SwapEvent) {
        trace!("Monitor received {event} for {}", event.address());
        match event {
            SwapEvent::Deployed { address, lock_until, amount, .. } => {
                self.update(address, WatchedSwap::Locked { lock_until });
                self.raise(Alert::new(
                    AlertLevel::Info,
                    address,
                    "Swap locked",
                    format!("{amount} locked until {lock_until}."),
                ));
            }
            SwapEvent::SecretRevealed { address, revealer, claimable_after, .. } => {
                self.update(address, WatchedSwap::Revealed { revealer, claimable_after, warned: false });
                self.raise(Alert::new(
                    AlertLevel::Info,
                    address,
                    "Secret revealed",
                    format!("{revealer} revealed the secret. Claimable after {claimable_after}."),
                ));
            }
            SwapEvent::TokensClaimed { address, claimer, amount, .. } => {
                self.update(address, WatchedSwap::Completed);
                self.raise(Alert::new(
                    AlertLevel::Info,
                    address,
                    "Swap completed",
                    format!("{claimer} claimed {amount}."),
                ));
            }
            SwapEvent::Unlocked { address, unlocker, amount, .. } => {
                self.update(address, WatchedSwap::Completed);
                self.raise(Alert::new(
                    AlertLevel::Info,
                    address,
                    "Swap completed",
                    format!("{unlocker} unlocked {amount} in a single step."),
                ));
            }
            SwapEvent::Refunded { address, depositor, amount } => {
                self.update(address, WatchedSwap::Expired);
                self.raise(Alert::new(
                    AlertLevel::Info,
                    address,
                    "Swap refunded",
                    format!("{amount} returned to {depositor}."),
                ));
            }
            SwapEvent::ProofVerificationFailed { address, hashlock, reason } => {
                self.raise(Alert::new(
                    AlertLevel::Critical,
                    address,
                    "DLEQ proof rejected",
                    format!("Deployment for hashlock {hashlock} was refused: {reason}"),
                ));
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::cryptography::hashes::Hashlock;
    use crate::cryptography::secret::SwapSecret;

    fn addr(name: &str) -> Address {
        Address::derive(&[name.as_bytes()])
    }

    #[test]
    fn grace_period_warning_fires_once() {
        let monitor = SwapMonitor::new(Duration::from_secs(1800));
        let swap = addr("swap");
        monitor.emit(SwapEvent::SecretRevealed {
            address: swap,
            revealer: addr("bob"),
            secret: SwapSecret::new([0x12; 32]),
            claimable_after: Timestamp::new(10_000),
        });
        assert_eq!(monitor.drain_alerts().len(), 1);
        // more than 30 minutes away
        assert!(monitor.poll(Timestamp::new(8_000)).is_empty());
        let alerts = monitor.poll(Timestamp::new(8_500));
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Warning);
        assert!(monitor.poll(Timestamp::new(9_000)).is_empty());
        assert_eq!(monitor.drain_alerts(), alerts);
    }

    #[test]
    fn locks_expire() {
        let monitor = SwapMonitor::new(Duration::from_secs(1800));
        let swap = addr("swap");
        monitor.emit(SwapEvent::Deployed {
            address: swap,
            depositor: addr("alice"),
            hashlock: Hashlock::from_secret(&[0x12; 32]),
            lock_until: Timestamp::new(5_000),
            amount: 10,
        });
        assert!(monitor.poll(Timestamp::new(4_999)).is_empty());
        assert_eq!(monitor.poll(Timestamp::new(5_000)).len(), 1);
        assert_eq!(monitor.status(&swap), Some(WatchedSwap::Expired));
    }

    #[test]
    fn finished_swaps_can_be_dropped() {
        let monitor = SwapMonitor::new(Duration::from_secs(60));
        let deployed = |address: Address| SwapEvent::Deployed {
            address,
            depositor: addr("alice"),
            hashlock: Hashlock::from_secret(&[0x12; 32]),
            lock_until: Timestamp::new(5_000),
            amount: 10,
        };
        monitor.emit(deployed(addr("refunded")));
        monitor.emit(deployed(addr("claimed")));
        monitor.emit(deployed(addr("open")));
        monitor.emit(SwapEvent::Refunded { address: addr("refunded"), depositor: addr("alice"), amount: 10 });
        monitor.emit(SwapEvent::TokensClaimed {
            address: addr("claimed"),
            claimer: addr("bob"),
            amount: 10,
            timestamp: Timestamp::new(4_000),
        });
        assert_eq!(monitor.watched(), 3);
        assert_eq!(monitor.prune_finished(), 2);
        assert_eq!(monitor.prune_finished(), 0);
        assert_eq!(monitor.status(&addr("claimed")), None);
        assert_eq!(monitor.forget(&addr("open")), Some(WatchedSwap::Locked { lock_until: Timestamp::new(5_000) }));
        assert_eq!(monitor.watched(), 0);
        assert!(monitor.poll(Timestamp::new(6_000)).is_empty());
    }

    #[test]
    fn proof_failures_are_critical() {
        let monitor = SwapMonitor::new(Duration::from_secs(60));
        monitor.emit(SwapEvent::ProofVerificationFailed {
            address: addr("swap"),
            hashlock: Hashlock::from_secret(&[1; 32]),
            reason: "challenge mismatch".into(),
        });
        let alerts = monitor.drain_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, AlertLevel::Critical);
        assert_eq!(monitor.status(&addr("swap")), None);
    }
}
