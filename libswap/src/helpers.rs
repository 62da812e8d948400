use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub fn to_hex<S>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    hex::encode(bytes).serialize(s)
}

pub fn array_from_hex<'de, D>(de: D) -> Result<[u8; 32], D::Error>
where
    D: Deserializer<'de>,
{
    let hex_str = String::deserialize(de)?;
    let mut result = [0u8; 32];
    hex::decode_to_slice(hex_str, &mut result)
        .map_err(|e| serde::de::Error::custom(format!("Invalid hex string: {e}")))?;
    Ok(result)
}

/// Decode a 64-character hex string into 32 bytes, returning `None` on any malformed input.
pub fn bytes32_from_hex(hex_str: &str) -> Option<[u8; 32]> {
    if hex_str.len() != 64 {
        return None;
    }
    let mut result = [0u8; 32];
    hex::decode_to_slice(hex_str, &mut result).ok()?;
    Some(result)
}

/// A UTC Unix timestamp representing seconds since January 1, 1970.
///
/// Every timelock comparison in the swap contract is made between two of these, taken from the settlement layer's own
/// clock. There is no shared clock with the counterparty chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(u64);

impl Timestamp {
    /// Creates a new Timestamp from seconds since Unix epoch.
    pub fn new(seconds: u64) -> Self {
        Self(seconds)
    }

    /// Returns the current UTC time as a Timestamp.
    pub fn now() -> Self {
        Self(Utc::now().timestamp() as u64)
    }

    /// Creates a Timestamp that is `duration` time from now.
    pub fn from_now(duration: Duration) -> Self {
        Self::now().saturating_add(duration)
    }

    /// Returns the underlying seconds value.
    pub fn as_secs(&self) -> u64 {
        self.0
    }

    /// Adds `duration` to the timestamp, returning `None` on overflow.
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        self.0.checked_add(duration.as_secs()).map(Self)
    }

    /// Adds `duration` to the timestamp, clamping at `u64::MAX`.
    pub fn saturating_add(&self, duration: Duration) -> Self {
        Self(self.0.saturating_add(duration.as_secs()))
    }

    /// Seconds from `self` until `later`, or zero if `later` is not in the future.
    pub fn secs_until(&self, later: Timestamp) -> u64 {
        later.0.saturating_sub(self.0)
    }

    /// Converts this Timestamp to a chrono DateTime<Utc>.
    /// In odd corners cases where the timestamp is invalid (exactly coinciding with a leap-second,
    /// or out-of-range values), this will return None.
    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        let t = i64::try_from(self.0).ok()?;
        Utc.timestamp_opt(t, 0).single()
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.to_datetime() {
            Some(dt) => write!(f, "{}", dt.to_rfc3339()),
            None => write!(f, "{}s", self.0),
        }
    }
}

impl From<u64> for Timestamp {
    fn from(secs: u64) -> Self {
        Self(secs)
    }
}

impl From<Timestamp> for u64 {
    fn from(ts: Timestamp) -> Self {
        ts.0
    }
}
