//! Module: accounting
//! Responsibility: per-address counters of personal objects served by the
//! read path. The write pipeline never calls into this module.

use parking_lot::Mutex;
use std::{collections::HashMap, net::IpAddr, time::Duration};
use tracing::{info, warn};

///
/// PersonalObjectAccounting
///

pub trait PersonalObjectAccounting: Send + Sync {
    /// Personal objects served to `address` so far.
    fn queried_count(&self, address: IpAddr) -> u32;

    /// Add `amount` for `address`; returns the new total.
    fn account(&self, address: IpAddr, amount: u32) -> u32;

    fn reset(&self);
}

///
/// LocalPersonalObjectAccounting
///
/// Counters behind a lock taken with a bounded wait. When the lock cannot be
/// taken in time the request is allowed: both reads and writes report 0.
///

#[derive(Debug)]
pub struct LocalPersonalObjectAccounting {
    counts: Mutex<HashMap<IpAddr, u32>>,
    lock_timeout: Duration,
}

impl LocalPersonalObjectAccounting {
    pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(3);

    #[must_use]
    pub fn new(lock_timeout: Duration) -> Self {
        Self {
            counts: Mutex::new(HashMap::new()),
            lock_timeout,
        }
    }
}

impl Default for LocalPersonalObjectAccounting {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LOCK_TIMEOUT)
    }
}

impl PersonalObjectAccounting for LocalPersonalObjectAccounting {
    fn queried_count(&self, address: IpAddr) -> u32 {
        let Some(counts) = self.counts.try_lock_for(self.lock_timeout) else {
            warn!(%address, "unable to read personal object count, allowed by default");
            return 0;
        };

        counts.get(&address).copied().unwrap_or(0)
    }

    fn account(&self, address: IpAddr, amount: u32) -> u32 {
        let Some(mut counts) = self.counts.try_lock_for(self.lock_timeout) else {
            info!(%address, "unable to account personal object, allowed by default");
            return 0;
        };

        let count = counts.entry(address).or_insert(0);
        *count = count.saturating_add(amount);
        *count
    }

    fn reset(&self) {
        self.counts.lock().clear();
    }
}
