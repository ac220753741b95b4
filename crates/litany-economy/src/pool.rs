//! Bounded resource pools.
//!
//! A [`ResourcePool`] holds `current` in `[0, max]`. Every mutator clamps, so
//! the bound holds after each call, not only at the end of a tick. [`Pools`]
//! groups one pool per [`Resource`] and handles multi-resource costs
//! atomically: either every entry is paid or nothing is.

use std::collections::BTreeMap;

use litany_types::{PoolView, Rejection, Resource};
use serde::{Deserialize, Serialize};

use crate::error::EconomyError;

/// Tolerance used when comparing pool amounts against costs.
pub const EPSILON: f64 = 1e-9;

/// A multi-resource amount (cost, output batch, upkeep slice).
pub type Amounts = BTreeMap<Resource, f64>;

// ---------------------------------------------------------------------------
// ResourcePool
// ---------------------------------------------------------------------------

/// A single bounded, regenerating quantity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResourcePool {
    current: f64,
    max: f64,
    unlocked: bool,
}

impl ResourcePool {
    /// Create an empty, locked pool with the given capacity.
    ///
    /// # Errors
    ///
    /// Returns [`EconomyError::InvalidAmount`] if `max` is not a positive
    /// finite number.
    pub fn new(max: f64) -> Result<Self, EconomyError> {
        if !max.is_finite() || max <= 0.0 {
            return Err(EconomyError::InvalidAmount {
                context: "pool max".to_owned(),
                value: max,
            });
        }
        Ok(Self {
            current: 0.0,
            max,
            unlocked: false,
        })
    }

    /// Create a pool with a starting amount (clamped into range).
    ///
    /// # Errors
    ///
    /// Same conditions as [`ResourcePool::new`].
    pub fn with_current(current: f64, max: f64, unlocked: bool) -> Result<Self, EconomyError> {
        let mut pool = Self::new(max)?;
        pool.current = sanitize(current).min(max);
        pool.unlocked = unlocked;
        Ok(pool)
    }

    /// Current amount.
    pub const fn current(&self) -> f64 {
        self.current
    }

    /// Capacity.
    pub const fn max(&self) -> f64 {
        self.max
    }

    /// Whether the pool has ever been credited (or started unlocked).
    pub const fn unlocked(&self) -> bool {
        self.unlocked
    }

    /// Headroom left before the pool is full.
    pub fn headroom(&self) -> f64 {
        (self.max - self.current).max(0.0)
    }

    /// Add `amount`, capped at `max`. Returns the amount actually added.
    ///
    /// Non-positive and non-finite amounts are ignored. Any positive credit
    /// unlocks the pool.
    pub fn credit(&mut self, amount: f64) -> f64 {
        if !amount.is_finite() || amount <= 0.0 {
            return 0.0;
        }
        self.unlocked = true;
        let added = amount.min(self.headroom());
        self.current = (self.current + added).min(self.max);
        added
    }

    /// Whether `amount` could be debited right now.
    pub fn can_afford(&self, amount: f64) -> bool {
        amount <= 0.0 || self.current + EPSILON >= amount
    }

    /// Remove `amount` if available. Returns `false` (and changes nothing)
    /// if the pool is short.
    pub fn debit(&mut self, amount: f64) -> bool {
        if !amount.is_finite() {
            return false;
        }
        if amount <= 0.0 {
            return true;
        }
        if !self.can_afford(amount) {
            return false;
        }
        self.current = (self.current - amount).max(0.0);
        true
    }

    /// Change the capacity, clamping `current` down if needed.
    ///
    /// Invalid capacities (non-positive or non-finite) are ignored.
    pub fn set_max(&mut self, max: f64) {
        if max.is_finite() && max > 0.0 {
            self.max = max;
            self.clamp();
        }
    }

    /// Force `current` into `[0, max]`.
    pub fn clamp(&mut self) {
        self.current = sanitize(self.current).min(self.max);
    }

    /// Mark the pool as unlocked without crediting it.
    pub const fn unlock(&mut self) {
        self.unlocked = true;
    }
}

/// Map NaN and negatives to zero.
fn sanitize(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.max(0.0) }
}

// ---------------------------------------------------------------------------
// Pools
// ---------------------------------------------------------------------------

/// One [`ResourcePool`] per resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pools {
    pools: BTreeMap<Resource, ResourcePool>,
}

impl Pools {
    /// Build from explicit pools. Resources missing from the map get a
    /// locked pool of capacity 1.
    pub fn from_map(mut pools: BTreeMap<Resource, ResourcePool>) -> Self {
        for resource in Resource::ALL {
            pools.entry(*resource).or_insert(ResourcePool {
                current: 0.0,
                max: 1.0,
                unlocked: false,
            });
        }
        Self { pools }
    }

    /// Borrow one pool.
    pub fn get(&self, resource: Resource) -> Option<&ResourcePool> {
        self.pools.get(&resource)
    }

    /// Mutably borrow one pool.
    pub fn get_mut(&mut self, resource: Resource) -> Option<&mut ResourcePool> {
        self.pools.get_mut(&resource)
    }

    /// Current amount of `resource` (0 if absent).
    pub fn current(&self, resource: Resource) -> f64 {
        self.pools.get(&resource).map_or(0.0, ResourcePool::current)
    }

    /// Credit `amount` of `resource`. Returns the amount actually added.
    pub fn credit(&mut self, resource: Resource, amount: f64) -> f64 {
        self.pools
            .get_mut(&resource)
            .map_or(0.0, |pool| pool.credit(amount))
    }

    /// Credit every entry of `amounts`. Returns what was actually added.
    pub fn credit_all(&mut self, amounts: &Amounts) -> Amounts {
        amounts
            .iter()
            .map(|(resource, amount)| (*resource, self.credit(*resource, *amount)))
            .collect()
    }

    /// Check that every entry of `cost` is affordable.
    ///
    /// The reason names the first short resource.
    pub fn check_affordable(&self, cost: &Amounts) -> Result<(), Rejection> {
        for (resource, amount) in cost {
            let have = self.current(*resource);
            let affordable = self
                .pools
                .get(resource)
                .is_some_and(|pool| pool.can_afford(*amount));
            if !affordable {
                return Err(Rejection::requirement(format!(
                    "not enough {resource}: need {amount:.0}, have {have:.0}"
                )));
            }
        }
        Ok(())
    }

    /// Debit every entry of `cost`, or nothing if any entry is short.
    pub fn pay(&mut self, cost: &Amounts) -> Result<(), Rejection> {
        self.check_affordable(cost)?;
        for (resource, amount) in cost {
            if let Some(pool) = self.pools.get_mut(resource) {
                pool.debit(*amount);
            }
        }
        Ok(())
    }

    /// Set the capacity of one pool.
    pub fn set_max(&mut self, resource: Resource, max: f64) {
        if let Some(pool) = self.pools.get_mut(&resource) {
            pool.set_max(max);
        }
    }

    /// Clamp every pool into `[0, max]`.
    pub fn clamp_all(&mut self) {
        for pool in self.pools.values_mut() {
            pool.clamp();
        }
    }

    /// Iterate pools in resource order.
    pub fn iter(&self) -> impl Iterator<Item = (Resource, &ResourcePool)> {
        self.pools.iter().map(|(r, p)| (*r, p))
    }

    /// Read-only views for rendering.
    pub fn views(&self) -> Vec<PoolView> {
        self.iter()
            .map(|(resource, pool)| PoolView {
                resource,
                current: pool.current(),
                max: pool.max(),
                unlocked: pool.unlocked(),
            })
            .collect()
    }

    /// Whether every pool satisfies `0 <= current <= max`.
    pub fn within_bounds(&self) -> bool {
        self.pools
            .values()
            .all(|p| p.current() >= 0.0 && p.current() <= p.max())
    }
}
