//! Resource inventory: the tanks a harvester fills and draws power from.
//!
//! The live inventory of a loaded vessel and the persisted snapshot of an
//! unloaded one are the same type, so the foreground and background paths
//! write through the same [`ResourceSink`] code.

use serde::{Deserialize, Serialize};

/// Resource drawn to power harvesters.
pub const ELECTRIC_CHARGE: &str = "ElectricCharge";

/// Anything a harvester can deposit into and draw from.
pub trait ResourceSink {
    /// Total stored amount of `resource`.
    fn amount(&self, resource: &str) -> f64;
    /// Free space for `resource`.
    fn free_capacity(&self, resource: &str) -> f64;
    /// Add up to `amount`; returns what was accepted. The rest is dropped.
    fn deposit(&mut self, resource: &str, amount: f64) -> f64;
    /// Remove up to `amount`; returns what was removed.
    fn request(&mut self, resource: &str, amount: f64) -> f64;
}

/// One storage container.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tank {
    pub resource: String,
    pub amount: f64,
    pub max_amount: f64,
}

/// Ordered tanks; deposits fill them front to back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceInventory {
    tanks: Vec<Tank>,
}

impl ResourceInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tank(mut self, resource: &str, amount: f64, max_amount: f64) -> Self {
        self.add_tank(resource, amount, max_amount);
        self
    }

    pub fn add_tank(&mut self, resource: &str, amount: f64, max_amount: f64) {
        let max_amount = max_amount.max(0.0);
        self.tanks.push(Tank {
            resource: resource.to_string(),
            amount: amount.clamp(0.0, max_amount),
            max_amount,
        });
    }

    pub fn tanks(&self) -> &[Tank] {
        &self.tanks
    }

    pub fn capacity(&self, resource: &str) -> f64 {
        self.tanks_of(resource).map(|t| t.max_amount).sum()
    }

    fn tanks_of<'a>(&'a self, resource: &'a str) -> impl Iterator<Item = &'a Tank> + 'a {
        self.tanks.iter().filter(move |t| t.resource == resource)
    }
}

impl ResourceSink for ResourceInventory {
    fn amount(&self, resource: &str) -> f64 {
        self.tanks_of(resource).map(|t| t.amount).sum()
    }

    fn free_capacity(&self, resource: &str) -> f64 {
        self.tanks_of(resource)
            .map(|t| t.max_amount - t.amount)
            .sum()
    }

    fn deposit(&mut self, resource: &str, amount: f64) -> f64 {
        if !(amount > 0.0) {
            return 0.0;
        }
        let mut remaining = amount;
        for tank in self.tanks.iter_mut().filter(|t| t.resource == resource) {
            let space = tank.max_amount - tank.amount;
            if space >= remaining {
                tank.amount += remaining;
                remaining = 0.0;
                break;
            }
            tank.amount = tank.max_amount;
            remaining -= space;
        }
        amount - remaining
    }

    fn request(&mut self, resource: &str, amount: f64) -> f64 {
        if !(amount > 0.0) {
            return 0.0;
        }
        let mut remaining = amount;
        for tank in self.tanks.iter_mut().filter(|t| t.resource == resource) {
            if tank.amount >= remaining {
                tank.amount -= remaining;
                remaining = 0.0;
                break;
            }
            remaining -= tank.amount;
            tank.amount = 0.0;
        }
        amount - remaining
    }
}
