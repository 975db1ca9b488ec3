//! Price Resolution
//!
//! Maps `(package, rush)` to the Stripe price id configured for it. The six
//! prices live in the Stripe dashboard; only their ids are configured here.

use std::collections::HashMap;

use storefront_core::PackageId;

use crate::error::{PaymentError, Result};

/// Static `{package × rush}` → Stripe price id table
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PriceTable {
    prices: HashMap<(PackageId, bool), String>,
}

impl PriceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Environment variable holding the price for a package/rush combination,
    /// e.g. `PRICE_STARTER_RUSH`.
    pub fn env_key(package: PackageId, rush: bool) -> String {
        format!(
            "PRICE_{}_{}",
            package.as_str().to_uppercase(),
            if rush { "RUSH" } else { "BASE" }
        )
    }

    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create from an arbitrary key lookup. Missing entries are left out and
    /// reported by [`PriceTable::missing`].
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut table = Self::new();
        for package in PackageId::ALL {
            for rush in [false, true] {
                if let Some(price) = lookup(&Self::env_key(package, rush)).filter(|p| !p.trim().is_empty()) {
                    table.prices.insert((package, rush), price.trim().to_string());
                }
            }
        }
        table
    }

    #[must_use]
    pub fn with_price(mut self, package: PackageId, rush: bool, price: impl Into<String>) -> Self {
        self.prices.insert((package, rush), price.into());
        self
    }

    /// Environment keys with no configured price
    pub fn missing(&self) -> Vec<String> {
        PackageId::ALL
            .into_iter()
            .flat_map(|p| [(p, false), (p, true)])
            .filter(|key| !self.prices.contains_key(key))
            .map(|(p, rush)| Self::env_key(p, rush))
            .collect()
    }

    /// Resolve the price for a raw package identifier.
    ///
    /// An identifier outside the catalog is always `InvalidPackage`; a known
    /// package without a configured price is a configuration error.
    pub fn resolve(&self, package: &str, rush: bool) -> Result<(PackageId, &str)> {
        let id = PackageId::parse(package).ok_or_else(|| PaymentError::InvalidPackage(package.to_string()))?;

        self.prices
            .get(&(id, rush))
            .map(|price| (id, price.as_str()))
            .ok_or_else(|| PaymentError::Config(format!("{} not set", Self::env_key(id, rush))))
    }
}
