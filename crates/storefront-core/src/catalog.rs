//! Package Catalog
//!
//! The fixed set of service packages sold on the site. Keep in sync with the
//! pricing cards of the frontend.

use serde::{Deserialize, Serialize};

/// Service package identifiers
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageId {
    Starter,
    Growth,
    Scale,
}

impl PackageId {
    pub const ALL: [Self; 3] = [Self::Starter, Self::Growth, Self::Scale];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Starter => "starter",
            Self::Growth => "growth",
            Self::Scale => "scale",
        }
    }

    /// Case-insensitive lookup; `None` for anything outside the catalog.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "starter" => Some(Self::Starter),
            "growth" => Some(Self::Growth),
            "scale" => Some(Self::Scale),
            _ => None,
        }
    }

    /// Catalog entry for this package
    pub const fn package(self) -> &'static Package {
        match self {
            Self::Starter => &STARTER,
            Self::Growth => &GROWTH,
            Self::Scale => &SCALE,
        }
    }
}

impl std::fmt::Display for PackageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable catalog entry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Package {
    pub id: PackageId,
    pub label: &'static str,
    /// Base price in cents
    pub base_cents: i64,
    /// Rush surcharge in cents
    pub rush_fee_cents: i64,
    pub days: u32,
    pub rush_days: u32,
}

impl Package {
    /// Total in cents for the chosen delivery speed
    pub const fn total_cents(&self, rush: bool) -> i64 {
        if rush {
            self.base_cents + self.rush_fee_cents
        } else {
            self.base_cents
        }
    }
}

static STARTER: Package = Package {
    id: PackageId::Starter,
    label: "Starter",
    base_cents: 90_000,
    rush_fee_cents: 20_000,
    days: 4,
    rush_days: 2,
};

static GROWTH: Package = Package {
    id: PackageId::Growth,
    label: "Growth",
    base_cents: 230_000,
    rush_fee_cents: 40_000,
    days: 8,
    rush_days: 6,
};

static SCALE: Package = Package {
    id: PackageId::Scale,
    label: "Scale",
    base_cents: 700_000,
    rush_fee_cents: 80_000,
    days: 14,
    rush_days: 10,
};

/// Delivery timeline shown in confirmation emails.
///
/// Built from session metadata, so it has to cope with values that are not in
/// the catalog: those become a placeholder with unknown day counts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Timeline {
    pub label: String,
    pub days: Option<u32>,
    pub rush_days: Option<u32>,
}

impl Timeline {
    pub fn for_package(package: &Package) -> Self {
        Self {
            label: package.label.to_string(),
            days: Some(package.days),
            rush_days: Some(package.rush_days),
        }
    }

    /// Resolve a timeline from a raw `package` metadata value.
    pub fn from_metadata(value: Option<&str>) -> Self {
        let raw = value.map(str::trim).unwrap_or_default();
        PackageId::parse(raw).map_or_else(
            || Self {
                label: if raw.is_empty() { "Custom".to_string() } else { raw.to_lowercase() },
                days: None,
                rush_days: None,
            },
            |id| Self::for_package(id.package()),
        )
    }

    pub fn days_display(&self) -> String {
        display_days(self.days)
    }

    pub fn rush_days_display(&self) -> String {
        display_days(self.rush_days)
    }
}

fn display_days(days: Option<u32>) -> String {
    days.map_or_else(|| "—".to_string(), |d| d.to_string())
}
