use serde::{Deserialize, Serialize};

/// Party role used for access decisions.
///
/// The set is closed: every account is exactly one of these, and operations
/// check role membership directly rather than going through a permission
/// table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Runs a white-label storefront; earns commission above the base price.
    Reseller,
    /// Owns the catalog; sets base prices and the markup floor.
    Manufacturer,
    /// Operates the platform; processes payouts and manages order flow.
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reseller => "reseller",
            Self::Manufacturer => "manufacturer",
            Self::Admin => "admin",
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}
