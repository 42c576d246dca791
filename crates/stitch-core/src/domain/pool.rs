//! Compute inventory as seen by the matcher: pools and the scale sets behind
//! them. Read-only from the core's point of view.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{PoolId, ScalesetId};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PoolName(String);

impl PoolName {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PoolName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PoolName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for PoolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Os {
    Linux,
    Windows,
}

/// A named, long-lived group of compute workers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pool {
    pub pool_id: PoolId,
    pub name: PoolName,
    pub os: Os,
}

impl Pool {
    pub fn new(pool_id: PoolId, name: impl Into<PoolName>, os: Os) -> Self {
        Self {
            pool_id,
            name: name.into(),
            os,
        }
    }
}

/// Homogeneous VM instances backing a pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scaleset {
    pub scaleset_id: ScalesetId,
    pub pool_name: PoolName,
    pub region: String,
    pub vm_sku: String,
    pub image: String,
}

impl Scaleset {
    pub fn matches(&self, sku: &str, image: &str) -> bool {
        self.vm_sku == sku && self.image == image
    }
}
