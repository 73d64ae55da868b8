//! Waste-factor decision table.
//!
//! | source           | segments | factor |
//! |------------------|----------|--------|
//! | remote provider  | ≤ 5      | 1.15   |
//! | remote provider  | 6–15     | 1.2075 |
//! | remote provider  | > 15     | 1.265  |
//! | local provider   | any      | 1.15   |
//! | manual draw      | any      | 1.20   |
//!
//! Remote surveys report sloped surface area, so only parapet and detail
//! work is added for busy roofs (+5% and +10% on the base 15%). Manual
//! polygons are flat footprints and carry a fixed 20% correction.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const BASE_WASTE_FACTOR: f64 = 1.15;
pub const COMPLEX_ROOF_WASTE_FACTOR: f64 = 1.2075;
pub const VERY_COMPLEX_ROOF_WASTE_FACTOR: f64 = 1.265;
pub const MANUAL_WASTE_FACTOR: f64 = 1.20;

/// Where an estimate's geometry came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceKind {
    RemoteProvider,
    LocalProvider,
    ManualDraw,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RemoteProvider => "remote-provider",
            Self::LocalProvider => "local-provider",
            Self::ManualDraw => "manual-draw",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn waste_factor(
    source: SourceKind,
    complexity_score: u32,
) -> f64 {
    match source {
        SourceKind::RemoteProvider => match complexity_score {
            0..=5 => BASE_WASTE_FACTOR,
            6..=15 => COMPLEX_ROOF_WASTE_FACTOR,
            _ => VERY_COMPLEX_ROOF_WASTE_FACTOR,
        },
        SourceKind::LocalProvider => BASE_WASTE_FACTOR,
        SourceKind::ManualDraw => MANUAL_WASTE_FACTOR,
    }
}
