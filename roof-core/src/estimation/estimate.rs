use serde::{Deserialize, Serialize};

use super::waste::{SourceKind, waste_factor};

/// Area and material figures for one roof measurement.
///
/// Built fresh for every computation; a newer estimate replaces an older
/// one outright.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoofEstimate {
    pub geometric_area_sq_ft: u64,
    pub waste_factor: f64,
    pub material_needed_sq_ft: u64,
    pub complexity_score: u32,
    pub source: SourceKind,
    pub user_adjusted: bool,
}

impl RoofEstimate {
    /// Rounds `area_sq_ft` to whole square feet, looks up the waste factor
    /// and rounds the material quantity from the rounded area.
    ///
    /// Negative or non-finite areas count as zero; complexity is at least 1.
    pub fn from_area(
        area_sq_ft: f64,
        source: SourceKind,
        complexity_score: u32,
    ) -> Self {
        let geometric_area_sq_ft = if area_sq_ft.is_finite() && area_sq_ft > 0.0 {
            area_sq_ft.round() as u64
        } else {
            0
        };
        let complexity_score = complexity_score.max(1);
        let waste_factor = waste_factor(source, complexity_score);
        let material_needed_sq_ft = (geometric_area_sq_ft as f64 * waste_factor).round() as u64;

        Self {
            geometric_area_sq_ft,
            waste_factor,
            material_needed_sq_ft,
            complexity_score,
            source,
            user_adjusted: false,
        }
    }

    pub fn user_adjusted(self) -> Self {
        Self {
            user_adjusted: true,
            ..self
        }
    }
}
