//! Piecewise-linear dosage effectiveness scoring.
//!
//! The curve peaks at 1.0 on the optimal dose and falls linearly to
//! [`BOUNDARY_SCORE`] at both the minimum and maximum thresholds. Doses outside
//! `[min, max]` sit on the same floor: under-dosing and over-dosing are
//! penalized alike.
//!
//! When two thresholds coincide (`min == optimal` or `optimal == max`) the
//! collapsed segment becomes a step at the shared value. The minimum and
//! maximum thresholds take precedence over a shared optimal, so a dose exactly
//! on one scores the boundary value.

use crate::{
    catalog::{DosageCatalog, NormalizedRange},
    error::DosewiseError,
};
use serde::Serialize;
use std::fmt;
use tracing::debug;

/// Score at the minimum and maximum thresholds and outside the range.
pub const BOUNDARY_SCORE: f64 = 0.25;
pub const OPTIMAL_SCORE: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DosageRegime {
    BelowMinimum,
    AtMinimum,
    MinimumToOptimal,
    AtOptimal,
    OptimalToMaximum,
    AtMaximum,
    AboveMaximum,
}

impl DosageRegime {
    pub fn label(self) -> &'static str {
        match self {
            DosageRegime::BelowMinimum => "below minimum effective dose",
            DosageRegime::AtMinimum => "at minimum effective dose",
            DosageRegime::MinimumToOptimal => "between minimum and optimal dose",
            DosageRegime::AtOptimal => "at optimal dose",
            DosageRegime::OptimalToMaximum => "between optimal and maximum dose",
            DosageRegime::AtMaximum => "at maximum dose",
            DosageRegime::AboveMaximum => {
                "above maximum dose, diminishing/negative returns possible"
            }
        }
    }
}

impl fmt::Display for DosageRegime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DosageScore {
    pub score: f64,
    pub regime: DosageRegime,
    /// Regime label followed by the thresholds it was judged against.
    pub reason: String,
}

/// Scores `amount_mg` against `range`. The result is always within
/// `[BOUNDARY_SCORE, OPTIMAL_SCORE]`.
pub fn score_dose(amount_mg: f64, range: &NormalizedRange) -> DosageScore {
    let NormalizedRange {
        min_mg: min,
        optimal_mg: optimal,
        max_mg: max,
    } = *range;
    let span = OPTIMAL_SCORE - BOUNDARY_SCORE;

    // Interpolating branches are only reached when their segment has width.
    let (score, regime, thresholds) = if amount_mg < min {
        (BOUNDARY_SCORE, DosageRegime::BelowMinimum, format!("{min}mg"))
    } else if amount_mg == min {
        (BOUNDARY_SCORE, DosageRegime::AtMinimum, format!("{min}mg"))
    } else if amount_mg > max {
        (BOUNDARY_SCORE, DosageRegime::AboveMaximum, format!("{max}mg"))
    } else if amount_mg == max {
        (BOUNDARY_SCORE, DosageRegime::AtMaximum, format!("{max}mg"))
    } else if amount_mg == optimal {
        (OPTIMAL_SCORE, DosageRegime::AtOptimal, format!("{optimal}mg"))
    } else if amount_mg < optimal {
        (
            BOUNDARY_SCORE + span * (amount_mg - min) / (optimal - min),
            DosageRegime::MinimumToOptimal,
            format!("{min}mg-{optimal}mg"),
        )
    } else {
        (
            OPTIMAL_SCORE - span * (amount_mg - optimal) / (max - optimal),
            DosageRegime::OptimalToMaximum,
            format!("{optimal}mg-{max}mg"),
        )
    };

    DosageScore {
        score: score.clamp(BOUNDARY_SCORE, OPTIMAL_SCORE),
        regime,
        reason: format!("{} ({thresholds})", regime.label()),
    }
}

impl DosageCatalog {
    /// Looks up the ingredient's range and scores the dose against it.
    pub fn score(
        &self,
        ingredient_name: &str,
        amount_mg: f64,
    ) -> Result<DosageScore, DosewiseError> {
        let range = self
            .get(ingredient_name)
            .ok_or_else(|| DosewiseError::MissingDosage(ingredient_name.to_string()))?;
        let result = score_dose(amount_mg, range);
        debug!(
            ingredient = %ingredient_name,
            amount_mg,
            score = result.score,
            regime = ?result.regime,
            "Scored dose"
        );
        Ok(result)
    }
}
