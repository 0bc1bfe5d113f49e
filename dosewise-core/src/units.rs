//! Mass unit parsing and conversion to the canonical unit (milligrams).

use crate::error::DosewiseError;
use std::{fmt, str::FromStr};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MassUnit {
    Mcg,
    Mg,
    G,
    Kg,
}

impl MassUnit {
    /// Milligrams per one of this unit.
    pub fn mg_factor(self) -> f64 {
        match self {
            MassUnit::Mcg => 0.001,
            MassUnit::Mg => 1.0,
            MassUnit::G => 1_000.0,
            MassUnit::Kg => 1_000_000.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MassUnit::Mcg => "mcg",
            MassUnit::Mg => "mg",
            MassUnit::G => "g",
            MassUnit::Kg => "kg",
        }
    }

    pub fn to_mg(self, amount: f64) -> f64 {
        match self {
            // Divide rather than multiply by 0.001 so 1000 mcg is exactly 1 mg.
            MassUnit::Mcg => amount / 1_000.0,
            _ => amount * self.mg_factor(),
        }
    }

    pub fn from_mg(self, amount_mg: f64) -> f64 {
        match self {
            MassUnit::Mcg => amount_mg * 1_000.0,
            _ => amount_mg / self.mg_factor(),
        }
    }
}

impl FromStr for MassUnit {
    type Err = DosewiseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mcg" => Ok(MassUnit::Mcg),
            "mg" => Ok(MassUnit::Mg),
            "g" => Ok(MassUnit::G),
            "kg" => Ok(MassUnit::Kg),
            _ => Err(DosewiseError::UnsupportedUnit(s.to_string())),
        }
    }
}

impl fmt::Display for MassUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Converts `amount` expressed in the raw `unit` string to milligrams.
pub fn to_mg(amount: f64, unit: &str) -> Result<f64, DosewiseError> {
    Ok(unit.parse::<MassUnit>()?.to_mg(amount))
}

/// Converts a milligram amount back into `unit`.
pub fn from_mg(amount_mg: f64, unit: &str) -> Result<f64, DosewiseError> {
    Ok(unit.parse::<MassUnit>()?.from_mg(amount_mg))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_every_supported_unit() {
        assert_eq!(to_mg(500.0, "mcg").unwrap(), 0.5);
        assert_eq!(to_mg(200.0, "mg").unwrap(), 200.0);
        assert_eq!(to_mg(3.2, "g").unwrap(), 3200.0);
        assert_eq!(to_mg(2.0, "kg").unwrap(), 2_000_000.0);
    }

    #[test]
    fn unit_strings_are_case_and_whitespace_insensitive() {
        assert_eq!(" G ".parse::<MassUnit>().unwrap(), MassUnit::G);
        assert_eq!("MCG".parse::<MassUnit>().unwrap(), MassUnit::Mcg);
    }

    #[test]
    fn rejects_unknown_units() {
        for unit in ["oz", "lb", "ml", "IU", ""] {
            match to_mg(1.0, unit) {
                Err(DosewiseError::UnsupportedUnit(u)) => assert_eq!(u, unit),
                other => panic!("expected UnsupportedUnit for {unit:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn gram_round_trips_through_milligrams() {
        let mg = to_mg(1.0, "g").unwrap();
        assert_eq!(mg, 1000.0);
        assert_eq!(from_mg(mg, "g").unwrap(), 1.0);
        assert_eq!(MassUnit::Mcg.from_mg(MassUnit::Mcg.to_mg(1000.0)), 1000.0);
    }
}
