use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Clone)]
pub enum ConditionError {
    #[error("Unknown duplex type '{0}'. Expected one of DNA:DNA, RNA:RNA, DNA:RNA, RNA:DNA")]
    UnknownDuplexType(String),

    #[error("Condition parameter '{name}' = {value} is out of range: {reason}")]
    OutOfRange {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },
}

/// Nucleic-acid types of a duplex. The first type is the provided sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
pub enum DuplexType {
    #[default]
    #[serde(rename = "DNA:DNA")]
    DnaDna,
    #[serde(rename = "RNA:RNA")]
    RnaRna,
    #[serde(rename = "DNA:RNA")]
    DnaRna,
    #[serde(rename = "RNA:DNA")]
    RnaDna,
}

impl DuplexType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DuplexType::DnaDna => "DNA:DNA",
            DuplexType::RnaRna => "RNA:RNA",
            DuplexType::DnaRna => "DNA:RNA",
            DuplexType::RnaDna => "RNA:DNA",
        }
    }
}

impl fmt::Display for DuplexType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DuplexType {
    type Err = ConditionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DNA:DNA" => Ok(DuplexType::DnaDna),
            "RNA:RNA" => Ok(DuplexType::RnaRna),
            "DNA:RNA" => Ok(DuplexType::DnaRna),
            "RNA:DNA" => Ok(DuplexType::RnaDna),
            _ => Err(ConditionError::UnknownDuplexType(s.to_string())),
        }
    }
}

/// A point of the hybridization parameter space.
///
/// Concentrations are molar. Sweeps derive every evaluated point from a stage's
/// default condition with [`Condition::at_temperature`], so conditions are never
/// mutated in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Condition {
    /// Celsius degrees.
    pub temperature: f64,
    /// Formamide, % v/v.
    pub formamide: f64,
    pub sodium: f64,
    pub magnesium: f64,
    pub duplex_type: DuplexType,
    /// Strand (probe or labeled oligo) concentration.
    pub concentration: f64,
}

impl Condition {
    pub fn validate(&self) -> Result<(), ConditionError> {
        non_negative("temperature", self.temperature)?;
        non_negative("formamide", self.formamide)?;
        positive("sodium", self.sodium)?;
        non_negative("magnesium", self.magnesium)?;
        positive("concentration", self.concentration)?;
        Ok(())
    }

    pub fn at_temperature(&self, temperature: f64) -> Self {
        Self {
            temperature,
            ..*self
        }
    }

    /// Directory-safe key identifying this condition, used to namespace the
    /// artifacts of its evaluation. Temperatures keep the four decimals of the
    /// sweep grid, so every planned point gets its own key.
    pub fn namespace_key(&self) -> String {
        format!(
            "T{:.4}_FA{:.2}_Na{:.4}_Mg{:.4}_{}",
            self.temperature,
            self.formamide,
            self.sodium,
            self.magnesium,
            self.duplex_type.as_str().replace(':', "-")
        )
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), ConditionError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConditionError::OutOfRange {
            name,
            value,
            reason: "must be a finite value >= 0",
        })
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), ConditionError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConditionError::OutOfRange {
            name,
            value,
            reason: "must be a finite value > 0",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn condition() -> Condition {
        Condition {
            temperature: 37.0,
            formamide: 25.0,
            sodium: 0.3,
            magnesium: 0.0,
            duplex_type: DuplexType::DnaDna,
            concentration: 1e-6,
        }
    }

    #[test]
    fn duplex_type_round_trips_through_display() {
        for dtype in [
            DuplexType::DnaDna,
            DuplexType::RnaRna,
            DuplexType::DnaRna,
            DuplexType::RnaDna,
        ] {
            assert_eq!(dtype.to_string().parse::<DuplexType>().unwrap(), dtype);
        }
        assert_eq!("dna:rna".parse::<DuplexType>().unwrap(), DuplexType::DnaRna);
        assert!("DNA-DNA".parse::<DuplexType>().is_err());
    }

    #[test]
    fn at_temperature_only_changes_temperature() {
        let base = condition();
        let shifted = base.at_temperature(42.5);
        assert_eq!(shifted.temperature, 42.5);
        assert_eq!(shifted, Condition {
            temperature: 42.5,
            ..base
        });
        assert_ne!(shifted, base);
    }

    #[test]
    fn validate_enforces_parameter_ranges() {
        assert!(condition().validate().is_ok());

        let zero_sodium = Condition {
            sodium: 0.0,
            ..condition()
        };
        assert!(matches!(
            zero_sodium.validate(),
            Err(ConditionError::OutOfRange { name: "sodium", .. })
        ));

        let negative_fa = Condition {
            formamide: -1.0,
            ..condition()
        };
        assert!(negative_fa.validate().is_err());

        let nan_temperature = Condition {
            temperature: f64::NAN,
            ..condition()
        };
        assert!(nan_temperature.validate().is_err());
    }

    #[test]
    fn namespace_key_encodes_all_condition_parameters() {
        assert_eq!(
            condition().namespace_key(),
            "T37.0000_FA25.00_Na0.3000_Mg0.0000_DNA-DNA"
        );
    }

    #[test]
    fn namespace_keys_differ_for_temperatures_a_millidegree_apart() {
        let a = Condition {
            temperature: 37.000,
            ..condition()
        };
        let b = Condition {
            temperature: 37.001,
            ..condition()
        };
        assert_ne!(a.namespace_key(), b.namespace_key());
        assert_eq!(b.namespace_key(), "T37.0010_FA25.00_Na0.3000_Mg0.0000_DNA-DNA");
    }
}
