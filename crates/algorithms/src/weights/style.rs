//! Weight normalization styles and the zero-neighbor policy

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use arealstat_core::Error;

/// Normalization applied to binary neighbor links
///
/// Letter codes follow the usual convention: `B`, `W`, `C`, `U`, `S`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WeightStyle {
    /// `B`: weight 1 for each neighbor
    Binary,
    /// `W`: each neighbor weighs 1/k_i, rows sum to 1
    #[default]
    RowStandardized,
    /// `C`: binary weights scaled so all weights sum to n
    GlobalStandardized,
    /// `U`: binary weights scaled so all weights sum to 1
    UnitSum,
    /// `S`: variance-stabilizing coding (Tiefelsdorf et al. 1999), sums to n
    VarianceStabilizing,
}

impl WeightStyle {
    pub fn code(&self) -> char {
        match self {
            WeightStyle::Binary => 'B',
            WeightStyle::RowStandardized => 'W',
            WeightStyle::GlobalStandardized => 'C',
            WeightStyle::UnitSum => 'U',
            WeightStyle::VarianceStabilizing => 'S',
        }
    }
}

impl fmt::Display for WeightStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for WeightStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "B" => Ok(WeightStyle::Binary),
            "W" => Ok(WeightStyle::RowStandardized),
            "C" => Ok(WeightStyle::GlobalStandardized),
            "U" => Ok(WeightStyle::UnitSum),
            "S" => Ok(WeightStyle::VarianceStabilizing),
            _ => Err(Error::config("style", s, "expected one of B, W, C, U, S")),
        }
    }
}

/// Treatment of units with no neighbors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ZeroPolicy {
    /// Fail with `Error::IsolatedUnit`
    #[default]
    Reject,
    /// Keep the unit with an all-zero row; its lag is 0
    Allow,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_codes() {
        for style in [
            WeightStyle::Binary,
            WeightStyle::RowStandardized,
            WeightStyle::GlobalStandardized,
            WeightStyle::UnitSum,
            WeightStyle::VarianceStabilizing,
        ] {
            assert_eq!(style.to_string().parse::<WeightStyle>().unwrap(), style);
        }
        assert_eq!("w".parse::<WeightStyle>().unwrap(), WeightStyle::RowStandardized);
    }

    #[test]
    fn test_unknown_style_is_configuration_error() {
        let err = "X".parse::<WeightStyle>().unwrap_err();
        assert!(matches!(err, Error::Configuration { name: "style", .. }));
    }
}
