use serde_derive::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::models::resample::Rule;

/// Target time step of an aggregation
#[derive(Debug, PartialEq, Eq, Copy, Clone, EnumString, Display, Serialize, Deserialize)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Years,
    Months,
    Days,
    Hours,
}

impl Aggregation {
    pub fn rule(&self) -> Rule {
        match self {
            Aggregation::Years => Rule::years(),
            Aggregation::Months => Rule::months(),
            Aggregation::Days => Rule::Days(1),
            Aggregation::Hours => Rule::Hours(1),
        }
    }

    /// Rule applied to every single month before merging them
    pub fn monthly_rule(&self) -> Rule {
        match self {
            Aggregation::Years => Rule::months(),
            _ => self.rule(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_case_insensitive() {
        assert_eq!("Days".parse::<Aggregation>().unwrap(), Aggregation::Days);
        assert_eq!(Aggregation::Years.to_string(), "years");
        assert!("weeks".parse::<Aggregation>().is_err());
    }
}
