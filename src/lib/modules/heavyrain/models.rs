use std::fmt::Display;
use std::str::FromStr;

use crate::errors::RadprocError;
use crate::models::resample::Rule;

const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// Months taken into account by a heavy rain analysis
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Season {
    Year,
    /// May - October
    Summer,
    /// November - April
    Winter,
    /// January and December
    JanuaryDecember,
    Month(u32),
    Months(Vec<u32>),
}

impl Season {
    pub fn months(&self) -> Vec<u32> {
        match self {
            Season::Year => (1..=12).collect(),
            Season::Summer => vec![5, 6, 7, 8, 9, 10],
            Season::Winter => vec![1, 2, 3, 4, 11, 12],
            Season::JanuaryDecember => vec![1, 12],
            Season::Month(month) => vec![*month],
            Season::Months(months) => months.clone(),
        }
    }

    /// Period over which exceedances are counted
    pub fn rule(&self) -> Rule {
        match self {
            Season::Year => Rule::years(),
            Season::Summer => Rule::annual_ending(10),
            Season::Winter => Rule::annual_ending(4),
            Season::JanuaryDecember => Rule::annual_ending(1),
            Season::Months(months) if months.len() == 12 => Rule::years(),
            Season::Month(_) | Season::Months(_) => Rule::months(),
        }
    }
}

impl FromStr for Season {
    type Err = RadprocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s {
            "Year" => return Ok(Season::Year),
            "May - October" => return Ok(Season::Summer),
            "November - April" => return Ok(Season::Winter),
            "January/December" => return Ok(Season::JanuaryDecember),
            _ => {}
        }
        if let Some(idx) = MONTH_NAMES.iter().position(|m| m.eq_ignore_ascii_case(s)) {
            return Ok(Season::Month(idx as u32 + 1));
        }

        let mut months = s
            .split(',')
            .map(|m| m.trim().parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| format!("invalid season '{s}'"))?;
        // months are loaded in calendar order
        months.sort_unstable();
        months.dedup();
        if months.is_empty() || months.iter().any(|m| !(1..=12).contains(m)) {
            return Err(format!("invalid months in season '{s}'").into());
        }
        Ok(Season::Months(months))
    }
}

impl Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Season::Year => write!(f, "Year"),
            Season::Summer => write!(f, "May - October"),
            Season::Winter => write!(f, "November - April"),
            Season::JanuaryDecember => write!(f, "January/December"),
            Season::Month(month) => {
                match month.checked_sub(1).and_then(|m| MONTH_NAMES.get(m as usize)) {
                    Some(name) => write!(f, "{name}"),
                    None => write!(f, "{month}"),
                }
            }
            Season::Months(months) => {
                let months: Vec<String> = months.iter().map(|m| m.to_string()).collect();
                write!(f, "{}", months.join(","))
            }
        }
    }
}
