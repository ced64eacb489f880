// src/pest.rs

use crate::db::{Medium, PEST_COUNT_KEY};
use crate::error::{EcoError, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::{info, warn};

/// Highest count the tally accepts.
pub const MAX_COUNT: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub before: Option<u32>,
    pub after: Option<u32>,
}

/// Serialized as `{ treated: {before, after}, control: {before, after} }`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PestCountData {
    pub treated: Tally,
    pub control: Tally,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Group {
    Treated,
    Control,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Timing {
    Before,
    After,
}

impl FromStr for Group {
    type Err = EcoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "treated" => Ok(Group::Treated),
            "control" => Ok(Group::Control),
            other => Err(EcoError::InvalidInput(format!(
                "Unknown group '{}', expected treated or control",
                other
            ))),
        }
    }
}

impl FromStr for Timing {
    type Err = EcoError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "before" => Ok(Timing::Before),
            "after" => Ok(Timing::After),
            other => Err(EcoError::InvalidInput(format!(
                "Unknown timing '{}', expected before or after",
                other
            ))),
        }
    }
}

/// Percentages already rounded to one decimal place for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Effectiveness {
    pub treated_reduction: String,
    pub control_reduction: String,
    pub effectiveness: String,
}

impl PestCountData {
    pub fn load(medium: &Medium) -> Self {
        match medium.get_item(PEST_COUNT_KEY) {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(error = %e, "stored pest counts are malformed, starting fresh");
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                warn!(error = %e, "could not read pest counts, starting fresh");
                Self::default()
            }
        }
    }

    pub fn save(&self, medium: &Medium) -> Result<()> {
        medium.set_item(PEST_COUNT_KEY, &serde_json::to_string(self)?)
    }

    pub fn get(&self, group: Group, timing: Timing) -> Option<u32> {
        let tally = match group {
            Group::Treated => &self.treated,
            Group::Control => &self.control,
        };
        match timing {
            Timing::Before => tally.before,
            Timing::After => tally.after,
        }
    }

    /// Sets one count and persists the whole record.
    pub fn update_count(
        &mut self,
        medium: &Medium,
        group: Group,
        timing: Timing,
        value: u32,
    ) -> Result<()> {
        if value > MAX_COUNT {
            return Err(EcoError::InvalidInput(format!(
                "Count must be between 0 and {}",
                MAX_COUNT
            )));
        }
        let tally = match group {
            Group::Treated => &mut self.treated,
            Group::Control => &mut self.control,
        };
        match timing {
            Timing::Before => tally.before = Some(value),
            Timing::After => tally.after = Some(value),
        }
        self.save(medium)?;
        info!(?group, ?timing, value, "updated pest count");
        Ok(())
    }

    /// `None` until all four counts are known, or if a "before" count is zero.
    pub fn effectiveness(&self) -> Option<Effectiveness> {
        let treated = reduction(self.treated)?;
        let control = reduction(self.control)?;
        Some(Effectiveness {
            treated_reduction: format!("{:.1}", treated),
            control_reduction: format!("{:.1}", control),
            effectiveness: format!("{:.1}", treated - control),
        })
    }
}

fn reduction(tally: Tally) -> Option<f64> {
    let before = tally.before?;
    let after = tally.after?;
    if before == 0 {
        return None;
    }
    Some((f64::from(before) - f64::from(after)) / f64::from(before) * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effectiveness_needs_all_counts() {
        let mut data = PestCountData::default();
        data.treated = Tally { before: Some(40), after: Some(10) };
        assert_eq!(data.effectiveness(), None);

        data.control = Tally { before: Some(40), after: Some(30) };
        let result = data.effectiveness().unwrap();
        assert_eq!(result.treated_reduction, "75.0");
        assert_eq!(result.control_reduction, "25.0");
        assert_eq!(result.effectiveness, "50.0");
    }

    #[test]
    fn zero_before_count_has_no_effectiveness() {
        let data = PestCountData {
            treated: Tally { before: Some(0), after: Some(0) },
            control: Tally { before: Some(10), after: Some(5) },
        };
        assert_eq!(data.effectiveness(), None);
    }

    #[test]
    fn counts_persist_in_browser_shape() {
        let medium = Medium::open_in_memory().unwrap();
        let mut data = PestCountData::load(&medium);
        data.update_count(&medium, Group::Control, Timing::After, 7).unwrap();

        let raw = medium.get_item(PEST_COUNT_KEY).unwrap().unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["control"]["after"], 7);
        assert!(json["treated"]["before"].is_null());

        assert_eq!(PestCountData::load(&medium).get(Group::Control, Timing::After), Some(7));
    }

    #[test]
    fn update_rejects_out_of_range_count() {
        let medium = Medium::open_in_memory().unwrap();
        let mut data = PestCountData::default();
        assert!(data.update_count(&medium, Group::Treated, Timing::Before, 101).is_err());
        assert_eq!(medium.get_item(PEST_COUNT_KEY).unwrap(), None);
    }

    #[test]
    fn malformed_counts_fall_back_to_unset() {
        let medium = Medium::open_in_memory().unwrap();
        medium.set_item(PEST_COUNT_KEY, "[1,2]").unwrap();
        assert_eq!(PestCountData::load(&medium), PestCountData::default());
    }

    #[test]
    fn group_and_timing_parse_case_insensitively() {
        assert_eq!("Treated".parse::<Group>().unwrap(), Group::Treated);
        assert_eq!(" after ".parse::<Timing>().unwrap(), Timing::After);
        assert!("sideways".parse::<Timing>().is_err());
    }
}
