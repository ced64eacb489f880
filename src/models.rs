// src/models.rs

use crate::error::{EcoError, Result};
use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One pesticide application record, stored under `pesticideLog`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: String,
    pub entry_number: u64,
    pub date_applied: String,
    pub time_applied: String,
    pub plant_area: String,
    pub dosage_amount: String,
    #[serde(default)]
    pub notes_remarks: String,
    pub created_at: String, // ISO-8601, e.g. 2026-10-19T08:30:00.000Z
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

/// The mutable part of an entry, as supplied to add and update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEntry {
    pub date_applied: String,
    pub time_applied: String,
    pub plant_area: String,
    pub dosage_amount: String,
    pub notes_remarks: Option<String>,
}

impl NewEntry {
    /// Trims every field and checks the required ones, the way the entry form
    /// does before it hands data to the store.
    pub fn validated(self) -> Result<NewEntry> {
        let date_applied = required("date", &self.date_applied)?;
        let time_applied = required("time", &self.time_applied)?;
        let plant_area = required("plant/area", &self.plant_area)?;
        let dosage_amount = required("dosage", &self.dosage_amount)?;

        if NaiveDate::parse_from_str(&date_applied, "%Y-%m-%d").is_err() {
            return Err(EcoError::InvalidInput(
                "Invalid date format. Use YYYY-MM-DD.".to_string(),
            ));
        }
        if NaiveTime::parse_from_str(&time_applied, "%H:%M").is_err() {
            return Err(EcoError::InvalidInput(
                "Invalid time format. Use HH:MM (24-hour).".to_string(),
            ));
        }

        let notes_remarks = self
            .notes_remarks
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty());

        Ok(NewEntry {
            date_applied,
            time_applied,
            plant_area,
            dosage_amount,
            notes_remarks,
        })
    }
}

fn required(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EcoError::InvalidInput(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}

/// ISO-8601 in UTC with millisecond precision and a `Z` suffix.
pub fn iso_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn input() -> NewEntry {
        NewEntry {
            date_applied: " 2026-10-19 ".to_string(),
            time_applied: "07:45".to_string(),
            plant_area: "  Tomato bed  ".to_string(),
            dosage_amount: "5 ml / L".to_string(),
            notes_remarks: Some("   ".to_string()),
        }
    }

    #[test]
    fn validated_trims_and_drops_blank_notes() {
        let entry = input().validated().unwrap();
        assert_eq!(entry.date_applied, "2026-10-19");
        assert_eq!(entry.plant_area, "Tomato bed");
        assert_eq!(entry.notes_remarks, None);
    }

    #[test]
    fn validated_rejects_missing_required_field() {
        let mut raw = input();
        raw.dosage_amount = "   ".to_string();
        assert!(matches!(raw.validated(), Err(EcoError::InvalidInput(_))));
    }

    #[test]
    fn validated_rejects_bad_date_and_time() {
        let mut raw = input();
        raw.date_applied = "19/10/2026".to_string();
        assert!(raw.validated().is_err());

        let mut raw = input();
        raw.time_applied = "7pm".to_string();
        assert!(raw.validated().is_err());
    }

    #[test]
    fn entry_json_uses_camel_case_and_omits_missing_update() {
        let entry = LogEntry {
            id: "1760860000000".to_string(),
            entry_number: 1,
            date_applied: "2026-10-19".to_string(),
            time_applied: "07:45".to_string(),
            plant_area: "Tomato bed".to_string(),
            dosage_amount: "5 ml".to_string(),
            notes_remarks: String::new(),
            created_at: "2026-10-19T07:50:00.000Z".to_string(),
            updated_at: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["entryNumber"], 1);
        assert_eq!(json["plantArea"], "Tomato bed");
        assert!(json.get("updatedAt").is_none());
    }

    #[test]
    fn entry_without_notes_deserializes_to_empty_notes() {
        let raw = r#"{"id":"1","entryNumber":2,"dateApplied":"2026-01-01","timeApplied":"09:00",
            "plantArea":"Lettuce","dosageAmount":"2 g","createdAt":"2026-01-01T09:01:00.000Z"}"#;
        let entry: LogEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.notes_remarks, "");
        assert_eq!(entry.updated_at, None);
    }

    #[test]
    fn iso_timestamp_matches_browser_format() {
        let dt = Utc.with_ymd_and_hms(2026, 10, 19, 8, 30, 0).unwrap();
        assert_eq!(iso_timestamp(dt), "2026-10-19T08:30:00.000Z");
    }
}
