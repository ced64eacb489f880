// src/store.rs

//! The record store: sole owner of the application log.
//!
//! The collection is read once from the [`Medium`] when the store is loaded
//! and written back in full after every add, update and delete. Entries keep
//! their most-recent-first insertion order internally; listing and export
//! each derive their own order from `entry_number`.

use crate::db::{Medium, LOG_KEY};
use crate::error::{EcoError, Result};
use crate::models::{iso_timestamp, LogEntry, NewEntry};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, Utc};
use tracing::{debug, error, info, warn};

/// Largest entry number a stored log may carry (2^53 - 1, the largest
/// integer a browser-written log can hold exactly).
pub const MAX_ENTRY_NUMBER: u64 = 9_007_199_254_740_991;

const NUMBER_WIDTH: usize = 8;
const DATE_WIDTH: usize = 12;
const TIME_WIDTH: usize = 8;
const TEXT_WIDTH: usize = 20;
const NOTES_RULE_WIDTH: usize = 30;

pub struct RecordStore<'m> {
    medium: &'m Medium,
    entries: Vec<LogEntry>,
    /// Set when the medium could not be read; writes are refused so the
    /// stored log is not replaced by a partial one.
    read_failed: bool,
}

impl<'m> RecordStore<'m> {
    /// Reads the log from the medium. Missing or malformed data yields an
    /// empty log; this never fails.
    ///
    /// A log is malformed if it does not parse as a list of entries or if any
    /// entry number lies outside `1..=MAX_ENTRY_NUMBER`. If the medium itself
    /// cannot be read the store also starts empty, but refuses to write.
    pub fn load(medium: &'m Medium) -> Self {
        let mut read_failed = false;
        let entries = match medium.get_item(LOG_KEY) {
            Ok(Some(raw)) => parse_log(&raw).unwrap_or_default(),
            Ok(None) => Vec::new(),
            Err(e) => {
                error!(error = %e, "could not read stored log, changes will not be saved");
                read_failed = true;
                Vec::new()
            }
        };
        debug!(count = entries.len(), "loaded log");
        Self {
            medium,
            entries,
            read_failed,
        }
    }

    fn persist(&self) -> Result<()> {
        if self.read_failed {
            return Err(EcoError::LogUnreadable);
        }
        let json = serde_json::to_string(&self.entries)?;
        self.medium.set_item(LOG_KEY, &json)
    }

    /// Entries in storage order (most recently added first).
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn next_entry_number(&self) -> u64 {
        self.entries
            .iter()
            .map(|e| e.entry_number)
            .max()
            .map_or(1, |n| n + 1)
    }

    /// Millisecond timestamp, bumped past any id already in use.
    fn fresh_id(&self, now: DateTime<Utc>) -> String {
        let mut millis = now.timestamp_millis();
        loop {
            let id = millis.to_string();
            if self.get_by_id(&id).is_none() {
                return id;
            }
            millis += 1;
        }
    }

    /// Records a new entry. Callers validate `data` first.
    pub fn add(&mut self, data: NewEntry) -> Result<LogEntry> {
        let entry_number = self.next_entry_number();
        if entry_number > MAX_ENTRY_NUMBER {
            return Err(EcoError::InvalidInput(
                "No entry numbers left; delete the highest-numbered entry first".to_string(),
            ));
        }

        let now = Utc::now();
        let entry = LogEntry {
            id: self.fresh_id(now),
            entry_number,
            date_applied: data.date_applied,
            time_applied: data.time_applied,
            plant_area: data.plant_area,
            dosage_amount: data.dosage_amount,
            notes_remarks: data.notes_remarks.unwrap_or_default(),
            created_at: iso_timestamp(now),
            updated_at: None,
        };

        self.entries.insert(0, entry.clone());
        if let Err(e) = self.persist() {
            self.entries.remove(0);
            return Err(e);
        }
        info!(id = %entry.id, number = entry.entry_number, "added entry");
        Ok(entry)
    }

    /// Replaces the mutable fields of entry `id`. `Ok(None)` if there is no
    /// such entry.
    pub fn update(&mut self, id: &str, data: NewEntry) -> Result<Option<LogEntry>> {
        let Some(index) = self.position(id) else {
            return Ok(None);
        };

        let previous = self.entries[index].clone();
        let entry = &mut self.entries[index];
        entry.date_applied = data.date_applied;
        entry.time_applied = data.time_applied;
        entry.plant_area = data.plant_area;
        entry.dosage_amount = data.dosage_amount;
        entry.notes_remarks = data.notes_remarks.unwrap_or_default();
        entry.updated_at = Some(iso_timestamp(Utc::now()));
        let updated = entry.clone();

        if let Err(e) = self.persist() {
            self.entries[index] = previous;
            return Err(e);
        }
        info!(id, number = updated.entry_number, "updated entry");
        Ok(Some(updated))
    }

    /// Removes entry `id`. Remaining entries keep their numbers.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let Some(index) = self.position(id) else {
            return Ok(false);
        };

        let removed = self.entries.remove(index);
        if let Err(e) = self.persist() {
            self.entries.insert(index, removed);
            return Err(e);
        }
        info!(id, number = removed.entry_number, "deleted entry");
        Ok(true)
    }

    pub fn get_by_id(&self, id: &str) -> Option<&LogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn find_by_number(&self, number: u64) -> Option<&LogEntry> {
        self.entries.iter().find(|e| e.entry_number == number)
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.id == id)
    }

    /// Entries highest number first, the order the log is listed in.
    pub fn display_order(&self) -> Vec<&LogEntry> {
        let mut sorted: Vec<&LogEntry> = self.entries.iter().collect();
        sorted.sort_by(|a, b| b.entry_number.cmp(&a.entry_number));
        sorted
    }

    pub fn export_to_text(&self) -> String {
        self.render_export(Local::now().naive_local())
    }

    /// Fixed-width text table with rows in ascending entry number order,
    /// the reverse of [`display_order`](Self::display_order).
    pub fn render_export(&self, exported_at: NaiveDateTime) -> String {
        let mut out = String::from("EcoSlug Tracker - Application Log Export\n");
        out.push_str(&format!(
            "Export Date: {}\n",
            exported_at.format("%-m/%-d/%Y, %-I:%M:%S %p")
        ));
        out.push_str(&format!("Total Entries: {}\n\n", self.entries.len()));

        out.push_str(&format!(
            "{:<nw$} | {:<dw$} | {:<tw$} | {:<xw$} | {:<xw$} | Notes\n",
            "Entry#",
            "Date",
            "Time",
            "Plant/Area",
            "Dosage",
            nw = NUMBER_WIDTH,
            dw = DATE_WIDTH,
            tw = TIME_WIDTH,
            xw = TEXT_WIDTH,
        ));
        out.push_str(&format!(
            "{} | {} | {} | {} | {} | {}\n",
            "-".repeat(NUMBER_WIDTH),
            "-".repeat(DATE_WIDTH),
            "-".repeat(TIME_WIDTH),
            "-".repeat(TEXT_WIDTH),
            "-".repeat(TEXT_WIDTH),
            "-".repeat(NOTES_RULE_WIDTH),
        ));

        let mut rows: Vec<&LogEntry> = self.entries.iter().collect();
        rows.sort_by_key(|e| e.entry_number);
        for entry in rows {
            out.push_str(&format!(
                "{:<nw$} | {:<dw$} | {:<tw$} | {:<xw$} | {:<xw$} | {}\n",
                entry.entry_number,
                entry.date_applied,
                entry.time_applied,
                truncate(&entry.plant_area, TEXT_WIDTH),
                truncate(&entry.dosage_amount, TEXT_WIDTH),
                entry.notes_remarks,
                nw = NUMBER_WIDTH,
                dw = DATE_WIDTH,
                tw = TIME_WIDTH,
                xw = TEXT_WIDTH,
            ));
        }
        out
    }
}

pub(crate) fn parse_log(raw: &str) -> Option<Vec<LogEntry>> {
    let entries = match serde_json::from_str::<Vec<LogEntry>>(raw) {
        Ok(entries) => entries,
        Err(e) => {
            warn!(error = %e, "stored log is malformed, starting with an empty log");
            return None;
        }
    };
    if let Some(bad) = entries
        .iter()
        .find(|e| e.entry_number == 0 || e.entry_number > MAX_ENTRY_NUMBER)
    {
        warn!(
            id = %bad.id,
            number = bad.entry_number,
            "stored log has an out-of-range entry number, starting with an empty log"
        );
        return None;
    }
    Some(entries)
}

/// Name of the export file for the given (UTC) day.
pub fn export_file_name(date: NaiveDate) -> String {
    format!("pesticide-log-{}.txt", date.format("%Y-%m-%d"))
}

fn truncate(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(plant: &str) -> NewEntry {
        NewEntry {
            date_applied: "2026-10-19".to_string(),
            time_applied: "07:45".to_string(),
            plant_area: plant.to_string(),
            dosage_amount: "5 ml".to_string(),
            notes_remarks: None,
        }
    }

    #[test]
    fn next_entry_number_starts_at_one() {
        let medium = Medium::open_in_memory().unwrap();
        let store = RecordStore::load(&medium);
        assert_eq!(store.next_entry_number(), 1);
    }

    #[test]
    fn add_prepends_and_assigns_unique_ids() {
        let medium = Medium::open_in_memory().unwrap();
        let mut store = RecordStore::load(&medium);
        let first = store.add(entry("Bed A")).unwrap();
        let second = store.add(entry("Bed B")).unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(store.entries()[0].id, second.id);
        assert_eq!(store.entries()[1].id, first.id);
        assert_eq!(first.notes_remarks, "");
        assert!(first.updated_at.is_none());
    }

    #[test]
    fn update_of_unknown_id_is_none() {
        let medium = Medium::open_in_memory().unwrap();
        let mut store = RecordStore::load(&medium);
        store.add(entry("Bed A")).unwrap();
        assert_eq!(store.update("missing", entry("Bed Z")).unwrap(), None);
        assert_eq!(store.entries()[0].plant_area, "Bed A");
    }

    #[test]
    fn display_order_is_descending() {
        let medium = Medium::open_in_memory().unwrap();
        let mut store = RecordStore::load(&medium);
        for plant in ["a", "b", "c"] {
            store.add(entry(plant)).unwrap();
        }
        let numbers: Vec<u64> = store.display_order().iter().map(|e| e.entry_number).collect();
        assert_eq!(numbers, vec![3, 2, 1]);
    }

    #[test]
    fn truncate_counts_characters() {
        assert_eq!(truncate("Tomatoes", 20), "Tomatoes");
        assert_eq!(truncate("ééééééééééééééééééééééé", 20).chars().count(), 20);
    }

    #[test]
    fn export_file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(export_file_name(date), "pesticide-log-2026-03-07.txt");
    }
}
