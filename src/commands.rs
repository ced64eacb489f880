// src/commands.rs

use crate::cli::{EntryFields, PestAction, SystemAppearance};
use crate::db::{Medium, LOG_KEY};
use crate::error::{EcoError, Result};
use crate::models::{LogEntry, NewEntry};
use crate::pest::{Group, PestCountData, Timing};
use crate::store::{self, export_file_name, RecordStore};
use crate::sync::{self, LoggingSync};
use crate::theme::{Appearance, Theme};
use crate::weather::{self, SimulatedWeather, WeatherSource};
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};
use std::env;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Pushes local data to the cloud when someone is signed in.
fn sync_if_signed_in(medium: &Medium, entries: &[LogEntry]) {
    if let Some(identity) = sync::signed_in_user(medium) {
        sync::sync_after_write(&LoggingSync::new(Some(identity)), entries);
    }
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{} (y/N): ", prompt);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().eq_ignore_ascii_case("y"))
}

/// Handles 'init'
pub fn handle_init(medium: &Medium, db_path: &Path) -> Result<()> {
    println!("✓ Database ready at: {}", db_path.display());

    let log = RecordStore::load(medium);
    let malformed = medium
        .get_item(LOG_KEY)?
        .is_some_and(|raw| store::parse_log(&raw).is_none());
    if malformed {
        println!("Warning: the stored log could not be read and will be replaced on the next change.");
    } else {
        println!("✓ {} log {} found.", log.len(), plural(log.len()));
    }
    Ok(())
}

/// Handles 'add'
pub fn handle_add(medium: &Medium, fields: EntryFields) -> Result<()> {
    let now = Local::now();
    let data = NewEntry {
        date_applied: fields
            .date
            .unwrap_or_else(|| now.format("%Y-%m-%d").to_string()),
        time_applied: fields
            .time
            .unwrap_or_else(|| now.format("%H:%M").to_string()),
        plant_area: fields.plant.unwrap_or_default(),
        dosage_amount: fields.dosage.unwrap_or_default(),
        notes_remarks: fields.notes,
    }
    .validated()?;

    let mut store = RecordStore::load(medium);
    let entry = store.add(data)?;
    sync_if_signed_in(medium, store.entries());

    println!("✓ Entry #{} added.", entry.entry_number);
    Ok(())
}

/// Handles 'list'
pub fn handle_list(medium: &Medium) -> Result<()> {
    let store = RecordStore::load(medium);
    if store.is_empty() {
        println!("No entries yet. Add one with `ecoslug add`.");
        return Ok(());
    }

    for entry in store.display_order() {
        println!(
            "#{:<4} {:<13} {:<9} {} | {}",
            entry.entry_number,
            format_date(&entry.date_applied),
            format_time(&entry.time_applied),
            entry.plant_area,
            entry.dosage_amount
        );
        let notes = if entry.notes_remarks.is_empty() { "-" } else { entry.notes_remarks.as_str() };
        println!("      └─ {}", notes);
    }
    println!("{}", "─".repeat(40));
    println!("{} {}", store.len(), plural(store.len()));
    Ok(())
}

/// Handles 'show'
pub fn handle_show(medium: &Medium, number: u64) -> Result<()> {
    let store = RecordStore::load(medium);
    let entry = store
        .find_by_number(number)
        .ok_or(EcoError::EntryNotFound(number))?;

    println!("Entry #{}", entry.entry_number);
    println!("  Date:       {}", format_date(&entry.date_applied));
    println!("  Time:       {}", format_time(&entry.time_applied));
    println!("  Plant/Area: {}", entry.plant_area);
    println!("  Dosage:     {}", entry.dosage_amount);
    println!("  Notes:      {}", if entry.notes_remarks.is_empty() { "-" } else { entry.notes_remarks.as_str() });
    println!("  Created:    {}", format_timestamp(&entry.created_at));
    if let Some(updated) = &entry.updated_at {
        println!("  Updated:    {}", format_timestamp(updated));
    }
    Ok(())
}

/// Handles 'edit'
pub fn handle_edit(medium: &Medium, number: u64, fields: EntryFields) -> Result<()> {
    let mut store = RecordStore::load(medium);
    let current = store
        .find_by_number(number)
        .cloned()
        .ok_or(EcoError::EntryNotFound(number))?;

    let edited = if fields.is_empty() {
        edit_in_editor(&current)?
    } else {
        NewEntry {
            date_applied: fields.date.unwrap_or_else(|| current.date_applied.clone()),
            time_applied: fields.time.unwrap_or_else(|| current.time_applied.clone()),
            plant_area: fields.plant.unwrap_or_else(|| current.plant_area.clone()),
            dosage_amount: fields.dosage.unwrap_or_else(|| current.dosage_amount.clone()),
            notes_remarks: Some(fields.notes.unwrap_or_else(|| current.notes_remarks.clone())),
        }
    };
    let data = edited.validated()?;

    if unchanged(&current, &data) {
        return Err(EcoError::NoChangesMade);
    }

    store
        .update(&current.id, data)?
        .ok_or(EcoError::EntryNotFound(number))?;
    sync_if_signed_in(medium, store.entries());

    println!("✓ Entry #{} updated.", number);
    Ok(())
}

fn unchanged(current: &LogEntry, data: &NewEntry) -> bool {
    current.date_applied == data.date_applied
        && current.time_applied == data.time_applied
        && current.plant_area == data.plant_area
        && current.dosage_amount == data.dosage_amount
        && current.notes_remarks == data.notes_remarks.as_deref().unwrap_or("")
}

fn edit_in_editor(entry: &LogEntry) -> Result<NewEntry> {
    let mut temp_file = tempfile::NamedTempFile::new()?;
    temp_file.write_all(render_form(entry).as_bytes())?;
    temp_file.flush()?;

    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());
    let status = Command::new(editor).arg(temp_file.path()).status()?;
    if !status.success() {
        return Err(EcoError::EditorError);
    }

    let mut edited = String::new();
    temp_file.reopen()?.read_to_string(&mut edited)?;
    parse_form(&edited)
}

fn render_form(entry: &LogEntry) -> String {
    format!(
        "# Editing entry #{}. Lines starting with '#' above the fields are ignored.\n\
         # A line without a 'field:' prefix continues the field above it.\n\
         date: {}\n\
         time: {}\n\
         plant: {}\n\
         dosage: {}\n\
         notes: {}\n",
        entry.entry_number,
        entry.date_applied,
        entry.time_applied,
        entry.plant_area,
        entry.dosage_amount,
        entry.notes_remarks
    )
}

const FORM_FIELDS: [&str; 5] = ["date", "time", "plant", "dosage", "notes"];

/// Splits `field: value`, returning `None` unless `field` is a form field.
fn form_field(line: &str) -> Option<(&'static str, &str)> {
    let (key, value) = line.split_once(':')?;
    let key = FORM_FIELDS.into_iter().find(|f| *f == key.trim())?;
    Some((key, value.trim()))
}

fn form_value<'a>(data: &'a mut NewEntry, key: &str) -> &'a mut String {
    match key {
        "date" => &mut data.date_applied,
        "time" => &mut data.time_applied,
        "plant" => &mut data.plant_area,
        "dosage" => &mut data.dosage_amount,
        _ => data.notes_remarks.get_or_insert_with(String::new),
    }
}

fn parse_form(text: &str) -> Result<NewEntry> {
    let mut data = NewEntry::default();
    let mut current: Option<&'static str> = None;
    for line in text.lines() {
        if let Some((key, value)) = form_field(line) {
            *form_value(&mut data, key) = value.to_string();
            current = Some(key);
            continue;
        }
        match current {
            Some(key) => {
                let value = form_value(&mut data, key);
                value.push('\n');
                value.push_str(line.trim_end());
            }
            None if line.trim().is_empty() || line.trim_start().starts_with('#') => {}
            None => {
                return Err(EcoError::InvalidInput(format!(
                    "Expected 'field: value', got: {}",
                    line.trim()
                )));
            }
        }
    }
    Ok(data)
}

/// Handles 'del'
pub fn handle_del(medium: &Medium, number: u64, yes: bool) -> Result<()> {
    let mut store = RecordStore::load(medium);
    let id = store
        .find_by_number(number)
        .map(|e| e.id.clone())
        .ok_or(EcoError::EntryNotFound(number))?;

    if !yes
        && !confirm(&format!(
            "Are you sure you want to delete Entry #{}? This action cannot be undone.",
            number
        ))?
    {
        println!("Cancelled.");
        return Ok(());
    }

    if !store.delete(&id)? {
        return Err(EcoError::EntryNotFound(number));
    }
    sync_if_signed_in(medium, store.entries());
    println!("✓ Entry #{} deleted.", number);
    Ok(())
}

/// Handles 'export'
pub fn handle_export(medium: &Medium, output: Option<PathBuf>, to_stdout: bool) -> Result<()> {
    let store = RecordStore::load(medium);
    if store.is_empty() {
        println!("No entries to export.");
        return Ok(());
    }

    let text = store.export_to_text();
    if to_stdout {
        print!("{}", text);
        return Ok(());
    }

    let dir = match output {
        Some(dir) => dir,
        None => env::current_dir()?,
    };
    let path = dir.join(export_file_name(Utc::now().date_naive()));
    std::fs::write(&path, text)?;
    println!("✓ Log exported to {}", path.display());
    Ok(())
}

/// Handles 'applied'
pub fn handle_applied(medium: &Medium, at: Option<String>) -> Result<()> {
    let at = match at {
        Some(raw) => DateTime::parse_from_rfc3339(&raw)
            .map_err(|_| {
                EcoError::InvalidInput(
                    "Invalid timestamp. Use RFC 3339, e.g. 2026-10-19T08:30:00Z.".to_string(),
                )
            })?
            .with_timezone(&Utc),
        None => Utc::now(),
    };
    weather::set_last_application(medium, at)?;
    sync_if_signed_in(medium, RecordStore::load(medium).entries());

    println!("✓ Application recorded at {}.", at.with_timezone(&Local).format("%b %-d, %Y %-I:%M %p"));
    println!("{}", weather::countdown(Some(at), Utc::now()));
    Ok(())
}

/// Handles 'weather'
pub fn handle_weather(medium: &Medium) -> Result<()> {
    show_weather(medium, &SimulatedWeather);
    Ok(())
}

fn show_weather(medium: &Medium, source: &dyn WeatherSource) {
    let reading = source.current();
    let advice = weather::advice(&reading);

    println!("{}", reading.location);
    println!("  Condition:   {} ({})", reading.description, reading.condition);
    println!("  Temperature: {}°C", reading.temperature);
    println!("  Humidity:    {}%", reading.humidity);
    println!("  Wind:        {} km/h", reading.wind_speed);
    println!("  Pressure:    {} hPa", reading.pressure);
    println!();
    let marker = match advice.is_good_weather() {
        Some(true) => "✓",
        Some(false) => "✗",
        None => "?",
    };
    println!("{} {}", marker, advice.text());
    println!(
        "Next application: {}",
        weather::countdown(weather::last_application(medium), Utc::now())
    );
}

/// Handles 'pest'
pub fn handle_pest(medium: &Medium, action: PestAction) -> Result<()> {
    let mut data = PestCountData::load(medium);
    match action {
        PestAction::Set { group, timing, value } => {
            let group: Group = group.parse()?;
            let timing: Timing = timing.parse()?;
            data.update_count(medium, group, timing, value)?;
            sync_if_signed_in(medium, RecordStore::load(medium).entries());
            println!("✓ Count recorded.");
        }
        PestAction::Reset => {
            data = PestCountData::default();
            data.save(medium)?;
            sync_if_signed_in(medium, RecordStore::load(medium).entries());
            println!("✓ Counts cleared.");
        }
        PestAction::Show => {}
    }

    let count = |g, t| data.get(g, t).map_or("-".to_string(), |v| v.to_string());
    println!("            before  after");
    println!("  treated   {:<7} {}", count(Group::Treated, Timing::Before), count(Group::Treated, Timing::After));
    println!("  control   {:<7} {}", count(Group::Control, Timing::Before), count(Group::Control, Timing::After));

    match data.effectiveness() {
        Some(result) => {
            println!();
            println!("Treated reduction: {}%", result.treated_reduction);
            println!("Control reduction: {}%", result.control_reduction);
            println!("Effectiveness:     {}%", result.effectiveness);
        }
        None => println!("\nEffectiveness needs all four counts (with non-zero 'before' counts)."),
    }
    Ok(())
}

/// Handles 'theme'
pub fn handle_theme(
    medium: &Medium,
    value: Option<String>,
    toggle: bool,
    system: SystemAppearance,
) -> Result<()> {
    let system = match system {
        SystemAppearance::Light => Appearance::Light,
        SystemAppearance::Dark => Appearance::Dark,
    };

    let theme = if toggle {
        Theme::toggle(medium, system)?
    } else if let Some(v) = value {
        let theme: Theme = v.parse()?;
        theme.save(medium)?;
        theme
    } else {
        Theme::load(medium)
    };

    if theme == Theme::System {
        println!("Theme: system ({})", theme.resolve(system));
    } else {
        println!("Theme: {}", theme);
    }
    Ok(())
}

/// Handles 'signin'
pub fn handle_signin(medium: &Medium, token: &str) -> Result<()> {
    let identity = sync::decode_identity_token(token)?;
    sync::sign_in(medium, &identity)?;
    println!("✓ Signed in as {} <{}>", identity.name, identity.email);
    sync_if_signed_in(medium, RecordStore::load(medium).entries());
    Ok(())
}

/// Handles 'signout'
pub fn handle_signout(medium: &Medium) -> Result<()> {
    if sync::sign_out(medium)? {
        println!("✓ Signed out.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

/// Handles 'whoami'
pub fn handle_whoami(medium: &Medium) -> Result<()> {
    match sync::signed_in_user(medium) {
        Some(identity) => println!("{} <{}>", identity.name, identity.email),
        None => println!("Not signed in."),
    }
    Ok(())
}

fn plural(count: usize) -> &'static str {
    if count == 1 {
        "entry"
    } else {
        "entries"
    }
}

/// "2026-10-19" -> "Oct 19, 2026"; unparseable values are shown as stored.
fn format_date(date: &str) -> String {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|d| d.format("%b %-d, %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

/// "13:05" -> "1:05 PM"
fn format_time(time: &str) -> String {
    NaiveTime::parse_from_str(time, "%H:%M")
        .map(|t| t.format("%-I:%M %p").to_string())
        .unwrap_or_else(|_| time.to_string())
}

fn format_timestamp(ts: &str) -> String {
    DateTime::parse_from_rfc3339(ts)
        .map(|dt| dt.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|_| ts.to_string())
}
