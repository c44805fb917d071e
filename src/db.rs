//! On-disk task table and date helpers.
//!
//! `Database` is the persisted shape of the task table. The `Storage` trait is the
//! seam the store writes through: `JsonFile` keeps the table in a single JSON
//! document replaced atomically on every save, `MemoryStorage` keeps it in process.

use std::fmt::Write as _;
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::Result;
use crate::task::Task;

/// Layout version written to disk. Any other version is discarded on load.
pub const SCHEMA_VERSION: u32 = 1;

/// The task table as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub version: u32,
    /// Highest id ever handed out. Ids above it are fresh, ids at or below it
    /// are never reassigned even after their row is deleted.
    #[serde(default)]
    pub last_id: u64,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl Default for Database {
    fn default() -> Self {
        Database {
            version: SCHEMA_VERSION,
            last_id: 0,
            tasks: Vec::new(),
        }
    }
}

/// Only the version is read first so a newer layout never has to parse as ours.
#[derive(Deserialize)]
struct Header {
    #[serde(default)]
    version: Option<u32>,
}

impl Database {
    /// Parse a stored document. Returns `None` when the schema version differs.
    pub fn from_json(data: &str) -> Result<Option<Self>> {
        let header: Header = serde_json::from_str(data)?;
        if header.version != Some(SCHEMA_VERSION) {
            return Ok(None);
        }
        let mut db: Database = serde_json::from_str(data)?;
        db.last_id = db.last_id.max(db.max_id());
        Ok(Some(db))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Hand out the next id and advance the high-water mark.
    pub fn allocate_id(&mut self) -> u64 {
        self.last_id = self.last_id.max(self.max_id()) + 1;
        self.last_id
    }

    /// Record an externally chosen id so it is never allocated again.
    pub fn reserve_id(&mut self, id: u64) {
        self.last_id = self.last_id.max(id);
    }

    fn max_id(&self) -> u64 {
        self.tasks.iter().map(|t| t.id).max().unwrap_or(0)
    }

    /// Position of a task in insertion order.
    pub fn position(&self, id: u64) -> Option<usize> {
        self.tasks.iter().position(|t| t.id == id)
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    pub fn get_mut(&mut self, id: u64) -> Option<&mut Task> {
        let idx = self.position(id)?;
        self.tasks.get_mut(idx)
    }
}

/// Durable home of the task table.
pub trait Storage: Send {
    /// Read the table. A missing table is an empty one.
    fn load(&mut self) -> Result<Database>;

    /// Replace the stored table with `db`. Must be all-or-nothing.
    fn save(&mut self, db: &Database) -> Result<()>;

    /// Human-readable location, for logs.
    fn describe(&self) -> String;
}

/// Task table stored as one JSON file.
#[derive(Debug, Clone)]
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFile { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Storage for JsonFile {
    fn load(&mut self) -> Result<Database> {
        if !self.path.exists() {
            debug!(path = %self.path.display(), "no task file yet, starting empty");
            return Ok(Database::default());
        }
        let mut buf = String::new();
        File::open(&self.path)?.read_to_string(&mut buf)?;
        match Database::from_json(&buf)? {
            Some(db) => Ok(db),
            None => {
                warn!(
                    path = %self.path.display(),
                    expected = SCHEMA_VERSION,
                    "task file has a different schema version, recreating it empty"
                );
                let fresh = Database::default();
                self.save(&fresh)?;
                Ok(fresh)
            }
        }
    }

    fn save(&mut self, db: &Database) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // Atomic-ish write via temp + rename.
        let tmp = self.path.with_extension("json.tmp");
        let data = db.to_json()?;
        let mut f = File::create(&tmp)?;
        f.write_all(data.as_bytes())?;
        f.sync_all()?;
        fs::rename(tmp, &self.path)?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Task table that lives only as long as the process.
#[derive(Debug, Default, Clone)]
pub struct MemoryStorage {
    saved: Option<Database>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn load(&mut self) -> Result<Database> {
        Ok(self.saved.clone().unwrap_or_default())
    }

    fn save(&mut self, db: &Database) -> Result<()> {
        self.saved = Some(db.clone());
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".into()
    }
}

/// Parse human-readable due date input.
///
/// Supports:
/// - "today", "tomorrow", "yesterday"
/// - "monday", "next monday", "this friday", "weekend"
/// - "end of week", "end of month"
/// - "in 3d", "in 2w", "in 1m"
/// - "YYYY-MM-DD"
pub fn parse_due_input(s: &str) -> Option<NaiveDate> {
    parse_due_relative_to(s, Local::now().date_naive())
}

/// `parse_due_input` against an explicit "today".
pub fn parse_due_relative_to(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    let s = s.trim().to_lowercase();

    match s.as_str() {
        "today" => return Some(today),
        "tomorrow" => return Some(today + Duration::days(1)),
        "yesterday" => return Some(today - Duration::days(1)),
        "end of week" | "eow" => {
            let (_, end) = start_end_of_this_week(today);
            return Some(end);
        }
        "end of month" | "eom" => {
            let (year, month) = if today.month() == 12 {
                (today.year() + 1, 1)
            } else {
                (today.year(), today.month() + 1)
            };
            let first_of_next = NaiveDate::from_ymd_opt(year, month, 1)?;
            return Some(first_of_next - Duration::days(1));
        }
        "this weekend" | "weekend" => {
            let days_until_saturday = (5 + 7 - today.weekday().num_days_from_monday()) % 7;
            return Some(today + Duration::days(days_until_saturday as i64));
        }
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        let rest = rest.trim();
        if let Some((idx, _)) = rest.char_indices().last() {
            let (num, unit) = rest.split_at(idx);
            if let Ok(n) = num.trim().parse::<i64>() {
                let offset = match unit {
                    "d" => Duration::try_days(n),
                    "w" => Duration::try_weeks(n),
                    // Approximate: 30 days per month
                    "m" => n.checked_mul(30).and_then(Duration::try_days),
                    _ => return None,
                };
                return today.checked_add_signed(offset?);
            }
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current = today.weekday().num_days_from_monday() as i64;
    for (day_name, target) in weekdays {
        let days_ahead = (target + 7 - current) % 7;
        if s == day_name || s == format!("this {day_name}") {
            return Some(today + Duration::days(days_ahead));
        }
        if s == format!("next {day_name}") {
            let days = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return Some(today + Duration::days(days));
        }
    }

    NaiveDate::parse_from_str(&s, "%Y-%m-%d").ok()
}

/// Turn a picked calendar day into a due instant, keeping the current time of day.
pub fn due_on(date: NaiveDate) -> DateTime<Utc> {
    let time = Local::now().time();
    due_on_at(date, time)
}

pub fn due_on_at(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(&date.and_time(time))
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&date.and_time(time)))
}

/// Calculate the start and end dates of the current ISO week (Monday to Sunday).
pub fn start_end_of_this_week(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let weekday = today.weekday().num_days_from_monday() as i64;
    let start = today - Duration::days(weekday);
    (start, start + Duration::days(6))
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: NaiveDate, today: NaiveDate) -> String {
    let days = (due - today).num_days();
    match days {
        0 => "today".into(),
        1 => "tomorrow".into(),
        d if d > 1 => format!("in {d}d"),
        d => format!("{}d late", -d),
    }
}

/// Day and abbreviated month, e.g. "07 Mar".
pub const DEFAULT_DATE_FORMAT: &str = "%d %b";

/// True when every specifier in `format` is one chrono understands.
pub fn is_valid_date_format(format: &str) -> bool {
    StrftimeItems::new(format).all(|item| !matches!(item, Item::Error))
}

/// Render a due instant in local time with a chrono format string. An
/// unusable format falls back to `DEFAULT_DATE_FORMAT`.
pub fn format_due(due: DateTime<Utc>, format: &str) -> String {
    let local = due.with_timezone(&Local);
    let mut out = String::new();
    if write!(out, "{}", local.format(format)).is_err() {
        return local.format(DEFAULT_DATE_FORMAT).to_string();
    }
    out
}

pub fn local_date(due: DateTime<Utc>) -> NaiveDate {
    due.with_timezone(&Local).date_naive()
}

/// Truncate a string to a maximum width, adding ellipsis if needed.
pub fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(id: u64) -> Task {
        let mut t = Task::new(format!("t{id}"), "d", "c", Utc::now());
        t.id = id;
        t
    }

    #[test]
    fn test_allocate_id_never_reuses() {
        let mut db = Database::default();
        assert_eq!(db.allocate_id(), 1);
        assert_eq!(db.allocate_id(), 2);
        db.tasks.clear();
        assert_eq!(db.allocate_id(), 3);
        db.reserve_id(10);
        assert_eq!(db.allocate_id(), 11);
    }

    #[test]
    fn test_json_file_roundtrip_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut storage = JsonFile::new(dir.path().join("nested").join("tasks.json"));
        assert_eq!(storage.load().unwrap(), Database::default());

        let mut db = Database::default();
        db.tasks.push(sample(1));
        db.last_id = 4;
        storage.save(&db).unwrap();
        assert_eq!(storage.load().unwrap(), db);
        assert!(!storage.path().with_extension("json.tmp").exists());
    }

    #[test]
    fn test_other_schema_version_is_wiped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, r#"{"version": 2, "rows": [{"anything": true}]}"#).unwrap();

        let mut storage = JsonFile::new(&path);
        let db = storage.load().unwrap();
        assert!(db.tasks.is_empty());
        assert_eq!(db.version, SCHEMA_VERSION);

        let on_disk = fs::read_to_string(&path).unwrap();
        assert!(on_disk.contains("\"version\": 1"));
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tasks.json");
        fs::write(&path, "not json").unwrap();
        let err = JsonFile::new(&path).load().unwrap_err();
        assert!(err.is_storage());
    }

    #[test]
    fn test_last_id_catches_up_with_rows() {
        let json = r#"{"version":1,"tasks":[{"task_id":5,"title":"a","description":"b","course":"c","dueDate":0,"isFinished":true}]}"#;
        let mut db = Database::from_json(json).unwrap().unwrap();
        assert_eq!(db.last_id, 5);
        assert_eq!(db.allocate_id(), 6);
    }

    #[test]
    fn test_parse_due_input() {
        // 2024-05-15 is a Wednesday.
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day);
        assert_eq!(parse_due_relative_to("today", today), d(2024, 5, 15));
        assert_eq!(parse_due_relative_to("Tomorrow", today), d(2024, 5, 16));
        assert_eq!(parse_due_relative_to("in 3d", today), d(2024, 5, 18));
        assert_eq!(parse_due_relative_to("in 2w", today), d(2024, 5, 29));
        assert_eq!(parse_due_relative_to("friday", today), d(2024, 5, 17));
        assert_eq!(parse_due_relative_to("next wednesday", today), d(2024, 5, 22));
        assert_eq!(parse_due_relative_to("weekend", today), d(2024, 5, 18));
        assert_eq!(parse_due_relative_to("eow", today), d(2024, 5, 19));
        assert_eq!(parse_due_relative_to("eom", today), d(2024, 5, 31));
        assert_eq!(parse_due_relative_to("2024-12-25", today), d(2024, 12, 25));
        assert_eq!(parse_due_relative_to("someday", today), None);
        assert_eq!(parse_due_relative_to("in 3y", today), None);
    }

    #[test]
    fn test_huge_relative_due_is_rejected() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        assert_eq!(parse_due_relative_to("in 9999999999999d", today), None);
        assert_eq!(parse_due_relative_to("in 9999999999999w", today), None);
        assert_eq!(parse_due_relative_to("in 9223372036854775807m", today), None);
        // In range for a duration, out of range for a calendar date.
        assert_eq!(parse_due_relative_to("in 999999999d", today), None);
    }

    #[test]
    fn test_format_due_with_bad_format_falls_back() {
        let due = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        assert!(is_valid_date_format("%Y-%m-%d %H:%M"));
        assert!(!is_valid_date_format("%Q"));
        assert_eq!(format_due(due, "%Q"), format_due(due, DEFAULT_DATE_FORMAT));
        assert_eq!(format_due(due, "%Y"), "2024");
    }

    #[test]
    fn test_format_due_relative() {
        let today = NaiveDate::from_ymd_opt(2024, 5, 15).unwrap();
        assert_eq!(format_due_relative(today, today), "today");
        assert_eq!(format_due_relative(today + Duration::days(1), today), "tomorrow");
        assert_eq!(format_due_relative(today + Duration::days(4), today), "in 4d");
        assert_eq!(format_due_relative(today - Duration::days(2), today), "2d late");
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer title", 6), "a lon…");
    }
}
