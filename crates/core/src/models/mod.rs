#![allow(missing_docs)]

//! Shared domain models.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};
use uuid::Uuid;

/// Full name stored on return records, which only collect a student id.
pub const RETURN_PLACEHOLDER_NAME: &str = "นักศึกษา (คืนรายการ)";
/// Classroom stored on return records.
pub const RETURN_PLACEHOLDER_CLASSROOM: &str = "-";
/// Game list stored on return records.
pub const RETURN_PLACEHOLDER_GAMES: &str = "คืนบอร์ดเกมทั้งหมด";

/// A board game in the lending catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Stable identifier (e.g. `BG-001`).
    pub id: String,
    /// Display name shown in lists and joined into records.
    pub name: String,
    /// Image URL or path.
    pub image: String,
    /// Category label (e.g. `Strategy`).
    pub category: String,
    /// Whether the game is marked available on the shelf.
    pub available: bool,
    /// Free-text description.
    pub description: String,
}

impl Game {
    /// Short badge text for the availability flag.
    pub fn availability_label(&self) -> &'static str {
        if self.available {
            "available"
        } else {
            "borrowed"
        }
    }
}

/// Borrower details collected by the borrow form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentInfo {
    pub full_name: String,
    pub student_id: String,
    pub classroom: String,
}

/// Identity held for the current session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub email: String,
    pub full_name: String,
    /// Empty when the identity came from an assertion that lacks it.
    pub student_id: String,
    /// Empty when the identity came from an assertion that lacks it.
    pub classroom: String,
    pub picture: Option<String>,
    pub is_logged_in: bool,
}

impl User {
    /// Single-character avatar fallback when no picture is present.
    pub fn initial(&self) -> char {
        self.full_name.chars().next().unwrap_or('?')
    }
}

/// Transaction kind carried by a [`BorrowRecord`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordKind {
    Borrow,
    Return,
}

impl RecordKind {
    /// Wire label (`BORROW` / `RETURN`).
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Borrow => "BORROW",
            RecordKind::Return => "RETURN",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Immutable log entry for one borrow or return transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRecord {
    pub id: String,
    #[serde(serialize_with = "serialize_iso_millis")]
    pub timestamp: DateTime<Utc>,
    pub student_id: String,
    pub full_name: String,
    pub classroom: String,
    /// Game names joined with `", "`.
    pub games: String,
    #[serde(rename = "type")]
    pub kind: RecordKind,
}

impl BorrowRecord {
    /// Build a borrow record for the given student and joined game names.
    pub fn borrow(student: &StudentInfo, games: impl Into<String>) -> Self {
        Self {
            id: new_record_id(),
            timestamp: Utc::now(),
            student_id: student.student_id.trim().to_string(),
            full_name: student.full_name.trim().to_string(),
            classroom: student.classroom.trim().to_string(),
            games: games.into(),
            kind: RecordKind::Borrow,
        }
    }

    /// Build a return record; only the student id is known.
    pub fn return_all(student_id: &str) -> Self {
        Self {
            id: new_record_id(),
            timestamp: Utc::now(),
            student_id: student_id.trim().to_string(),
            full_name: RETURN_PLACEHOLDER_NAME.to_string(),
            classroom: RETURN_PLACEHOLDER_CLASSROOM.to_string(),
            games: RETURN_PLACEHOLDER_GAMES.to_string(),
            kind: RecordKind::Return,
        }
    }
}

fn new_record_id() -> String {
    format!("REC-{}", Uuid::new_v4().simple())
}

fn serialize_iso_millis<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_sheet_field_names() {
        let student = StudentInfo {
            full_name: "Somchai".to_string(),
            student_id: "12345".to_string(),
            classroom: "M.6/1".to_string(),
        };
        let record = BorrowRecord::borrow(&student, "Avalon");
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["type"], "BORROW");
        assert_eq!(value["studentId"], "12345");
        assert_eq!(value["fullName"], "Somchai");
        assert_eq!(value["classroom"], "M.6/1");
        assert_eq!(value["games"], "Avalon");
        assert!(value["id"].as_str().unwrap().starts_with("REC-"));
        assert!(value["timestamp"].as_str().unwrap().ends_with('Z'));
    }

    #[test]
    fn return_record_uses_placeholders() {
        let record = BorrowRecord::return_all("  12345 ");
        assert_eq!(record.student_id, "12345");
        assert_eq!(record.kind, RecordKind::Return);
        assert_eq!(record.full_name, RETURN_PLACEHOLDER_NAME);
        assert_eq!(record.classroom, "-");
        assert_eq!(record.games, RETURN_PLACEHOLDER_GAMES);
    }

    #[test]
    fn record_ids_do_not_collide_within_a_tick() {
        let first = BorrowRecord::return_all("1");
        let second = BorrowRecord::return_all("1");
        assert_ne!(first.id, second.id);
    }
}
