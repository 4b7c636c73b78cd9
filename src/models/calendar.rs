//! Exam calendar: sessions and date windows.
//!
//! An exam day has two half-day sessions, forenoon (FN) and afternoon (AN).
//! Exams are only held on weekdays; weekends inside a requested window are
//! skipped, never scheduled.
//!
//! # Ordering
//! `Session` orders FN before AN. Every search in this crate walks dates
//! ascending and sessions in `Session::ALL` order, which is what makes the
//! first-fit result reproducible.

use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

/// A half-day exam slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Session {
    /// Forenoon session.
    #[serde(rename = "FN")]
    Forenoon,
    /// Afternoon session.
    #[serde(rename = "AN")]
    Afternoon,
}

impl Session {
    /// Both sessions in search order (FN before AN).
    pub const ALL: [Session; 2] = [Session::Forenoon, Session::Afternoon];

    /// Short code used in timetables ("FN" / "AN").
    pub fn code(&self) -> &'static str {
        match self {
            Session::Forenoon => "FN",
            Session::Afternoon => "AN",
        }
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Session {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FN" => Ok(Session::Forenoon),
            "AN" => Ok(Session::Afternoon),
            other => Err(format!("unknown session '{other}' (expected FN or AN)")),
        }
    }
}

/// An inclusive range of calendar dates [start, end].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    /// First candidate date (inclusive).
    pub start: NaiveDate,
    /// Last candidate date (inclusive).
    pub end: NaiveDate,
}

impl DateWindow {
    /// Creates a window. The window may be inverted; callers validate with
    /// [`DateWindow::is_valid`].
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A window covering a single day.
    pub fn single(date: NaiveDate) -> Self {
        Self::new(date, date)
    }

    /// Whether `start <= end`.
    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    /// Whether a date falls within the window.
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// All Monday–Friday dates in the window, ascending.
    ///
    /// Returns an empty vector for inverted or weekend-only windows.
    pub fn exam_days(&self) -> Vec<NaiveDate> {
        if !self.is_valid() {
            return Vec::new();
        }
        self.start
            .iter_days()
            .take_while(|d| *d <= self.end)
            .filter(|d| is_exam_day(*d))
            .collect()
    }
}

/// Whether exams may be held on this date (Monday–Friday).
#[inline]
pub fn is_exam_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}
