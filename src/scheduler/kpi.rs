//! Schedule metrics (KPIs).
//!
//! Summarizes a committed exam schedule for display. Nothing here feeds
//! back into placement.
//!
//! # Metrics
//!
//! | Metric | Definition |
//! |--------|-----------|
//! | Exams | Distinct subjects scheduled |
//! | Assignments | Room bookings |
//! | Exam Days | Distinct dates used |
//! | Seats Used | Sum of students over all bookings |
//! | Invigilator Load | Bookings per invigilator |
//! | Rooms By Date | Bookings per date |
//! | Avg Fill Ratio | Mean of students / room seat limit |
//!
//! # Reference
//! Carter, Laporte & Lee (1996), "Examination Timetabling", §2: evaluation measures

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::models::{Room, Schedule};

/// Exam schedule indicators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleKpi {
    /// Distinct subjects with assignments.
    pub exam_count: usize,
    /// Total room bookings.
    pub assignment_count: usize,
    /// Distinct dates with at least one exam.
    pub exam_days: usize,
    /// Students seated across all bookings.
    pub seats_used: u64,
    /// Bookings per invigilator.
    pub invigilator_load: BTreeMap<String, usize>,
    /// Bookings per date.
    pub rooms_by_date: BTreeMap<NaiveDate, usize>,
    /// Mean fill ratio of booked rooms (0.0..1.0).
    pub avg_fill_ratio: f64,
}

impl ScheduleKpi {
    /// Computes KPIs for a schedule.
    ///
    /// Seat limits come from `rooms` under `config`; rooms missing from
    /// the list count with the configured default.
    pub fn calculate(schedule: &Schedule, rooms: &[Room], config: &EngineConfig) -> Self {
        let caps: HashMap<&str, u32> = rooms
            .iter()
            .map(|r| (r.code.as_str(), config.room_capacity(r)))
            .collect();

        let mut rooms_by_date: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        let mut dates = BTreeSet::new();
        let mut seats_used: u64 = 0;
        let mut fill_sum = 0.0;

        for a in &schedule.assignments {
            *rooms_by_date.entry(a.date).or_insert(0) += 1;
            dates.insert(a.date);
            seats_used += u64::from(a.student_count);

            let cap = caps
                .get(a.room_code.as_str())
                .copied()
                .unwrap_or(config.default_room_capacity);
            if cap > 0 {
                fill_sum += f64::from(a.student_count) / f64::from(cap);
            }
        }

        let avg_fill_ratio = if schedule.is_empty() {
            0.0
        } else {
            fill_sum / schedule.assignment_count() as f64
        };

        Self {
            exam_count: schedule.exam_count(),
            assignment_count: schedule.assignment_count(),
            exam_days: dates.len(),
            seats_used,
            invigilator_load: schedule
                .invigilator_loads()
                .into_iter()
                .map(|(code, n)| (code.to_string(), n))
                .collect(),
            rooms_by_date,
            avg_fill_ratio,
        }
    }

    /// Highest booking count of any invigilator.
    pub fn max_invigilator_load(&self) -> usize {
        self.invigilator_load.values().copied().max().unwrap_or(0)
    }

    /// Whether the schedule meets the given quality thresholds.
    pub fn meets_thresholds(&self, max_invigilator_load: usize, min_fill_ratio: f64) -> bool {
        self.max_invigilator_load() <= max_invigilator_load && self.avg_fill_ratio >= min_fill_ratio
    }
}
