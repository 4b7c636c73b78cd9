//! Exam scheduling domain models.
//!
//! Provides the data types the engine reads (catalog rows) and writes
//! (assignments). Everything here is plain data with builders; conflict
//! rules live in [`crate::cp`].
//!
//! # Catalog vs. schedule
//!
//! | Type | Owned by | Mutable during scheduling |
//! |------|----------|---------------------------|
//! | Department, Subject | administrators | no |
//! | Room, Invigilator | administrators | no |
//! | Assignment, Schedule | Schedule Commit | append / replace only |

mod calendar;
mod resource;
mod schedule;
mod subject;

pub use calendar::{is_exam_day, DateWindow, Session};
pub use resource::{Invigilator, Room, ROOMS_PER_FLOOR, STANDARD_FLOORS, STANDARD_ROOM_CAPACITY};
pub use schedule::{Assignment, Invariant, Schedule, Violation};
pub use subject::{Department, Subject};
