//! Shared resource pools: rooms and invigilators.
//!
//! Rooms and invigilators are catalog rows created by administrators
//! before scheduling. The engine only reads them.

use serde::{Deserialize, Serialize};

/// Floors in the standard examination block.
pub const STANDARD_FLOORS: u32 = 15;
/// Rooms per floor in the standard examination block.
pub const ROOMS_PER_FLOOR: u32 = 8;
/// Seats per room in the standard examination block.
pub const STANDARD_ROOM_CAPACITY: u32 = 30;

/// An examination room.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    /// Unique room code (e.g. "TP101").
    pub code: String,
    /// Floor number.
    pub floor: u32,
    /// Seats available. `None` = use the configured default.
    #[serde(default)]
    pub capacity: Option<u32>,
}

impl Room {
    /// Creates a ground-floor room with no explicit capacity.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            floor: 0,
            capacity: None,
        }
    }

    /// Sets the floor.
    pub fn with_floor(mut self, floor: u32) -> Self {
        self.floor = floor;
        self
    }

    /// Sets the seat capacity.
    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Room capacity, or `default` when the room carries none.
    #[inline]
    pub fn capacity_or(&self, default: u32) -> u32 {
        self.capacity.unwrap_or(default)
    }

    /// The standard block: floors 1..=15, rooms 1..=8 per floor,
    /// codes `TP{floor}{room:02}`, 30 seats each.
    pub fn standard_block() -> Vec<Room> {
        (1..=STANDARD_FLOORS)
            .flat_map(|floor| {
                (1..=ROOMS_PER_FLOOR).map(move |n| {
                    Room::new(format!("TP{floor}{n:02}"))
                        .with_floor(floor)
                        .with_capacity(STANDARD_ROOM_CAPACITY)
                })
            })
            .collect()
    }
}

/// A staff member who supervises one room during one exam.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invigilator {
    /// Unique staff code (e.g. "VS12345").
    pub code: String,
    /// Display name.
    pub name: String,
}

impl Invigilator {
    /// Creates an invigilator with an empty name.
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: String::new(),
        }
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}
