//! Room selection and student splitting.
//!
//! Rooms are taken in catalog order until their combined seats cover the
//! subject. Students are then spread as evenly as the rooms allow: with
//! `n` students over `k` rooms the first `n % k` rooms get `n / k + 1` and
//! the rest `n / k`. When a room seats fewer than its even share, its
//! overflow is re-spread over the rooms that still have seats.
//!
//! A backtracking search cannot stop at the first room set: with mixed
//! seat limits, seating a small subject in a large room can leave a later
//! subject without one. [`room_options`] lists every room set worth
//! trying, treating rooms of one seat limit as interchangeable.

use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::models::Room;

/// Picks rooms, in the given order, until their seats cover `students`.
///
/// Returns `None` if all rooms together seat fewer than `students`.
pub fn select_rooms<'a, I>(
    rooms: I,
    students: u32,
    config: &EngineConfig,
) -> Option<Vec<&'a Room>>
where
    I: IntoIterator<Item = &'a Room>,
{
    let mut chosen = Vec::new();
    let mut seats: u64 = 0;
    if students == 0 {
        return Some(chosen);
    }
    for room in rooms {
        let cap = config.room_capacity(room);
        if cap == 0 {
            continue;
        }
        chosen.push(room);
        seats += u64::from(cap);
        if seats >= u64::from(students) {
            return Some(chosen);
        }
    }
    None
}

/// Number of catalog rooms a subject of `students` needs when rooms are
/// taken in catalog order. `None` if the catalog cannot seat it.
///
/// With a uniform cap this equals `ceil(students / cap)`.
pub fn rooms_needed(rooms: &[Room], students: u32, config: &EngineConfig) -> Option<usize> {
    select_rooms(rooms, students, config).map(|chosen| chosen.len())
}

/// Room sets able to seat `students`, for a search that may backtrack.
///
/// Rooms sharing a seat limit are interchangeable, so each set uses the
/// earliest rooms (in the given order) of each limit. Every minimal
/// combination of per-limit room counts is listed: dropping any room
/// from a set leaves the subject short. The [`select_rooms`] choice comes
/// first, then sets with fewer rooms, then sets with fewer seats. Rooms
/// inside a set keep the given order. Empty if the rooms cannot seat
/// `students` at all.
pub fn room_options<'a>(
    rooms: &[&'a Room],
    students: u32,
    config: &EngineConfig,
) -> Vec<Vec<&'a Room>> {
    // Seat limit -> positions in `rooms`, largest limit first.
    let mut by_cap: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (pos, room) in rooms.iter().enumerate() {
        let cap = config.room_capacity(room);
        if cap > 0 {
            by_cap.entry(cap).or_default().push(pos);
        }
    }
    let groups: Vec<(u64, Vec<usize>)> = by_cap
        .into_iter()
        .rev()
        .map(|(cap, positions)| (u64::from(cap), positions))
        .collect();

    let mut counts = Vec::with_capacity(groups.len());
    let mut found = Vec::new();
    collect_counts(&groups, u64::from(students), 0, &mut counts, &mut found);

    let mut sets: Vec<(Vec<usize>, u64)> = found
        .into_iter()
        .map(|counts| {
            let mut positions = Vec::new();
            let mut seats = 0;
            for ((cap, group), k) in groups.iter().zip(counts) {
                positions.extend(&group[..k]);
                seats += cap * k as u64;
            }
            positions.sort_unstable();
            (positions, seats)
        })
        .collect();
    sets.sort_by_key(|(positions, seats)| (positions.len(), *seats));

    let mut options: Vec<Vec<&'a Room>> = Vec::with_capacity(sets.len() + 1);
    if let Some(first) = select_rooms(rooms.iter().copied(), students, config) {
        options.push(first);
    }
    for (positions, _) in sets {
        let set: Vec<&'a Room> = positions.iter().map(|&p| rooms[p]).collect();
        if !options.iter().any(|o| same_rooms(o, &set)) {
            options.push(set);
        }
    }
    options
}

/// Depth-first over seat-limit groups (largest first), choosing how many
/// rooms of each group to take. A group's last room must be needed.
fn collect_counts(
    groups: &[(u64, Vec<usize>)],
    students: u64,
    seats: u64,
    counts: &mut Vec<usize>,
    found: &mut Vec<Vec<usize>>,
) {
    if seats >= students {
        let mut full = counts.clone();
        full.resize(groups.len(), 0);
        found.push(full);
        return;
    }
    let Some((cap, group)) = groups.get(counts.len()) else {
        return;
    };
    for k in 0..=group.len() {
        if k > 0 && seats + cap * (k as u64 - 1) >= students {
            break;
        }
        counts.push(k);
        collect_counts(groups, students, seats + cap * k as u64, counts, found);
        counts.pop();
    }
}

fn same_rooms(a: &[&Room], b: &[&Room]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.code == y.code)
}

/// Splits `total` students over rooms with the given seat limits.
///
/// The caller guarantees `sum(caps) >= total`; any remainder that cannot
/// be seated is left off the returned shares.
pub fn split_students(total: u32, caps: &[u32]) -> Vec<u32> {
    let mut shares = vec![0u32; caps.len()];
    let mut open: Vec<usize> = (0..caps.len()).filter(|&i| caps[i] > 0).collect();
    let mut left = total;

    while left > 0 && !open.is_empty() {
        let n = open.len() as u32;
        let base = left / n;
        let extra = left % n;
        let mut still_open = Vec::with_capacity(open.len());

        for (pos, &i) in open.iter().enumerate() {
            let want = base + u32::from((pos as u32) < extra);
            let give = want.min(caps[i] - shares[i]);
            shares[i] += give;
            left -= give;
            if shares[i] < caps[i] {
                still_open.push(i);
            }
        }
        open = still_open;
    }

    shares
}
