//! Picks the next arrivals per direction out of decoded trip updates.

use serde::Serialize;

use crate::config::Board;
use crate::parser::TripUpdateRecord;

/// How many upcoming trains each direction keeps.
pub const TRAINS_PER_DIRECTION: usize = 3;

/// Label shown once a train is less than half a minute away.
pub const ARRIVING_LABEL: &str = "Arriving";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrivalEvent {
    pub minutes_away: String,
    pub arrival_epoch: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionalArrivals {
    pub direction: String,
    pub next_three_trains: Vec<ArrivalEvent>,
}

/// Whole minutes from `now` until `arrival`, half-minutes rounding up.
///
/// 30 seconds in the past is still 0; 31 seconds in the past is -1.
/// Saturates instead of overflowing on extreme inputs.
pub fn minutes_until(arrival: i64, now: i64) -> i64 {
    arrival.saturating_sub(now).saturating_add(30).div_euclid(60)
}

/// Display label for a non-negative minute count.
pub fn label(minutes: i64) -> String {
    if minutes <= 0 {
        ARRIVING_LABEL.to_string()
    } else {
        format!("{minutes} min")
    }
}

/// Buckets every upcoming arrival on `board.route_id` at either of the
/// board's stops, sorted by true arrival time and cut to
/// [`TRAINS_PER_DIRECTION`].
///
/// The result is index-aligned with `board.directions`. Updates missing a
/// stop id or arrival time are skipped, as are trains already gone.
pub fn select_arrivals(
    trips: &[TripUpdateRecord],
    board: &Board,
    now: i64,
) -> [DirectionalArrivals; 2] {
    let mut buckets: [Vec<ArrivalEvent>; 2] = [Vec::new(), Vec::new()];

    for trip in trips {
        if trip.route_id.as_deref() != Some(board.route_id.as_str()) {
            continue;
        }

        for stu in &trip.stop_time_updates {
            let (Some(stop_id), Some(arrival)) = (stu.stop_id.as_deref(), stu.arrival_time) else {
                continue;
            };

            // Board::new guarantees the stop ids differ, so at most one matches.
            let Some(idx) = board
                .directions
                .iter()
                .position(|d| d.stop_id == stop_id)
            else {
                continue;
            };

            let minutes = minutes_until(arrival, now);
            if minutes < 0 {
                continue;
            }

            buckets[idx].push(ArrivalEvent {
                minutes_away: label(minutes),
                arrival_epoch: arrival,
            });
        }
    }

    let [first, second] = buckets;
    let [dir_a, dir_b] = &board.directions;
    [
        window(&dir_a.name, first),
        window(&dir_b.name, second),
    ]
}

fn window(direction: &str, mut events: Vec<ArrivalEvent>) -> DirectionalArrivals {
    events.sort_by_key(|e| e.arrival_epoch);
    events.truncate(TRAINS_PER_DIRECTION);
    DirectionalArrivals {
        direction: direction.to_string(),
        next_three_trains: events,
    }
}
