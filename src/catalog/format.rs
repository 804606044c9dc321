use crate::config::Board;
use crate::selector::{ArrivalEvent, DirectionalArrivals, TRAINS_PER_DIRECTION};

use super::{CatalogItem, CatalogItemMap};

/// Value written to a slot with no train to show.
pub const PLACEHOLDER: &str = "--";

/// Catalog item id for `slot` (1-based) under `prefix`.
pub fn item_id(prefix: &str, slot: usize) -> String {
    format!("{prefix}_{slot}")
}

/// Maps both directions onto exactly [`TRAINS_PER_DIRECTION`] slots each,
/// filling empty slots with [`PLACEHOLDER`].
pub fn format_items(board: &Board, arrivals: &[DirectionalArrivals; 2]) -> CatalogItemMap {
    let mut items = CatalogItemMap::new();

    for (direction, arrivals) in board.directions.iter().zip(arrivals) {
        for slot in 1..=TRAINS_PER_DIRECTION {
            let minutes_away = arrivals
                .next_three_trains
                .get(slot - 1)
                .map_or(PLACEHOLDER, |e| e.minutes_away.as_str());
            items.insert(
                item_id(&direction.prefix, slot),
                CatalogItem {
                    minutes_away: minutes_away.to_string(),
                },
            );
        }
    }

    items
}

/// A fixed, plausible map for exercising the catalog without a live feed.
pub fn example_items(board: &Board) -> CatalogItemMap {
    let sample = |direction: &str, labels: &[&str]| DirectionalArrivals {
        direction: direction.to_string(),
        next_three_trains: labels
            .iter()
            .map(|l| ArrivalEvent {
                minutes_away: l.to_string(),
                arrival_epoch: 0,
            })
            .collect(),
    };
    let [a, b] = &board.directions;
    format_items(
        board,
        &[
            sample(&a.name, &["Arriving", "4 min", "11 min"]),
            sample(&b.name, &["2 min", "9 min"]),
        ],
    )
}
