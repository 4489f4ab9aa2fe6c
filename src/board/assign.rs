use std::collections::HashMap;

use tracing::info;

use super::model::Board;
use super::types::{BucketId, Person};
use crate::config::Settings;

/// Builds the initial board from requests in upload order.
///
/// Requests from a special pickup point go to the first taxi load (1, 2, 3)
/// whose running total plus the group still fits the taxi capacity. All
/// other requests, and special ones that fit nowhere, land in the
/// unassigned pool. Bus loads start empty.
pub fn auto_assign(persons: Vec<Person>, settings: &Settings) -> Board {
    let mut board = Board::new();
    let capacity = u64::from(settings.taxi_capacity);
    let mut taxi_totals: HashMap<BucketId, u64> =
        BucketId::TAXI_LOADS.iter().map(|&id| (id, 0)).collect();

    for person in persons {
        let mut assigned_to = None;
        if settings.is_special_location(&person.location) {
            for taxi in BucketId::TAXI_LOADS {
                let total = taxi_totals.get(&taxi).copied().unwrap_or(0);
                let with_group = total + u64::from(person.group_size);
                if with_group <= capacity {
                    taxi_totals.insert(taxi, with_group);
                    assigned_to = Some(taxi);
                    break;
                }
            }
        }

        board.push(assigned_to.unwrap_or(BucketId::Unassigned), person);
    }

    info!(
        requests = board.total_requests(),
        people = board.total_people(),
        unassigned = board.counts(BucketId::Unassigned).requests,
        "auto-assigned requests"
    );
    board
}
