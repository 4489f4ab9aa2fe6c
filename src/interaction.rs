//! Selection and drag-and-drop handling for the allocation board.
//!
//! Pointer geometry comes from whatever renders the board; this module only
//! turns it into an insertion point and applies drops to a [`Board`].

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::board::{Board, BucketId, MoveOutcome, PersonId};
use crate::error::{AllocationError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    #[default]
    Idle,
    Selected,
    /// Part of the current drag payload. Dragging items are also selected.
    Dragging,
}

/// Vertical extent of one rendered item inside a bucket
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ItemBox {
    pub id: PersonId,
    pub top: f64,
    pub height: f64,
}

/// Where a drop would currently land
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InsertionMarker {
    pub bucket: BucketId,
    /// Position among the bucket's non-dragging items
    pub index: usize,
    /// The item the drop would be inserted in front of
    pub before: Option<PersonId>,
}

/// Index of the nearest item whose vertical midpoint lies below the pointer,
/// or `None` when the drop belongs at the end.
pub fn compute_insertion_index(layout: &[ItemBox], pointer_y: f64) -> Option<usize> {
    let mut closest: Option<(usize, f64)> = None;
    for (i, item) in layout.iter().enumerate() {
        let offset = pointer_y - item.top - item.height / 2.0;
        if offset < 0.0 && closest.map_or(true, |(_, best)| offset > best) {
            closest = Some((i, offset));
        }
    }
    closest.map(|(i, _)| i)
}

#[derive(Debug, Default)]
pub struct Controller {
    states: HashMap<PersonId, ItemState>,
    marker: Option<InsertionMarker>,
}

impl Controller {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets all selection and drag state
    pub fn reset(&mut self) {
        self.states.clear();
        self.marker = None;
    }

    pub fn state_of(&self, id: PersonId) -> ItemState {
        self.states.get(&id).copied().unwrap_or_default()
    }

    pub fn marker(&self) -> Option<InsertionMarker> {
        self.marker
    }

    /// The drag payload in on-screen order
    pub fn dragging(&self, board: &Board) -> Vec<PersonId> {
        let ids: HashSet<PersonId> = self
            .states
            .iter()
            .filter(|(_, s)| **s == ItemState::Dragging)
            .map(|(id, _)| *id)
            .collect();
        board.persons_in_board_order(&ids)
    }

    fn ensure_on_board(board: &Board, id: PersonId) -> Result<()> {
        match board.locate(id) {
            Some(_) => Ok(()),
            None => Err(AllocationError::UnknownPerson(id)),
        }
    }

    /// Toggles one item between idle and selected
    pub fn click(&mut self, board: &Board, id: PersonId) -> Result<ItemState> {
        Self::ensure_on_board(board, id)?;
        let next = match self.state_of(id) {
            ItemState::Idle => ItemState::Selected,
            ItemState::Selected | ItemState::Dragging => ItemState::Idle,
        };
        if next == ItemState::Idle {
            self.states.remove(&id);
        } else {
            self.states.insert(id, next);
        }
        Ok(next)
    }

    /// Starts a drag on `id`. An unselected item replaces the selection;
    /// a selected one drags the whole selection along. Returns the payload.
    pub fn drag_start(&mut self, board: &Board, id: PersonId) -> Result<Vec<PersonId>> {
        Self::ensure_on_board(board, id)?;
        if self.state_of(id) == ItemState::Idle {
            self.states.clear();
            self.states.insert(id, ItemState::Selected);
        }
        for state in self.states.values_mut() {
            *state = ItemState::Dragging;
        }
        Ok(self.dragging(board))
    }

    /// Ends the gesture whatever its outcome: nothing stays dragging
    pub fn drag_end(&mut self) {
        for state in self.states.values_mut() {
            if *state == ItemState::Dragging {
                *state = ItemState::Selected;
            }
        }
        self.marker = None;
    }

    fn resolve(&self, bucket: BucketId, pointer_y: f64, layout: &[ItemBox]) -> InsertionMarker {
        let candidates: Vec<ItemBox> = layout
            .iter()
            .filter(|item| self.state_of(item.id) != ItemState::Dragging)
            .copied()
            .collect();
        match compute_insertion_index(&candidates, pointer_y) {
            Some(index) => InsertionMarker {
                bucket,
                index,
                before: Some(candidates[index].id),
            },
            None => InsertionMarker {
                bucket,
                index: candidates.len(),
                before: None,
            },
        }
    }

    /// Tracks the pointer over `bucket` and moves the insertion marker
    pub fn drag_over(&mut self, bucket: BucketId, pointer_y: f64, layout: &[ItemBox]) -> InsertionMarker {
        let marker = self.resolve(bucket, pointer_y, layout);
        self.marker = Some(marker);
        marker
    }

    /// Pointer left `bucket` without dropping
    pub fn drag_leave(&mut self, bucket: BucketId) {
        if self.marker.is_some_and(|m| m.bucket == bucket) {
            self.marker = None;
        }
    }

    /// Drops the drag payload into `target`. A drop outside every bucket
    /// only clears the marker. Moved items come out idle.
    pub fn drop_on(
        &mut self,
        board: &mut Board,
        target: Option<BucketId>,
        pointer_y: f64,
        layout: &[ItemBox],
    ) -> Result<Option<MoveOutcome>> {
        self.marker = None;
        let Some(target) = target else {
            return Ok(None);
        };

        let payload = self.dragging(board);
        if payload.is_empty() {
            return Ok(None);
        }

        let marker = self.resolve(target, pointer_y, layout);
        let outcome = board.move_items_before(&payload, target, marker.before)?;
        for id in &outcome.moved {
            self.states.remove(id);
        }

        info!(count = outcome.moved.len(), to = %target, "dropped requests");
        for (bucket, counts) in &outcome.affected {
            debug!(
                bucket = %bucket,
                requests = counts.requests,
                people = counts.total_people,
                "recounted bucket"
            );
        }
        Ok(Some(outcome))
    }
}
