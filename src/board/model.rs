use std::collections::HashSet;

use tracing::debug;

use super::types::{Bucket, BucketCounts, BucketId, Person, PersonId};
use crate::error::{AllocationError, Result};

/// Every bucket on the board. Each person lives in exactly one bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    buckets: Vec<Bucket>,
}

/// Result of a move: freshly recomputed counts for every bucket it touched
#[derive(Debug, Clone, PartialEq)]
pub struct MoveOutcome {
    pub moved: Vec<PersonId>,
    pub affected: Vec<(BucketId, BucketCounts)>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            buckets: BucketId::ALL.iter().map(|&id| Bucket::new(id)).collect(),
        }
    }

    /// Buckets in display order
    pub fn buckets(&self) -> impl Iterator<Item = &Bucket> {
        self.buckets.iter()
    }

    pub fn bucket(&self, id: BucketId) -> &Bucket {
        &self.buckets[Self::slot(id)]
    }

    fn bucket_mut(&mut self, id: BucketId) -> &mut Bucket {
        &mut self.buckets[Self::slot(id)]
    }

    fn slot(id: BucketId) -> usize {
        BucketId::ALL
            .iter()
            .position(|&b| b == id)
            .unwrap_or(BucketId::ALL.len() - 1)
    }

    pub(crate) fn push(&mut self, id: BucketId, person: Person) {
        self.bucket_mut(id).items.push(person);
    }

    pub fn counts(&self, id: BucketId) -> BucketCounts {
        self.bucket(id).counts()
    }

    pub fn total_people(&self) -> u64 {
        self.buckets.iter().map(|b| b.counts().total_people).sum()
    }

    pub fn total_requests(&self) -> usize {
        self.buckets.iter().map(|b| b.items.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.iter().all(Bucket::is_empty)
    }

    pub fn locate(&self, id: PersonId) -> Option<(BucketId, usize)> {
        self.buckets
            .iter()
            .find_map(|b| b.position(id).map(|pos| (b.id, pos)))
    }

    /// The subset of `ids` present on the board, in on-screen order.
    pub fn persons_in_board_order(&self, ids: &HashSet<PersonId>) -> Vec<PersonId> {
        self.buckets
            .iter()
            .flat_map(|b| b.items.iter())
            .map(|p| p.id)
            .filter(|id| ids.contains(id))
            .collect()
    }

    /// Moves `ids` into `target` so the first of them lands at `index`.
    ///
    /// `index` counts positions in `target` once the moved persons have been
    /// taken out, and is clamped to its length. Relative order of `ids` is
    /// kept; duplicates are ignored. Unknown ids reject the whole move.
    pub fn move_items(
        &mut self,
        ids: &[PersonId],
        target: BucketId,
        index: usize,
    ) -> Result<MoveOutcome> {
        let (moving, sources) = self.detach(ids)?;
        let at = index.min(self.bucket(target).items.len());
        Ok(self.attach(moving, sources, target, at))
    }

    /// Moves `ids` into `target` directly in front of `before`, or to the end
    /// when `before` is absent or not in `target`.
    pub fn move_items_before(
        &mut self,
        ids: &[PersonId],
        target: BucketId,
        before: Option<PersonId>,
    ) -> Result<MoveOutcome> {
        let moving: HashSet<PersonId> = ids.iter().copied().collect();
        let index = self
            .bucket(target)
            .items
            .iter()
            .filter(|p| !moving.contains(&p.id))
            .position(|p| Some(p.id) == before)
            .unwrap_or(usize::MAX);
        self.move_items(ids, target, index)
    }

    fn detach(&mut self, ids: &[PersonId]) -> Result<(Vec<Person>, Vec<BucketId>)> {
        let mut seen = HashSet::new();
        let wanted: Vec<PersonId> = ids.iter().copied().filter(|id| seen.insert(*id)).collect();

        if let Some(missing) = wanted.iter().find(|id| self.locate(**id).is_none()) {
            return Err(AllocationError::UnknownPerson(*missing));
        }

        let mut sources = Vec::new();
        let mut moving = Vec::with_capacity(wanted.len());
        for id in wanted {
            let Some((bucket_id, pos)) = self.locate(id) else {
                continue;
            };
            moving.push(self.bucket_mut(bucket_id).items.remove(pos));
            if !sources.contains(&bucket_id) {
                sources.push(bucket_id);
            }
        }
        Ok((moving, sources))
    }

    fn attach(
        &mut self,
        moving: Vec<Person>,
        sources: Vec<BucketId>,
        target: BucketId,
        at: usize,
    ) -> MoveOutcome {
        let moved: Vec<PersonId> = moving.iter().map(|p| p.id).collect();
        let bucket = self.bucket_mut(target);
        for (offset, person) in moving.into_iter().enumerate() {
            bucket.items.insert(at + offset, person);
        }

        let mut touched = sources;
        if !touched.contains(&target) {
            touched.push(target);
        }
        let affected: Vec<(BucketId, BucketCounts)> =
            touched.into_iter().map(|id| (id, self.counts(id))).collect();

        debug!(count = moved.len(), to = %target, index = at, "moved requests");
        MoveOutcome { moved, affected }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person(n: usize, size: u32) -> Person {
        Person {
            id: PersonId(n),
            name: format!("Person {n}"),
            location: "Somewhere".into(),
            group_size: size,
            priority: false,
        }
    }

    fn sample_board() -> Board {
        let mut board = Board::new();
        board.push(BucketId::Unassigned, person(0, 2));
        board.push(BucketId::Unassigned, person(1, 3));
        board.push(BucketId::Unassigned, person(2, 4));
        board.push(BucketId::SpecialTaxi1, person(3, 5));
        board.push(BucketId::SpecialTaxi1, person(4, 1));
        board
    }

    fn ids(board: &Board, bucket: BucketId) -> Vec<usize> {
        board.bucket(bucket).items.iter().map(|p| p.id.0).collect()
    }

    #[test]
    fn new_board_has_every_bucket_empty() {
        let board = Board::new();
        assert_eq!(board.buckets().count(), 7);
        assert!(board.is_empty());
        assert_eq!(board.counts(BucketId::ChurchBus1), BucketCounts::default());
    }

    #[test]
    fn move_shifts_counts_by_exact_contribution() {
        let mut board = sample_board();
        let before_total = board.total_people();
        let src_before = board.counts(BucketId::Unassigned);
        let dst_before = board.counts(BucketId::SpecialTaxi1);

        let outcome = board
            .move_items(&[PersonId(0), PersonId(2)], BucketId::SpecialTaxi1, 1)
            .expect("move");

        let src_after = board.counts(BucketId::Unassigned);
        let dst_after = board.counts(BucketId::SpecialTaxi1);
        assert_eq!(src_before.requests - 2, src_after.requests);
        assert_eq!(src_before.total_people - 6, src_after.total_people);
        assert_eq!(dst_before.requests + 2, dst_after.requests);
        assert_eq!(dst_before.total_people + 6, dst_after.total_people);
        assert_eq!(board.total_people(), before_total);
        assert_eq!(ids(&board, BucketId::SpecialTaxi1), vec![3, 0, 2, 4]);
        assert_eq!(
            outcome.affected,
            vec![(BucketId::Unassigned, src_after), (BucketId::SpecialTaxi1, dst_after)]
        );
    }

    #[test]
    fn move_keeps_supplied_order_and_clamps_index() {
        let mut board = sample_board();
        board
            .move_items(&[PersonId(2), PersonId(0)], BucketId::ChurchBus2, 99)
            .expect("move");
        assert_eq!(ids(&board, BucketId::ChurchBus2), vec![2, 0]);
        assert_eq!(ids(&board, BucketId::Unassigned), vec![1]);
    }

    #[test]
    fn move_within_same_bucket_reorders() {
        let mut board = sample_board();
        board
            .move_items(&[PersonId(0)], BucketId::Unassigned, 2)
            .expect("move");
        assert_eq!(ids(&board, BucketId::Unassigned), vec![1, 2, 0]);
        assert_eq!(board.total_requests(), 5);
    }

    #[test]
    fn duplicate_ids_move_once() {
        let mut board = sample_board();
        let outcome = board
            .move_items(&[PersonId(1), PersonId(1)], BucketId::ChurchBus1, 0)
            .expect("move");
        assert_eq!(outcome.moved, vec![PersonId(1)]);
        assert_eq!(board.total_requests(), 5);
    }

    #[test]
    fn unknown_id_leaves_board_untouched() {
        let mut board = sample_board();
        let snapshot = board.clone();
        let err = board
            .move_items(&[PersonId(0), PersonId(42)], BucketId::ChurchBus1, 0)
            .unwrap_err();
        assert!(matches!(err, AllocationError::UnknownPerson(PersonId(42))));
        assert_eq!(board, snapshot);
    }

    #[test]
    fn move_before_inserts_ahead_of_anchor() {
        let mut board = sample_board();
        board
            .move_items_before(&[PersonId(1)], BucketId::SpecialTaxi1, Some(PersonId(4)))
            .expect("move");
        assert_eq!(ids(&board, BucketId::SpecialTaxi1), vec![3, 1, 4]);

        board
            .move_items_before(&[PersonId(0)], BucketId::SpecialTaxi1, None)
            .expect("move");
        assert_eq!(ids(&board, BucketId::SpecialTaxi1), vec![3, 1, 4, 0]);
    }

    #[test]
    fn board_order_follows_display_order() {
        let board = sample_board();
        let wanted = HashSet::from([PersonId(4), PersonId(1), PersonId(9)]);
        assert_eq!(board.persons_in_board_order(&wanted), vec![PersonId(1), PersonId(4)]);
    }

    #[test]
    fn counts_hold_groups_beyond_u32_range() {
        let mut board = Board::new();
        board.push(BucketId::Unassigned, person(0, 3_000_000_000));
        board.push(BucketId::Unassigned, person(1, 3_000_000_000));

        assert_eq!(board.counts(BucketId::Unassigned).total_people, 6_000_000_000);
        assert_eq!(board.total_people(), 6_000_000_000);
    }
}
