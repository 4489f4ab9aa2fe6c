use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::board::{auto_assign, Board, BucketId, MoveOutcome, PersonId};
use crate::config::Settings;
use crate::error::{AllocationError, Result};
use crate::export::export_to_buffer;
use crate::interaction::{Controller, InsertionMarker, ItemBox, ItemState};
use crate::parser::load_requests_from_bytes;

/// The board built from the latest accepted upload plus its gesture state
#[derive(Debug)]
pub struct Session {
    settings: Settings,
    board: Option<Board>,
    controller: Controller,
    uploaded_at: Option<DateTime<Local>>,
    source_name: Option<String>,
}

impl Session {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            board: None,
            controller: Controller::new(),
            uploaded_at: None,
            source_name: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn uploaded_at(&self) -> Option<DateTime<Local>> {
        self.uploaded_at
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source_name.as_deref()
    }

    /// Replaces the whole board with one built from `csv`. On any error the
    /// previous board and selection are kept as they were.
    pub fn upload_csv(&mut self, csv: &[u8], source_name: Option<String>) -> Result<&Board> {
        let persons = match load_requests_from_bytes(csv, &self.settings) {
            Ok(persons) => persons,
            Err(e) => {
                warn!(error = %e, "upload rejected, keeping previous board");
                return Err(e);
            }
        };

        if self.board.is_some() {
            info!("discarding previous board for new upload");
        }
        self.controller.reset();
        self.uploaded_at = Some(Local::now());
        self.source_name = source_name;
        Ok(&*self.board.insert(auto_assign(persons, &self.settings)))
    }

    pub fn board(&self) -> Result<&Board> {
        self.board.as_ref().ok_or(AllocationError::NoBoard)
    }

    pub fn state_of(&self, id: PersonId) -> ItemState {
        self.controller.state_of(id)
    }

    pub fn marker(&self) -> Option<InsertionMarker> {
        self.controller.marker()
    }

    pub fn click(&mut self, id: PersonId) -> Result<ItemState> {
        let board = self.board.as_ref().ok_or(AllocationError::NoBoard)?;
        self.controller.click(board, id)
    }

    pub fn drag_start(&mut self, id: PersonId) -> Result<Vec<PersonId>> {
        let board = self.board.as_ref().ok_or(AllocationError::NoBoard)?;
        self.controller.drag_start(board, id)
    }

    pub fn drag_over(&mut self, bucket: BucketId, pointer_y: f64, layout: &[ItemBox]) -> InsertionMarker {
        self.controller.drag_over(bucket, pointer_y, layout)
    }

    pub fn drag_leave(&mut self, bucket: BucketId) {
        self.controller.drag_leave(bucket);
    }

    pub fn drag_end(&mut self) {
        self.controller.drag_end();
    }

    pub fn drop_on(
        &mut self,
        target: Option<BucketId>,
        pointer_y: f64,
        layout: &[ItemBox],
    ) -> Result<Option<MoveOutcome>> {
        let board = self.board.as_mut().ok_or(AllocationError::NoBoard)?;
        self.controller.drop_on(board, target, pointer_y, layout)
    }

    /// Workbook bytes for the current board
    pub fn export(&self) -> Result<Vec<u8>> {
        match &self.board {
            Some(board) => export_to_buffer(board),
            None => Err(AllocationError::NothingToAllocate),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::required_columns;

    fn csv(rows: &[&str]) -> Vec<u8> {
        let settings = Settings::default();
        let header = required_columns(&settings)
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>()
            .join(",");
        let mut out = header;
        for row in rows {
            out.push('\n');
            out.push_str(row);
        }
        out.into_bytes()
    }

    #[test]
    fn upload_builds_board_and_reupload_discards_moves() {
        let mut session = Session::new(Settings::default());
        let data = csv(&["Jane Doe,2,Total Garage Braamfontein,,Yes", "Sam,3,Melville,,No"]);

        session.upload_csv(&data, Some("week1.csv".into())).expect("upload");
        session.click(PersonId(1)).expect("click");
        session.drag_start(PersonId(1)).expect("start");
        session
            .drop_on(Some(BucketId::ChurchBus1), 0.0, &[])
            .expect("drop");
        assert_eq!(session.board().expect("board").counts(BucketId::ChurchBus1).requests, 1);

        session.click(PersonId(0)).expect("click");
        let board = session.upload_csv(&data, None).expect("reupload");
        assert!(board.bucket(BucketId::ChurchBus1).is_empty());
        assert_eq!(board.counts(BucketId::SpecialTaxi1).requests, 1);
        assert_eq!(session.state_of(PersonId(0)), ItemState::Idle);
        assert_eq!(session.source_name(), None);
    }

    #[test]
    fn rejected_upload_keeps_previous_board() {
        let mut session = Session::new(Settings::default());
        session
            .upload_csv(&csv(&["Jane Doe,2,15 Yale Road,,No"]), None)
            .expect("upload");
        let before = session.board().expect("board").clone();

        let bad = b"\"What is your name?\",\"How many people are you requesting for?\",\"Pickup point next to you?\",\"Other (Please Specify)\"\nBob,1,15 Yale Road,\n";
        let err = session.upload_csv(bad, None).unwrap_err();
        assert!(matches!(err, AllocationError::MissingColumn(ref c) if c == &Settings::default().priority_column));
        assert_eq!(session.board().expect("board"), &before);
    }

    #[test]
    fn export_without_upload_has_nothing_to_allocate() {
        let session = Session::new(Settings::default());
        assert!(matches!(session.export(), Err(AllocationError::NothingToAllocate)));
        assert!(matches!(session.board(), Err(AllocationError::NoBoard)));
    }
}
